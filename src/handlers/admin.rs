// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    error::AppError,
    models::{
        category::{CreateCategoryRequest, UpdateCategoryRequest},
        location::{CreateLocationRequest, UpdateLocationRequest},
        post::{AdminPostParams, AdminPostUpdate},
    },
    repository::DynRepository,
    utils::form::FormJson,
};

/// Lists all categories, published or not.
/// Admin only.
pub async fn list_categories(
    State(repo): State<DynRepository>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(repo.list_categories().await?))
}

/// Admin only.
pub async fn create_category(
    State(repo): State<DynRepository>,
    FormJson(payload): FormJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = repo.create_category(&payload).await?;
    tracing::info!(category_id = category.id, slug = %category.slug, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}

/// Partial update; only supplied fields change.
/// Admin only.
pub async fn update_category(
    State(repo): State<DynRepository>,
    Path(id): Path<i64>,
    FormJson(payload): FormJson<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = repo
        .update_category(id, &payload)
        .await?
        .ok_or(AppError::NotFound("Category not found".to_string()))?;

    Ok(Json(category))
}

/// Posts filed under the category lose their category, they are not deleted.
/// Admin only.
pub async fn delete_category(
    State(repo): State<DynRepository>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !repo.delete_category(id).await? {
        return Err(AppError::NotFound("Category not found".to_string()));
    }
    tracing::info!(category_id = id, "Category deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Admin only.
pub async fn list_locations(
    State(repo): State<DynRepository>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(repo.list_locations().await?))
}

/// Admin only.
pub async fn create_location(
    State(repo): State<DynRepository>,
    FormJson(payload): FormJson<CreateLocationRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let location = repo.create_location(&payload).await?;

    Ok((StatusCode::CREATED, Json(location)))
}

/// Admin only.
pub async fn update_location(
    State(repo): State<DynRepository>,
    Path(id): Path<i64>,
    FormJson(payload): FormJson<UpdateLocationRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let location = repo
        .update_location(id, &payload)
        .await?
        .ok_or(AppError::NotFound("Location not found".to_string()))?;

    Ok(Json(location))
}

/// Admin only.
pub async fn delete_location(
    State(repo): State<DynRepository>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !repo.delete_location(id).await? {
        return Err(AppError::NotFound("Location not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Every post regardless of state, searchable by title and filterable by location.
/// Admin only.
pub async fn list_posts(
    State(repo): State<DynRepository>,
    Query(params): Query<AdminPostParams>,
) -> Result<impl IntoResponse, AppError> {
    let posts = repo
        .search_posts(params.q.as_deref(), params.location_id)
        .await?;

    Ok(Json(posts))
}

/// Change publication state, date or category of any post.
/// Admin only.
pub async fn update_post(
    State(repo): State<DynRepository>,
    Path(id): Path<i64>,
    FormJson(payload): FormJson<AdminPostUpdate>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(Some(category_id)) = payload.category_id {
        if repo.find_category(category_id).await?.is_none() {
            let mut errors = ValidationErrors::new();
            errors.add(
                "category_id",
                ValidationError::new("does_not_exist").with_message("Select a valid category.".into()),
            );
            return Err(AppError::Validation(errors));
        }
    }

    let post = repo
        .moderate_post(id, &payload)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;
    tracing::info!(post_id = id, is_published = post.is_published, "Post moderated");

    Ok(Json(post))
}

/// Remove any post with its comments.
/// Admin only.
pub async fn delete_post(
    State(repo): State<DynRepository>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !repo.delete_post(id).await? {
        return Err(AppError::NotFound("Post not found".to_string()));
    }
    tracing::info!(post_id = id, "Post removed by admin");

    Ok(StatusCode::NO_CONTENT)
}
