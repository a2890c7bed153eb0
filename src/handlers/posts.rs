// src/handlers/posts.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde_json::json;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    error::AppError,
    models::{post::PostForm, user::User},
    repository::{BlogRepository, DynRepository},
    services::guard::{self, Decision, Target},
    utils::{form::FormJson, html::clean_html, jwt::Claims},
};

/// Loads the user behind the token.
pub(crate) async fn current_user(
    repo: &dyn BlogRepository,
    claims: &Claims,
) -> Result<User, AppError> {
    repo.find_user(claims.user_id()?)
        .await?
        .ok_or(AppError::AuthError("User not found".to_string()))
}

/// Category and location must point at existing rows.
async fn check_references(repo: &dyn BlogRepository, form: &PostForm) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();

    if let Some(id) = form.category_id {
        if repo.find_category(id).await?.is_none() {
            errors.add(
                "category_id",
                ValidationError::new("does_not_exist").with_message("Select a valid category.".into()),
            );
        }
    }

    if let Some(id) = form.location_id {
        if repo.find_location(id).await?.is_none() {
            errors.add(
                "location_id",
                ValidationError::new("does_not_exist").with_message("Select a valid location.".into()),
            );
        }
    }

    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Validates the submitted form and returns it with its text sanitized.
async fn clean_form(repo: &dyn BlogRepository, form: PostForm) -> Result<PostForm, AppError> {
    form.validate()?;
    check_references(repo, &form).await?;

    Ok(PostForm {
        text: clean_html(&form.text),
        ..form
    })
}

/// Form data shown next to a post form: the current values and the choices.
async fn form_context(repo: &dyn BlogRepository, form: PostForm) -> Result<Response, AppError> {
    let categories = repo.list_categories().await?;
    let locations = repo.list_locations().await?;

    Ok(Json(json!({
        "form": form,
        "categories": categories,
        "locations": locations,
    }))
    .into_response())
}

/// Empty creation form.
pub async fn create_post_form(State(repo): State<DynRepository>) -> Result<Response, AppError> {
    form_context(repo.as_ref(), PostForm::blank(Utc::now())).await
}

/// Create a new post owned by the current user, then go to their profile.
pub async fn create_post(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    FormJson(payload): FormJson<PostForm>,
) -> Result<Response, AppError> {
    let user = current_user(repo.as_ref(), &claims).await?;
    let form = clean_form(repo.as_ref(), payload).await?;

    let post = repo.create_post(user.id, &form).await?;
    tracing::info!(post_id = post.id, user_id = user.id, "Post created");

    Ok(Redirect::to(&format!("/profile/{}/", user.username)).into_response())
}

/// Edit form pre-filled with the post's current values. Author only.
pub async fn edit_post_form(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
) -> Result<Response, AppError> {
    let target = Target::post(post_id);
    if let Decision::Deny { redirect_to } =
        guard::authorize(repo.as_ref(), claims.user_id()?, target).await?
    {
        return Ok(Redirect::to(&redirect_to).into_response());
    }

    let post = repo
        .find_post(post_id)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    form_context(repo.as_ref(), PostForm::from(&post)).await
}

/// Save an edited post. Author only.
pub async fn edit_post(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
    FormJson(payload): FormJson<PostForm>,
) -> Result<Response, AppError> {
    let target = Target::post(post_id);
    if let Decision::Deny { redirect_to } =
        guard::authorize(repo.as_ref(), claims.user_id()?, target).await?
    {
        return Ok(Redirect::to(&redirect_to).into_response());
    }

    let form = clean_form(repo.as_ref(), payload).await?;
    repo.update_post(post_id, &form)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    Ok(Redirect::to(&target.detail_url()).into_response())
}

/// Delete confirmation: the post and how many comments go with it. Author only.
pub async fn delete_post_form(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
) -> Result<Response, AppError> {
    if let Decision::Deny { redirect_to } =
        guard::authorize(repo.as_ref(), claims.user_id()?, Target::post(post_id)).await?
    {
        return Ok(Redirect::to(&redirect_to).into_response());
    }

    let post = repo
        .find_post(post_id)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;
    let comment_count = repo.count_comments(post_id).await?;

    Ok(Json(json!({
        "post": post,
        "comment_count": comment_count,
    }))
    .into_response())
}

/// Delete a post together with its comments. Author only.
pub async fn delete_post(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
) -> Result<Response, AppError> {
    let user_id = claims.user_id()?;
    if let Decision::Deny { redirect_to } =
        guard::authorize(repo.as_ref(), user_id, Target::post(post_id)).await?
    {
        return Ok(Redirect::to(&redirect_to).into_response());
    }

    if !repo.delete_post(post_id).await? {
        return Err(AppError::NotFound("Post not found".to_string()));
    }
    tracing::info!(post_id, user_id, "Post deleted");

    Ok(Redirect::to("/").into_response())
}
