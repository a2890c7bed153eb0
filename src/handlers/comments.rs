// src/handlers/comments.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use validator::Validate;

use super::posts::current_user;
use crate::{
    error::AppError,
    models::comment::{Comment, CommentForm},
    repository::{BlogRepository, DynRepository},
    services::guard::{self, Decision, Target},
    utils::{form::FormJson, html::clean_html, jwt::Claims},
};

/// The comment, provided it sits under `post_id`.
async fn comment_of_post(
    repo: &dyn BlogRepository,
    post_id: i64,
    comment_id: i64,
) -> Result<Comment, AppError> {
    repo.find_comment(comment_id)
        .await?
        .filter(|c| c.post_id == post_id)
        .ok_or(AppError::NotFound("Comment not found".to_string()))
}

/// Add a comment to any existing post.
pub async fn add_comment(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
    FormJson(payload): FormJson<CommentForm>,
) -> Result<Response, AppError> {
    let user = current_user(repo.as_ref(), &claims).await?;
    repo.find_post(post_id)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    payload.validate()?;

    let comment = repo
        .create_comment(post_id, user.id, &clean_html(&payload.text))
        .await?;
    tracing::info!(comment_id = comment.id, post_id, user_id = user.id, "Comment added");

    Ok(Redirect::to(&Target::post(post_id).detail_url()).into_response())
}

/// Edit form for a comment. Comment author only.
pub async fn edit_comment_form(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Response, AppError> {
    let target = Target::comment(post_id, comment_id);
    if let Decision::Deny { redirect_to } =
        guard::authorize(repo.as_ref(), claims.user_id()?, target).await?
    {
        return Ok(Redirect::to(&redirect_to).into_response());
    }

    let comment = comment_of_post(repo.as_ref(), post_id, comment_id).await?;

    Ok(Json(json!({
        "form": CommentForm { text: comment.text.clone() },
        "comment": comment,
    }))
    .into_response())
}

/// Save an edited comment. Comment author only.
pub async fn edit_comment(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    FormJson(payload): FormJson<CommentForm>,
) -> Result<Response, AppError> {
    let target = Target::comment(post_id, comment_id);
    if let Decision::Deny { redirect_to } =
        guard::authorize(repo.as_ref(), claims.user_id()?, target).await?
    {
        return Ok(Redirect::to(&redirect_to).into_response());
    }

    comment_of_post(repo.as_ref(), post_id, comment_id).await?;
    payload.validate()?;

    repo.update_comment(comment_id, &clean_html(&payload.text))
        .await?
        .ok_or(AppError::NotFound("Comment not found".to_string()))?;

    Ok(Redirect::to(&target.detail_url()).into_response())
}

/// Delete confirmation for a comment. Comment author only.
pub async fn delete_comment_form(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Response, AppError> {
    let target = Target::comment(post_id, comment_id);
    if let Decision::Deny { redirect_to } =
        guard::authorize(repo.as_ref(), claims.user_id()?, target).await?
    {
        return Ok(Redirect::to(&redirect_to).into_response());
    }

    let comment = comment_of_post(repo.as_ref(), post_id, comment_id).await?;

    Ok(Json(json!({ "comment": comment })).into_response())
}

/// Delete a comment. Comment author only.
pub async fn delete_comment(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Response, AppError> {
    let user_id = claims.user_id()?;
    let target = Target::comment(post_id, comment_id);
    if let Decision::Deny { redirect_to } =
        guard::authorize(repo.as_ref(), user_id, target).await?
    {
        return Ok(Redirect::to(&redirect_to).into_response());
    }

    comment_of_post(repo.as_ref(), post_id, comment_id).await?;
    repo.delete_comment(comment_id).await?;
    tracing::info!(comment_id, post_id, user_id, "Comment deleted");

    Ok(Redirect::to(&target.detail_url()).into_response())
}
