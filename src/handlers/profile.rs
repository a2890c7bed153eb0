use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use super::{
    blog::{post_page, viewer_id},
    posts::current_user,
};
use crate::{
    error::AppError,
    models::{
        post::PageParams,
        user::{ProfileForm, ProfileResponse},
    },
    repository::DynRepository,
    services::visibility::PostQuery,
    utils::{form::FormJson, jwt::Claims},
};

/// A user's page with their posts.
/// The owner sees drafts and scheduled posts too; other viewers get the public subset.
pub async fn profile_info(
    State(repo): State<DynRepository>,
    claims: Option<Extension<Claims>>,
    Path(username): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let profile = repo
        .find_user_by_username(&username)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let is_owner = viewer_id(&claims) == Some(profile.id);
    let now = Utc::now();
    let query = if is_owner {
        PostQuery::visible_to(Some(profile.id), now)
    } else {
        PostQuery::public(now).by_author(profile.id)
    };
    let page = post_page(repo.as_ref(), &query, params.page.as_deref()).await?;

    Ok(Json(json!({
        "profile": ProfileResponse::new(&profile, is_owner),
        "page_obj": page,
    })))
}

/// Current values of the logged-in user's profile.
pub async fn edit_profile_form(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(repo.as_ref(), &claims).await?;

    Ok(Json(json!({ "form": ProfileForm::from(&user) })))
}

/// Update the logged-in user's profile, then go to the (possibly renamed) profile page.
pub async fn edit_profile(
    State(repo): State<DynRepository>,
    Extension(claims): Extension<Claims>,
    FormJson(payload): FormJson<ProfileForm>,
) -> Result<Response, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let user = repo
        .update_profile(user_id, &payload)
        .await?
        .ok_or(AppError::AuthError("User not found".to_string()))?;
    tracing::info!(user_id, username = %user.username, "Profile updated");

    Ok(Redirect::to(&format!("/profile/{}/", user.username)).into_response())
}
