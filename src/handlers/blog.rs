// src/handlers/blog.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;

use crate::{
    error::AppError,
    models::post::{PageParams, PostDetailResponse, PostSummary},
    repository::{BlogRepository, DynRepository},
    services::{
        aggregate,
        pagination::{PAGE_SIZE, Page, Paginator},
        visibility::PostQuery,
    },
    utils::jwt::Claims,
};

/// Id of the logged-in viewer, if any.
pub(crate) fn viewer_id(claims: &Option<Extension<Claims>>) -> Option<i64> {
    claims.as_ref().and_then(|Extension(c)| c.user_id().ok())
}

/// Counts, paginates, fetches and annotates one page of `query`.
pub(crate) async fn post_page(
    repo: &dyn BlogRepository,
    query: &PostQuery,
    raw_page: Option<&str>,
) -> Result<Page<PostSummary>, AppError> {
    let count = repo.count_posts(query).await?;
    let window = Paginator::new(count, PAGE_SIZE).window(raw_page);

    let posts = repo
        .list_posts(query, window.limit(), window.offset())
        .await?;
    let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    let counts = repo.comment_counts(&ids).await?;

    Ok(Page::new(aggregate::annotate(posts, &counts), window))
}

/// Public feed.
pub async fn index(
    State(repo): State<DynRepository>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = PostQuery::public(Utc::now());
    let page = post_page(repo.as_ref(), &query, params.page.as_deref()).await?;

    Ok(Json(json!({ "page_obj": page })))
}

/// Single post with its comments.
/// The author sees the post in any state; everyone else only if it is on the public feed.
pub async fn post_detail(
    State(repo): State<DynRepository>,
    claims: Option<Extension<Claims>>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let post = repo
        .find_post(post_id)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    let now = Utc::now();
    let query = if viewer_id(&claims) == Some(post.author_id) {
        PostQuery::visible_to(Some(post.author_id), now)
    } else {
        PostQuery::public(now)
    }
    .with_id(post_id);

    let mut summary = repo
        .list_posts(&query, 1, 0)
        .await?
        .into_iter()
        .next()
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    let comments = repo.list_comments(post_id).await?;
    summary.comment_count = comments.len() as i64;

    Ok(Json(PostDetailResponse {
        post: summary,
        comments,
    }))
}

/// Public posts of one published category.
pub async fn category_posts(
    State(repo): State<DynRepository>,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let category = repo
        .find_category_by_slug(&slug)
        .await?
        .filter(|c| c.is_published)
        .ok_or(AppError::NotFound("Category not found".to_string()))?;

    let query = PostQuery::public(Utc::now()).in_category(category.id);
    let page = post_page(repo.as_ref(), &query, params.page.as_deref()).await?;

    Ok(Json(json!({
        "category": category,
        "page_obj": page,
    })))
}
