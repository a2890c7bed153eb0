// src/repository/mod.rs

//! Storage interface. Handlers and services only see `BlogRepository`;
//! `SqliteRepository` is the SQL implementation.

pub mod sqlite;

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        category::{Category, CreateCategoryRequest, UpdateCategoryRequest},
        comment::{Comment, CommentView},
        location::{CreateLocationRequest, Location, UpdateLocationRequest},
        post::{AdminPostUpdate, Post, PostForm, PostSummary},
        user::{ProfileForm, User},
    },
    services::visibility::PostQuery,
};

pub use sqlite::SqliteRepository;

/// Shared handle stored in the application state.
pub type DynRepository = Arc<dyn BlogRepository>;

/// Data for inserting a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

#[async_trait]
pub trait BlogRepository: Send + Sync {
    // Users

    /// Fails with `Conflict` when the username is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    /// Fails with `Conflict` when the new username is taken.
    async fn update_profile(&self, id: i64, form: &ProfileForm) -> Result<Option<User>, AppError>;

    // Categories

    async fn list_categories(&self) -> Result<Vec<Category>, AppError>;
    async fn find_category(&self, id: i64) -> Result<Option<Category>, AppError>;
    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, AppError>;
    async fn create_category(&self, req: &CreateCategoryRequest) -> Result<Category, AppError>;
    async fn update_category(
        &self,
        id: i64,
        req: &UpdateCategoryRequest,
    ) -> Result<Option<Category>, AppError>;
    /// Posts in the category keep existing with their category cleared.
    async fn delete_category(&self, id: i64) -> Result<bool, AppError>;

    // Locations

    async fn list_locations(&self) -> Result<Vec<Location>, AppError>;
    async fn find_location(&self, id: i64) -> Result<Option<Location>, AppError>;
    async fn create_location(&self, req: &CreateLocationRequest) -> Result<Location, AppError>;
    async fn update_location(
        &self,
        id: i64,
        req: &UpdateLocationRequest,
    ) -> Result<Option<Location>, AppError>;
    async fn delete_location(&self, id: i64) -> Result<bool, AppError>;

    // Posts

    async fn count_posts(&self, query: &PostQuery) -> Result<i64, AppError>;
    /// Posts matching `query`, newest `pub_date` first.
    async fn list_posts(
        &self,
        query: &PostQuery,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostSummary>, AppError>;
    async fn find_post(&self, id: i64) -> Result<Option<Post>, AppError>;
    async fn create_post(&self, author_id: i64, form: &PostForm) -> Result<Post, AppError>;
    async fn update_post(&self, id: i64, form: &PostForm) -> Result<Option<Post>, AppError>;
    /// Admin partial update of publication state, date and category.
    async fn moderate_post(
        &self,
        id: i64,
        update: &AdminPostUpdate,
    ) -> Result<Option<Post>, AppError>;
    /// Removes the post and, by cascade, its comments.
    async fn delete_post(&self, id: i64) -> Result<bool, AppError>;
    /// Every post regardless of state, for the admin list.
    async fn search_posts(
        &self,
        title: Option<&str>,
        location_id: Option<i64>,
    ) -> Result<Vec<Post>, AppError>;

    // Comments

    /// Grouped comment count keyed by post id; posts without comments are absent.
    async fn comment_counts(&self, post_ids: &[i64]) -> Result<HashMap<i64, i64>, AppError>;
    async fn count_comments(&self, post_id: i64) -> Result<i64, AppError>;
    /// Oldest first.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>, AppError>;
    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, AppError>;
    async fn create_comment(
        &self,
        post_id: i64,
        author_id: i64,
        text: &str,
    ) -> Result<Comment, AppError>;
    async fn update_comment(&self, id: i64, text: &str) -> Result<Option<Comment>, AppError>;
    async fn delete_comment(&self, id: i64) -> Result<bool, AppError>;
}
