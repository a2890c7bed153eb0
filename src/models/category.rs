// src/models/category.rs

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Latin letters, digits, hyphen and underscore.
pub static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid slug regex"));

/// Represents the 'categories' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub description: String,

    /// Unique URL segment for `/category/{slug}/`.
    pub slug: String,

    /// Unpublished categories hide every post filed under them.
    pub is_published: bool,

    pub created_at: DateTime<Utc>,
}

/// DTO for creating a category (admin).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    pub description: String,
    #[validate(
        length(min = 1, max = 50),
        regex(path = *SLUG_RE, message = "Slug may contain only latin letters, digits, hyphen and underscore.")
    )]
    pub slug: String,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

/// DTO for a partial category update (admin).
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(
        length(min = 1, max = 50),
        regex(path = *SLUG_RE, message = "Slug may contain only latin letters, digits, hyphen and underscore.")
    )]
    pub slug: Option<String>,
    pub is_published: Option<bool>,
}

pub(crate) fn default_published() -> bool {
    true
}
