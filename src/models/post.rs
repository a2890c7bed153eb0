use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

use super::{category::default_published, comment::CommentView};

/// Represents the 'posts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,

    /// A future date schedules the post: it stays off the public feed until then.
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,

    pub author_id: i64,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,

    /// Path under the media root, or an absolute URL.
    pub image: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// A post joined with its author, category and location for list and detail pages.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub author_id: i64,
    pub author_username: String,
    pub category_id: Option<i64>,
    pub category_title: Option<String>,
    pub category_slug: Option<String>,
    pub location_id: Option<i64>,
    /// Only set when the location itself is published.
    pub location_name: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,

    /// Filled in after the query from a grouped count over comments.
    #[sqlx(skip)]
    pub comment_count: i64,
}

/// Post detail page: the post plus its comments, oldest first.
#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    pub post: PostSummary,
    pub comments: Vec<CommentView>,
}

/// DTO for creating or editing a post.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PostForm {
    #[validate(length(
        min = 1,
        max = 256,
        message = "Title length must be between 1 and 256 chars"
    ))]
    pub title: String,

    #[validate(length(min = 1, message = "Text must not be empty"))]
    pub text: String,

    pub pub_date: DateTime<Utc>,

    #[serde(default = "default_published")]
    pub is_published: bool,

    pub category_id: Option<i64>,
    pub location_id: Option<i64>,

    #[validate(length(max = 500), custom(function = validate_image_ref))]
    pub image: Option<String>,
}

impl PostForm {
    /// Initial values of an empty creation form.
    pub fn blank(now: DateTime<Utc>) -> Self {
        Self {
            title: String::new(),
            text: String::new(),
            pub_date: now,
            is_published: true,
            category_id: None,
            location_id: None,
            image: None,
        }
    }
}

impl From<&Post> for PostForm {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: post.pub_date,
            is_published: post.is_published,
            category_id: post.category_id,
            location_id: post.location_id,
            image: post.image.clone(),
        }
    }
}

/// Accepts an absolute http(s) URL or a relative path inside the media root.
fn validate_image_ref(image: &str) -> Result<(), validator::ValidationError> {
    if let Ok(url) = Url::parse(image) {
        if url.scheme() == "http" || url.scheme() == "https" {
            return Ok(());
        }
        return Err(validator::ValidationError::new("invalid_url"));
    }
    let escapes = image.starts_with('/')
        || image.contains('\\')
        || image.split('/').any(|segment| segment == ".." || segment.is_empty());
    if escapes {
        return Err(validator::ValidationError::new("invalid_media_path"));
    }
    Ok(())
}

/// Query parameters for paginated post lists.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    /// Raw page number; anything unparsable falls back to the first page.
    pub page: Option<String>,
}

/// Query parameters for the admin post list.
#[derive(Debug, Deserialize)]
pub struct AdminPostParams {
    /// Case-insensitive title search.
    pub q: Option<String>,
    pub location_id: Option<i64>,
}

/// Admin moderation of any post; only supplied fields change.
#[derive(Debug, Default, Deserialize)]
pub struct AdminPostUpdate {
    pub is_published: Option<bool>,
    pub pub_date: Option<DateTime<Utc>>,
    /// `null` removes the category, an absent field leaves it alone.
    #[serde(default, deserialize_with = "nullable")]
    pub category_id: Option<Option<i64>>,
}

impl AdminPostUpdate {
    pub fn is_empty(&self) -> bool {
        self.is_published.is_none() && self.pub_date.is_none() && self.category_id.is_none()
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_refs() {
        assert!(validate_image_ref("post_image/cat.jpg").is_ok());
        assert!(validate_image_ref("https://example.com/cat.jpg").is_ok());
        assert!(validate_image_ref("../etc/passwd").is_err());
        assert!(validate_image_ref("/etc/passwd").is_err());
        assert!(validate_image_ref("post_image//cat.jpg").is_err());
        assert!(validate_image_ref("file:///etc/passwd").is_err());
    }

    #[test]
    fn blank_form_is_published_by_default() {
        let now = Utc::now();
        let form = PostForm::blank(now);
        assert!(form.is_published);
        assert_eq!(form.pub_date, now);
        // An untouched form must not pass validation.
        assert!(form.validate().is_err());
    }

    #[test]
    fn moderation_distinguishes_null_from_absent() {
        let clear: AdminPostUpdate = serde_json::from_str(r#"{"category_id": null}"#).unwrap();
        assert_eq!(clear.category_id, Some(None));
        assert!(!clear.is_empty());

        let untouched: AdminPostUpdate =
            serde_json::from_str(r#"{"is_published": false}"#).unwrap();
        assert_eq!(untouched.category_id, None);
        assert_eq!(untouched.is_published, Some(false));
    }
}
