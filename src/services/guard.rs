//! Ownership checks for mutating post and comment actions.
//!
//! Handlers call [`authorize`] first thing, after the login middleware has
//! established who the user is. A denial is not an error: it turns into a
//! redirect back to the post page and the action does not run.

use crate::{
    error::AppError,
    models::{comment::Comment, post::Post},
    repository::BlogRepository,
};

/// Anything with a single owning author.
pub trait Owned {
    fn owner_id(&self) -> i64;
}

impl Owned for Post {
    fn owner_id(&self) -> i64 {
        self.author_id
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> i64 {
        self.author_id
    }
}

pub fn check_owner(user_id: i64, target: &impl Owned) -> bool {
    target.owner_id() == user_id
}

/// What a mutating route acts on, taken from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub post_id: Option<i64>,
    pub comment_id: Option<i64>,
}

impl Target {
    pub fn post(post_id: i64) -> Self {
        Self {
            post_id: Some(post_id),
            comment_id: None,
        }
    }

    pub fn comment(post_id: i64, comment_id: i64) -> Self {
        Self {
            post_id: Some(post_id),
            comment_id: Some(comment_id),
        }
    }

    /// Post detail page of the target.
    pub fn detail_url(&self) -> String {
        match self.post_id {
            Some(id) => format!("/posts/{id}/"),
            None => "/".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum Decision {
    Allow,
    /// Not the owner: send the user to this location instead.
    Deny { redirect_to: String },
}

/// Loads the target and compares its author with `user_id`.
///
/// A comment id wins over a post id. A missing entity is `NotFound`. With
/// neither id present there is nothing to protect and the action is allowed.
pub async fn authorize(
    repo: &dyn BlogRepository,
    user_id: i64,
    target: Target,
) -> Result<Decision, AppError> {
    let is_owner = if let Some(comment_id) = target.comment_id {
        let comment = repo
            .find_comment(comment_id)
            .await?
            .ok_or(AppError::NotFound("Comment not found".to_string()))?;
        check_owner(user_id, &comment)
    } else if let Some(post_id) = target.post_id {
        let post = repo
            .find_post(post_id)
            .await?
            .ok_or(AppError::NotFound("Post not found".to_string()))?;
        check_owner(user_id, &post)
    } else {
        true
    };

    if is_owner {
        Ok(Decision::Allow)
    } else {
        tracing::info!(user_id, ?target, "Ownership check denied");
        Ok(Decision::Deny {
            redirect_to: target.detail_url(),
        })
    }
}
