use std::collections::HashMap;

use crate::models::post::PostSummary;

/// Attaches comment counts to posts.
///
/// `counts` is a grouped `post_id -> COUNT(*)` over the comments table; posts
/// missing from it have no comments. Order of `posts` is untouched.
pub fn annotate(mut posts: Vec<PostSummary>, counts: &HashMap<i64, i64>) -> Vec<PostSummary> {
    for post in &mut posts {
        post.comment_count = counts.get(&post.id).copied().unwrap_or(0);
    }
    posts
}
