use chrono::{DateTime, Utc};

/// Who is looking at the posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Everything written by this author, drafts and scheduled posts included.
    Owner(i64),
    /// Published posts in published (or no) categories with `pub_date <= now`.
    Public { now: DateTime<Utc> },
}

/// Predicate over the posts table.
///
/// Built here, rendered to SQL by the repository. Results are always ordered
/// by `pub_date` descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub visibility: Visibility,
    pub category_id: Option<i64>,
    pub author_id: Option<i64>,
    pub post_id: Option<i64>,
}

impl PostQuery {
    /// Base query for a viewer. `owner` is set only when a user looks at
    /// their own posts.
    pub fn visible_to(owner: Option<i64>, now: DateTime<Utc>) -> Self {
        let visibility = match owner {
            Some(id) => Visibility::Owner(id),
            None => Visibility::Public { now },
        };
        Self {
            visibility,
            category_id: None,
            author_id: None,
            post_id: None,
        }
    }

    pub fn public(now: DateTime<Utc>) -> Self {
        Self::visible_to(None, now)
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn by_author(mut self, author_id: i64) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn with_id(mut self, post_id: i64) -> Self {
        self.post_id = Some(post_id);
        self
    }

    pub fn is_public(&self) -> bool {
        matches!(self.visibility, Visibility::Public { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_query_is_not_public() {
        let now = Utc::now();
        let q = PostQuery::visible_to(Some(7), now);
        assert_eq!(q.visibility, Visibility::Owner(7));
        assert!(!q.is_public());
        assert!(PostQuery::visible_to(None, now).is_public());
    }

    #[test]
    fn narrowing_keeps_visibility() {
        let now = Utc::now();
        let q = PostQuery::public(now).in_category(3).by_author(4).with_id(5);
        assert_eq!(q.visibility, Visibility::Public { now });
        assert_eq!(q.category_id, Some(3));
        assert_eq!(q.author_id, Some(4));
        assert_eq!(q.post_id, Some(5));
    }
}
