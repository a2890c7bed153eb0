// src/repository/sqlite.rs

use std::{collections::HashMap, str::FromStr, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    QueryBuilder, Sqlite, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use super::{BlogRepository, NewUser};
use crate::{
    error::AppError,
    models::{
        category::{Category, CreateCategoryRequest, UpdateCategoryRequest},
        comment::{Comment, CommentView},
        location::{CreateLocationRequest, Location, UpdateLocationRequest},
        post::{AdminPostUpdate, Post, PostForm, PostSummary},
        user::{ProfileForm, User},
    },
    services::visibility::{PostQuery, Visibility},
};

/// Opens a pool and enables foreign keys (cascades and SET NULL depend on them).
///
/// An in-memory database lives only as long as its connection, so those
/// pools never recycle idle connections.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3));
    if database_url.contains(":memory:") {
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
    }

    pool_options.connect_with(options).await
}

/// Applies the migrations under `migrations/`.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Maps a unique-constraint failure to `Conflict`, everything else to a 500.
fn unique_or_internal(err: sqlx::Error, conflict: impl FnOnce() -> String) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::Conflict(conflict());
        }
    }
    tracing::error!("Database error: {:?}", err);
    AppError::from(err)
}

const POST_SUMMARY_SELECT: &str = r#"
    SELECT
        p.id, p.title, p.text, p.pub_date, p.is_published,
        p.author_id, u.username AS author_username,
        p.category_id, c.title AS category_title, c.slug AS category_slug,
        p.location_id,
        CASE WHEN l.is_published THEN l.name END AS location_name,
        p.image, p.created_at
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN locations l ON l.id = p.location_id
    WHERE 1 = 1"#;

const POST_COUNT_SELECT: &str = r#"
    SELECT COUNT(*)
    FROM posts p
    LEFT JOIN categories c ON c.id = p.category_id
    WHERE 1 = 1"#;

const POST_COLUMNS: &str =
    "id, title, text, pub_date, is_published, author_id, category_id, location_id, image, created_at";

/// Renders a `PostQuery` as `AND ...` clauses. Expects `p` (posts) and
/// `c` (left-joined categories) in scope.
fn push_predicate(builder: &mut QueryBuilder<'_, Sqlite>, query: &PostQuery) {
    match query.visibility {
        Visibility::Owner(owner_id) => {
            builder.push(" AND p.author_id = ").push_bind(owner_id);
        }
        Visibility::Public { now } => {
            builder
                .push(" AND p.is_published = 1 AND p.pub_date <= ")
                .push_bind(now)
                .push(" AND (p.category_id IS NULL OR c.is_published = 1)");
        }
    }
    if let Some(category_id) = query.category_id {
        builder.push(" AND p.category_id = ").push_bind(category_id);
    }
    if let Some(author_id) = query.author_id {
        builder.push(" AND p.author_id = ").push_bind(author_id);
    }
    if let Some(post_id) = query.post_id {
        builder.push(" AND p.id = ").push_bind(post_id);
    }
}

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlogRepository for SqliteRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, first_name, last_name, email, password, role, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, username, first_name, last_name, email, password, role, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_or_internal(e, || format!("Username '{}' already exists", user.username)))
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, first_name, last_name, email, password, role, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, first_name, last_name, email, password, role, created_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_profile(&self, id: i64, form: &ProfileForm) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET first_name = ?, last_name = ?, username = ?, email = ?
            WHERE id = ?
            RETURNING id, username, first_name, last_name, email, password, role, created_at
            "#,
        )
        .bind(&form.first_name)
        .bind(&form.last_name)
        .bind(&form.username)
        .bind(form.email.as_deref().unwrap_or(""))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_or_internal(e, || format!("Username '{}' already exists", form.username)))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, title, description, slug, is_published, created_at FROM categories ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, title, description, slug, is_published, created_at FROM categories WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, title, description, slug, is_published, created_at FROM categories WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn create_category(&self, req: &CreateCategoryRequest) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (title, description, slug, is_published, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, title, description, slug, is_published, created_at
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.slug)
        .bind(req.is_published)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_or_internal(e, || format!("Slug '{}' already exists", req.slug)))
    }

    async fn update_category(
        &self,
        id: i64,
        req: &UpdateCategoryRequest,
    ) -> Result<Option<Category>, AppError> {
        if req.title.is_none()
            && req.description.is_none()
            && req.slug.is_none()
            && req.is_published.is_none()
        {
            return self.find_category(id).await;
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE categories SET ");
        let mut separated = builder.separated(", ");

        if let Some(title) = &req.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title.clone());
        }

        if let Some(description) = &req.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description.clone());
        }

        if let Some(slug) = &req.slug {
            separated.push("slug = ");
            separated.push_bind_unseparated(slug.clone());
        }

        if let Some(is_published) = req.is_published {
            separated.push("is_published = ");
            separated.push_bind_unseparated(is_published);
        }

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING id, title, description, slug, is_published, created_at");

        builder
            .build_query_as::<Category>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                unique_or_internal(e, || {
                    format!("Slug '{}' already exists", req.slug.as_deref().unwrap_or_default())
                })
            })
    }

    async fn delete_category(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_locations(&self) -> Result<Vec<Location>, AppError> {
        let locations = sqlx::query_as::<_, Location>(
            "SELECT id, name, is_published, created_at FROM locations ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }

    async fn find_location(&self, id: i64) -> Result<Option<Location>, AppError> {
        let location = sqlx::query_as::<_, Location>(
            "SELECT id, name, is_published, created_at FROM locations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(location)
    }

    async fn create_location(&self, req: &CreateLocationRequest) -> Result<Location, AppError> {
        let location = sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (name, is_published, created_at)
            VALUES (?, ?, ?)
            RETURNING id, name, is_published, created_at
            "#,
        )
        .bind(&req.name)
        .bind(req.is_published)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(location)
    }

    async fn update_location(
        &self,
        id: i64,
        req: &UpdateLocationRequest,
    ) -> Result<Option<Location>, AppError> {
        if req.name.is_none() && req.is_published.is_none() {
            return self.find_location(id).await;
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE locations SET ");
        let mut separated = builder.separated(", ");

        if let Some(name) = &req.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name.clone());
        }

        if let Some(is_published) = req.is_published {
            separated.push("is_published = ");
            separated.push_bind_unseparated(is_published);
        }

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING id, name, is_published, created_at");

        let location = builder
            .build_query_as::<Location>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(location)
    }

    async fn delete_location(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM locations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<i64, AppError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(POST_COUNT_SELECT);
        push_predicate(&mut builder, query);

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count posts: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

        Ok(count)
    }

    async fn list_posts(
        &self,
        query: &PostQuery,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostSummary>, AppError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(POST_SUMMARY_SELECT);
        push_predicate(&mut builder, query);
        builder
            .push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let posts = builder
            .build_query_as::<PostSummary>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list posts: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

        Ok(posts)
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    async fn create_post(&self, author_id: i64, form: &PostForm) -> Result<Post, AppError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts
                (title, text, pub_date, is_published, author_id, category_id, location_id, image, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&form.title)
        .bind(&form.text)
        .bind(form.pub_date)
        .bind(form.is_published)
        .bind(author_id)
        .bind(form.category_id)
        .bind(form.location_id)
        .bind(form.image.as_deref())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create post: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(post)
    }

    async fn update_post(&self, id: i64, form: &PostForm) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET title = ?, text = ?, pub_date = ?, is_published = ?,
                category_id = ?, location_id = ?, image = ?
            WHERE id = ?
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&form.title)
        .bind(&form.text)
        .bind(form.pub_date)
        .bind(form.is_published)
        .bind(form.category_id)
        .bind(form.location_id)
        .bind(form.image.as_deref())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update post: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(post)
    }

    async fn moderate_post(
        &self,
        id: i64,
        update: &AdminPostUpdate,
    ) -> Result<Option<Post>, AppError> {
        if update.is_empty() {
            return self.find_post(id).await;
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE posts SET ");
        let mut separated = builder.separated(", ");

        if let Some(is_published) = update.is_published {
            separated.push("is_published = ");
            separated.push_bind_unseparated(is_published);
        }

        if let Some(pub_date) = update.pub_date {
            separated.push("pub_date = ");
            separated.push_bind_unseparated(pub_date);
        }

        if let Some(category_id) = update.category_id {
            separated.push("category_id = ");
            separated.push_bind_unseparated(category_id);
        }

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(format!(" RETURNING {POST_COLUMNS}"));

        builder
            .build_query_as::<Post>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to moderate post: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })
    }

    async fn delete_post(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete post: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn search_posts(
        &self,
        title: Option<&str>,
        location_id: Option<i64>,
    ) -> Result<Vec<Post>, AppError> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {POST_COLUMNS} FROM posts WHERE 1 = 1"));

        if let Some(location_id) = location_id {
            builder.push(" AND location_id = ").push_bind(location_id);
        }
        builder.push(" ORDER BY pub_date DESC, id DESC");

        let mut posts = builder.build_query_as::<Post>().fetch_all(&self.pool).await?;

        // SQLite's LOWER and LIKE only fold ASCII, so the title match runs here.
        if let Some(needle) = title.map(str::trim).filter(|t| !t.is_empty()) {
            let needle = needle.to_lowercase();
            posts.retain(|post| post.title.to_lowercase().contains(&needle));
        }

        Ok(posts)
    }

    async fn comment_counts(&self, post_ids: &[i64]) -> Result<HashMap<i64, i64>, AppError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT post_id, COUNT(*) FROM comments WHERE post_id IN (");
        let mut separated = builder.separated(", ");
        for id in post_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") GROUP BY post_id");

        let rows = builder
            .build_query_as::<(i64, i64)>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().collect())
    }

    async fn count_comments(&self, post_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>, AppError> {
        let comments = sqlx::query_as::<_, CommentView>(
            r#"
            SELECT
                c.id, c.post_id, c.author_id, u.username AS author_username,
                c.text, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = ?
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, post_id, author_id, text, created_at FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn create_comment(
        &self,
        post_id: i64,
        author_id: i64,
        text: &str,
    ) -> Result<Comment, AppError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, author_id, text, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, post_id, author_id, text, created_at
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create comment: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(comment)
    }

    async fn update_comment(&self, id: i64, text: &str) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments SET text = ?
            WHERE id = ?
            RETURNING id, post_id, author_id, text, created_at
            "#,
        )
        .bind(text)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
