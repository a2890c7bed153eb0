// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, blog, comments, posts, profile},
    state::AppState,
    utils::jwt::{admin_middleware, identify, login_required},
};

/// Assembles the main application router.
///
/// * Public pages (feed, post detail, category, profile) and auth entry points.
/// * Mutating pages behind `login_required`; ownership is checked in the handlers.
/// * Admin pages behind `login_required` then `admin_middleware`.
/// * `identify` runs on everything, then Trace and CORS.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let public_routes = Router::new()
        .route("/", get(blog::index))
        .route("/posts/{post_id}/", get(blog::post_detail))
        .route("/category/{slug}/", get(blog::category_posts))
        .route("/profile/{username}/", get(profile::profile_info));

    let auth_routes = Router::new()
        .route("/auth/registration/", post(auth::register))
        .route("/auth/login/", get(auth::login_page).post(auth::login));

    let member_routes = Router::new()
        .route(
            "/posts/create/",
            get(posts::create_post_form).post(posts::create_post),
        )
        .route(
            "/posts/{post_id}/edit/",
            get(posts::edit_post_form).post(posts::edit_post),
        )
        .route(
            "/posts/{post_id}/delete/",
            get(posts::delete_post_form).post(posts::delete_post),
        )
        .route("/posts/{post_id}/comment/", post(comments::add_comment))
        .route(
            "/posts/{post_id}/edit_comment/{comment_id}/",
            get(comments::edit_comment_form).post(comments::edit_comment),
        )
        .route(
            "/posts/{post_id}/delete_comment/{comment_id}/",
            get(comments::delete_comment_form).post(comments::delete_comment),
        )
        .route(
            "/profile/edit_profile/",
            get(profile::edit_profile_form).post(profile::edit_profile),
        )
        .route_layer(middleware::from_fn(login_required));

    let admin_routes = Router::new()
        .route(
            "/admin/categories/",
            get(admin::list_categories).post(admin::create_category),
        )
        .route(
            "/admin/categories/{id}/",
            put(admin::update_category).delete(admin::delete_category),
        )
        .route(
            "/admin/locations/",
            get(admin::list_locations).post(admin::create_location),
        )
        .route(
            "/admin/locations/{id}/",
            put(admin::update_location).delete(admin::delete_location),
        )
        .route("/admin/posts/", get(admin::list_posts))
        .route(
            "/admin/posts/{id}/",
            put(admin::update_post).delete(admin::delete_post),
        )
        // Login first, then the role check
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(middleware::from_fn(login_required));

    let media = ServeDir::new(&state.config.media_root);

    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(member_routes)
        .merge(admin_routes)
        .nest_service("/media", media)
        // Global Middleware (applied from outside in)
        .layer(middleware::from_fn_with_state(state.clone(), identify))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::Config,
        repository::{SqliteRepository, sqlite},
    };

    async fn app() -> Router {
        let pool = sqlite::connect("sqlite::memory:", 1).await.unwrap();
        sqlite::migrate(&pool).await.unwrap();
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "secret".to_string(),
            jwt_expiration: 60,
            rust_log: "error".to_string(),
            admin_username: None,
            admin_password: None,
            media_root: "media".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
        };
        create_router(AppState {
            repo: Arc::new(SqliteRepository::new(pool)),
            config,
        })
    }

    #[tokio::test]
    async fn member_routes_redirect_anonymous_users() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .uri("/profile/edit_profile/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/auth/login/?next=%2Fprofile%2Fedit_profile%2F"
        );
    }

    #[tokio::test]
    async fn empty_feed_is_a_single_page() {
        let response = app()
            .await
            .oneshot(Request::builder().uri("/?page=7").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
