#![allow(dead_code)]

use std::sync::Arc;

use blogicum::{
    config::Config,
    models::post::PostForm,
    repository::{BlogRepository, NewUser, SqliteRepository, sqlite},
    routes,
    state::AppState,
    utils::hash::hash_password,
};
use chrono::{DateTime, Utc};

pub struct TestApp {
    pub address: String,
    pub repo: Arc<SqliteRepository>,
    pub client: reqwest::Client,
}

/// Spawns the app on a random port over a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    // 1. In-memory pool, one connection so every query sees the same database
    let pool = sqlite::connect("sqlite::memory:", 1)
        .await
        .expect("Failed to open in-memory SQLite");

    // 2. Run migrations
    sqlite::migrate(&pool).await.expect("Failed to migrate database");

    // 3. Create test configuration and state
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
        media_root: "media".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
    };

    let repo = Arc::new(SqliteRepository::new(pool));
    let state = AppState {
        repo: repo.clone(),
        config,
    };

    // 4. Create the router with the app state
    let app = routes::create_router(state);

    // 5. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 6. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Redirects are part of what we assert on
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        address,
        repo,
        client,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers through the API and logs in. Returns (user id, bearer token).
    pub async fn signup(&self, username: &str) -> (i64, String) {
        let registered = self
            .client
            .post(self.url("/auth/registration/"))
            .json(&serde_json::json!({
                "username": username,
                "password": "password123",
                "email": format!("{username}@example.com"),
            }))
            .send()
            .await
            .expect("Register failed");
        assert_eq!(registered.status().as_u16(), 201);
        let user: serde_json::Value = registered.json().await.unwrap();

        (user["id"].as_i64().unwrap(), self.login(username, "password123").await)
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let login = self
            .client
            .post(self.url("/auth/login/"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Login failed")
            .json::<serde_json::Value>()
            .await
            .expect("Failed to parse login json");

        login["token"].as_str().expect("Token not found").to_string()
    }

    /// Inserts an admin directly and logs in as them.
    pub async fn admin(&self, username: &str) -> String {
        self.repo
            .create_user(NewUser {
                username: username.to_string(),
                password_hash: hash_password("adminpass").unwrap(),
                email: String::new(),
                first_name: String::new(),
                last_name: String::new(),
                role: "admin".to_string(),
            })
            .await
            .unwrap();
        self.login(username, "adminpass").await
    }

    /// Inserts a published post straight into the store.
    pub async fn seed_post(
        &self,
        author_id: i64,
        title: &str,
        pub_date: DateTime<Utc>,
        category_id: Option<i64>,
    ) -> i64 {
        self.repo
            .create_post(
                author_id,
                &PostForm {
                    title: title.to_string(),
                    text: "Body".to_string(),
                    pub_date,
                    is_published: true,
                    category_id,
                    location_id: None,
                    image: None,
                },
            )
            .await
            .unwrap()
            .id
    }
}

pub fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .expect("Location header missing")
        .to_str()
        .unwrap()
}
