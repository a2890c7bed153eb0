// tests/api_tests.rs

mod common;

use blogicum::repository::BlogRepository;
use chrono::{Duration, Utc};
use common::spawn_app;
use serde_json::{Value, json};

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_works() {
    // Arrange
    let app = spawn_app().await;
    let unique_name = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);

    // Act
    let response = app
        .client
        .post(app.url("/auth/registration/"))
        .json(&json!({
            "username": unique_name,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 201);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["username"], unique_name.as_str());
    assert!(user.get("password").is_none());
}

#[tokio::test]
async fn register_fails_validation() {
    // Arrange
    let app = spawn_app().await;

    // Act: username too short, bad characters, bad email
    for payload in [
        json!({ "username": "yo", "password": "password123" }),
        json!({ "username": "no spaces", "password": "password123" }),
        json!({ "username": "valid_name", "password": "password123", "email": "nope" }),
    ] {
        let response = app
            .client
            .post(app.url("/auth/registration/"))
            .json(&payload)
            .send()
            .await
            .expect("Failed to execute request");

        // Assert
        assert_eq!(response.status().as_u16(), 400, "payload: {payload}");
    }
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = spawn_app().await;
    app.signup("taken_name").await;

    let response = app
        .client
        .post(app.url("/auth/registration/"))
        .json(&json!({ "username": "taken_name", "password": "password123" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = spawn_app().await;
    app.signup("someone").await;

    for (username, password) in [("someone", "wrong-password"), ("nobody", "password123")] {
        let response = app
            .client
            .post(app.url("/auth/login/"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 401);
    }
}

#[tokio::test]
async fn login_entry_point_echoes_next() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/auth/login/?next=%2Fposts%2Fcreate%2F"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["next"], "/posts/create/");
}

#[tokio::test]
async fn admin_routes_need_admin_role() {
    let app = spawn_app().await;
    let (_, user_token) = app.signup("plain_user").await;

    let anonymous = app.client.get(app.url("/admin/categories/")).send().await.unwrap();
    assert_eq!(anonymous.status().as_u16(), 303);

    let response = app
        .client
        .get(app.url("/admin/categories/"))
        .header("Authorization", format!("Bearer {}", user_token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn admin_manages_categories() {
    // Arrange
    let app = spawn_app().await;
    let admin_token = app.admin("site_admin").await;
    let (author, _) = app.signup("columnist").await;
    let auth = format!("Bearer {}", admin_token);

    // Create
    let response = app
        .client
        .post(app.url("/admin/categories/"))
        .header("Authorization", &auth)
        .json(&json!({ "title": "Sport", "description": "Games", "slug": "sport" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let category: Value = response.json().await.unwrap();
    let category_id = category["id"].as_i64().unwrap();
    assert_eq!(category["is_published"], true);

    // Duplicate slug, then invalid slug
    let response = app
        .client
        .post(app.url("/admin/categories/"))
        .header("Authorization", &auth)
        .json(&json!({ "title": "Sport 2", "description": "", "slug": "sport" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let response = app
        .client
        .post(app.url("/admin/categories/"))
        .header("Authorization", &auth)
        .json(&json!({ "title": "Bad", "description": "", "slug": "has space" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Hide it: the category page disappears
    let post_id = app
        .seed_post(author, "Match report", Utc::now() - Duration::hours(1), Some(category_id))
        .await;
    let response = app
        .client
        .put(app.url(&format!("/admin/categories/{category_id}/")))
        .header("Authorization", &auth)
        .json(&json!({ "is_published": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["title"], "Sport");
    assert_eq!(updated["is_published"], false);

    let hidden = app.client.get(app.url("/category/sport/")).send().await.unwrap();
    assert_eq!(hidden.status().as_u16(), 404);

    // Delete: the post survives without a category
    let response = app
        .client
        .delete(app.url(&format!("/admin/categories/{category_id}/")))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);
    let post = app.repo.find_post(post_id).await.unwrap().unwrap();
    assert_eq!(post.category_id, None);

    let response = app
        .client
        .delete(app.url(&format!("/admin/categories/{category_id}/")))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn admin_lists_and_searches_posts() {
    let app = spawn_app().await;
    let admin_token = app.admin("site_admin").await;
    let auth = format!("Bearer {}", admin_token);
    let (author, _) = app.signup("columnist").await;

    let response = app
        .client
        .post(app.url("/admin/locations/"))
        .header("Authorization", &auth)
        .json(&json!({ "name": "Lisbon" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let lisbon: Value = response.json().await.unwrap();
    let lisbon_id = lisbon["id"].as_i64().unwrap();

    let now = Utc::now();
    app.seed_post(author, "Tram rides", now - Duration::hours(2), None).await;
    // A scheduled post is still listed for admins
    app.seed_post(author, "Future tram", now + Duration::days(3), None).await;
    let located = app.seed_post(author, "Pasteis", now - Duration::hours(1), None).await;
    let mut form = blogicum::models::post::PostForm::from(
        &app.repo.find_post(located).await.unwrap().unwrap(),
    );
    form.location_id = Some(lisbon_id);
    app.repo.update_post(located, &form).await.unwrap();

    let search: Vec<Value> = app
        .client
        .get(app.url("/admin/posts/?q=TRAM"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let titles: Vec<&str> = search.iter().map(|p| p["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Future tram", "Tram rides"]);

    let by_location: Vec<Value> = app
        .client
        .get(app.url(&format!("/admin/posts/?location_id={lisbon_id}")))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_location.len(), 1);
    assert_eq!(by_location[0]["title"], "Pasteis");
}

#[tokio::test]
async fn admin_moderates_any_post() {
    // Arrange
    let app = spawn_app().await;
    let admin_token = app.admin("site_admin").await;
    let auth = format!("Bearer {}", admin_token);
    let (author, user_token) = app.signup("columnist").await;
    let category = app
        .repo
        .create_category(&blogicum::models::category::CreateCategoryRequest {
            title: "News".to_string(),
            description: String::new(),
            slug: "news".to_string(),
            is_published: true,
        })
        .await
        .unwrap();
    let post_id = app
        .seed_post(author, "Spam", Utc::now() - Duration::hours(1), Some(category.id))
        .await;
    let path = format!("/admin/posts/{post_id}/");

    // Only admins moderate
    let response = app
        .client
        .put(app.url(&path))
        .header("Authorization", format!("Bearer {}", user_token))
        .json(&json!({ "is_published": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    // Unpublish: gone from the feed, everything else untouched
    let response = app
        .client
        .put(app.url(&path))
        .header("Authorization", &auth)
        .json(&json!({ "is_published": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let post: Value = response.json().await.unwrap();
    assert_eq!(post["is_published"], false);
    assert_eq!(post["title"], "Spam");
    assert_eq!(post["category_id"], category.id);

    let feed: Value = app.client.get(app.url("/")).send().await.unwrap().json().await.unwrap();
    assert_eq!(feed["page_obj"]["count"], 0);

    // Unknown category is a field error, null clears it
    let response = app
        .client
        .put(app.url(&path))
        .header("Authorization", &auth)
        .json(&json!({ "category_id": 4242 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["fields"]["category_id"].is_array());

    let response = app
        .client
        .put(app.url(&path))
        .header("Authorization", &auth)
        .json(&json!({ "category_id": null }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let stored = app.repo.find_post(post_id).await.unwrap().unwrap();
    assert_eq!(stored.category_id, None);
    assert!(!stored.is_published);

    // Delete, then it is gone
    let response = app
        .client
        .delete(app.url(&path))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);
    assert!(app.repo.find_post(post_id).await.unwrap().is_none());

    let response = app
        .client
        .put(app.url(&path))
        .header("Authorization", &auth)
        .json(&json!({ "is_published": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
