// src/handlers/auth.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest},
    repository::{DynRepository, NewUser},
    utils::{
        form::FormJson,
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(repo): State<DynRepository>,
    FormJson(payload): FormJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;

    let user = repo
        .create_user(NewUser {
            username: payload.username,
            password_hash: hashed_password,
            email: payload.email.unwrap_or_default(),
            first_name: payload.first_name,
            last_name: payload.last_name,
            role: "user".to_string(),
        })
        .await?;
    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
///
/// Verifies the username and password against the database.
/// If valid, signs a JWT token with the user's ID, username and role.
pub async fn login(
    State(repo): State<DynRepository>,
    State(config): State<Config>,
    FormJson(payload): FormJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = repo
        .find_user_by_username(&payload.username)
        .await?
        .ok_or(AppError::AuthError("User not found".to_string()))?;

    let is_valid = verify_password(&payload.password, &user.password)?;

    if !is_valid {
        return Err(AppError::AuthError("Invalid password".to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.username,
        &user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "username": user.username,
    })))
}

#[derive(Debug, Deserialize)]
pub struct LoginPageParams {
    pub next: Option<String>,
}

/// Login entry point. Anonymous users hitting a protected route land here.
pub async fn login_page(Query(params): Query<LoginPageParams>) -> impl IntoResponse {
    Json(json!({
        "detail": "Authentication required. POST username and password to /auth/login/ for a bearer token.",
        "next": params.next.unwrap_or_else(|| "/".to_string()),
    }))
}
