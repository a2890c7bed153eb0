// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod blog;
pub mod comments;
pub mod posts;
pub mod profile;
