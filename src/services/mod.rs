// src/services/mod.rs

//! Storage-independent post logic shared by the handlers.

pub mod aggregate;
pub mod guard;
pub mod pagination;
pub mod visibility;
