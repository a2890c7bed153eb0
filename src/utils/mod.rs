// src/utils/mod.rs

pub mod hash;
pub mod form;
pub mod html;
pub mod jwt;
