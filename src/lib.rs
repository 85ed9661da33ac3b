//! Data models behind a mobile web browser UI.
//!
//! The tab list, history list and settings layer are plain Rust types that
//! a declarative UI binds to through the observer-based list-model contract
//! in [`models::notifier`].

pub mod app;
pub mod database;
pub mod models;
pub mod platform;
pub mod services;
pub mod types;
