pub mod access;
pub mod app;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod query;
pub mod types;
pub mod validation;

pub use app::{router, AppState};
pub use error::ApiError;
