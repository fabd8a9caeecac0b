/// n22 social API
///
/// REST backend for a small social network: accounts, image posts with
/// generated captions, likes, comments, user search and an AI chat assistant
/// with persisted conversations.
pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
