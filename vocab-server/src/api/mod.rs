//! HTTP API handlers for vocab-server

pub mod ai;
pub mod auth;
pub mod health;
pub mod review;
pub mod words;

pub use auth::{auth_middleware, login, logout, AuthSettings};
pub use health::health_routes;
pub use review::{due_words, review_word};
pub use words::{create_words, delete_word, get_word, list_words, update_word};
