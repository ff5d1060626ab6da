//! DietMate error taxonomy.
//!
//! Errors below the turn boundary are always recovered or downgraded by the
//! caller; nothing propagates past a single console turn.

use thiserror::Error;

/// All errors produced inside the DietMate crates.
#[derive(Error, Debug)]
pub enum DietMateError {
    /// A capability was invoked before its backing credential or instance
    /// was bound at construction. Fatal to that capability's use, never to
    /// the process.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("API key missing for provider: {0}")]
    ApiKeyMissing(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Knowledge base error: {0}")]
    Knowledge(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DietMateError>;
