// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::events::codec::StreamError;

#[derive(Error, Debug)]
pub enum CallbackdError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid event pattern: {0}")]
    PatternError(#[from] globset::Error),

    #[error("Event stream error: {0}")]
    EventStream(#[from] StreamError),

    #[error("Event listener failed: {0}")]
    ListenerError(String),
}

pub type Result<T> = std::result::Result<T, CallbackdError>;
