// src/error.rs
use std::io;
use thiserror::Error;

// Re-export anyhow's Result type
pub use anyhow::Result;

/// Result type for collector store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors returned synchronously by the collector store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Collector id already registered: {0}")]
    DuplicateId(String),

    #[error("Collector store lock poisoned")]
    Poisoned,
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StoreError::Poisoned
    }
}

/// Error type for the service around the store
#[derive(Error, Debug)]
pub enum ObsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Server error: {0}")]
    Server(String),
}
