//! Error types for meshview

use thiserror::Error;

/// Main error type for meshview operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Visualization error: {0}")]
    Visualization(String),

    #[error("Invalid clip range: near {near} must be positive and below far {far}")]
    InvalidClipRange { near: f64, far: f64 },
}

/// Result type alias for meshview operations
pub type Result<T> = std::result::Result<T, Error>;
