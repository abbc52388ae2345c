//! Error types for model import

use std::collections::TryReserveError;
use thiserror::Error;

/// Errors that can occur while importing a model file
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Unsupported 3D file format [{extension}]")]
    UnsupportedFormat { extension: String },

    #[error("Unknown 3D file format, path missing extension [{path}]")]
    MissingExtension { path: String },

    #[error("Parse error in {format} file: {message}")]
    ParseError { format: &'static str, message: String },

    #[error("Not enough memory to decode model: {0}")]
    ResourceExhausted(#[from] TryReserveError),

    #[error("Decoder dependency {dependency} for {format} files is not available")]
    MissingDependency { format: String, dependency: &'static str },

    #[error("Not enough memory to read model: {0}")]
    OutOfMemory(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for ImportError {
    /// Allocation failures while reading are reported as exhausted memory
    fn from(error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::OutOfMemory {
            ImportError::OutOfMemory(error)
        } else {
            ImportError::Io(error)
        }
    }
}

impl ImportError {
    pub(crate) fn parse(format: &'static str, message: impl Into<String>) -> Self {
        ImportError::ParseError {
            format,
            message: message.into(),
        }
    }

    /// True when the model did not fit in memory
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, ImportError::ResourceExhausted(_) | ImportError::OutOfMemory(_))
    }

    /// True for the errors raised before any decoding starts
    pub fn is_unsupported_format(&self) -> bool {
        matches!(
            self,
            ImportError::UnsupportedFormat { .. } | ImportError::MissingExtension { .. }
        )
    }
}

/// Result type alias for import operations
pub type Result<T> = std::result::Result<T, ImportError>;
