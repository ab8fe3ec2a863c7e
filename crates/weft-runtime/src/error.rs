//! Runtime error types.

use thiserror::Error;
use weft_core::GlueError;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Glue could not be registered.
    #[error("Glue error: {0}")]
    Glue(#[from] GlueError),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The runtime was sealed before any glue was loaded.
    #[error("No glue has been loaded")]
    NotLoaded,

    /// The object factory was replaced after glue was loaded.
    #[error("Glue is already loaded; the object factory can no longer be replaced")]
    AlreadyLoaded,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
