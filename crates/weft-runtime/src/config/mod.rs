//! Configuration for the Weft runtime.
//!
//! Layered loading (defaults, config files, `WEFT_*` variables) and validation
//! of glue discovery and logging settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    GlueConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, SpanEventConfig, WeftConfig,
};
pub use validation::validate_config;
