//! Configuration validation.

use super::error::{ConfigError, ConfigResult};
use super::schema::{GlueConfig, LogOutput, LoggingConfig, WeftConfig};

/// Validates the entire configuration.
///
/// An empty `glue.paths` list is accepted here; glue sources that need search
/// roots reject it when discovering.
pub fn validate_config(config: &WeftConfig) -> ConfigResult<()> {
    validate_glue_config(&config.glue)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_glue_config(glue: &GlueConfig) -> ConfigResult<()> {
    for path in &glue.paths {
        if path.trim().is_empty() {
            return Err(ConfigError::validation("Glue path cannot be blank"));
        }
        if path.chars().any(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Glue path cannot contain whitespace: {path:?}"
            )));
        }
    }

    if glue.default_timeout_ms == Some(0) {
        return Err(ConfigError::validation(
            "Default timeout must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "File log output requires logging.file_path",
        ));
    }

    if let Some(module) = logging.filters.keys().find(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Log filter module cannot be blank: {module:?}"
        )));
    }

    Ok(())
}
