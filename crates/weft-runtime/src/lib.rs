//! Weft Runtime - configuration, logging and glue loading for the Weft BDD runner.
//!
//! This crate provides:
//! - Layered configuration (`WeftConfig`, `ConfigLoader`)
//! - Logging setup (`LoggingBuilder`, `init_from_config`)
//! - Glue loading orchestration (`WeftRuntime`) and the sealed, thread-shared
//!   view scenarios resolve against (`ResolvedGlue`)
//!
//! ```ignore
//! use weft_runtime::WeftRuntime;
//!
//! fn main() -> weft_runtime::RuntimeResult<()> {
//!     let mut runtime = WeftRuntime::builder().build()?;
//!     runtime.load()?;
//!     let glue = runtime.seal()?;
//!
//!     let scenario = glue.start_scenario();
//!     for hook in glue.before_hooks_for(&["@smoke"]) {
//!         if let Err(error) = hook.execute() {
//!             tracing::error!(%error, hook = %hook.location(), "Hook failed");
//!         }
//!     }
//!     scenario.end();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, GlueConfig, LoggingConfig, WeftConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{GlueStats, ResolvedGlue, RuntimeBuilder, ScenarioScope, WeftRuntime};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// Provides the `tracing` logging macros alongside the runtime entry points.
pub mod prelude {
    pub use crate::{ResolvedGlue, RuntimeResult, WeftRuntime};
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
