//! # Weft
//!
//! Glue registration for behaviour-driven test runners.
//!
//! ## Overview
//!
//! Step definitions, hooks and advice are declared as handler units carrying
//! markers. Weft discovers them, compiles their patterns, weaves advice onto
//! the steps that carry its pointcuts, and seals the result into a registry
//! scenario threads resolve step text against.
//!
//! ```text
//! ┌────────────┐     ┌─────────┐     ┌──────────────┐     ┌─────────────┐
//! │ weft_glue! │────▶│ Backend │────▶│ GlueRegistry │────▶│ ResolvedGlue│──▶ scenarios
//! │ StaticGlue │     │ (weave) │     │              │     │  (sealed)   │
//! └────────────┘     └─────────┘     └──────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use weft::prelude::*;
//!
//! static SLOW: MarkerType = MarkerType::pointcut("Slow");
//!
//! #[derive(Default)]
//! struct Belly;
//!
//! weft_glue! {
//!     I_HAVE_CUKES => HandlerUnit::new::<Belly, _>("i_have_cukes", |_, call| {
//!         println!("{} cukes", call.arg(0).unwrap_or("0"));
//!         Ok(())
//!     })
//!     .marked(GIVEN.matching(r"^I have (\d+) cukes$"))
//!     .marked(SLOW.marker());
//!     PATIENTLY => HandlerUnit::new::<Belly, _>("patiently", |_, call| call.proceed())
//!         .marked(AROUND.matching("^(.*) patiently$").with_pointcuts([&SLOW]));
//! }
//!
//! fn main() -> RuntimeResult<()> {
//!     let mut config = WeftConfig::default();
//!     config.glue.paths = vec![module_path!().to_string()];
//!
//!     let mut runtime = WeftRuntime::builder().merge(config).build()?;
//!     runtime.load()?;
//!     let glue = runtime.seal()?;
//!
//!     let scenario = glue.start_scenario();
//!     if let Ok(Some(step)) = glue.resolve_step("I have 3 cukes patiently") {
//!         if let Err(error) = step.execute() {
//!             error!(%error, "Step failed");
//!         }
//!     }
//!     scenario.end();
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: `weft.toml` configuration files (default)
//! - `yaml-config`: `weft.yaml` configuration files
//! - `json-log`: JSON log lines

pub use weft_core as core;
pub use weft_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use weft::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use weft_runtime::{
        ResolvedGlue, RuntimeError, RuntimeResult, ScenarioScope, WeftConfig, WeftRuntime,
    };

    // Declarations and registration
    pub use weft_core::prelude::*;
    pub use weft_core::{
        AmbiguousStepError, Argument, GlueError, HookDefinition, HookKind, MarkerRole,
        ObjectFactory, SnippetGenerator, StepMatch,
    };

    // Logging
    pub use weft_runtime::prelude::{debug, error, info, trace, warn};
}
