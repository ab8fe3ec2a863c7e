//! # Weft Core
//!
//! The glue layer of the Weft BDD runner: it turns marked handler units into
//! step definitions, hooks and advice, and keeps them in a registry the
//! execution engine resolves step text against.
//!
//! ## Layers
//!
//! - **Declarations**: [`MarkerType`] / [`Marker`] describe what a
//!   [`HandlerUnit`] is; [`GlueType`] is the type that declares it.
//! - **Definitions**: [`HandlerStepDefinition`], [`HookDefinition`],
//!   [`AdviceDefinition`] and the [`AdvisedStepDefinition`]s produced by
//!   weaving, all resolved through the [`StepDefinition`] trait.
//! - **Registration**: [`Backend`] classifies discovered units, compiles their
//!   patterns, validates pointcuts and weaves advice into a [`Glue`].
//! - **Resolution**: [`GlueRegistry`] matches step text and orders hooks.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐     ┌─────────┐     ┌──────────────┐
//! │ GlueSource  │────▶│ Backend │────▶│ GlueRegistry │◀──── step text
//! │ (discovery) │     │         │     │  (resolve)   │
//! └─────────────┘     └────┬────┘     └──────────────┘
//!                          │ add_class / start / stop
//!                          ▼
//!                   ┌───────────────┐
//!                   │ ObjectFactory │
//!                   └───────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use weft_core::prelude::*;
//!
//! #[derive(Default)]
//! struct Belly;
//!
//! let glue_units = StaticGlue::new().with(
//!     HandlerUnit::new::<Belly, _>("i_have_cukes", |_, call| {
//!         println!("{} cukes", call.arg(0).unwrap_or("0"));
//!         Ok(())
//!     })
//!     .marked(GIVEN.matching(r"^I have (\d+) cukes$")),
//! );
//!
//! let mut registry = GlueRegistry::new();
//! let mut backend = Backend::new(Arc::new(DefaultObjectFactory::new()));
//! backend.load_glue(&mut registry, &glue_units, &["my_steps".into()])?;
//!
//! backend.build_world();
//! if let Some(step) = registry.resolve_step("I have 3 cukes")? {
//!     step.execute()?;
//! }
//! backend.dispose_world();
//! ```

pub mod backend;
pub mod definition;
pub mod discovery;
pub mod error;
pub mod factory;
pub mod glue;
pub mod handler;
pub mod marker;
pub mod pattern;
pub mod pointcut;
pub mod tag;

pub use backend::{Backend, BackendStats, BoxedSnippetGenerator, SnippetGenerator};
pub use definition::{
    AdviceDefinition, AdvisedStepDefinition, BoxedStepDefinition, HandlerStepDefinition,
    HookDefinition, HookKind, StepDefinition, StepMatch,
};
pub use discovery::{DiscoveredGlue, GlueSource, LinkedGlue, StaticGlue};
pub use error::{
    AmbiguousStepError, DiscoveryError, GlueError, GlueResult, HandlerError, HandlerResult,
    MarkerError, PatternError,
};
pub use factory::{BoxedObjectFactory, DefaultObjectFactory, ObjectFactory};
pub use glue::{Glue, GlueRegistry};
pub use handler::{Argument, GlueInstance, GlueType, HandlerUnit, Invocation};
pub use marker::{Marker, MarkerId, MarkerRole, MarkerType};
pub use pattern::CompiledPattern;
pub use pointcut::PointcutIndex;
pub use tag::TagFilter;

// Used by `weft_glue!` expansions in downstream crates.
#[doc(hidden)]
pub use linkme;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::marker::markers::{AFTER, AND, AROUND, BEFORE, BUT, GIVEN, ORDER, THEN, WHEN};
    pub use crate::{
        Backend, DefaultObjectFactory, Glue, GlueRegistry, GlueType, HandlerError, HandlerResult,
        HandlerUnit, Invocation, LinkedGlue, MarkerType, StaticGlue, StepDefinition, weft_glue,
    };
}
