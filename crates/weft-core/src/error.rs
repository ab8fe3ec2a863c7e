//! Unified error types for glue registration and resolution.
//!
//! Registration errors ([`GlueError`]) are fatal: the batch being loaded is
//! discarded and nothing from it becomes resolvable. Resolution errors
//! ([`AmbiguousStepError`]) and handler failures ([`HandlerError`]) only fail
//! the step that raised them.

use thiserror::Error;

use crate::marker::MarkerRole;

// =============================================================================
// Marker Errors
// =============================================================================

/// A marker is missing a field its role requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerError {
    /// Step and advice markers must carry match text.
    #[error("@{marker} has no match text")]
    MissingPattern {
        /// The offending marker type.
        marker: &'static str,
    },

    /// Advice markers must name at least one pointcut.
    #[error("@{marker} declares no pointcuts")]
    MissingPointcuts {
        /// The offending marker type.
        marker: &'static str,
    },

    /// Order markers must carry an order value.
    #[error("@{marker} has no order value")]
    MissingOrder {
        /// The offending marker type.
        marker: &'static str,
    },

    /// The marker was handed to a registration path for another role.
    #[error("@{marker} is a {actual} marker, expected {expected}")]
    UnexpectedRole {
        /// The offending marker type.
        marker: &'static str,
        /// Role the registration path handles.
        expected: MarkerRole,
        /// Role the marker actually has.
        actual: MarkerRole,
    },
}

// =============================================================================
// Pattern Errors
// =============================================================================

/// Match text could not be turned into a usable matcher.
#[derive(Debug, Clone, Error)]
pub enum PatternError {
    /// The regular expression does not parse.
    #[error("invalid pattern `{pattern}`: {source}")]
    Syntax {
        /// The raw match text.
        pattern: String,
        /// Parser diagnostics.
        #[source]
        source: regex::Error,
    },

    /// An advice pattern needs a capture group to hold the advised step text.
    #[error("advice pattern `{pattern}` has no capture group for the advised step")]
    MissingAdviceSlot {
        /// The raw match text.
        pattern: String,
    },
}

// =============================================================================
// Discovery Errors
// =============================================================================

/// Errors raised by a [`GlueSource`](crate::discovery::GlueSource).
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    /// Discovery needs at least one search root.
    #[error("no glue paths given")]
    NoGluePaths,

    /// A search root is malformed.
    #[error("invalid glue path `{path}`: {reason}")]
    InvalidPath {
        /// The rejected path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Source-specific failure.
    #[error("glue discovery failed: {0}")]
    Other(String),
}

// =============================================================================
// Glue Errors
// =============================================================================

/// Fatal errors raised while registering glue.
///
/// Every variant identifies the handler unit it came from.
#[derive(Debug, Error)]
pub enum GlueError {
    /// The match text of a step or advice is not a valid pattern.
    #[error("{handler}: {source}")]
    PatternCompilation {
        /// Location of the handler unit.
        handler: String,
        /// Compiler diagnostics.
        #[source]
        source: PatternError,
    },

    /// An advice targets a marker type that is not flagged as a pointcut.
    #[error("{handler}: @{marker} is not a pointcut (not flagged with `pointcut`)")]
    InvalidPointcut {
        /// Location of the advice handler unit.
        handler: String,
        /// The marker type named as target.
        marker: &'static str,
    },

    /// Two step definitions declare byte-identical match text.
    #[error("duplicate step definitions: {duplicate} and {existing} both declare `{pattern}`")]
    DuplicateStepDefinition {
        /// The shared match text.
        pattern: String,
        /// Location of the definition registered first.
        existing: String,
        /// Location of the rejected definition.
        duplicate: String,
    },

    /// A marker could not be read.
    #[error("failed to configure {handler}: {source}")]
    Configuration {
        /// Location of the handler unit.
        handler: String,
        /// The underlying marker problem.
        #[source]
        source: MarkerError,
    },

    /// The discovery source failed.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

impl GlueError {
    /// Wraps a marker extraction failure for the given handler.
    pub fn configuration(handler: impl Into<String>, source: MarkerError) -> Self {
        Self::Configuration {
            handler: handler.into(),
            source,
        }
    }

    /// Wraps a pattern failure for the given handler.
    pub fn pattern(handler: impl Into<String>, source: PatternError) -> Self {
        Self::PatternCompilation {
            handler: handler.into(),
            source,
        }
    }
}

// =============================================================================
// Resolution Errors
// =============================================================================

/// More than one registered pattern matches a step.
#[derive(Debug, Clone, Error)]
#[error("step `{step}` is ambiguous, matched by: {}", .candidates.join(", "))]
pub struct AmbiguousStepError {
    /// The step text being resolved.
    pub step: String,
    /// `pattern (location)` of every matching definition, in registration order.
    pub candidates: Vec<String>,
}

// =============================================================================
// Handler Errors
// =============================================================================

/// Failures raised while invoking a handler unit.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The object factory has no live instance of the declaring type.
    #[error("no instance of {type_name} is available, was the world built?")]
    InstanceUnavailable {
        /// The declaring type.
        type_name: &'static str,
    },

    /// The instance handed to the handler is of another type.
    #[error("instance is not a {type_name}")]
    TypeMismatch {
        /// The type the handler expected.
        type_name: &'static str,
    },

    /// `proceed` was called outside of an advised step.
    #[error("proceed called without an advised step")]
    NoProceed,

    /// The step is declared but not implemented yet.
    #[error("step is pending")]
    Pending,

    /// The handler reported a failure.
    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    /// Creates a handler failure with a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for glue registration.
pub type GlueResult<T> = Result<T, GlueError>;

/// Result type for handler invocation.
pub type HandlerResult = Result<(), HandlerError>;
