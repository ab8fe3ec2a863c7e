//! Definition model.
//!
//! Definitions are immutable once built and shared by reference: the registry,
//! the registration engine and advised steps all hold `Arc`s to the same value.
//!
//! - [`StepDefinition`] is the seam the registry resolves steps through. Plain
//!   steps are [`HandlerStepDefinition`]s; weaving adds
//!   [`AdvisedStepDefinition`]s wrapping them.
//! - [`HookDefinition`] is a before/after hook with tag filter and order.
//! - [`AdviceDefinition`] is advice waiting to be woven.

pub mod advice;
pub mod hook;
pub mod step;

pub use advice::{AdviceDefinition, AdvisedStepDefinition};
pub use hook::{HookDefinition, HookKind};
pub use step::{BoxedStepDefinition, HandlerStepDefinition, StepDefinition, StepMatch};
