//! Advice definitions and the advised steps they produce.
//!
//! An advice pattern wraps step text and must match all of it: its first capture group is the slot the
//! advised step's own text goes into. With advice `^(.+) within (\d+) seconds$`
//! woven onto step `^I eat (\d+) cukes$`, the advised step matches
//! `I eat 5 cukes within 2 seconds` and captures `["5", "2"]`: the step's
//! arguments first, then the advice's remaining ones.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::definition::step::{HandlerStepDefinition, StepDefinition};
use crate::error::{HandlerResult, PatternError};
use crate::factory::BoxedObjectFactory;
use crate::handler::{Argument, HandlerUnit, Invocation};
use crate::marker::MarkerId;
use crate::pattern::{self, CompiledPattern};

/// Cross-cutting behavior waiting to be woven onto steps.
pub struct AdviceDefinition {
    unit: Arc<HandlerUnit>,
    pattern: CompiledPattern,
    pointcuts: Vec<MarkerId>,
    timeout: Option<Duration>,
    factory: BoxedObjectFactory,
}

impl AdviceDefinition {
    /// Creates an advice definition.
    ///
    /// Fails if the pattern has no capture group to hold the advised step.
    pub fn new(
        unit: Arc<HandlerUnit>,
        pattern: CompiledPattern,
        pointcuts: Vec<MarkerId>,
        timeout: Option<Duration>,
        factory: BoxedObjectFactory,
    ) -> Result<Self, PatternError> {
        if pattern.group_count() == 0 {
            return Err(PatternError::MissingAdviceSlot {
                pattern: pattern.source().to_string(),
            });
        }
        Ok(Self {
            unit,
            pattern,
            pointcuts,
            timeout,
            factory,
        })
    }

    /// Returns the validated pointcuts, in declaration order.
    pub fn pointcuts(&self) -> &[MarkerId] {
        &self.pointcuts
    }

    /// Returns the compiled pattern.
    pub fn compiled_pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    /// Returns the handler unit.
    pub fn handler(&self) -> &Arc<HandlerUnit> {
        &self.unit
    }

    /// Returns a human-readable location of the advice.
    pub fn location(&self) -> String {
        self.unit.location()
    }

    /// Builds the advised variant of `step`. The step itself is left untouched.
    pub fn advise(self: &Arc<Self>, step: &Arc<HandlerStepDefinition>) -> AdvisedStepDefinition {
        AdvisedStepDefinition {
            pattern: format!("{} ⊃ {}", self.pattern.source(), step.pattern()),
            advice: Arc::clone(self),
            step: Arc::clone(step),
        }
    }
}

impl fmt::Debug for AdviceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdviceDefinition")
            .field("pattern", &self.pattern.source())
            .field("location", &self.unit.location())
            .field("pointcuts", &self.pointcuts)
            .finish()
    }
}

/// A synthetic step: a plain step wrapped by one advice.
pub struct AdvisedStepDefinition {
    pattern: String,
    advice: Arc<AdviceDefinition>,
    step: Arc<HandlerStepDefinition>,
}

impl AdvisedStepDefinition {
    /// Returns the advice.
    pub fn advice(&self) -> &Arc<AdviceDefinition> {
        &self.advice
    }

    /// Returns the advised step.
    pub fn step(&self) -> &Arc<HandlerStepDefinition> {
        &self.step
    }
}

impl StepDefinition for AdvisedStepDefinition {
    fn pattern(&self) -> &str {
        &self.pattern
    }

    fn location(&self) -> String {
        format!("{} advising {}", self.advice.location(), self.step.location())
    }

    fn timeout(&self) -> Option<Duration> {
        self.advice.timeout.or(self.step.timeout())
    }

    fn matched_arguments(&self, text: &str) -> Option<Vec<Argument>> {
        let caps = self.advice.pattern.whole_captures(text)?;
        let slot = caps.get(1)?;

        let mut arguments: Vec<Argument> = self
            .step
            .compiled_pattern()
            .match_arguments(slot.as_str())?
            .into_iter()
            .map(|argument| argument.shifted(slot.start()))
            .collect();
        arguments.extend(pattern::arguments(&caps, 2));
        Some(arguments)
    }

    fn execute(&self, arguments: &[Argument]) -> HandlerResult {
        let split = self.step.compiled_pattern().group_count().min(arguments.len());
        let (step_arguments, advice_arguments) = arguments.split_at(split);

        let instance = self.advice.factory.instance(self.advice.unit.declaring_type())?;
        let proceed = || self.step.execute(step_arguments);
        self.advice
            .unit
            .invoke(&*instance, &Invocation::with_proceed(advice_arguments, &proceed))
    }

    fn is_advised(&self) -> bool {
        true
    }
}

impl fmt::Debug for AdvisedStepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvisedStepDefinition")
            .field("pattern", &self.pattern)
            .field("location", &self.location())
            .finish()
    }
}
