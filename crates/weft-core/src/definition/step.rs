//! Step definitions.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::HandlerResult;
use crate::factory::BoxedObjectFactory;
use crate::handler::{Argument, HandlerUnit, Invocation};
use crate::pattern::CompiledPattern;

/// A step definition the registry can resolve step text to.
pub trait StepDefinition: Send + Sync + fmt::Debug {
    /// Returns the match text. Byte-identical match texts are duplicates.
    fn pattern(&self) -> &str;

    /// Returns a human-readable location of the definition.
    fn location(&self) -> String;

    /// Returns the advisory timeout, enforced by the execution engine.
    fn timeout(&self) -> Option<Duration>;

    /// Returns the captured arguments if this definition matches `text`.
    fn matched_arguments(&self, text: &str) -> Option<Vec<Argument>>;

    /// Invokes the definition with arguments previously captured by
    /// [`matched_arguments`](StepDefinition::matched_arguments).
    fn execute(&self, arguments: &[Argument]) -> HandlerResult;

    /// Returns whether this definition was synthesized by weaving advice.
    fn is_advised(&self) -> bool {
        false
    }
}

/// A shared step definition.
pub type BoxedStepDefinition = Arc<dyn StepDefinition>;

/// A step definition built from a step marker on a handler unit.
pub struct HandlerStepDefinition {
    unit: Arc<HandlerUnit>,
    pattern: CompiledPattern,
    timeout: Option<Duration>,
    factory: BoxedObjectFactory,
}

impl HandlerStepDefinition {
    /// Creates a step definition. The pattern is compiled by the caller, once.
    pub fn new(
        unit: Arc<HandlerUnit>,
        pattern: CompiledPattern,
        timeout: Option<Duration>,
        factory: BoxedObjectFactory,
    ) -> Self {
        Self {
            unit,
            pattern,
            timeout,
            factory,
        }
    }

    /// Returns the handler unit.
    pub fn handler(&self) -> &Arc<HandlerUnit> {
        &self.unit
    }

    /// Returns the compiled pattern.
    pub fn compiled_pattern(&self) -> &CompiledPattern {
        &self.pattern
    }
}

impl StepDefinition for HandlerStepDefinition {
    fn pattern(&self) -> &str {
        self.pattern.source()
    }

    fn location(&self) -> String {
        self.unit.location()
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn matched_arguments(&self, text: &str) -> Option<Vec<Argument>> {
        self.pattern.match_arguments(text)
    }

    fn execute(&self, arguments: &[Argument]) -> HandlerResult {
        let instance = self.factory.instance(self.unit.declaring_type())?;
        self.unit.invoke(&*instance, &Invocation::new(arguments))
    }
}

impl fmt::Debug for HandlerStepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerStepDefinition")
            .field("pattern", &self.pattern.source())
            .field("location", &self.unit.location())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A step definition resolved for a concrete step text.
#[derive(Debug, Clone)]
pub struct StepMatch {
    definition: BoxedStepDefinition,
    arguments: Vec<Argument>,
}

impl StepMatch {
    pub(crate) fn new(definition: BoxedStepDefinition, arguments: Vec<Argument>) -> Self {
        Self {
            definition,
            arguments,
        }
    }

    /// Returns the matched definition.
    pub fn definition(&self) -> &BoxedStepDefinition {
        &self.definition
    }

    /// Returns the captured arguments.
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Invokes the definition with the captured arguments.
    pub fn execute(&self) -> HandlerResult {
        self.definition.execute(&self.arguments)
    }
}
