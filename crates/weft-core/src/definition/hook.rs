//! Hook definitions.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::HandlerResult;
use crate::factory::BoxedObjectFactory;
use crate::handler::{HandlerUnit, Invocation};
use crate::tag::TagFilter;

/// When a hook runs relative to a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Before the first step.
    Before,
    /// After the last step.
    After,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => f.write_str("before"),
            Self::After => f.write_str("after"),
        }
    }
}

/// A before or after hook.
pub struct HookDefinition {
    unit: Arc<HandlerUnit>,
    tag_filter: TagFilter,
    order: i32,
    timeout: Option<Duration>,
    kind: HookKind,
    factory: BoxedObjectFactory,
}

impl HookDefinition {
    /// Order of hooks declared without an order marker: they run last.
    pub const DEFAULT_ORDER: i32 = i32::MAX;

    /// Creates a hook definition.
    pub fn new(
        unit: Arc<HandlerUnit>,
        tag_filter: TagFilter,
        order: i32,
        timeout: Option<Duration>,
        kind: HookKind,
        factory: BoxedObjectFactory,
    ) -> Self {
        Self {
            unit,
            tag_filter,
            order,
            timeout,
            kind,
            factory,
        }
    }

    /// Returns whether the hook applies to a scenario with these tags.
    pub fn matches<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        self.tag_filter.matches(tags)
    }

    /// Returns the order; lower runs first.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Returns the advisory timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns whether this is a before or after hook.
    pub fn kind(&self) -> HookKind {
        self.kind
    }

    /// Returns the tag filter.
    pub fn tag_filter(&self) -> &TagFilter {
        &self.tag_filter
    }

    /// Returns the handler unit.
    pub fn handler(&self) -> &Arc<HandlerUnit> {
        &self.unit
    }

    /// Returns a human-readable location of the hook.
    pub fn location(&self) -> String {
        self.unit.location()
    }

    /// Invokes the hook.
    pub fn execute(&self) -> HandlerResult {
        let instance = self.factory.instance(self.unit.declaring_type())?;
        self.unit.invoke(&*instance, &Invocation::new(&[]))
    }
}

impl fmt::Debug for HookDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookDefinition")
            .field("location", &self.unit.location())
            .field("kind", &self.kind)
            .field("order", &self.order)
            .field("tags", &self.tag_filter.expressions())
            .finish()
    }
}
