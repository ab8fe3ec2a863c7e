//! Declarative markers attached to handler units.
//!
//! A [`MarkerType`] is a `'static` descriptor that plays the part of an
//! annotation type: it is identified by its address, has a name and a
//! [`MarkerRole`], and may be flagged as a pointcut. A [`Marker`] is one use
//! of a marker type on a handler unit and carries the semantic fields the registration engine reads.
//!
//! ```rust,ignore
//! use weft_core::marker::{MarkerType, markers::GIVEN};
//!
//! pub static SLOW: MarkerType = MarkerType::pointcut("Slow");
//!
//! let step = GIVEN.matching(r"^I have (\d+) cukes$").with_timeout(Duration::from_secs(1));
//! let slow = SLOW.marker();
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use crate::error::MarkerError;

/// What a marker type makes of the handler unit it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerRole {
    /// Declares a step definition.
    Step,
    /// Declares a hook run before each matching scenario.
    BeforeHook,
    /// Declares a hook run after each matching scenario.
    AfterHook,
    /// Declares advice woven onto steps carrying one of its pointcuts.
    Advice,
    /// Carries the explicit order of a hook declared on the same unit.
    Order,
    /// Carries no glue semantics of its own (typically a pointcut).
    Plain,
}

impl MarkerRole {
    /// Returns the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Step => "step",
            Self::BeforeHook => "before hook",
            Self::AfterHook => "after hook",
            Self::Advice => "advice",
            Self::Order => "order",
            Self::Plain => "plain",
        }
    }

    /// Returns `true` for roles that produce a definition on their own.
    pub fn is_glue(&self) -> bool {
        matches!(
            self,
            Self::Step | Self::BeforeHook | Self::AfterHook | Self::Advice
        )
    }
}

impl fmt::Display for MarkerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a marker type: the address of its `'static` descriptor.
///
/// Two descriptors sharing a name are still distinct marker types.
#[derive(Clone, Copy)]
pub struct MarkerId(&'static MarkerType);

impl MarkerId {
    /// Returns the marker type name.
    pub fn as_str(&self) -> &'static str {
        self.0.name
    }

    /// Returns the marker type descriptor.
    pub fn marker_type(&self) -> &'static MarkerType {
        self.0
    }
}

impl PartialEq for MarkerId {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl Eq for MarkerId {}

impl Hash for MarkerId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.0, state);
    }
}

impl fmt::Debug for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MarkerId({} @ {:p})", self.0.name, self.0)
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0.name)
    }
}

/// A marker type descriptor.
///
/// Declare marker types as `static` items: identity is the item's address,
/// so a `const` would produce a new marker type at every use.
#[derive(Debug)]
pub struct MarkerType {
    name: &'static str,
    role: MarkerRole,
    pointcut: bool,
}

impl MarkerType {
    /// Creates a marker type with the given role.
    pub const fn new(name: &'static str, role: MarkerRole) -> Self {
        Self {
            name,
            role,
            pointcut: false,
        }
    }

    /// Creates a step marker type (`Given`, `When`, …).
    pub const fn step(name: &'static str) -> Self {
        Self::new(name, MarkerRole::Step)
    }

    /// Creates a before-hook marker type.
    pub const fn before(name: &'static str) -> Self {
        Self::new(name, MarkerRole::BeforeHook)
    }

    /// Creates an after-hook marker type.
    pub const fn after(name: &'static str) -> Self {
        Self::new(name, MarkerRole::AfterHook)
    }

    /// Creates an advice marker type.
    pub const fn advice(name: &'static str) -> Self {
        Self::new(name, MarkerRole::Advice)
    }

    /// Creates an order marker type.
    pub const fn order(name: &'static str) -> Self {
        Self::new(name, MarkerRole::Order)
    }

    /// Creates a plain marker type flagged as a pointcut.
    pub const fn pointcut(name: &'static str) -> Self {
        Self::new(name, MarkerRole::Plain).as_pointcut()
    }

    /// Flags this marker type as a valid advice target.
    pub const fn as_pointcut(mut self) -> Self {
        self.pointcut = true;
        self
    }

    /// Returns the identity of this marker type.
    pub fn id(&'static self) -> MarkerId {
        MarkerId(self)
    }

    /// Returns the marker type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the role of this marker type.
    pub fn role(&self) -> MarkerRole {
        self.role
    }

    /// Returns whether advice may target this marker type.
    pub fn is_pointcut(&self) -> bool {
        self.pointcut
    }

    /// Creates a marker of this type with no fields set.
    pub fn marker(&'static self) -> Marker {
        Marker::new(self)
    }

    /// Creates a marker of this type carrying match text.
    pub fn matching(&'static self, pattern: impl Into<String>) -> Marker {
        Marker::new(self).with_value(pattern)
    }
}

/// One marker attached to a handler unit.
#[derive(Debug, Clone)]
pub struct Marker {
    ty: &'static MarkerType,
    value: Option<String>,
    tags: Vec<String>,
    order: Option<i32>,
    timeout: Option<Duration>,
    pointcuts: Vec<&'static MarkerType>,
}

impl Marker {
    /// Creates a marker of the given type with no fields set.
    pub fn new(ty: &'static MarkerType) -> Self {
        Self {
            ty,
            value: None,
            tags: Vec::new(),
            order: None,
            timeout: None,
            pointcuts: Vec::new(),
        }
    }

    /// Sets the match text.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Adds tag expressions (hooks only).
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Sets the order value (order markers only).
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Sets the advisory timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds pointcut targets (advice only).
    pub fn with_pointcuts<I>(mut self, pointcuts: I) -> Self
    where
        I: IntoIterator<Item = &'static MarkerType>,
    {
        self.pointcuts.extend(pointcuts);
        self
    }

    /// Returns the marker type.
    pub fn marker_type(&self) -> &'static MarkerType {
        self.ty
    }

    /// Returns the identity of the marker type.
    pub fn id(&self) -> MarkerId {
        self.ty.id()
    }

    /// Returns the marker type name.
    pub fn name(&self) -> &'static str {
        self.ty.name
    }

    /// Returns the role of the marker type.
    pub fn role(&self) -> MarkerRole {
        self.ty.role
    }

    /// Returns the match text.
    pub fn pattern(&self) -> Result<&str, MarkerError> {
        self.value
            .as_deref()
            .ok_or(MarkerError::MissingPattern {
                marker: self.ty.name,
            })
    }

    /// Returns the tag expressions, in declaration order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the order value.
    pub fn order(&self) -> Result<i32, MarkerError> {
        self.order.ok_or(MarkerError::MissingOrder {
            marker: self.ty.name,
        })
    }

    /// Returns the advisory timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the declared pointcut targets, in declaration order.
    pub fn pointcut_targets(&self) -> Result<&[&'static MarkerType], MarkerError> {
        if self.pointcuts.is_empty() {
            return Err(MarkerError::MissingPointcuts {
                marker: self.ty.name,
            });
        }
        Ok(&self.pointcuts)
    }

    /// Fails unless this marker has the given role.
    pub fn expect_role(&self, expected: MarkerRole) -> Result<(), MarkerError> {
        if self.ty.role == expected {
            Ok(())
        } else {
            Err(MarkerError::UnexpectedRole {
                marker: self.ty.name,
                expected,
                actual: self.ty.role,
            })
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "@{}(\"{}\")", self.ty.name, value),
            None => write!(f, "@{}", self.ty.name),
        }
    }
}

/// Stock marker types.
pub mod markers {
    use super::MarkerType;

    /// `@Given` step marker.
    pub static GIVEN: MarkerType = MarkerType::step("Given");
    /// `@When` step marker.
    pub static WHEN: MarkerType = MarkerType::step("When");
    /// `@Then` step marker.
    pub static THEN: MarkerType = MarkerType::step("Then");
    /// `@And` step marker.
    pub static AND: MarkerType = MarkerType::step("And");
    /// `@But` step marker.
    pub static BUT: MarkerType = MarkerType::step("But");
    /// `@Before` hook marker.
    pub static BEFORE: MarkerType = MarkerType::before("Before");
    /// `@After` hook marker.
    pub static AFTER: MarkerType = MarkerType::after("After");
    /// `@Order` marker for hooks.
    pub static ORDER: MarkerType = MarkerType::order("Order");
    /// `@Around` advice marker.
    pub static AROUND: MarkerType = MarkerType::advice("Around");
}
