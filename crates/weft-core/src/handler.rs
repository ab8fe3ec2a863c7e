//! Handler units: the invocable code behind a marker.
//!
//! A [`HandlerUnit`] binds a typed closure to the type that declares it
//! ([`GlueType`]) and lists the markers attached to it. The registration engine
//! never calls the closure; it only stores the unit in definitions, and the
//! execution engine later invokes it against an instance provided by the
//! [`ObjectFactory`](crate::factory::ObjectFactory).
//!
//! ```rust,ignore
//! #[derive(Default)]
//! struct Belly { cukes: AtomicUsize }
//!
//! let unit = HandlerUnit::new::<Belly, _>("i_have_cukes", |belly, call| {
//!     let n = call.arg(0).unwrap_or("0").parse().map_err(|_| HandlerError::failed("nan"))?;
//!     belly.cukes.store(n, Ordering::SeqCst);
//!     Ok(())
//! })
//! .marked(GIVEN.matching(r"^I have (\d+) cukes$"));
//! ```

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use crate::error::{HandlerError, HandlerResult};
use crate::marker::{Marker, MarkerId, MarkerRole};

/// A type-erased glue instance, as stored by an object factory.
pub type GlueInstance = Arc<dyn Any + Send + Sync>;

/// A type-erased handler closure.
pub type HandlerFn = Arc<dyn Fn(&(dyn Any + Send + Sync), &Invocation<'_>) -> HandlerResult + Send + Sync>;

/// Identity of a type that declares handler units.
#[derive(Clone, Copy)]
pub struct GlueType {
    name: &'static str,
    type_id: TypeId,
    construct: fn() -> GlueInstance,
}

impl GlueType {
    /// Returns the glue type for `T`.
    pub fn of<T>() -> Self
    where
        T: Default + Send + Sync + 'static,
    {
        Self {
            name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            construct: construct::<T>,
        }
    }

    /// Returns the fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the module path the type is declared in.
    pub fn module_path(&self) -> &'static str {
        let path = self.name.split('<').next().unwrap_or(self.name);
        path.rsplit_once("::").map_or("", |(module, _)| module)
    }

    /// Returns the [`TypeId`] of the type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Builds a fresh default instance.
    pub fn construct(&self) -> GlueInstance {
        (self.construct)()
    }
}

fn construct<T>() -> GlueInstance
where
    T: Default + Send + Sync + 'static,
{
    Arc::new(T::default())
}

impl PartialEq for GlueType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for GlueType {}

impl fmt::Debug for GlueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GlueType").field(&self.name).finish()
    }
}

/// A raw argument captured from step text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    offset: Option<usize>,
    value: Option<String>,
}

impl Argument {
    /// Creates an argument.
    pub fn new(offset: Option<usize>, value: Option<String>) -> Self {
        Self { offset, value }
    }

    /// Byte offset of the capture in the step text, `None` if the group did not participate.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Captured text, `None` if the group did not participate.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub(crate) fn shifted(mut self, by: usize) -> Self {
        self.offset = self.offset.map(|offset| offset + by);
        self
    }
}

/// What a handler receives when invoked.
pub struct Invocation<'a> {
    arguments: &'a [Argument],
    proceed: Option<&'a dyn Fn() -> HandlerResult>,
}

impl<'a> Invocation<'a> {
    /// Creates an invocation for a step or hook.
    pub fn new(arguments: &'a [Argument]) -> Self {
        Self {
            arguments,
            proceed: None,
        }
    }

    /// Creates an invocation for advice, with a continuation running the advised step.
    pub fn with_proceed(arguments: &'a [Argument], proceed: &'a dyn Fn() -> HandlerResult) -> Self {
        Self {
            arguments,
            proceed: Some(proceed),
        }
    }

    /// Returns the captured arguments, in capture-group order.
    pub fn arguments(&self) -> &[Argument] {
        self.arguments
    }

    /// Returns the text of the argument at `index`.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.arguments.get(index).and_then(Argument::value)
    }

    /// Runs the advised step.
    pub fn proceed(&self) -> HandlerResult {
        match self.proceed {
            Some(proceed) => proceed(),
            None => Err(HandlerError::NoProceed),
        }
    }
}

/// Invocable code plus the markers declared on it.
pub struct HandlerUnit {
    name: String,
    declaring: GlueType,
    markers: Vec<Marker>,
    func: HandlerFn,
}

impl HandlerUnit {
    /// Creates a handler unit declared by `T`.
    pub fn new<T, F>(name: impl Into<String>, f: F) -> Self
    where
        T: Default + Send + Sync + 'static,
        F: Fn(&T, &Invocation<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        let func: HandlerFn = Arc::new(move |instance: &(dyn Any + Send + Sync), call: &Invocation<'_>| {
            let instance = instance
                .downcast_ref::<T>()
                .ok_or(HandlerError::TypeMismatch {
                    type_name: type_name::<T>(),
                })?;
            f(instance, call)
        });

        Self {
            name: name.into(),
            declaring: GlueType::of::<T>(),
            markers: Vec::new(),
            func,
        }
    }

    /// Attaches a marker. Markers keep their declaration order.
    pub fn marked(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Returns the handler name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declaring type.
    pub fn declaring_type(&self) -> &GlueType {
        &self.declaring
    }

    /// Returns the module path of the declaring type.
    pub fn module_path(&self) -> &'static str {
        self.declaring.module_path()
    }

    /// Returns `Type::handler`, used to identify the unit in errors and logs.
    pub fn location(&self) -> String {
        format!("{}::{}", self.declaring.name(), self.name)
    }

    /// Returns the declared markers, in declaration order.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Returns the first marker with the given role.
    pub fn find_marker(&self, role: MarkerRole) -> Option<&Marker> {
        self.markers.iter().find(|marker| marker.role() == role)
    }

    /// Returns whether a marker of the given type is declared.
    pub fn has_marker(&self, id: MarkerId) -> bool {
        self.markers.iter().any(|marker| marker.id() == id)
    }

    /// Invokes the handler against an instance of its declaring type.
    pub fn invoke(&self, instance: &(dyn Any + Send + Sync), call: &Invocation<'_>) -> HandlerResult {
        (self.func)(instance, call)
    }
}

impl fmt::Debug for HandlerUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerUnit")
            .field("location", &self.location())
            .field("markers", &self.markers)
            .finish_non_exhaustive()
    }
}
