//! Owning-object factory.
//!
//! Handler units are invoked against an instance of their declaring type. The
//! [`ObjectFactory`] owns those instances: the registration engine announces
//! every declaring type with [`add_class`](ObjectFactory::add_class) while glue
//! loads, and the surrounding runner brackets each scenario with
//! [`start`](ObjectFactory::start) / [`stop`](ObjectFactory::stop).
//!
//! A world belongs to the thread that started it, so scenarios running on
//! different threads never see or dispose of each other's instances.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::HandlerError;
use crate::handler::{GlueInstance, GlueType};

/// Creates and owns instances of glue types.
pub trait ObjectFactory: Send + Sync {
    /// Registers a type whose instances must be constructable. Idempotent.
    fn add_class(&self, glue_type: &GlueType);

    /// Builds the instances for a new world on the calling thread.
    fn start(&self);

    /// Disposes of the calling thread's world.
    fn stop(&self);

    /// Returns the live instance of `glue_type` in the calling thread's world.
    fn instance(&self, glue_type: &GlueType) -> Result<GlueInstance, HandlerError>;
}

/// A shared object factory.
pub type BoxedObjectFactory = Arc<dyn ObjectFactory>;

type World = HashMap<TypeId, GlueInstance>;

/// Builds one default instance per registered type on every `start`, keeping
/// one world per thread.
#[derive(Default)]
pub struct DefaultObjectFactory {
    classes: RwLock<IndexMap<TypeId, GlueType>>,
    worlds: RwLock<HashMap<ThreadId, World>>,
}

impl DefaultObjectFactory {
    /// Creates an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered types.
    pub fn class_count(&self) -> usize {
        self.classes.read().len()
    }

    /// Returns whether the calling thread has a world.
    pub fn is_started(&self) -> bool {
        self.worlds.read().contains_key(&thread::current().id())
    }

    /// Returns the number of live worlds across all threads.
    pub fn world_count(&self) -> usize {
        self.worlds.read().len()
    }
}

impl ObjectFactory for DefaultObjectFactory {
    fn add_class(&self, glue_type: &GlueType) {
        let mut classes = self.classes.write();
        if classes.insert(glue_type.type_id(), *glue_type).is_none() {
            trace!(glue_type = glue_type.name(), "Registered glue type");
        }
    }

    fn start(&self) {
        let world: World = self
            .classes
            .read()
            .iter()
            .map(|(type_id, glue_type)| (*type_id, glue_type.construct()))
            .collect();
        let instances = world.len();
        self.worlds.write().insert(thread::current().id(), world);
        debug!(instances, "World built");
    }

    fn stop(&self) {
        let disposed = self
            .worlds
            .write()
            .remove(&thread::current().id())
            .map_or(0, |world| world.len());
        debug!(instances = disposed, "World disposed");
    }

    fn instance(&self, glue_type: &GlueType) -> Result<GlueInstance, HandlerError> {
        self.worlds
            .read()
            .get(&thread::current().id())
            .and_then(|world| world.get(&glue_type.type_id()))
            .cloned()
            .ok_or(HandlerError::InstanceUnavailable {
                type_name: glue_type.name(),
            })
    }
}

impl std::fmt::Debug for DefaultObjectFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultObjectFactory")
            .field("class_count", &self.classes.read().len())
            .field("world_count", &self.worlds.read().len())
            .finish()
    }
}
