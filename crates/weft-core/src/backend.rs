//! The registration engine.
//!
//! [`Backend`] classifies each discovered `(marker, handler unit)` pair, builds
//! the matching definition and writes it into a [`Glue`]. Advice is indexed by
//! pointcut instead of being registered, and a weaving pass at the end of
//! every load adds one advised step per (step, advice) pair that shares a
//! pointcut.
//!
//! # Loading is all-or-nothing
//!
//! Each `load_glue*` call works on a copy of the registry and of the engine's
//! own bookkeeping. Both are committed only if discovery, every registration
//! and the weave succeed; on error nothing from the batch is observable.
//!
//! # Weaving is idempotent
//!
//! The engine remembers which (step, advice) pairs it has woven. A later load
//! still weaves new advice onto old steps and old advice onto new steps, but
//! never the same pair twice.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{Level, debug, info, span, trace, warn};

use crate::definition::{AdviceDefinition, HandlerStepDefinition, HookDefinition, HookKind};
use crate::discovery::{GlueSource, glue_pairs};
use crate::error::{GlueError, GlueResult};
use crate::factory::BoxedObjectFactory;
use crate::glue::Glue;
use crate::handler::HandlerUnit;
use crate::marker::{Marker, MarkerRole};
use crate::pattern::CompiledPattern;
use crate::pointcut::{PointcutIndex, resolve_pointcuts};
use crate::tag::TagFilter;

/// Generates snippet text for undefined steps.
pub trait SnippetGenerator: Send + Sync {
    /// Returns a snippet implementing `step_text`.
    fn snippet(&self, step_text: &str) -> String;
}

/// A shared snippet generator.
pub type BoxedSnippetGenerator = Arc<dyn SnippetGenerator>;

/// Engine bookkeeping that must roll back with a failed load.
#[derive(Debug, Clone, Default)]
struct BackendState {
    steps: Vec<Arc<HandlerStepDefinition>>,
    advices: PointcutIndex,
    woven: HashSet<(usize, usize)>,
}

/// Counters describing what the engine has registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    /// Plain step definitions.
    pub steps: usize,
    /// Indexed advice definitions.
    pub advices: usize,
    /// Advised step definitions synthesized by weaving.
    pub woven: usize,
}

/// The registration engine.
pub struct Backend {
    factory: BoxedObjectFactory,
    snippets: Option<BoxedSnippetGenerator>,
    default_timeout: Option<Duration>,
    state: BackendState,
}

impl Backend {
    /// Creates an engine registering declaring types with `factory`.
    pub fn new(factory: BoxedObjectFactory) -> Self {
        Self {
            factory,
            snippets: None,
            default_timeout: None,
            state: BackendState::default(),
        }
    }

    /// Sets the timeout used when a marker declares none.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Sets the snippet generator for undefined steps.
    pub fn with_snippets(mut self, generator: BoxedSnippetGenerator) -> Self {
        self.snippets = Some(generator);
        self
    }

    /// Replaces the object factory. Definitions already registered stay bound
    /// to the previous one.
    pub fn with_object_factory(mut self, factory: BoxedObjectFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Returns the object factory.
    pub fn object_factory(&self) -> &BoxedObjectFactory {
        &self.factory
    }

    /// Returns the snippet generator, if any.
    pub fn snippet_generator(&self) -> Option<&BoxedSnippetGenerator> {
        self.snippets.as_ref()
    }

    /// Returns registration counters.
    pub fn stats(&self) -> BackendStats {
        BackendStats {
            steps: self.state.steps.len(),
            advices: self.state.advices.len(),
            woven: self.state.woven.len(),
        }
    }

    /// Discovers glue under `glue_paths`, registers it and weaves advice.
    pub fn load_glue<G>(
        &mut self,
        glue: &mut G,
        source: &dyn GlueSource,
        glue_paths: &[String],
    ) -> GlueResult<()>
    where
        G: Glue + Clone,
    {
        let span = span!(Level::DEBUG, "load_glue", paths = ?glue_paths);
        let _enter = span.enter();

        let discovered = source.discover(glue_paths)?;
        self.transaction(glue, |backend, staged| {
            for (marker, unit) in &discovered {
                backend.register(staged, marker, unit)?;
            }
            Ok(())
        })
    }

    /// Registers every glue marker of one explicitly provided unit, then weaves.
    pub fn load_glue_unit<G>(&mut self, glue: &mut G, unit: Arc<HandlerUnit>) -> GlueResult<()>
    where
        G: Glue + Clone,
    {
        let span = span!(Level::DEBUG, "load_glue", unit = %unit.location());
        let _enter = span.enter();

        let discovered = glue_pairs([unit]);
        self.transaction(glue, |backend, staged| {
            for (marker, unit) in &discovered {
                backend.register(staged, marker, unit)?;
            }
            Ok(())
        })
    }

    fn transaction<G, F>(&mut self, glue: &mut G, register: F) -> GlueResult<()>
    where
        G: Glue + Clone,
        F: FnOnce(&mut Self, &mut G) -> GlueResult<()>,
    {
        let snapshot = self.state.clone();
        let mut staged = glue.clone();

        let result = register(self, &mut staged).and_then(|()| self.apply_advices(&mut staged));
        match result {
            Ok(woven) => {
                *glue = staged;
                let stats = self.stats();
                info!(
                    steps = stats.steps,
                    advices = stats.advices,
                    woven_now = woven,
                    "Glue loaded"
                );
                Ok(())
            }
            Err(err) => {
                self.state = snapshot;
                warn!(error = %err, "Glue loading failed, batch discarded");
                Err(err)
            }
        }
    }

    /// Registers one discovered pair.
    ///
    /// Advice is only indexed; it reaches the glue at the next weave.
    pub fn register<G>(&mut self, glue: &mut G, marker: &Marker, unit: &Arc<HandlerUnit>) -> GlueResult<()>
    where
        G: Glue + ?Sized,
    {
        match marker.role() {
            MarkerRole::Step => self.add_step_definition(glue, marker, unit),
            MarkerRole::BeforeHook | MarkerRole::AfterHook => self.add_hook(glue, marker, unit),
            MarkerRole::Advice => self.add_advice_definition(marker, unit),
            MarkerRole::Order | MarkerRole::Plain => {
                trace!(marker = %marker, location = %unit.location(), "Skipping non-glue marker");
                Ok(())
            }
        }
    }

    fn add_step_definition<G>(&mut self, glue: &mut G, marker: &Marker, unit: &Arc<HandlerUnit>) -> GlueResult<()>
    where
        G: Glue + ?Sized,
    {
        self.factory.add_class(unit.declaring_type());

        let raw = marker
            .pattern()
            .map_err(|source| GlueError::configuration(unit.location(), source))?;
        let pattern = CompiledPattern::compile(raw)
            .map_err(|source| GlueError::pattern(unit.location(), source))?;

        let definition = Arc::new(HandlerStepDefinition::new(
            Arc::clone(unit),
            pattern,
            self.timeout(marker),
            Arc::clone(&self.factory),
        ));
        glue.add_step_definition(definition.clone())?;
        self.state.steps.push(definition);
        Ok(())
    }

    fn add_hook<G>(&mut self, glue: &mut G, marker: &Marker, unit: &Arc<HandlerUnit>) -> GlueResult<()>
    where
        G: Glue + ?Sized,
    {
        self.factory.add_class(unit.declaring_type());

        let order = match unit.find_marker(MarkerRole::Order) {
            Some(order) => order
                .order()
                .map_err(|source| GlueError::configuration(unit.location(), source))?,
            None => HookDefinition::DEFAULT_ORDER,
        };
        let kind = match marker.role() {
            MarkerRole::BeforeHook => HookKind::Before,
            _ => HookKind::After,
        };

        let hook = Arc::new(HookDefinition::new(
            Arc::clone(unit),
            TagFilter::new(marker.tags().iter().cloned()),
            order,
            self.timeout(marker),
            kind,
            Arc::clone(&self.factory),
        ));
        match kind {
            HookKind::Before => glue.add_before_hook(hook),
            HookKind::After => glue.add_after_hook(hook),
        }
        Ok(())
    }

    fn add_advice_definition(&mut self, marker: &Marker, unit: &Arc<HandlerUnit>) -> GlueResult<()> {
        self.factory.add_class(unit.declaring_type());

        let targets = marker
            .pointcut_targets()
            .map_err(|source| GlueError::configuration(unit.location(), source))?;
        let pointcuts = resolve_pointcuts(unit, targets)?;
        let raw = marker
            .pattern()
            .map_err(|source| GlueError::configuration(unit.location(), source))?;
        let pattern = CompiledPattern::compile(raw)
            .map_err(|source| GlueError::pattern(unit.location(), source))?;

        let advice = AdviceDefinition::new(
            Arc::clone(unit),
            pattern,
            pointcuts,
            self.timeout(marker),
            Arc::clone(&self.factory),
        )
        .map_err(|source| GlueError::pattern(unit.location(), source))?;

        let number = self.state.advices.insert(Arc::new(advice));
        debug!(
            advice = number,
            location = %unit.location(),
            "Indexed advice definition"
        );
        Ok(())
    }

    /// Weaves indexed advice onto every known step and returns how many
    /// advised steps were added.
    ///
    /// Steps are visited in registration order, each step's markers in
    /// declaration order, and each marker's advices in registration order.
    fn apply_advices<G>(&mut self, glue: &mut G) -> GlueResult<usize>
    where
        G: Glue + ?Sized,
    {
        let BackendState {
            steps,
            advices,
            woven,
        } = &mut self.state;
        let mut added = 0;

        for (step_number, step) in steps.iter().enumerate() {
            for marker in step.handler().markers() {
                for (advice_number, advice) in advices.advices_for(marker.id()) {
                    if !woven.insert((step_number, advice_number)) {
                        trace!(
                            step = %step.handler().location(),
                            advice = %advice.location(),
                            "Pair already woven"
                        );
                        continue;
                    }
                    glue.add_step_definition(Arc::new(advice.advise(step)))?;
                    added += 1;
                }
            }
        }
        Ok(added)
    }

    fn timeout(&self, marker: &Marker) -> Option<Duration> {
        marker.timeout().or(self.default_timeout)
    }

    /// Builds the world for a scenario on the calling thread.
    pub fn build_world(&self) {
        self.factory.start();
    }

    /// Disposes of the calling thread's world.
    pub fn dispose_world(&self) {
        self.factory.stop();
    }

    /// Returns a snippet for an undefined step, if a generator is configured.
    pub fn snippet(&self, step_text: &str) -> Option<String> {
        self.snippets
            .as_ref()
            .map(|generator| generator.snippet(step_text))
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("stats", &self.stats())
            .field("default_timeout", &self.default_timeout)
            .field("snippets", &self.snippets.is_some())
            .finish()
    }
}
