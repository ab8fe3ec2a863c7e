//! Glue loading orchestration.
//!
//! [`WeftRuntime`] owns the configuration, the registration engine, the
//! registry and the glue source. Loading is single-threaded and needs
//! `&mut self`; [`WeftRuntime::seal`] consumes the runtime and hands back a
//! [`ResolvedGlue`], the read-only view scenario threads resolve against.
//! Registration can therefore never overlap with resolution.
//!
//! Each scenario runs inside a [`ScenarioScope`] returned by
//! [`ResolvedGlue::start_scenario`]. The scope owns the calling thread's world
//! and disposes of it when ended or dropped; scenarios on other threads keep
//! their own worlds.
//!
//! ```rust,ignore
//! use weft_runtime::WeftRuntime;
//!
//! let mut runtime = WeftRuntime::builder()
//!     .config_file("weft.toml")
//!     .build()?;
//! runtime.load()?;
//! let glue = runtime.seal()?;
//!
//! let worker = glue.clone();
//! std::thread::spawn(move || {
//!     let scenario = worker.start_scenario();
//!     if let Ok(Some(step)) = worker.resolve_step("I have 3 cukes") {
//!         let _ = step.execute();
//!     }
//!     scenario.end();
//! });
//! ```

use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};
use weft_core::{
    AmbiguousStepError, Backend, BoxedObjectFactory, BoxedSnippetGenerator, DefaultObjectFactory,
    GlueRegistry, GlueSource, HandlerUnit, HookDefinition, LinkedGlue, StepDefinition, StepMatch,
};

use crate::config::{ConfigLoader, WeftConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// Counters describing loaded glue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlueStats {
    /// Plain step definitions.
    pub steps: usize,
    /// Advised step definitions.
    pub advised_steps: usize,
    /// Indexed advice definitions.
    pub advices: usize,
    /// Before hooks.
    pub before_hooks: usize,
    /// After hooks.
    pub after_hooks: usize,
}

impl GlueStats {
    fn collect(backend: &Backend, glue: &GlueRegistry) -> Self {
        let advised_steps = glue
            .step_definitions()
            .iter()
            .filter(|definition| definition.is_advised())
            .count();
        Self {
            steps: glue.step_count() - advised_steps,
            advised_steps,
            advices: backend.stats().advices,
            before_hooks: glue.before_hook_count(),
            after_hooks: glue.after_hook_count(),
        }
    }
}

/// The Weft runtime: loads glue, then seals it for resolution.
pub struct WeftRuntime {
    config: WeftConfig,
    backend: Backend,
    glue: GlueRegistry,
    source: Box<dyn GlueSource>,
    loaded: bool,
}

impl WeftRuntime {
    /// Creates a runtime builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration.
    ///
    /// Installs logging from `config.logging` unless a subscriber already
    /// exists. Glue is discovered with [`LinkedGlue`] and instantiated by a
    /// [`DefaultObjectFactory`] until replaced.
    pub fn from_config(config: WeftConfig) -> Self {
        logging::init_from_config(&config.logging);

        let backend = Self::backend(&config, Arc::new(DefaultObjectFactory::new()));
        info!(
            glue_paths = ?config.glue.paths,
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );

        Self {
            config,
            backend,
            glue: GlueRegistry::new(),
            source: Box::new(LinkedGlue::new()),
            loaded: false,
        }
    }

    fn backend(config: &WeftConfig, factory: BoxedObjectFactory) -> Backend {
        Backend::new(factory).with_default_timeout(config.glue.default_timeout())
    }

    /// Replaces the glue source.
    pub fn with_source(mut self, source: impl GlueSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Replaces the object factory.
    ///
    /// Fails with [`RuntimeError::AlreadyLoaded`] once any glue is loaded,
    /// since loaded definitions stay bound to the factory they were built with.
    pub fn with_object_factory(mut self, factory: BoxedObjectFactory) -> RuntimeResult<Self> {
        if self.loaded {
            return Err(RuntimeError::AlreadyLoaded);
        }
        self.backend = self.backend.with_object_factory(factory);
        Ok(self)
    }

    /// Sets the snippet generator for undefined steps.
    pub fn with_snippets(mut self, generator: BoxedSnippetGenerator) -> Self {
        self.backend = self.backend.with_snippets(generator);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &WeftConfig {
        &self.config
    }

    /// Returns the registry as loaded so far.
    pub fn registry(&self) -> &GlueRegistry {
        &self.glue
    }

    /// Returns counters for the glue loaded so far.
    pub fn stats(&self) -> GlueStats {
        GlueStats::collect(&self.backend, &self.glue)
    }

    /// Runs one discovery round over the configured glue paths.
    pub fn load(&mut self) -> RuntimeResult<()> {
        let paths = self.config.glue.paths.clone();
        self.load_paths(&paths)
    }

    /// Runs one discovery round over `paths`.
    pub fn load_paths(&mut self, paths: &[String]) -> RuntimeResult<()> {
        self.backend
            .load_glue(&mut self.glue, self.source.as_ref(), paths)?;
        self.loaded = true;
        debug!(stats = ?self.stats(), "Discovery round complete");
        Ok(())
    }

    /// Loads one explicitly provided unit.
    pub fn load_unit(&mut self, unit: HandlerUnit) -> RuntimeResult<()> {
        self.backend.load_glue_unit(&mut self.glue, Arc::new(unit))?;
        self.loaded = true;
        Ok(())
    }

    /// Finishes registration.
    ///
    /// Fails with [`RuntimeError::NotLoaded`] if no load ever succeeded.
    pub fn seal(self) -> RuntimeResult<ResolvedGlue> {
        if !self.loaded {
            return Err(RuntimeError::NotLoaded);
        }
        let stats = GlueStats::collect(&self.backend, &self.glue);
        info!(
            steps = stats.steps,
            advised_steps = stats.advised_steps,
            before_hooks = stats.before_hooks,
            after_hooks = stats.after_hooks,
            "Glue sealed"
        );
        Ok(ResolvedGlue {
            inner: Arc::new(Sealed {
                backend: self.backend,
                glue: self.glue,
                stats,
            }),
        })
    }
}

struct Sealed {
    backend: Backend,
    glue: GlueRegistry,
    stats: GlueStats,
}

/// Sealed, read-only glue shared by scenario threads.
#[derive(Clone)]
pub struct ResolvedGlue {
    inner: Arc<Sealed>,
}

impl ResolvedGlue {
    /// Resolves step text to at most one definition.
    pub fn resolve_step(&self, text: &str) -> Result<Option<StepMatch>, AmbiguousStepError> {
        self.inner.glue.resolve_step(text)
    }

    /// Returns every definition matching step text.
    pub fn match_steps(&self, text: &str) -> Vec<StepMatch> {
        self.inner.glue.match_steps(text)
    }

    /// Returns the before hooks applying to `tags`, in run order.
    pub fn before_hooks_for<S: AsRef<str>>(&self, tags: &[S]) -> Vec<Arc<HookDefinition>> {
        self.inner.glue.before_hooks_for(tags)
    }

    /// Returns the after hooks applying to `tags`, in run order.
    pub fn after_hooks_for<S: AsRef<str>>(&self, tags: &[S]) -> Vec<Arc<HookDefinition>> {
        self.inner.glue.after_hooks_for(tags)
    }

    /// Returns a snippet for undefined step text, if a generator is set.
    pub fn snippet(&self, step_text: &str) -> Option<String> {
        self.inner.backend.snippet(step_text)
    }

    /// Builds the calling thread's world and returns the scope owning it.
    pub fn start_scenario(&self) -> ScenarioScope<'_> {
        self.inner.backend.build_world();
        ScenarioScope {
            glue: self,
            _thread: PhantomData,
        }
    }

    /// Returns the sealed registry.
    pub fn registry(&self) -> &GlueRegistry {
        &self.inner.glue
    }

    /// Returns counters for the sealed glue.
    pub fn stats(&self) -> GlueStats {
        self.inner.stats
    }
}

impl std::fmt::Debug for ResolvedGlue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedGlue")
            .field("stats", &self.inner.stats)
            .finish()
    }
}

/// One running scenario's world.
///
/// The world lives on the thread that started it, so the scope cannot be sent
/// to another thread. Dropping the scope disposes of the world.
#[must_use = "dropping the scope disposes of the scenario's world"]
pub struct ScenarioScope<'g> {
    glue: &'g ResolvedGlue,
    _thread: PhantomData<*const ()>,
}

impl ScenarioScope<'_> {
    /// Ends the scenario, disposing of its world.
    pub fn end(self) {}
}

impl Drop for ScenarioScope<'_> {
    fn drop(&mut self) {
        self.glue.inner.backend.dispose_world();
    }
}

impl std::fmt::Debug for ScenarioScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioScope").finish_non_exhaustive()
    }
}

/// Builder for [`WeftRuntime`].
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a builder searching the current directory for config files.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration programmatically.
    pub fn merge(mut self, config: WeftConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads configuration and builds the runtime.
    pub fn build(self) -> RuntimeResult<WeftRuntime> {
        let config = self.config_loader.load()?;
        Ok(WeftRuntime::from_config(config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use weft_core::marker::MarkerType;
    use weft_core::marker::markers::{AFTER, AROUND, BEFORE, GIVEN, WHEN};
    use weft_core::{DiscoveryError, GlueError, SnippetGenerator, StaticGlue};

    use super::*;

    static RETRIED: MarkerType = MarkerType::pointcut("Retried");

    #[derive(Default)]
    struct Steps;

    fn unit(name: &str) -> HandlerUnit {
        HandlerUnit::new::<Steps, _>(name, |_, _| Ok(()))
    }

    fn config(paths: &[&str]) -> WeftConfig {
        let mut config = WeftConfig::default();
        config.glue.paths = paths.iter().map(|p| p.to_string()).collect();
        config
    }

    fn source() -> StaticGlue {
        StaticGlue::new()
            .with(unit("cukes").marked(GIVEN.matching(r"^I have (\d+) cukes$")).marked(RETRIED.marker()))
            .with(unit("wait").marked(WHEN.matching(r"^I wait (\d+) hours?$")))
            .with(unit("setup").marked(BEFORE.marker()))
            .with(unit("teardown").marked(AFTER.marker().with_tags(["@db"])))
            .with(unit("retry").marked(AROUND.matching("^(.*), retrying$").with_pointcuts([&RETRIED])))
    }

    #[test]
    fn test_load_and_seal() {
        let mut runtime = WeftRuntime::from_config(config(&["weft_runtime"])).with_source(source());
        runtime.load().unwrap();

        let glue = runtime.seal().unwrap();
        assert_eq!(
            glue.stats(),
            GlueStats {
                steps: 2,
                advised_steps: 1,
                advices: 1,
                before_hooks: 1,
                after_hooks: 1,
            }
        );
        assert!(glue.resolve_step("I have 2 cukes, retrying").unwrap().is_some());
        assert_eq!(glue.before_hooks_for(&["@ui"]).len(), 1);
        assert!(glue.after_hooks_for(&["@ui"]).is_empty());
    }

    #[test]
    fn test_builder_merge_supplies_glue_paths() {
        let mut runtime = WeftRuntime::builder()
            .without_env()
            .merge(config(&["weft_runtime"]))
            .build()
            .unwrap()
            .with_source(source());
        assert_eq!(runtime.config().glue.paths, ["weft_runtime"]);

        runtime.load().unwrap();
        assert_eq!(runtime.stats().steps, 2);
    }

    #[test]
    fn test_seal_requires_load() {
        let runtime = WeftRuntime::from_config(config(&["weft_runtime"])).with_source(source());
        assert!(matches!(runtime.seal(), Err(RuntimeError::NotLoaded)));
    }

    #[test]
    fn test_failed_load_surfaces_glue_error() {
        let mut runtime = WeftRuntime::from_config(config(&[]));
        let err = runtime.load().unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Glue(GlueError::Discovery(DiscoveryError::NoGluePaths))
        ));
        assert!(matches!(runtime.seal(), Err(RuntimeError::NotLoaded)));
    }

    #[test]
    fn test_default_timeout_from_config() {
        let mut config = config(&["weft_runtime"]);
        config.glue.default_timeout_ms = Some(1500);
        let mut runtime = WeftRuntime::from_config(config);
        runtime
            .load_unit(unit("slow").marked(GIVEN.matching("^slow$")))
            .unwrap();

        let timeouts: Vec<_> = runtime
            .registry()
            .step_definitions()
            .iter()
            .map(|definition| definition.timeout())
            .collect();
        assert_eq!(timeouts, [Some(std::time::Duration::from_millis(1500))]);
    }

    #[test]
    fn test_sealed_glue_is_shared_across_threads() {
        struct Snippets;
        impl SnippetGenerator for Snippets {
            fn snippet(&self, step_text: &str) -> String {
                format!("^{step_text}$")
            }
        }

        let mut runtime = WeftRuntime::from_config(config(&["weft_runtime"]))
            .with_source(source())
            .with_snippets(Arc::new(Snippets));
        runtime.load().unwrap();
        let glue = runtime.seal().unwrap();

        let workers: Vec<_> = (1..=4)
            .map(|hours| {
                let glue = glue.clone();
                thread::spawn(move || {
                    let text = format!("I wait {hours} hours");
                    let found = glue.resolve_step(&text).unwrap().unwrap();
                    found.arguments()[0].value().map(str::to_string)
                })
            })
            .collect();
        let captured: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
        assert_eq!(
            captured,
            ["1", "2", "3", "4"].map(|h| Some(h.to_string()))
        );

        assert_eq!(glue.snippet("I dance").as_deref(), Some("^I dance$"));
    }

    #[test]
    fn test_scenario_lifecycle() {
        let factory = Arc::new(DefaultObjectFactory::new());
        let mut runtime = WeftRuntime::from_config(config(&["weft_runtime"]))
            .with_object_factory(factory.clone())
            .unwrap()
            .with_source(source());
        runtime.load().unwrap();
        let glue = runtime.seal().unwrap();

        let scenario = glue.start_scenario();
        assert!(factory.is_started());
        for hook in glue.before_hooks_for::<&str>(&[]) {
            hook.execute().unwrap();
        }
        scenario.end();
        assert!(!factory.is_started());

        {
            let _scenario = glue.start_scenario();
            assert!(factory.is_started());
        }
        assert!(!factory.is_started());
    }

    #[test]
    fn test_parallel_scenarios_keep_their_worlds() {
        let mut runtime = WeftRuntime::from_config(config(&["weft_runtime"])).with_source(source());
        runtime.load().unwrap();
        let glue = runtime.seal().unwrap();

        let second_started = Arc::new(Barrier::new(2));
        let first_ended = Arc::new(Barrier::new(2));

        let first = glue.start_scenario();
        let second = {
            let glue = glue.clone();
            let second_started = Arc::clone(&second_started);
            let first_ended = Arc::clone(&first_ended);
            thread::spawn(move || {
                let scenario = glue.start_scenario();
                second_started.wait();
                first_ended.wait();
                let step = glue.resolve_step("I have 3 cukes").unwrap().unwrap();
                let executed = step.execute().is_ok();
                scenario.end();
                executed
            })
        };

        second_started.wait();
        first.end();
        first_ended.wait();

        assert!(second.join().unwrap());
    }

    #[test]
    fn test_object_factory_is_fixed_once_loaded() {
        let mut runtime = WeftRuntime::from_config(config(&["weft_runtime"]))
            .with_snippets(Arc::new(NoSnippets))
            .with_object_factory(Arc::new(DefaultObjectFactory::new()))
            .unwrap()
            .with_source(source());
        assert!(runtime.backend.snippet_generator().is_some());
        runtime.load().unwrap();

        let err = runtime
            .with_object_factory(Arc::new(DefaultObjectFactory::new()))
            .err().unwrap();
        assert!(matches!(err, RuntimeError::AlreadyLoaded));
    }

    struct SpanNames(Arc<std::sync::Mutex<Vec<&'static str>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for SpanNames {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            _id: &tracing::span::Id,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            if let Ok(mut names) = self.0.lock() {
                names.push(attrs.metadata().name());
            }
        }
    }

    #[test]
    fn test_unit_rounds_open_a_load_span() {
        use tracing_subscriber::layer::SubscriberExt;

        let names = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut runtime = WeftRuntime::from_config(config(&["weft_runtime"]));
        let subscriber = tracing_subscriber::registry().with(SpanNames(Arc::clone(&names)));

        tracing::subscriber::with_default(subscriber, || {
            runtime
                .load_unit(unit("solo").marked(GIVEN.matching("^solo$")))
                .unwrap();
        });

        assert_eq!(*names.lock().unwrap(), ["load_glue"]);
    }

    struct NoSnippets;

    impl SnippetGenerator for NoSnippets {
        fn snippet(&self, _step_text: &str) -> String {
            String::new()
        }
    }
}
