//! The glue registry.
//!
//! [`Glue`] is the seam the registration engine writes through;
//! [`GlueRegistry`] is the store of record and answers resolution queries.
//!
//! Registration is append-only and single-threaded. Once registration is
//! finished the registry is read-only, so it can be shared behind an `Arc`
//! and queried from many scenario threads at once.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::definition::{BoxedStepDefinition, HookDefinition, StepMatch};
use crate::error::{AmbiguousStepError, GlueError, GlueResult};

/// Write side of a glue store.
pub trait Glue {
    /// Adds a step definition.
    ///
    /// Fails with [`GlueError::DuplicateStepDefinition`] if a definition with
    /// byte-identical match text is already registered.
    fn add_step_definition(&mut self, definition: BoxedStepDefinition) -> GlueResult<()>;

    /// Adds a before hook.
    fn add_before_hook(&mut self, hook: Arc<HookDefinition>);

    /// Adds an after hook.
    fn add_after_hook(&mut self, hook: Arc<HookDefinition>);
}

/// The registry of step definitions and hooks.
#[derive(Debug, Clone, Default)]
pub struct GlueRegistry {
    steps: Vec<BoxedStepDefinition>,
    patterns: HashMap<String, usize>,
    before_hooks: Vec<Arc<HookDefinition>>,
    after_hooks: Vec<Arc<HookDefinition>>,
}

impl GlueRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of step definitions, advised ones included.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Returns the number of before hooks.
    pub fn before_hook_count(&self) -> usize {
        self.before_hooks.len()
    }

    /// Returns the number of after hooks.
    pub fn after_hook_count(&self) -> usize {
        self.after_hooks.len()
    }

    /// Returns all step definitions, in registration order.
    pub fn step_definitions(&self) -> &[BoxedStepDefinition] {
        &self.steps
    }

    /// Returns every definition matching `text`, in registration order.
    pub fn match_steps(&self, text: &str) -> Vec<StepMatch> {
        self.steps
            .iter()
            .filter_map(|definition| {
                definition
                    .matched_arguments(text)
                    .map(|arguments| StepMatch::new(Arc::clone(definition), arguments))
            })
            .collect()
    }

    /// Resolves `text` to at most one definition.
    ///
    /// Returns `Ok(None)` for an undefined step and an error naming every
    /// candidate when more than one definition matches.
    pub fn resolve_step(&self, text: &str) -> Result<Option<StepMatch>, AmbiguousStepError> {
        let mut matches = self.match_steps(text);
        match matches.len() {
            0 => {
                trace!(step = text, "No step definition matches");
                Ok(None)
            }
            1 => Ok(matches.pop()),
            _ => Err(AmbiguousStepError {
                step: text.to_string(),
                candidates: matches
                    .iter()
                    .map(|m| {
                        format!(
                            "{} ({})",
                            m.definition().pattern(),
                            m.definition().location()
                        )
                    })
                    .collect(),
            }),
        }
    }

    /// Returns the before hooks applying to `tags`, in run order.
    pub fn before_hooks_for<S: AsRef<str>>(&self, tags: &[S]) -> Vec<Arc<HookDefinition>> {
        hooks_for(&self.before_hooks, tags)
    }

    /// Returns the after hooks applying to `tags`, in run order.
    pub fn after_hooks_for<S: AsRef<str>>(&self, tags: &[S]) -> Vec<Arc<HookDefinition>> {
        hooks_for(&self.after_hooks, tags)
    }
}

/// Filters hooks by tags, then orders them by ascending order value.
///
/// The sort is stable: hooks with equal order keep registration order.
fn hooks_for<S: AsRef<str>>(hooks: &[Arc<HookDefinition>], tags: &[S]) -> Vec<Arc<HookDefinition>> {
    let mut applicable: Vec<_> = hooks
        .iter()
        .filter(|hook| hook.matches(tags))
        .cloned()
        .collect();
    applicable.sort_by_key(|hook| hook.order());
    applicable
}

impl Glue for GlueRegistry {
    fn add_step_definition(&mut self, definition: BoxedStepDefinition) -> GlueResult<()> {
        if let Some(&existing) = self.patterns.get(definition.pattern()) {
            return Err(GlueError::DuplicateStepDefinition {
                pattern: definition.pattern().to_string(),
                existing: self.steps[existing].location(),
                duplicate: definition.location(),
            });
        }

        debug!(
            pattern = definition.pattern(),
            location = %definition.location(),
            advised = definition.is_advised(),
            "Added step definition"
        );
        self.patterns
            .insert(definition.pattern().to_string(), self.steps.len());
        self.steps.push(definition);
        Ok(())
    }

    fn add_before_hook(&mut self, hook: Arc<HookDefinition>) {
        debug!(location = %hook.location(), order = hook.order(), "Added before hook");
        self.before_hooks.push(hook);
    }

    fn add_after_hook(&mut self, hook: Arc<HookDefinition>) {
        debug!(location = %hook.location(), order = hook.order(), "Added after hook");
        self.after_hooks.push(hook);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{HandlerStepDefinition, HookKind};
    use crate::factory::{BoxedObjectFactory, DefaultObjectFactory};
    use crate::handler::HandlerUnit;
    use crate::pattern::CompiledPattern;
    use crate::tag::TagFilter;

    #[derive(Default)]
    struct Steps;

    fn factory() -> BoxedObjectFactory {
        Arc::new(DefaultObjectFactory::new())
    }

    fn step(name: &str, pattern: &str) -> BoxedStepDefinition {
        Arc::new(HandlerStepDefinition::new(
            Arc::new(HandlerUnit::new::<Steps, _>(name, |_, _| Ok(()))),
            CompiledPattern::compile(pattern).unwrap(),
            None,
            factory(),
        ))
    }

    fn hook(name: &str, order: i32, tags: &[&str]) -> Arc<HookDefinition> {
        Arc::new(HookDefinition::new(
            Arc::new(HandlerUnit::new::<Steps, _>(name, |_, _| Ok(()))),
            TagFilter::new(tags.iter().copied()),
            order,
            None,
            HookKind::Before,
            factory(),
        ))
    }

    fn names(hooks: &[Arc<HookDefinition>]) -> Vec<String> {
        hooks.iter().map(|h| h.handler().name().to_string()).collect()
    }

    #[test]
    fn test_resolve_exact_match() {
        let mut glue = GlueRegistry::new();
        glue.add_step_definition(step("cukes", r"^I have (\d+) cukes$")).unwrap();
        glue.add_step_definition(step("apples", r"^I have (\d+) apples$")).unwrap();

        let found = glue.resolve_step("I have 5 cukes").unwrap().unwrap();
        assert!(found.definition().location().ends_with("Steps::cukes"));
        assert_eq!(found.arguments()[0].value(), Some("5"));

        assert!(glue.resolve_step("I have 5 bananas").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_pattern_names_both_handlers() {
        let mut glue = GlueRegistry::new();
        glue.add_step_definition(step("first", "^I wait$")).unwrap();

        let err = glue.add_step_definition(step("second", "^I wait$")).unwrap_err();
        match err {
            GlueError::DuplicateStepDefinition {
                pattern,
                existing,
                duplicate,
            } => {
                assert_eq!(pattern, "^I wait$");
                assert!(existing.ends_with("Steps::first"));
                assert!(duplicate.ends_with("Steps::second"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(glue.step_count(), 1);
    }

    #[test]
    fn test_ambiguous_match_is_reported_on_resolution() {
        let mut glue = GlueRegistry::new();
        glue.add_step_definition(step("digits", r"^I have (\d+) cukes$")).unwrap();
        glue.add_step_definition(step("words", r"^I have (\w+) cukes$")).unwrap();

        let err = glue.resolve_step("I have 5 cukes").unwrap_err();
        assert_eq!(err.step, "I have 5 cukes");
        assert_eq!(err.candidates.len(), 2);
        assert!(glue.resolve_step("I have five cukes").unwrap().is_some());
        assert_eq!(glue.match_steps("I have 5 cukes").len(), 2);
    }

    #[test]
    fn test_hooks_sorted_stably() {
        let mut glue = GlueRegistry::new();
        glue.add_before_hook(hook("h1", 5, &[]));
        glue.add_before_hook(hook("h2", 5, &[]));
        glue.add_before_hook(hook("h3", 1, &[]));

        let ordered = glue.before_hooks_for(&["@any"]);
        assert_eq!(names(&ordered), ["h3", "h1", "h2"]);
    }

    #[test]
    fn test_hooks_filtered_by_tags() {
        let mut glue = GlueRegistry::new();
        glue.add_after_hook(hook("db", HookDefinition::DEFAULT_ORDER, &["@db"]));
        glue.add_after_hook(hook("always", HookDefinition::DEFAULT_ORDER, &[]));
        glue.add_after_hook(hook("first", 0, &["~@wip"]));

        assert_eq!(names(&glue.after_hooks_for(&["@db"])), ["first", "db", "always"]);
        assert_eq!(names(&glue.after_hooks_for(&["@wip"])), ["always"]);
        assert!(glue.before_hooks_for::<&str>(&[]).is_empty());
    }
}
