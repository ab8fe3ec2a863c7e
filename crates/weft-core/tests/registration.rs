use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use parking_lot::Mutex;
use weft_core::marker::markers::{AROUND, BEFORE, GIVEN, ORDER, THEN, WHEN};
use weft_core::prelude::*;
use weft_core::{GlueError, ObjectFactory, PatternError};

static CACHED: MarkerType = MarkerType::pointcut("Cached");
static AUDITED: MarkerType = MarkerType::pointcut("Audited");
static NOTE: MarkerType = MarkerType::new("Note", weft_core::MarkerRole::Plain);

#[derive(Default)]
struct Kitchen {
    log: Mutex<Vec<String>>,
    cukes: AtomicUsize,
}

impl Kitchen {
    fn record(&self, entry: impl Into<String>) {
        self.log.lock().push(entry.into());
    }
}

fn paths() -> Vec<String> {
    vec!["registration".to_string()]
}

fn noop(name: &str) -> HandlerUnit {
    HandlerUnit::new::<Kitchen, _>(name, |_, _| Ok(()))
}

fn advised_patterns(glue: &GlueRegistry) -> Vec<String> {
    glue.step_definitions()
        .iter()
        .filter(|definition| definition.is_advised())
        .map(|definition| definition.pattern().to_string())
        .collect()
}

#[test]
fn test_advice_reaches_only_marked_steps() {
    let mut glue = GlueRegistry::new();
    let mut backend = Backend::new(Arc::new(DefaultObjectFactory::new()));
    let source = StaticGlue::new()
        .with(noop("s1").marked(GIVEN.matching("^s1$")).marked(CACHED.marker()))
        .with(noop("s2").marked(WHEN.matching("^s2$")).marked(AUDITED.marker()))
        .with(noop("s3").marked(THEN.matching("^s3$")).marked(NOTE.marker()))
        .with(
            noop("advice")
                .marked(AROUND.matching("^(.*) again$").with_pointcuts([&CACHED, &AUDITED])),
        );

    backend.load_glue(&mut glue, &source, &paths()).unwrap();

    assert_eq!(
        advised_patterns(&glue),
        ["^(.*) again$ ⊃ ^s1$", "^(.*) again$ ⊃ ^s2$"]
    );
    let plain: Vec<&str> = glue
        .step_definitions()
        .iter()
        .filter(|definition| !definition.is_advised())
        .map(|definition| definition.pattern())
        .collect();
    assert_eq!(plain, ["^s1$", "^s2$", "^s3$"]);

    assert!(glue.resolve_step("s1 again").unwrap().is_some());
    assert!(glue.resolve_step("s2 again").unwrap().is_some());
    assert!(glue.resolve_step("s3 again").unwrap().is_none());
    assert!(glue.resolve_step("s3").unwrap().is_some());
}

#[test]
fn test_end_to_end_resolution_and_execution() {
    let factory = Arc::new(DefaultObjectFactory::new());
    let mut glue = GlueRegistry::new();
    let mut backend = Backend::new(factory.clone());
    let source = StaticGlue::new()
        .with(
            HandlerUnit::new::<Kitchen, _>("have_cukes", |kitchen, call| {
                let n = call
                    .arg(0)
                    .unwrap_or("0")
                    .parse()
                    .map_err(|_| HandlerError::failed("not a number"))?;
                kitchen.cukes.store(n, Ordering::SeqCst);
                Ok(())
            })
            .marked(GIVEN.matching(r"^I have (\d+) cukes$")),
        )
        .with(noop("have_apples").marked(GIVEN.matching(r"^I have (\d+) apples$")));

    backend.load_glue(&mut glue, &source, &paths()).unwrap();

    let found = glue.resolve_step("I have 5 cukes").unwrap().unwrap();
    assert!(found.definition().location().ends_with("Kitchen::have_cukes"));
    assert!(glue.resolve_step("I have 5 bananas").unwrap().is_none());

    backend.build_world();
    found.execute().unwrap();
    let instance = factory.instance(&GlueType::of::<Kitchen>()).unwrap();
    let kitchen = instance.downcast_ref::<Kitchen>().unwrap();
    assert_eq!(kitchen.cukes.load(Ordering::SeqCst), 5);
    backend.dispose_world();

    assert!(matches!(
        found.execute(),
        Err(HandlerError::InstanceUnavailable { .. })
    ));
}

#[test]
fn test_invalid_advice_rolls_back_whole_batch() {
    let mut glue = GlueRegistry::new();
    let mut backend = Backend::new(Arc::new(DefaultObjectFactory::new()));
    let source = StaticGlue::new()
        .with(noop("s1").marked(GIVEN.matching("^one$")))
        .with(noop("s2").marked(GIVEN.matching("^two$")))
        .with(noop("s3").marked(GIVEN.matching("^three$")))
        .with(noop("invalid").marked(AROUND.matching("^(.*)!$").with_pointcuts([&NOTE])));

    let err = backend.load_glue(&mut glue, &source, &paths()).unwrap_err();

    match err {
        GlueError::InvalidPointcut { handler, marker } => {
            assert_eq!(marker, "Note");
            assert!(handler.ends_with("Kitchen::invalid"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(glue.step_count(), 0);
    assert!(glue.resolve_step("one").unwrap().is_none());
}

#[test]
fn test_second_round_weaves_each_pair_once() {
    let mut glue = GlueRegistry::new();
    let mut backend = Backend::new(Arc::new(DefaultObjectFactory::new()));

    let first = StaticGlue::new()
        .with(noop("early").marked(GIVEN.matching("^early$")).marked(CACHED.marker()))
        .with(noop("retry").marked(AROUND.matching("^(.*) again$").with_pointcuts([&CACHED])));
    backend.load_glue(&mut glue, &first, &paths()).unwrap();
    assert_eq!(advised_patterns(&glue), ["^(.*) again$ ⊃ ^early$"]);

    let second = StaticGlue::new()
        .with(noop("late").marked(WHEN.matching("^late$")).marked(CACHED.marker()));
    backend.load_glue(&mut glue, &second, &paths()).unwrap();

    assert_eq!(
        advised_patterns(&glue),
        ["^(.*) again$ ⊃ ^early$", "^(.*) again$ ⊃ ^late$"]
    );
    assert_eq!(backend.stats().woven, 2);
}

#[test]
fn test_hooks_run_in_declared_order() {
    let factory = Arc::new(DefaultObjectFactory::new());
    let mut glue = GlueRegistry::new();
    let mut backend = Backend::new(factory.clone());

    let hook = |name: &'static str| {
        HandlerUnit::new::<Kitchen, _>(name, move |kitchen, _| {
            kitchen.record(name);
            Ok(())
        })
    };
    let source = StaticGlue::new()
        .with(hook("h1").marked(BEFORE.marker()).marked(ORDER.marker().with_order(5)))
        .with(hook("h2").marked(BEFORE.marker()).marked(ORDER.marker().with_order(5)))
        .with(hook("h3").marked(BEFORE.marker()).marked(ORDER.marker().with_order(1)))
        .with(hook("db_only").marked(BEFORE.marker().with_tags(["@db"])));

    backend.load_glue(&mut glue, &source, &paths()).unwrap();
    backend.build_world();

    for hook in glue.before_hooks_for(&["@smoke"]) {
        hook.execute().unwrap();
    }
    let instance = factory.instance(&GlueType::of::<Kitchen>()).unwrap();
    let kitchen = instance.downcast_ref::<Kitchen>().unwrap();
    assert_eq!(*kitchen.log.lock(), ["h3", "h1", "h2"]);
}

#[test]
fn test_broken_pattern_aborts_loading() {
    let mut glue = GlueRegistry::new();
    let mut backend = Backend::new(Arc::new(DefaultObjectFactory::new()));
    let source = StaticGlue::new()
        .with(noop("fine").marked(GIVEN.matching("^fine$")))
        .with(noop("broken").marked(WHEN.matching("^I have [unclosed$")));

    let err = backend.load_glue(&mut glue, &source, &paths()).unwrap_err();

    assert!(matches!(
        err,
        GlueError::PatternCompilation {
            source: PatternError::Syntax { .. },
            ..
        }
    ));
    assert_eq!(glue.step_count(), 0);
}

#[test]
fn test_concurrent_resolution_after_loading() {
    let mut glue = GlueRegistry::new();
    let mut backend = Backend::new(Arc::new(DefaultObjectFactory::new()));
    let source = StaticGlue::new()
        .with(noop("cukes").marked(GIVEN.matching(r"^I have (\d+) cukes$")))
        .with(noop("eat").marked(WHEN.matching(r"^I eat (\d+) cukes$")));
    backend.load_glue(&mut glue, &source, &paths()).unwrap();

    let glue = Arc::new(glue);
    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let glue = Arc::clone(&glue);
            thread::spawn(move || {
                for n in 0..50 {
                    let text = format!("I have {} cukes", worker * 100 + n);
                    let found = glue.resolve_step(&text).unwrap().unwrap();
                    assert_eq!(
                        found.arguments()[0].value(),
                        Some((worker * 100 + n).to_string().as_str())
                    );
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
}
