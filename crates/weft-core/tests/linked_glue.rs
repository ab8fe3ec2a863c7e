use std::sync::Arc;

use weft_core::prelude::*;
use weft_core::{DiscoveryError, GlueError, GlueSource};

mod steps {
    use weft_core::prelude::*;

    pub static SLOW: MarkerType = MarkerType::pointcut("Slow");

    #[derive(Default)]
    pub struct Belly;

    weft_glue! {
        I_HAVE_CUKES => HandlerUnit::new::<Belly, _>("i_have_cukes", |_, _| Ok(()))
            .marked(GIVEN.matching(r"^I have (\d+) cukes$"))
            .marked(SLOW.marker());
        I_WAIT => HandlerUnit::new::<Belly, _>("i_wait", |_, _| Ok(()))
            .marked(WHEN.matching(r"^I wait (\d+) hours?$"));
        CLEAN_UP => HandlerUnit::new::<Belly, _>("clean_up", |_, _| Ok(()))
            .marked(AFTER.marker());
    }

    pub mod advice {
        use super::SLOW;
        use weft_core::prelude::*;

        #[derive(Default)]
        pub struct Patience;

        weft_glue! {
            SLOWLY => HandlerUnit::new::<Patience, _>("slowly", |_, call| call.proceed())
                .marked(AROUND.matching("^(.*) slowly$").with_pointcuts([&SLOW]));
        }
    }
}

mod elsewhere {
    use weft_core::prelude::*;

    #[derive(Default)]
    pub struct Stray;

    weft_glue! {
        STRAY => HandlerUnit::new::<Stray, _>("stray", |_, _| Ok(()))
            .marked(THEN.matching("^stray$"));
    }
}

#[test]
fn test_linked_units_are_filtered_by_root() {
    let found = LinkedGlue::new()
        .discover(&["linked_glue::steps".to_string()])
        .unwrap();

    let names: Vec<&str> = found.iter().map(|(_, unit)| unit.name()).collect();
    // Sorted by module path, then name.
    assert_eq!(names, ["clean_up", "i_have_cukes", "i_wait", "slowly"]);
    assert!(LinkedGlue::linked_count() >= 5);
}

#[test]
fn test_linked_glue_loads_and_weaves() {
    let mut glue = GlueRegistry::new();
    let mut backend = Backend::new(Arc::new(DefaultObjectFactory::new()));

    backend
        .load_glue(&mut glue, &LinkedGlue::new(), &["linked_glue::steps".to_string()])
        .unwrap();

    assert_eq!(glue.step_count(), 3);
    assert_eq!(glue.after_hook_count(), 1);
    assert!(glue.resolve_step("I have 3 cukes slowly").unwrap().is_some());
    assert!(glue.resolve_step("I wait 1 hour slowly").unwrap().is_none());
    assert!(glue.resolve_step("stray").unwrap().is_none());
}

#[test]
fn test_missing_roots_fail_discovery() {
    let mut glue = GlueRegistry::new();
    let mut backend = Backend::new(Arc::new(DefaultObjectFactory::new()));

    let err = backend
        .load_glue(&mut glue, &LinkedGlue::new(), &[])
        .unwrap_err();
    assert!(matches!(err, GlueError::Discovery(DiscoveryError::NoGluePaths)));
}
