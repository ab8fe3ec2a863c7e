//! Glue discovery.
//!
//! A [`GlueSource`] turns a set of search roots into `(marker, handler unit)`
//! pairs, one per glue marker, in a deterministic order. Two sources ship here:
//!
//! - [`LinkedGlue`] collects units registered at link time with
//!   [`weft_glue!`](crate::weft_glue) and keeps those whose declaring type lives
//!   under one of the search roots (module paths such as `my_tests::steps`).
//! - [`StaticGlue`] serves an explicit list of units and ignores search roots.
//!
//! ```rust,ignore
//! use weft_core::{HandlerUnit, weft_glue};
//! use weft_core::marker::markers::GIVEN;
//!
//! weft_glue! {
//!     I_HAVE_CUKES => HandlerUnit::new::<Belly, _>("i_have_cukes", |_, _| Ok(()))
//!         .marked(GIVEN.matching(r"^I have (\d+) cukes$"));
//! }
//! ```

use std::sync::Arc;

use linkme::distributed_slice;
use tracing::debug;

use crate::error::DiscoveryError;
use crate::handler::HandlerUnit;
use crate::marker::Marker;

/// A discovered glue marker and the unit carrying it.
pub type DiscoveredGlue = (Marker, Arc<HandlerUnit>);

/// Produces glue for a set of search roots.
pub trait GlueSource: Send + Sync {
    /// Discovers the glue under `glue_paths`.
    fn discover(&self, glue_paths: &[String]) -> Result<Vec<DiscoveredGlue>, DiscoveryError>;
}

/// Units contributed by [`weft_glue!`](crate::weft_glue).
#[distributed_slice]
pub static GLUE_UNITS: [fn() -> HandlerUnit];

/// Registers handler units at link time.
///
/// Each entry becomes a `static` in the linked glue registry; the names only
/// need to be unique within the invoking module.
#[macro_export]
macro_rules! weft_glue {
    ($($name:ident => $unit:expr;)+) => {
        $(
            #[$crate::linkme::distributed_slice($crate::discovery::GLUE_UNITS)]
            #[linkme(crate = $crate::linkme)]
            static $name: fn() -> $crate::HandlerUnit = || $unit;
        )+
    };
}

/// Expands units into one pair per glue marker, keeping unit and marker order.
pub fn glue_pairs<I>(units: I) -> Vec<DiscoveredGlue>
where
    I: IntoIterator<Item = Arc<HandlerUnit>>,
{
    units
        .into_iter()
        .flat_map(|unit| {
            unit.markers()
                .iter()
                .filter(|marker| marker.role().is_glue())
                .map(|marker| (marker.clone(), Arc::clone(&unit)))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Discovers units registered with [`weft_glue!`](crate::weft_glue).
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkedGlue;

impl LinkedGlue {
    /// Creates the linked glue source.
    pub fn new() -> Self {
        Self
    }

    /// Returns the number of units linked into the binary.
    pub fn linked_count() -> usize {
        GLUE_UNITS.len()
    }
}

impl GlueSource for LinkedGlue {
    fn discover(&self, glue_paths: &[String]) -> Result<Vec<DiscoveredGlue>, DiscoveryError> {
        validate_paths(glue_paths)?;

        let mut units: Vec<Arc<HandlerUnit>> = GLUE_UNITS
            .iter()
            .map(|build| build())
            .filter(|unit| {
                glue_paths
                    .iter()
                    .any(|root| is_under(unit.module_path(), root))
            })
            .map(Arc::new)
            .collect();
        // Link order is unspecified.
        units.sort_by(|a, b| {
            (a.module_path(), a.name()).cmp(&(b.module_path(), b.name()))
        });

        debug!(
            roots = ?glue_paths,
            linked = GLUE_UNITS.len(),
            discovered = units.len(),
            "Discovered linked glue"
        );
        Ok(glue_pairs(units))
    }
}

fn validate_paths(glue_paths: &[String]) -> Result<(), DiscoveryError> {
    if glue_paths.is_empty() {
        return Err(DiscoveryError::NoGluePaths);
    }
    for path in glue_paths {
        if path.trim().is_empty() {
            return Err(DiscoveryError::InvalidPath {
                path: path.clone(),
                reason: "path is blank".to_string(),
            });
        }
        if path.chars().any(char::is_whitespace) {
            return Err(DiscoveryError::InvalidPath {
                path: path.clone(),
                reason: "path contains whitespace".to_string(),
            });
        }
    }
    Ok(())
}

/// Returns whether `module` is `root` or nested inside it.
fn is_under(module: &str, root: &str) -> bool {
    let root = root.trim_end_matches("::");
    match module.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with("::"),
        None => false,
    }
}

/// Serves an explicit list of units.
#[derive(Debug, Default, Clone)]
pub struct StaticGlue {
    units: Vec<Arc<HandlerUnit>>,
}

impl StaticGlue {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit (builder pattern).
    pub fn with(mut self, unit: HandlerUnit) -> Self {
        self.units.push(Arc::new(unit));
        self
    }

    /// Adds a unit.
    pub fn add(&mut self, unit: HandlerUnit) {
        self.units.push(Arc::new(unit));
    }

    /// Returns the number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true if the source has no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl GlueSource for StaticGlue {
    fn discover(&self, _glue_paths: &[String]) -> Result<Vec<DiscoveredGlue>, DiscoveryError> {
        Ok(glue_pairs(self.units.iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::MarkerType;
    use crate::marker::markers::{BEFORE, GIVEN, ORDER};

    static SLOW: MarkerType = MarkerType::pointcut("Slow");

    #[derive(Default)]
    struct Steps;

    #[test]
    fn test_is_under() {
        assert!(is_under("app::steps", "app"));
        assert!(is_under("app::steps", "app::steps"));
        assert!(is_under("app::steps", "app::"));
        assert!(!is_under("application::steps", "app"));
        assert!(!is_under("app", "app::steps"));
    }

    #[test]
    fn test_paths_are_validated() {
        assert!(matches!(
            LinkedGlue::new().discover(&[]),
            Err(DiscoveryError::NoGluePaths)
        ));
        assert!(matches!(
            LinkedGlue::new().discover(&["my steps".to_string()]),
            Err(DiscoveryError::InvalidPath { .. })
        ));
        assert!(matches!(
            LinkedGlue::new().discover(&["  ".to_string()]),
            Err(DiscoveryError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_pairs_skip_non_glue_markers() {
        let source = StaticGlue::new()
            .with(
                HandlerUnit::new::<Steps, _>("slow_step", |_, _| Ok(()))
                    .marked(GIVEN.matching("^a$"))
                    .marked(SLOW.marker()),
            )
            .with(
                HandlerUnit::new::<Steps, _>("setup", |_, _| Ok(()))
                    .marked(ORDER.marker().with_order(1))
                    .marked(BEFORE.marker()),
            );

        let pairs = source.discover(&[]).unwrap();
        let seen: Vec<(&str, &str)> = pairs
            .iter()
            .map(|(marker, unit)| (marker.name(), unit.name()))
            .collect();
        assert_eq!(seen, vec![("Given", "slow_step"), ("Before", "setup")]);
    }
}
