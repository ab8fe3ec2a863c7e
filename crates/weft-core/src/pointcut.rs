//! Pointcut resolution and the advice index.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::definition::AdviceDefinition;
use crate::error::{GlueError, GlueResult};
use crate::handler::HandlerUnit;
use crate::marker::{MarkerId, MarkerType};

/// Validates an advice's targets, keeping their declaration order.
///
/// Every target must be flagged as a pointcut; the first one that is not fails
/// the whole advice.
pub fn resolve_pointcuts(
    unit: &HandlerUnit,
    targets: &[&'static MarkerType],
) -> GlueResult<Vec<MarkerId>> {
    targets
        .iter()
        .map(|target| {
            if target.is_pointcut() {
                Ok(target.id())
            } else {
                Err(GlueError::InvalidPointcut {
                    handler: unit.location(),
                    marker: target.name(),
                })
            }
        })
        .collect()
}

/// Advice indexed by the pointcuts it targets.
///
/// Advices are numbered in registration order; the number is stable for the
/// lifetime of the index and identifies the advice when weaving.
#[derive(Debug, Clone, Default)]
pub struct PointcutIndex {
    advices: Vec<Arc<AdviceDefinition>>,
    by_pointcut: IndexMap<MarkerId, Vec<usize>>,
}

impl PointcutIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes an advice under each of its pointcuts and returns its number.
    pub fn insert(&mut self, advice: Arc<AdviceDefinition>) -> usize {
        let number = self.advices.len();
        for pointcut in advice.pointcuts() {
            let numbers = self.by_pointcut.entry(*pointcut).or_default();
            if !numbers.contains(&number) {
                numbers.push(number);
            }
        }
        self.advices.push(advice);
        number
    }

    /// Returns the numbered advices targeting `pointcut`, in registration order.
    pub fn advices_for(
        &self,
        pointcut: MarkerId,
    ) -> impl Iterator<Item = (usize, &Arc<AdviceDefinition>)> + '_ {
        self.by_pointcut
            .get(&pointcut)
            .into_iter()
            .flatten()
            .map(|&number| (number, &self.advices[number]))
    }

    /// Returns the number of indexed advices.
    pub fn len(&self) -> usize {
        self.advices.len()
    }

    /// Returns true if no advice is indexed.
    pub fn is_empty(&self) -> bool {
        self.advices.is_empty()
    }

    /// Returns the pointcuts that have advice, in first-registration order.
    pub fn pointcuts(&self) -> impl Iterator<Item = MarkerId> + '_ {
        self.by_pointcut.keys().copied()
    }
}
