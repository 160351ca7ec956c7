//! Request-scoped push state
//!
//! One [`PushContext`] is created per client request and shared, by
//! reference, with every sub-request pushed on its behalf. Nested preloads
//! therefore draw from the same budget and the same deduplication set.

use std::sync::Arc;

use super::budget::PushBudget;
use super::pushed_set::PushedSet;
use crate::telemetry::PushStats;

#[derive(Debug)]
pub struct PushContext {
    budget: PushBudget,
    pushed: PushedSet,
    max_depth: Option<usize>,
    stats: Arc<PushStats>,
}

impl PushContext {
    #[must_use]
    pub fn new(max_pushes: i64, max_depth: Option<usize>, stats: Arc<PushStats>) -> Self {
        Self {
            budget: PushBudget::new(max_pushes),
            pushed: PushedSet::new(),
            max_depth,
            stats,
        }
    }

    /// Context with an unlimited budget, no depth limit and private statistics
    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(super::budget::UNLIMITED, None, Arc::new(PushStats::default()))
    }

    #[inline]
    #[must_use]
    pub fn budget(&self) -> &PushBudget {
        &self.budget
    }

    #[inline]
    #[must_use]
    pub fn pushed(&self) -> &PushedSet {
        &self.pushed
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> &PushStats {
        &self.stats
    }

    /// Whether a sub-request at `depth` may push further resources
    ///
    /// The client request is depth 0, a resource it pushes is depth 1.
    #[inline]
    #[must_use]
    pub fn allows_depth(&self, depth: usize) -> bool {
        self.max_depth.is_none_or(|max| depth < max)
    }
}
