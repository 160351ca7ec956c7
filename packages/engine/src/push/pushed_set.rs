//! Request-scoped set of targets already pushed, announced, or visited

use dashmap::DashSet;

/// Deduplication and cycle guard for one client request
#[derive(Debug, Default)]
pub struct PushedSet {
    targets: DashSet<String>,
}

impl PushedSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a target; false when it was already present
    pub fn insert(&self, target: &str) -> bool {
        self.targets.insert(target.to_owned())
    }

    #[must_use]
    pub fn contains(&self, target: &str) -> bool {
        self.targets.contains(target)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
