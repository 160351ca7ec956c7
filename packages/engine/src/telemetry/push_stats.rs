//! Push decision statistics with cache-padded atomic counters
//!
//! Every counter sits on its own cache line; concurrent pushed sub-requests
//! update them without contending with each other.

use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

/// Process-wide push decision counters
#[derive(Debug, Default)]
pub struct PushStats {
    /// Documents processed with at least one selector
    pub documents: CachePadded<AtomicUsize>,
    /// Push promises accepted by the transport
    pub pushes: CachePadded<AtomicUsize>,
    /// Targets announced with a `Link` header
    pub links: CachePadded<AtomicUsize>,
    /// Targets skipped because they were already pushed or announced
    pub deduplicated: CachePadded<AtomicUsize>,
    /// Preload matches that did not resolve to a relation
    pub not_relations: CachePadded<AtomicUsize>,
    /// Push promises the transport refused
    pub push_failures: CachePadded<AtomicUsize>,
}

/// Immutable snapshot of [`PushStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushStatsSnapshot {
    pub documents: usize,
    pub pushes: usize,
    pub links: usize,
    pub deduplicated: usize,
    pub not_relations: usize,
    pub push_failures: usize,
}

impl PushStats {
    #[inline]
    pub fn record_document(&self) {
        self.documents.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_push(&self) {
        self.pushes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_link(&self) {
        self.links.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_deduplicated(&self) {
        self.deduplicated.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_not_relation(&self) {
        self.not_relations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_push_failure(&self) {
        self.push_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter with relaxed ordering
    ///
    /// Counters are read one by one, so a snapshot taken while requests are
    /// in flight may mix values from slightly different instants.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> PushStatsSnapshot {
        PushStatsSnapshot {
            documents: self.documents.load(Ordering::Relaxed),
            pushes: self.pushes.load(Ordering::Relaxed),
            links: self.links.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
            not_relations: self.not_relations.load(Ordering::Relaxed),
            push_failures: self.push_failures.load(Ordering::Relaxed),
        }
    }
}

impl PushStatsSnapshot {
    /// Relations either pushed or announced
    #[inline]
    #[must_use]
    pub fn preloaded(&self) -> usize {
        self.pushes + self.links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_recorded_events() {
        let stats = PushStats::default();
        stats.record_document();
        stats.record_push();
        stats.record_push();
        stats.record_link();
        stats.record_push_failure();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.documents, 1);
        assert_eq!(snapshot.pushes, 2);
        assert_eq!(snapshot.links, 1);
        assert_eq!(snapshot.push_failures, 1);
        assert_eq!(snapshot.preloaded(), 3);
    }
}
