//! Per-request push budget
//!
//! Lock-free counter with a ceiling: `-1` grants every request, `0` grants
//! none, `N > 0` grants exactly `N` across all threads sharing the budget.

use std::sync::atomic::{AtomicI64, Ordering};

use crossbeam_utils::CachePadded;

/// Ceiling value meaning "no limit"
pub const UNLIMITED: i64 = -1;

/// Maximum number of pushes for one client request
#[derive(Debug)]
pub struct PushBudget {
    ceiling: i64,
    granted: CachePadded<AtomicI64>,
}

impl PushBudget {
    /// Create a budget; any negative ceiling other than `-1` disables pushing
    #[must_use]
    pub fn new(ceiling: i64) -> Self {
        let ceiling = if ceiling < UNLIMITED { 0 } else { ceiling };
        Self {
            ceiling,
            granted: CachePadded::new(AtomicI64::new(0)),
        }
    }

    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(UNLIMITED)
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Take one push from the budget
    ///
    /// Linearizable: concurrent callers never obtain more grants than the
    /// ceiling allows.
    pub fn try_acquire(&self) -> bool {
        match self.ceiling {
            UNLIMITED => {
                self.granted.fetch_add(1, Ordering::AcqRel);
                true
            }
            0 => false,
            ceiling => self
                .granted
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |granted| {
                    (granted < ceiling).then_some(granted + 1)
                })
                .is_ok(),
        }
    }

    #[inline]
    #[must_use]
    pub fn ceiling(&self) -> i64 {
        self.ceiling
    }

    /// Pushes granted so far
    #[inline]
    #[must_use]
    pub fn granted(&self) -> i64 {
        self.granted.load(Ordering::Acquire)
    }

    /// Pushes left, `None` when unlimited
    #[must_use]
    pub fn remaining(&self) -> Option<i64> {
        (self.ceiling != UNLIMITED).then(|| (self.ceiling - self.granted()).max(0))
    }
}
