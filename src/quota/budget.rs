//! Budget accounting for one harvesting session

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Units charged for a single page request of any resource kind
pub const PAGE_COST: u64 = 1;

/// Units left in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    /// Ordinary counting applies
    Units(u64),

    /// The remote side reported the quota exhausted; treated as zero
    Exhausted,
}

impl Remaining {
    /// Units that may still be spent, zero when exhausted
    pub fn units(&self) -> u64 {
        match self {
            Self::Units(units) => *units,
            Self::Exhausted => 0,
        }
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Units(units) => write!(f, "{} units", units),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// Result of charging the budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charge {
    /// Units were debited
    Charged { remaining: u64 },

    /// The budget is latched exhausted; nothing was debited
    Exhausted,
}

#[derive(Debug)]
struct BudgetState {
    remaining: AtomicU64,
    exhausted: AtomicBool,
}

/// Shared unit counter for a session
///
/// Clones share the same counter and latch, so the driver, the harvester
/// and discovery all observe one budget. Deduction is lock-free;
/// `try_reserve` is a compare-and-deduct that never overdraws.
#[derive(Debug, Clone)]
pub struct QuotaBudget {
    state: Arc<BudgetState>,
}

impl QuotaBudget {
    /// Creates a budget holding `units`
    pub fn new(units: u64) -> Self {
        Self {
            state: Arc::new(BudgetState {
                remaining: AtomicU64::new(units),
                exhausted: AtomicBool::new(false),
            }),
        }
    }

    /// Units left, or `Exhausted` once the latch is set
    pub fn remaining(&self) -> Remaining {
        if self.is_exhausted() {
            Remaining::Exhausted
        } else {
            Remaining::Units(self.state.remaining.load(Ordering::Acquire))
        }
    }

    /// Debits units that were already spent
    ///
    /// Charging more than remains saturates at zero.
    pub fn charge(&self, units: u64) -> Charge {
        if self.is_exhausted() {
            return Charge::Exhausted;
        }

        let mut current = self.state.remaining.load(Ordering::Acquire);
        loop {
            let next = current.saturating_sub(units);
            match self.state.remaining.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    if units > current {
                        tracing::warn!(
                            "Charged {} units with only {} remaining; budget clamped to zero",
                            units,
                            current
                        );
                    }
                    return Charge::Charged { remaining: next };
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Atomically deducts `units` only if they are all available
    ///
    /// Returns false, leaving the budget untouched, when fewer units remain
    /// or the budget is exhausted.
    pub fn try_reserve(&self, units: u64) -> bool {
        if self.is_exhausted() {
            return false;
        }

        self.state
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_sub(units)
            })
            .is_ok()
    }

    /// Returns reserved units whose request was never served
    pub fn release(&self, units: u64) {
        let _ = self
            .state
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(units))
            });
    }

    /// Latches the exhausted state for the rest of the session
    pub fn mark_exhausted(&self) {
        if !self.state.exhausted.swap(true, Ordering::AcqRel) {
            tracing::error!("Quota reported exhausted by the service; stopping all requests");
        }
    }

    /// Returns true once the remote side has reported exhaustion
    pub fn is_exhausted(&self) -> bool {
        self.state.exhausted.load(Ordering::Acquire)
    }

    /// Returns true when no further request may be funded
    pub fn is_depleted(&self) -> bool {
        self.remaining().units() == 0
    }
}
