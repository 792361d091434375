/*!
 * Request Arena Sweep
 * End-of-request bulk reclamation for registered wrappers
 *
 * Bulk request-memory reclamation may run before ordinary reference-count
 * destruction; the arena guarantees sweep() runs first, and whichever of
 * sweep/drop reaches a wrapper first invalidates the other.
 */

use super::Reap;
use log::info;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Instant;

fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// Statistics for one sweep pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SweepStats {
    /// Registrations examined (live or not)
    #[serde(default, skip_serializing_if = "is_zero")]
    pub registered: usize,
    /// Wrappers actually reaped
    #[serde(default, skip_serializing_if = "is_zero")]
    pub reaped: usize,
    /// Materialized values released
    #[serde(default, skip_serializing_if = "is_zero")]
    pub values_released: usize,
    /// Wall time of the pass in microseconds
    #[serde(default, skip_serializing_if = "is_zero")]
    pub duration_us: usize,
}

/// Process-wide sweep totals across all requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SweepTotals {
    pub sweeps: usize,
    pub reaped: usize,
    pub values_released: usize,
}

static TOTALS: RwLock<SweepTotals> = RwLock::new(SweepTotals {
    sweeps: 0,
    reaped: 0,
    values_released: 0,
});

/// Snapshot of the process-wide sweep totals
pub fn global_totals() -> SweepTotals {
    TOTALS.read().clone()
}

/// Token returned by [`RequestArena::register`]
///
/// Single-use: consumed by `unregister`, or invalidated wholesale when the
/// arena sweeps. Deliberately neither `Clone` nor `Copy`.
#[derive(Debug)]
pub struct SweepToken {
    slot: usize,
}

/// The request allocator's end-of-request cleanup list
///
/// Confined to one request's thread; registrations are weak, so a wrapper
/// destroyed by ordinary reference counting simply vanishes from the list.
/// `sweep()` reaps whatever is still alive.
pub struct RequestArena {
    registered: RefCell<Vec<Option<Weak<RefCell<dyn Reap>>>>>,
    recycled: RefCell<Vec<usize>>,
}

impl RequestArena {
    /// Create an arena for one request
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            registered: RefCell::new(Vec::new()),
            recycled: RefCell::new(Vec::new()),
        })
    }

    /// Register an object for deferred cleanup
    pub fn register<T: Reap + 'static>(&self, target: &Rc<RefCell<T>>) -> SweepToken {
        let weak = Rc::downgrade(target) as Weak<RefCell<dyn Reap>>;
        let mut registered = self.registered.borrow_mut();
        let slot = match self.recycled.borrow_mut().pop() {
            Some(slot) => {
                registered[slot] = Some(weak);
                slot
            }
            None => {
                registered.push(Some(weak));
                registered.len() - 1
            }
        };
        SweepToken { slot }
    }

    /// Drop a registration (ordinary destruction got there first)
    ///
    /// Tolerates tokens whose slot was already drained by `sweep()`.
    pub fn unregister(&self, token: SweepToken) {
        let mut registered = self.registered.borrow_mut();
        if let Some(slot) = registered.get_mut(token.slot) {
            if slot.take().is_some() {
                self.recycled.borrow_mut().push(token.slot);
            }
        }
    }

    /// Count of live registrations
    pub fn registered_count(&self) -> usize {
        self.registered
            .borrow()
            .iter()
            .flatten()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Reap every still-registered wrapper
    ///
    /// The list is drained up front so that reaping (which drops values and
    /// may tear down nested wrappers) can re-enter register/unregister
    /// without deadlocking on the list.
    pub fn sweep(&self) -> SweepStats {
        let start = Instant::now();
        let drained = {
            let mut registered = self.registered.borrow_mut();
            self.recycled.borrow_mut().clear();
            std::mem::take(&mut *registered)
        };

        let mut stats = SweepStats::default();
        for weak in drained.into_iter().flatten() {
            stats.registered += 1;
            if let Some(cell) = weak.upgrade() {
                if let Some(released) = cell.borrow_mut().reap() {
                    stats.reaped += 1;
                    stats.values_released += released;
                }
            }
        }
        stats.duration_us = start.elapsed().as_micros() as usize;

        {
            let mut totals = TOTALS.write();
            totals.sweeps += 1;
            totals.reaped += stats.reaped;
            totals.values_released += stats.values_released;
        }

        info!(
            "arena sweep: reaped {} of {} registered, released {} values in {}us",
            stats.reaped, stats.registered, stats.values_released, stats.duration_us
        );
        stats
    }
}
