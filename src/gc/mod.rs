/*!
 * Collector Integration
 * Tracing visitor and end-of-request sweep registry
 */

mod sweep;

pub use sweep::{global_totals, RequestArena, SweepStats, SweepToken, SweepTotals};

use crate::value::Value;

/// Visitor the tracing collector hands to [`Trace::trace`]
///
/// Receives each owned outgoing reference of the traced object. Closures
/// work directly: `handle.trace(&mut |v: &Value| { ... })`.
pub trait Scanner {
    fn accept(&mut self, value: &Value);
}

impl<F: FnMut(&Value)> Scanner for F {
    #[inline]
    fn accept(&mut self, value: &Value) {
        self(value)
    }
}

/// Implemented by anything holding request-owned values the collector
/// must follow
///
/// Implementations report exactly the values they own. A wrapper over a
/// shared backing reports only its materialized slots: the backing itself
/// lives outside the request heap under atomic reference counting and is
/// never reported.
pub trait Trace {
    fn trace(&self, scanner: &mut dyn Scanner);
}

/// Deferred end-of-request cleanup, invoked by [`RequestArena::sweep`]
///
/// Returns the number of values released, or `None` if there was nothing
/// to reap (already escalated or already torn down).
pub trait Reap {
    fn reap(&mut self) -> Option<usize>;
}
