/*!
 * Shared Array Library
 * Request-local copy-on-write views over process-shared immutable arrays
 *
 * A shared array is built once and read by unboundedly many concurrent
 * requests. Each request wraps it in an [`ArrayHandle`]: reads resolve
 * through a lazily populated per-request cache, the first mutation
 * escalates to an independent fully mutable array, and the request arena
 * reaps whatever reference counting has not already reclaimed.
 */

pub mod core;
pub mod gc;
pub mod local;
pub mod shared;
pub mod value;

// Re-exports
pub use crate::core::{ArrayError, ArrayResult, InlineString, Key, Pos};
pub use gc::{global_totals, Reap, RequestArena, Scanner, SweepStats, SweepToken, SweepTotals, Trace};
pub use local::{ArrayHandle, ArrayIter, FullLocalArray, LocalCache, LocalWrapper};
pub use shared::{SharedArray, SharedStore, SharedValue};
pub use value::{FlatValue, Value};
