/*!
 * Shared Module
 * Immutable cross-request arrays and the process-wide store
 */

pub mod array;
pub mod store;

pub use array::{SharedArray, SharedValue};
pub use store::SharedStore;
