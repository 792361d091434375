/*!
 * Local Module
 * Request-local array representations: shared wrapper and full array
 */

pub mod cache;
pub mod full;
pub mod handle;
pub mod wrapper;

pub use cache::{LocalCache, Slot};
pub use full::FullLocalArray;
pub use handle::{ArrayHandle, ArrayIter};
pub use wrapper::LocalWrapper;
