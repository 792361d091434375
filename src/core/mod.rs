/*!
 * Core Module
 * Keys, errors, and shared data structures
 */

pub mod data_structures;
pub mod errors;
pub mod types;

// Re-export for convenience
pub use data_structures::InlineString;
pub use errors::{ArrayError, ArrayResult};
pub use types::{Key, Pos};
