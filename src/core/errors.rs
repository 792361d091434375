/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::core::data_structures::InlineString;
use crate::core::types::Key;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Array operation result
pub type ArrayResult<T> = Result<T, ArrayError>;

/// Array errors with serialization support
///
/// Absent keys are not errors: lookups return `Option::None`. Invariant
/// violations (cache/backing length mismatch, use after reap) are logic
/// bugs and assert instead of returning a recoverable error.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ArrayError {
    #[error("Duplicate key in shared array: {0}")]
    #[diagnostic(
        code(shared_array::duplicate_key),
        help("Shared array entries must have unique keys. Canonical integer strings (\"7\") collide with their integer form (7).")
    )]
    DuplicateKey(Key),

    #[error("Store entry already exists: {0}")]
    #[diagnostic(
        code(shared_array::already_stored),
        help("Use insert() to overwrite an existing store entry, or pick a different name.")
    )]
    AlreadyStored(InlineString),
}
