/*!
 * Data Structures
 * Specialized containers shared across the crate
 */

mod inline_string;

pub use inline_string::InlineString;
