/*!
 * Core Types
 * Array keys and positions shared by every array representation
 */

use crate::core::data_structures::InlineString;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Position of an entry inside an array, in `[0, len)`
pub type Pos = usize;

/// Array key: either an integer or a string
///
/// String keys that spell a canonical decimal integer ("7", "-3") are the
/// same key as their integer form, so they are folded into `Key::Int` at
/// construction. "07", "1.0", or "1e3" stay string keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Int(i64),
    Str(InlineString),
}

impl Key {
    /// Build a key from a string, folding canonical integer spellings
    pub fn canonical(s: &str) -> Self {
        if let Some(n) = parse_canonical_int(s) {
            Key::Int(n)
        } else {
            Key::Str(InlineString::from(s))
        }
    }

    /// True if this is an integer key
    #[inline]
    pub fn is_int(&self) -> bool {
        matches!(self, Key::Int(_))
    }

    /// Integer value, if this is an integer key
    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Key::Int(n) => Some(*n),
            Key::Str(_) => None,
        }
    }

    /// String slice, if this is a string key
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Int(_) => None,
            Key::Str(s) => Some(s.as_str()),
        }
    }
}

/// Key order used by key sorts: integers first (numeric), then strings
/// (lexicographic). Total and stable.
impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Key::Int(a), Key::Int(b)) => a.cmp(b),
            (Key::Str(a), Key::Str(b)) => a.cmp(b),
            (Key::Int(_), Key::Str(_)) => Ordering::Less,
            (Key::Str(_), Key::Int(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Key {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<i64> for Key {
    #[inline]
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

impl From<&str> for Key {
    #[inline]
    fn from(s: &str) -> Self {
        Key::canonical(s)
    }
}

impl From<String> for Key {
    #[inline]
    fn from(s: String) -> Self {
        Key::canonical(&s)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{}", n),
            Key::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Parse a canonical decimal integer: optional '-', no leading zeros
/// (except "0" itself), no '+', fits in i64.
fn parse_canonical_int(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    if s == "-0" {
        return None;
    }
    s.parse::<i64>().ok()
}
