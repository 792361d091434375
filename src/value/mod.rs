/*!
 * Request-Local Values
 * Live values owned by a single request, plus the flattened serializable form
 */

use crate::core::types::Key;
use crate::local::ArrayHandle;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::rc::Rc;

/// A live, request-owned value
///
/// Values are confined to one request's thread (`Rc`, not `Arc`). Cloning is
/// shallow: strings and arrays share their payload with the original, which
/// is what gives materialized cache slots their stable identity.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Array(ArrayHandle),
}

impl Value {
    /// String value from a slice
    #[inline]
    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&ArrayHandle> {
        match self {
            Value::Array(h) => Some(h),
            _ => None,
        }
    }

    /// Identity comparison: pointer identity for reference-counted variants,
    /// bit equality for scalars
    ///
    /// Two clones of the same materialized value are the *same* value; two
    /// independent decodings of equal content are not.
    pub fn same_value(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Int(x), Value::Int(y)) => x == y,
            (Value::Float(x), Value::Float(y)) => x.to_bits() == y.to_bits(),
            (Value::Str(x), Value::Str(y)) => Rc::ptr_eq(x, y),
            (Value::Array(x), Value::Array(y)) => ArrayHandle::ptr_eq(x, y),
            _ => false,
        }
    }

    /// Total order over values, used by the non-comparator sorts
    ///
    /// Type rank: Null < Bool < numeric < Str < Array. Int and Float compare
    /// numerically with each other; floats use `total_cmp` so NaN never
    /// panics a sort. Arrays compare by length.
    pub fn cmp_values(a: &Value, b: &Value) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::Int(_) | Value::Float(_) => 2,
                Value::Str(_) => 3,
                Value::Array(_) => 4,
            }
        }
        match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Int(x), Value::Int(y)) => x.cmp(y),
            (Value::Int(x), Value::Float(y)) => (*x as f64).total_cmp(y),
            (Value::Float(x), Value::Int(y)) => x.total_cmp(&(*y as f64)),
            (Value::Float(x), Value::Float(y)) => x.total_cmp(y),
            (Value::Str(x), Value::Str(y)) => x.cmp(y),
            (Value::Array(x), Value::Array(y)) => x.len().cmp(&y.len()),
            _ => rank(a).cmp(&rank(b)),
        }
    }

    /// Flatten into a fully-owned serializable tree
    ///
    /// Nested arrays are escalated and flattened; see
    /// [`ArrayHandle::copy_for_serialization`].
    pub fn to_flat(&self) -> FlatValue {
        match self {
            Value::Null => FlatValue::Null,
            Value::Bool(b) => FlatValue::Bool(*b),
            Value::Int(n) => FlatValue::Int(*n),
            Value::Float(f) => FlatValue::Float(*f),
            Value::Str(s) => FlatValue::Str(s.to_string()),
            Value::Array(h) => h.copy_for_serialization(),
        }
    }
}

impl From<&FlatValue> for Value {
    /// Build a standalone value from a flat tree
    ///
    /// Nested arrays become independent escalated (fully mutable) arrays;
    /// no shared backing is involved.
    fn from(flat: &FlatValue) -> Self {
        match flat {
            FlatValue::Null => Value::Null,
            FlatValue::Bool(b) => Value::Bool(*b),
            FlatValue::Int(n) => Value::Int(*n),
            FlatValue::Float(f) => Value::Float(*f),
            FlatValue::Str(s) => Value::str(s),
            FlatValue::Array(entries) => {
                let full = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect();
                Value::Array(ArrayHandle::from_entries(full))
            }
        }
    }
}

/// Fully-owned, order-preserving value tree
///
/// The output of copy-for-serialization and the input to shared-array
/// encoding. Unlike [`Value`] it holds no reference-counted state and
/// serializes directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlatValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<(Key, FlatValue)>),
}

impl FlatValue {
    /// String value from a slice
    #[inline]
    pub fn str(s: &str) -> Self {
        FlatValue::Str(s.to_string())
    }
}
