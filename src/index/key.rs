//! Ordered property values
//!
//! Every indexed or compared property is read into an [`IndexKey`]. The
//! ordering is total and deterministic so tree indexes, range scans and
//! sorting all agree on it.

use std::fmt;

/// Index key representing one property value.
///
/// Ordering is deterministic: Null < Bool < Int < Float < String.
/// Values of different variants never compare equal, so `Int(5)` and
/// `Float(5.0)` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    /// Missing or null value
    Null,
    /// Boolean value (false < true)
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value (stored as bits for total ordering)
    Float(u64),
    /// String value
    String(String),
}

impl IndexKey {
    /// Create a key from a boolean
    pub fn from_bool(v: bool) -> Self {
        IndexKey::Bool(v)
    }

    /// Create a key from an integer
    pub fn from_int(v: i64) -> Self {
        IndexKey::Int(v)
    }

    /// Create a key from a float
    ///
    /// Uses bit representation for total ordering.
    pub fn from_float(v: f64) -> Self {
        let bits = v.to_bits();
        let ordered = if (bits >> 63) == 1 {
            !bits // Negative: flip all bits
        } else {
            bits ^ (1 << 63) // Positive: flip sign bit
        };
        IndexKey::Float(ordered)
    }

    /// Create a key from a string
    pub fn from_string(v: impl Into<String>) -> Self {
        IndexKey::String(v.into())
    }

    /// Create a key from a JSON value.
    ///
    /// Arrays and objects are not indexable and yield `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(IndexKey::Null),
            serde_json::Value::Bool(b) => Some(IndexKey::from_bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(IndexKey::from_int(i))
                } else {
                    n.as_f64().map(IndexKey::from_float)
                }
            }
            serde_json::Value::String(s) => Some(IndexKey::from_string(s)),
            _ => None,
        }
    }

    /// Decode a float key back into its value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            IndexKey::Float(ordered) => {
                let bits = if (ordered >> 63) == 1 {
                    ordered ^ (1 << 63)
                } else {
                    !ordered
                };
                Some(f64::from_bits(bits))
            }
            _ => None,
        }
    }

    /// Returns true for the null key
    pub fn is_null(&self) -> bool {
        matches!(self, IndexKey::Null)
    }

    /// Returns true if both keys are the same variant
    pub fn same_kind(&self, other: &IndexKey) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Null => write!(f, "null"),
            IndexKey::Bool(b) => write!(f, "{}", b),
            IndexKey::Int(i) => write!(f, "{}", i),
            IndexKey::Float(_) => write!(f, "{}", self.as_float().unwrap_or(f64::NAN)),
            IndexKey::String(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<bool> for IndexKey {
    fn from(v: bool) -> Self {
        IndexKey::from_bool(v)
    }
}

impl From<i64> for IndexKey {
    fn from(v: i64) -> Self {
        IndexKey::from_int(v)
    }
}

impl From<i32> for IndexKey {
    fn from(v: i32) -> Self {
        IndexKey::from_int(i64::from(v))
    }
}

impl From<u32> for IndexKey {
    fn from(v: u32) -> Self {
        IndexKey::from_int(i64::from(v))
    }
}

impl From<f64> for IndexKey {
    fn from(v: f64) -> Self {
        IndexKey::from_float(v)
    }
}

impl From<&str> for IndexKey {
    fn from(v: &str) -> Self {
        IndexKey::from_string(v)
    }
}

impl From<String> for IndexKey {
    fn from(v: String) -> Self {
        IndexKey::String(v)
    }
}

impl<T: Into<IndexKey>> From<Option<T>> for IndexKey {
    fn from(v: Option<T>) -> Self {
        v.map_or(IndexKey::Null, Into::into)
    }
}
