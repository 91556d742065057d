use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// A host-side value read from, or written into, a marshaled buffer.
///
/// Integers keep their signedness so that `u64::MAX` and `-1i64` both round
/// trip exactly. Pointer-width storage decodes to [`Value::Pointer`].
///
/// Serializes as plain data (numbers, strings, arrays, maps) for inspecting
/// snapshots. There is no `Deserialize`: plain data cannot tell `UInt`,
/// `Int` and `Pointer` apart.
#[derive(Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Pointer(u64),
    Array(Vec<Value>),
    Record(IndexMap<String, Value>),
}

impl Value {
    /// Builds a record value from `(name, value)` pairs, keeping their order.
    pub fn record<K, I>(members: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Record(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short name of the variant, used in mismatch diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Pointer(_) => "pointer",
            Value::Array(_) => "array",
            Value::Record(_) => "record",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Reads any integer-like variant as a `u64`, reinterpreting negative
    /// numbers as two's complement.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(v) | Value::Pointer(v) => Some(*v),
            Value::Int(v) => Some(*v as u64),
            Value::Bool(b) => Some(*b as u64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) | Value::Pointer(v) => Some(*v as i64),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::UInt(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Record(members) => Some(members),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}u", v),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Str(v) => write!(f, "\"{}\"", v.escape_default()),
            Value::Pointer(v) => write!(f, "Ptr({:#x})", v),
            Value::Array(items) => f.debug_list().entries(items).finish(),
            Value::Record(members) => f.debug_map().entries(members.iter()).finish(),
        }
    }
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::UInt(v as u64)
            }
        })*
    };
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(v as i64)
            }
        })*
    };
}

impl_from_unsigned!(u8, u16, u32, u64);
impl_from_signed!(i8, i16, i32, i64);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(members: IndexMap<String, Value>) -> Self {
        Value::Record(members)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_as_plain_data() {
        let value = Value::record([
            ("name", Value::from("Alice")),
            ("age", Value::UInt(42)),
            ("delta", Value::Int(-3)),
            ("next", Value::Pointer(0x1fff)),
            ("scores", Value::from(vec![1.5f64, 2.0])),
            ("extra", Value::Null),
        ]);
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({
                "name": "Alice",
                "age": 42,
                "delta": -3,
                "next": 8191,
                "scores": [1.5, 2.0],
                "extra": null,
            })
        );
        assert_eq!(
            serde_json::to_string(&Value::UInt(u64::MAX)).unwrap(),
            u64::MAX.to_string()
        );
    }

    #[test]
    fn test_integer_conversions_keep_signedness() {
        assert_eq!(Value::from(5u8), Value::UInt(5));
        assert_eq!(Value::from(5i32), Value::Int(5));
        assert_eq!(Value::Int(-1).as_u64(), Some(u64::MAX));
        assert_eq!(Value::Pointer(7).as_i64(), Some(7));
        assert_eq!(Value::from(None::<u8>), Value::Null);
    }
}
