//! Typed values carried from documents and predicates to the relational boundary.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Data type of an indexable member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int64,
    Int32,
    Float,
    Bool,
    Text,
    Uuid,
    /// RFC 3339 timestamp carried as text
    DateTime,
}

impl DataType {
    /// Relational column type used when the member becomes an index column.
    pub fn db_type(&self) -> &'static str {
        match self {
            DataType::Int64 => "bigint",
            DataType::Int32 => "int",
            DataType::Float => "float",
            DataType::Bool => "bit",
            DataType::Text => "nvarchar(max)",
            DataType::Uuid => "uniqueidentifier",
            DataType::DateTime => "datetime2",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int64 => "Int64",
            DataType::Int32 => "Int32",
            DataType::Float => "Float",
            DataType::Bool => "Bool",
            DataType::Text => "Text",
            DataType::Uuid => "Uuid",
            DataType::DateTime => "DateTime",
        };
        f.write_str(name)
    }
}

/// Explicit typed-value union used for index values and query literals.
///
/// Values stay typed through the whole pipeline and are only converted to a
/// driver representation by the external client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    DateTime(String),
    List(Vec<Value>),
}

impl Value {
    /// Short kind name, used as the identity half of parameter deduplication.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Uuid(_) => "uuid",
            Value::DateTime(_) => "datetime",
            Value::List(_) => "list",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Key identifying a value by kind and content.
    pub(crate) fn identity_key(&self) -> String {
        format!("{}:{}", self.kind(), self)
    }

    /// Converts one JSON scalar read off a document into a typed value.
    ///
    /// Returns a reason string on mismatch; the caller attaches the member path.
    pub fn from_json(json: &serde_json::Value, data_type: DataType) -> Result<Value, String> {
        use serde_json::Value as Json;

        match json {
            Json::Null => Ok(Value::Null),
            Json::Array(_) => Err(format!("expected {} scalar, found a sequence", data_type)),
            Json::Object(_) => Err(format!("expected {} scalar, found an object", data_type)),
            _ => match data_type {
                DataType::Int64 => json
                    .as_i64()
                    .map(Value::Integer)
                    .ok_or_else(|| format!("expected Int64, found {}", json)),
                DataType::Int32 => json
                    .as_i64()
                    .filter(|v| i32::try_from(*v).is_ok())
                    .map(Value::Integer)
                    .ok_or_else(|| format!("expected Int32, found {}", json)),
                DataType::Float => json
                    .as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| format!("expected Float, found {}", json)),
                DataType::Bool => json
                    .as_bool()
                    .map(Value::Bool)
                    .ok_or_else(|| format!("expected Bool, found {}", json)),
                DataType::Text => json
                    .as_str()
                    .map(|s| Value::Text(s.to_string()))
                    .ok_or_else(|| format!("expected Text, found {}", json)),
                DataType::Uuid => json
                    .as_str()
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .map(Value::Uuid)
                    .ok_or_else(|| format!("expected Uuid, found {}", json)),
                DataType::DateTime => json
                    .as_str()
                    .map(|s| Value::DateTime(s.to_string()))
                    .ok_or_else(|| format!("expected DateTime, found {}", json)),
            },
        }
    }

    /// Orders two values of compatible kinds; `None` when they are not comparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Text(v) => write!(f, "'{}'", v),
            Value::Uuid(v) => write!(f, "'{}'", v),
            Value::DateTime(v) => write!(f, "'{}'", v),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
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
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntest::timeout;
    use serde_json::json;

    #[timeout(1000)]
    #[test]
    fn test_from_json_rejects_sequence_for_scalar() {
        let err = Value::from_json(&json!([1, 2]), DataType::Int64).unwrap_err();
        assert!(err.contains("sequence"));
    }

    #[timeout(1000)]
    #[test]
    fn test_from_json_int32_range() {
        assert_eq!(
            Value::from_json(&json!(42), DataType::Int32).unwrap(),
            Value::Integer(42)
        );
        assert!(Value::from_json(&json!(i64::MAX), DataType::Int32).is_err());
    }

    #[timeout(1000)]
    #[test]
    fn test_from_json_uuid() {
        let id = Uuid::new_v4();
        let value = Value::from_json(&json!(id.to_string()), DataType::Uuid).unwrap();
        assert_eq!(value, Value::Uuid(id));
        assert!(Value::from_json(&json!("not-a-uuid"), DataType::Uuid).is_err());
    }

    #[timeout(1000)]
    #[test]
    fn test_identity_key_separates_kinds() {
        assert_ne!(
            Value::Integer(3).identity_key(),
            Value::Text("3".into()).identity_key()
        );
        assert_eq!(Value::Integer(3).identity_key(), Value::from(3).identity_key());
    }

    #[timeout(1000)]
    #[test]
    fn test_compare_mixed_numeric() {
        assert_eq!(
            Value::Integer(2).compare(&Value::Float(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::Text("a".into()).compare(&Value::Integer(1)), None);
    }
}
