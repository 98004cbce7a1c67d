use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use serde::{Serialize, Serializer};

/// Native payload of a coerced cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Float(f64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Bool(bool),
    Timestamp(DateTime<FixedOffset>),
    Date(NaiveDate),
    Time(NaiveTime),
    Json(serde_json::Value),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Widen any signed integer variant to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int8(v) => Some(v as i64),
            Value::Int16(v) => Some(v as i64),
            Value::Int32(v) => Some(v as i64),
            Value::Int64(v) => Some(v),
            _ => None,
        }
    }

    /// Widen any unsigned integer variant to `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::UInt8(v) => Some(v as u64),
            Value::UInt16(v) => Some(v as u64),
            Value::UInt32(v) => Some(v as u64),
            Value::UInt64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short name of the variant, used in log lines and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Float(_) => "float64",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::UInt8(_) => "uint8",
            Value::UInt16(_) => "uint16",
            Value::UInt32(_) => "uint32",
            Value::UInt64(_) => "uint64",
            Value::Bool(_) => "bool",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Json(_) => "json",
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Text(v) => serializer.serialize_str(v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Int8(v) => serializer.serialize_i8(*v),
            Value::Int16(v) => serializer.serialize_i16(*v),
            Value::Int32(v) => serializer.serialize_i32(*v),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::UInt8(v) => serializer.serialize_u8(*v),
            Value::UInt16(v) => serializer.serialize_u16(*v),
            Value::UInt32(v) => serializer.serialize_u32(*v),
            Value::UInt64(v) => serializer.serialize_u64(*v),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Timestamp(v) => serializer.serialize_str(&v.to_rfc3339()),
            Value::Date(v) => serializer.serialize_str(&v.format("%Y-%m-%d").to_string()),
            Value::Time(v) => serializer.serialize_str(&v.format("%H:%M:%S%.f").to_string()),
            Value::Json(v) => v.serialize(serializer),
        }
    }
}

/// A cell after coercion.
///
/// The shape follows the column's nullability: non-nullable columns produce
/// `Bare`, nullable columns always produce `Nullable` (even when a value is
/// present). `Null` is reserved for columns whose reported type is `NULL`.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Bare(Value),
    Nullable(Option<Value>),
}

impl TypedValue {
    /// The present value, regardless of shape.
    pub fn value(&self) -> Option<&Value> {
        match self {
            TypedValue::Null => None,
            TypedValue::Bare(v) => Some(v),
            TypedValue::Nullable(v) => v.as_ref(),
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            TypedValue::Null => None,
            TypedValue::Bare(v) => Some(v),
            TypedValue::Nullable(v) => v,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, TypedValue::Nullable(_))
    }

    pub fn is_bare(&self) -> bool {
        matches!(self, TypedValue::Bare(_))
    }

    /// True for SQL NULL in either the `Null` or `Nullable(None)` shape.
    pub fn is_absent(&self) -> bool {
        self.value().is_none()
    }
}

impl Serialize for TypedValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            TypedValue::Bare(v) => v.serialize(serializer),
            TypedValue::Nullable(Some(v)) => serializer.serialize_some(v),
            TypedValue::Nullable(None) | TypedValue::Null => serializer.serialize_none(),
        }
    }
}
