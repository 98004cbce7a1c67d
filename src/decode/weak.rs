//! Weakly typed decoding.
//!
//! [`WeakDeserializer`] drives a serde target type from a `serde_json::Value`
//! and converts between scalar kinds when the target asks for a different
//! one than the value holds:
//!
//! | target | accepted input |
//! |--------|----------------|
//! | string | strings; bools as `"1"`/`"0"`; numbers in base 10 |
//! | bool   | bools; numbers (non-zero is true); `1 t T TRUE true True` / `0 f F FALSE false False`, empty string is false |
//! | int    | numbers (floats truncate); bools as 1/0; strings with an optional `0x`/`0o`/`0b`/`0` radix prefix |
//! | uint   | as int, negative numbers wrap around |
//! | float  | numbers; bools as 1/0; decimal strings |
//! | seq    | arrays; an empty object; any other single value becomes a one-element sequence |
//! | map    | objects; an empty array; an array of objects is merged left to right |
//!
//! Everything else (options, enums, unit) behaves like `serde_json`.

use serde::de::value::StringDeserializer;
use serde::de::{self, DeserializeSeed, Error as _, MapAccess, SeqAccess, Visitor};
use serde::forward_to_deserialize_any;
use serde_json::{Map, Value};

type Error = serde_json::Error;

pub struct WeakDeserializer {
    value: Value,
}

impl WeakDeserializer {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    fn unexpected(&self, target: &str) -> Error {
        Error::custom(format!(
            "cannot weakly decode {} {} into {}",
            describe(&self.value),
            self.value,
            target
        ))
    }

    fn weak_bool(&self) -> Result<bool, Error> {
        match &self.value {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
            Value::String(s) => match s.as_str() {
                "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
                "0" | "f" | "F" | "FALSE" | "false" | "False" | "" => Ok(false),
                _ => Err(self.unexpected("bool")),
            },
            _ => Err(self.unexpected("bool")),
        }
    }

    fn weak_i64(&self) -> Result<i64, Error> {
        match &self.value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_u64().map(|u| u as i64))
                .or_else(|| n.as_f64().map(|f| f as i64))
                .ok_or_else(|| self.unexpected("integer")),
            Value::Bool(b) => Ok(*b as i64),
            Value::String(s) if s.is_empty() => Ok(0),
            Value::String(s) => parse_int_literal(s)
                .and_then(|n| i64::try_from(n).ok())
                .ok_or_else(|| self.unexpected("integer")),
            _ => Err(self.unexpected("integer")),
        }
    }

    fn weak_u64(&self) -> Result<u64, Error> {
        match &self.value {
            // Negative numbers wrap around
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_i64().map(|i| i as u64))
                .or_else(|| n.as_f64().map(|f| f as i64 as u64))
                .ok_or_else(|| self.unexpected("unsigned integer")),
            Value::Bool(b) => Ok(*b as u64),
            Value::String(s) if s.is_empty() => Ok(0),
            Value::String(s) => parse_int_literal(s)
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| self.unexpected("unsigned integer")),
            _ => Err(self.unexpected("unsigned integer")),
        }
    }

    fn weak_f64(&self) -> Result<f64, Error> {
        match &self.value {
            Value::Number(n) => n.as_f64().ok_or_else(|| self.unexpected("float")),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::String(s) if s.is_empty() => Ok(0.0),
            Value::String(s) => s.parse::<f64>().map_err(|_| self.unexpected("float")),
            _ => Err(self.unexpected("float")),
        }
    }

    fn weak_string(self) -> Result<String, Error> {
        match self.value {
            Value::String(s) => Ok(s),
            Value::Bool(b) => Ok(if b { "1" } else { "0" }.to_string()),
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(self.unexpected("string")),
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse an integer literal whose radix is implied by its prefix.
fn parse_int_literal(s: &str) -> Option<i128> {
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };

    if body.is_empty() || body.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = i128::from_str_radix(body, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn visit_array<'de, V: Visitor<'de>>(items: Vec<Value>, visitor: V) -> Result<V::Value, Error> {
    visitor.visit_seq(WeakSeq {
        iter: items.into_iter(),
    })
}

fn visit_object<'de, V: Visitor<'de>>(object: Map<String, Value>, visitor: V) -> Result<V::Value, Error> {
    visitor.visit_map(WeakMap {
        iter: object.into_iter(),
        value: None,
    })
}

impl<'de> de::Deserializer<'de> for WeakDeserializer {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    visitor.visit_u64(u)
                } else if let Some(i) = n.as_i64() {
                    visitor.visit_i64(i)
                } else {
                    visitor.visit_f64(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => visitor.visit_string(s),
            Value::Array(items) => visit_array(items, visitor),
            Value::Object(object) => visit_object(object, visitor),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_bool(self.weak_bool()?)
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_i64(self.weak_i64()?)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_i64(self.weak_i64()?)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_i64(self.weak_i64()?)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_i64(self.weak_i64()?)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_u64(self.weak_u64()?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_u64(self.weak_u64()?)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_u64(self.weak_u64()?)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_u64(self.weak_u64()?)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_f64(self.weak_f64()?)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_f64(self.weak_f64()?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_string(self.weak_string()?)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_string(self.weak_string()?)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_string(self.weak_string()?)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Array(items) => visit_array(items, visitor),
            Value::Object(object) if object.is_empty() => visit_array(Vec::new(), visitor),
            Value::Null => Err(self.unexpected("sequence")),
            single => visit_array(vec![single], visitor),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Object(object) => visit_object(object, visitor),
            Value::Array(items) if items.iter().all(Value::is_object) => {
                let mut merged = Map::new();
                for item in items {
                    if let Value::Object(object) = item {
                        merged.extend(object);
                    }
                }
                visit_object(merged, visitor)
            }
            _ => Err(self.unexpected("map")),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        de::Deserializer::deserialize_enum(self.value, name, variants, visitor)
    }

    forward_to_deserialize_any! {
        bytes byte_buf unit unit_struct tuple_struct identifier ignored_any
    }
}

struct WeakSeq {
    iter: std::vec::IntoIter<Value>,
}

impl<'de> SeqAccess<'de> for WeakSeq {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>, Error> {
        match self.iter.next() {
            Some(value) => seed.deserialize(WeakDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct WeakMap {
    iter: serde_json::map::IntoIter,
    value: Option<Value>,
}

impl<'de> MapAccess<'de> for WeakMap {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, Error> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(StringDeserializer::<Error>::new(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Error> {
        match self.value.take() {
            Some(value) => seed.deserialize(WeakDeserializer::new(value)),
            None => Err(Error::custom("map value requested before its key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}
