//! Decoding rows into caller-defined record types.
//!
//! Column names map to fields through serde, so `#[serde(rename = "...")]`
//! is the field tag. A [`DecoderConfig`] adds a per-column hook and the
//! weakly typed conversions of [`weak`].

pub mod weak;

pub use weak::WeakDeserializer;

use crate::types::Row;
use crate::{Result, RowcastError};
use serde::de::{DeserializeOwned, Error as _};
use std::fmt;
use std::sync::Arc;

/// Rewrites one column's JSON value before the record is decoded.
pub type DecodeHook =
    Arc<dyn Fn(&str, serde_json::Value) -> std::result::Result<serde_json::Value, String> + Send + Sync>;

#[derive(Clone, Default)]
pub struct DecoderConfig {
    pub decode_hook: Option<DecodeHook>,
    pub weakly_typed_input: bool,
}

impl DecoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weakly_typed() -> Self {
        Self {
            decode_hook: None,
            weakly_typed_input: true,
        }
    }

    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, serde_json::Value) -> std::result::Result<serde_json::Value, String> + Send + Sync + 'static,
    {
        self.decode_hook = Some(Arc::new(hook));
        self
    }

    pub fn with_weakly_typed_input(mut self, weak: bool) -> Self {
        self.weakly_typed_input = weak;
        self
    }
}

impl fmt::Debug for DecoderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderConfig")
            .field("decode_hook", &self.decode_hook.as_ref().map(|_| "<fn>"))
            .field("weakly_typed_input", &self.weakly_typed_input)
            .finish()
    }
}

/// Turns [`Row`]s into `T`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowDecoder<'a> {
    config: Option<&'a DecoderConfig>,
}

impl<'a> RowDecoder<'a> {
    pub fn new(config: Option<&'a DecoderConfig>) -> Self {
        Self { config }
    }

    pub fn decode<T: DeserializeOwned>(&self, row: Row) -> Result<T> {
        let Some(config) = self.config else {
            return Ok(serde_json::from_value(serde_json::to_value(&row)?)?);
        };

        let mut record = serde_json::Map::with_capacity(row.len());
        for (column, cell) in row {
            let mut value = serde_json::to_value(&cell)?;
            if let Some(hook) = &config.decode_hook {
                value = hook(&column, value).map_err(|msg| {
                    RowcastError::Decode(serde_json::Error::custom(format!(
                        "decode hook failed for column \"{column}\": {msg}"
                    )))
                })?;
            }
            record.insert(column, value);
        }

        let record = serde_json::Value::Object(record);
        if config.weakly_typed_input {
            Ok(T::deserialize(WeakDeserializer::new(record))?)
        } else {
            Ok(serde_json::from_value(record)?)
        }
    }
}
