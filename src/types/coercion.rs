use crate::types::datetime_utils::{
    parse_date, parse_time, parse_timestamp, zero_date, zero_time, zero_timestamp,
};
use crate::types::{ColumnDescriptor, NativeWidth, TypeClass, TypedValue, Value};
use crate::{Result, RowcastError};
use tracing::trace;

/// What to do when a cell's raw text does not parse for its type class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParsePolicy {
    /// Substitute the class's zero value. A NULL on a non-nullable column
    /// panics.
    #[default]
    Permissive,
    /// Return `RowcastError::TypeConversion` for unparsable cells and for
    /// NULLs on non-nullable columns.
    Strict,
}

/// Maps (column descriptor, raw cell) to a [`TypedValue`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeCoercer {
    policy: ParsePolicy,
}

impl TypeCoercer {
    pub fn new(policy: ParsePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ParsePolicy {
        self.policy
    }

    /// Coerce one cell. `None` is SQL NULL.
    ///
    /// Nullable columns always yield `TypedValue::Nullable`, non-nullable ones
    /// `TypedValue::Bare`. Columns reporting the `NULL` type yield
    /// `TypedValue::Null` whatever the cell holds.
    ///
    /// # Panics
    ///
    /// Under [`ParsePolicy::Permissive`], a NULL cell on a column reported as
    /// non-nullable panics, except for unrecognized type names, which yield
    /// `TypedValue::Null`. The schema is trusted to rule that out.
    pub fn coerce(&self, column: &ColumnDescriptor, cell: Option<&[u8]>) -> Result<TypedValue> {
        let class = column.type_class();
        if class == TypeClass::Null {
            return Ok(TypedValue::Null);
        }

        let value = match cell {
            Some(raw) => Some(self.coerce_present(column, class, raw)?),
            None => None,
        };

        match value {
            value if column.nullable => Ok(TypedValue::Nullable(value)),
            Some(value) => Ok(TypedValue::Bare(value)),
            None => self.null_on_non_nullable(column, class),
        }
    }

    fn null_on_non_nullable(&self, column: &ColumnDescriptor, class: TypeClass) -> Result<TypedValue> {
        match self.policy {
            // Unknown types make no claim about their payload, so NULL stays absent
            ParsePolicy::Permissive if class == TypeClass::Fallback => Ok(TypedValue::Null),
            ParsePolicy::Strict => Err(RowcastError::TypeConversion(format!(
                "column \"{}\" ({}) is not nullable but returned NULL",
                column.name, column.type_name
            ))),
            ParsePolicy::Permissive => panic!(
                "column \"{}\" ({}) is not nullable but returned NULL",
                column.name, column.type_name
            ),
        }
    }

    fn coerce_present(&self, column: &ColumnDescriptor, class: TypeClass, raw: &[u8]) -> Result<Value> {
        let text = String::from_utf8_lossy(raw);

        let value = match class {
            TypeClass::Text | TypeClass::Fallback => Value::Text(text.into_owned()),
            TypeClass::Float => {
                Value::Float(self.parse_or(column, &text, text.parse::<f64>().ok(), || 0.0)?)
            }
            TypeClass::Integer => self.coerce_integer(column, &text)?,
            // Closed world: anything but these spellings is false
            TypeClass::Bool => Value::Bool(matches!(text.as_ref(), "true" | "TRUE" | "1")),
            TypeClass::Timestamp => Value::Timestamp(self.parse_or(
                column,
                &text,
                parse_timestamp(&text),
                zero_timestamp,
            )?),
            TypeClass::Date => Value::Date(self.parse_or(column, &text, parse_date(&text), zero_date)?),
            TypeClass::Time => Value::Time(self.parse_or(column, &text, parse_time(&text), zero_time)?),
            TypeClass::Json => Value::Json(self.parse_or(
                column,
                &text,
                serde_json::from_slice(raw).ok(),
                || serde_json::Value::Null,
            )?),
            TypeClass::Null => unreachable!("NULL columns are resolved before cell coercion"),
        };

        Ok(value)
    }

    /// Integers are parsed both signed and unsigned; the width hint picks the
    /// parse and narrows it.
    fn coerce_integer(&self, column: &ColumnDescriptor, text: &str) -> Result<Value> {
        let signed = text.parse::<i64>().ok();
        let unsigned = text.parse::<u64>().ok();

        let value = match column.native_width {
            Some(width) if width.is_unsigned() => {
                let n = self.parse_or(column, text, unsigned, || 0)?;
                match width {
                    NativeWidth::U8 => Value::UInt8(n as u8),
                    NativeWidth::U16 => Value::UInt16(n as u16),
                    NativeWidth::U32 => Value::UInt32(n as u32),
                    _ => Value::UInt64(n),
                }
            }
            Some(width) => {
                let n = self.parse_or(column, text, signed, || 0)?;
                match width {
                    NativeWidth::I8 => Value::Int8(n as i8),
                    NativeWidth::I16 => Value::Int16(n as i16),
                    NativeWidth::I32 => Value::Int32(n as i32),
                    _ => Value::Int64(n),
                }
            }
            None => Value::Int64(self.parse_or(column, text, signed, || 0)?),
        };

        Ok(value)
    }

    fn parse_or<T>(
        &self,
        column: &ColumnDescriptor,
        text: &str,
        parsed: Option<T>,
        zero: impl FnOnce() -> T,
    ) -> Result<T> {
        match parsed {
            Some(value) => Ok(value),
            None if self.policy == ParsePolicy::Strict => Err(RowcastError::TypeConversion(format!(
                "invalid {} value {:?} in column \"{}\"",
                column.type_name, text, column.name
            ))),
            None => {
                trace!("Unparsable {} value {:?} in column {}, using zero value", column.type_name, text, column.name);
                Ok(zero())
            }
        }
    }
}
