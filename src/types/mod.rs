// Module for column metadata, coerced values and the coercion engine
pub mod column;
pub mod value;
pub mod row;
pub mod coercion;
pub mod datetime_utils;

pub use column::{ColumnDescriptor, NativeWidth, TypeClass};
pub use value::{TypedValue, Value};
pub use row::Row;
pub use coercion::{ParsePolicy, TypeCoercer};
