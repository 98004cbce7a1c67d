use std::fmt;

/// Native integer width/signedness a driver reports for an integer column.
///
/// Drivers usually describe this as the host type they would scan into
/// (`"int32"`, `"uint8"`, ...). It only matters for the integer class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeWidth {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl NativeWidth {
    /// Parse a textual width hint. Unknown hints yield `None`, which the
    /// coercion engine treats as signed 64-bit.
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().to_ascii_lowercase().as_str() {
            "int8" | "i8" => Some(NativeWidth::I8),
            "int16" | "i16" => Some(NativeWidth::I16),
            "int32" | "i32" => Some(NativeWidth::I32),
            "int64" | "i64" | "int" | "isize" => Some(NativeWidth::I64),
            "uint8" | "u8" => Some(NativeWidth::U8),
            "uint16" | "u16" => Some(NativeWidth::U16),
            "uint32" | "u32" => Some(NativeWidth::U32),
            "uint64" | "u64" | "uint" | "usize" => Some(NativeWidth::U64),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NativeWidth::I8 => "int8",
            NativeWidth::I16 => "int16",
            NativeWidth::I32 => "int32",
            NativeWidth::I64 => "int64",
            NativeWidth::U8 => "uint8",
            NativeWidth::U16 => "uint16",
            NativeWidth::U32 => "uint32",
            NativeWidth::U64 => "uint64",
        }
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            NativeWidth::U8 | NativeWidth::U16 | NativeWidth::U32 | NativeWidth::U64
        )
    }
}

impl fmt::Display for NativeWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coercion class a reported type name falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    /// Driver reports a NULL-only static type
    Null,
    Text,
    Float,
    Integer,
    Bool,
    Timestamp,
    Date,
    Time,
    Json,
    /// Unrecognized names, coerced as text
    Fallback,
}

impl TypeClass {
    /// Classify a driver-reported type name (ASCII case-insensitive).
    pub fn from_type_name(type_name: &str) -> Self {
        // Fast path for names drivers already report in upper case
        if let Some(class) = Self::lookup(type_name) {
            return class;
        }
        Self::lookup(&type_name.to_ascii_uppercase()).unwrap_or(TypeClass::Fallback)
    }

    fn lookup(name: &str) -> Option<Self> {
        let class = match name {
            "NULL" => TypeClass::Null,
            "CHAR" | "VARCHAR" | "TEXT" | "NVARCHAR" | "MEDIUMTEXT" | "LONGTEXT" => TypeClass::Text,
            "FLOAT" | "DOUBLE" | "DECIMAL" | "NUMERIC" | "FLOAT4" | "FLOAT8" => TypeClass::Float,
            "INT" | "TINYINT" | "INT2" | "INT4" | "INT8" | "MEDIUMINT" | "SMALLINT" | "BIGINT" => {
                TypeClass::Integer
            }
            "BOOL" => TypeClass::Bool,
            "DATETIME" | "TIMESTAMP" | "TIMESTAMPTZ" => TypeClass::Timestamp,
            "DATE" => TypeClass::Date,
            "TIME" => TypeClass::Time,
            "JSON" | "JSONB" => TypeClass::Json,
            _ => return None,
        };
        Some(class)
    }
}

/// Metadata for one result column, as reported by the execution collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Database-reported type name, e.g. `INT4`, `VARCHAR`, `TIMESTAMPTZ`
    pub type_name: String,
    pub nullable: bool,
    pub native_width: Option<NativeWidth>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable,
            native_width: None,
        }
    }

    pub fn with_native_width(mut self, width: NativeWidth) -> Self {
        self.native_width = Some(width);
        self
    }

    /// Set the width from a textual hint; unrecognized hints clear it.
    pub fn with_width_hint(mut self, hint: &str) -> Self {
        self.native_width = NativeWidth::from_hint(hint);
        self
    }

    pub fn type_class(&self) -> TypeClass {
        TypeClass::from_type_name(&self.type_name)
    }
}
