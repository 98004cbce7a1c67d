pub mod config;
pub mod decode;
pub mod query;
pub mod session;
pub mod types;

pub use decode::{DecodeHook, DecoderConfig, RowDecoder};
pub use query::{
    Args, IntoArgs, Options, Param, QueryOutput, QueryRunner, QueryTypeDetector, StatementKind, PANIC,
    SINGLE_RESULT,
};
pub use session::{Context, DbHandler, ExecOutcome, Executor, RowCursor};
pub use types::{ColumnDescriptor, NativeWidth, ParsePolicy, Row, TypeClass, TypedValue, Value};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RowcastError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Cursor error: {0}")]
    Cursor(String),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    #[error("Statement cancelled")]
    Cancelled,

    #[error("Statement deadline exceeded")]
    DeadlineExceeded,

    #[error("Database handler is not running")]
    HandlerUnavailable,
}

pub type Result<T> = std::result::Result<T, RowcastError>;

/// Where in a call an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raised by the executor while running the statement.
    Execution,
    /// Raised while iterating or closing a row cursor.
    Cursor,
    /// Raised while decoding a row into the target type.
    Decode,
    /// A cell did not parse under the strict policy.
    Conversion,
}

impl RowcastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RowcastError::Sqlite(_) => ErrorKind::Execution,
            RowcastError::Execution(_) => ErrorKind::Execution,
            RowcastError::Cancelled => ErrorKind::Execution,
            RowcastError::DeadlineExceeded => ErrorKind::Execution,
            RowcastError::HandlerUnavailable => ErrorKind::Execution,
            RowcastError::Cursor(_) => ErrorKind::Cursor,
            RowcastError::Decode(_) => ErrorKind::Decode,
            RowcastError::TypeConversion(_) => ErrorKind::Conversion,
        }
    }
}
