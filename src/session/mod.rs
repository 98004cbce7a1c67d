pub mod context;
pub mod db_handler;
pub mod executor;

pub use context::Context;
pub use db_handler::DbHandler;
pub use executor::{BufferedCursor, ExecOutcome, Executor, RawRow, RowCursor};
