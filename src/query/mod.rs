// Statement classification, argument binding and the query entry points
pub mod args;
pub mod assembler;
pub mod options;
pub mod query_type_detection;
pub mod runner;

pub use args::{Args, IntoArgs, Param};
pub use options::{Options, PANIC, SINGLE_RESULT};
pub use query_type_detection::{QueryTypeDetector, StatementKind};
pub use runner::{QueryOutput, QueryRunner};
