use crate::decode::DecoderConfig;
use crate::types::ParsePolicy;

/// Per-call result shaping options.
///
/// The target record type is not a field: it is the type parameter of
/// [`QueryRunner::query_as`](crate::QueryRunner::query_as).
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Hook and weak-typing settings for decoding rows into a target type.
    /// Ignored when rows are returned as [`Row`](crate::Row)s.
    pub decoder_config: Option<DecoderConfig>,

    /// For row-producing statements, return the first row directly (or
    /// `None` when nothing matched) instead of a list.
    pub single_result: bool,

    /// Panic with the error value instead of returning it.
    pub panic_on_error: bool,

    /// How unparsable cells are handled.
    pub parse_policy: ParsePolicy,
}

/// Expect at most one row.
pub const SINGLE_RESULT: Options = Options {
    decoder_config: None,
    single_result: true,
    panic_on_error: false,
    parse_policy: ParsePolicy::Permissive,
};

/// Panic instead of returning errors.
pub const PANIC: Options = Options {
    decoder_config: None,
    single_result: false,
    panic_on_error: true,
    parse_policy: ParsePolicy::Permissive,
};

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same as [`SINGLE_RESULT`].
    pub fn single() -> Self {
        SINGLE_RESULT
    }

    /// Same as [`PANIC`].
    pub fn panicking() -> Self {
        PANIC
    }

    pub fn with_single_result(mut self, single_result: bool) -> Self {
        self.single_result = single_result;
        self
    }

    pub fn with_panic_on_error(mut self, panic_on_error: bool) -> Self {
        self.panic_on_error = panic_on_error;
        self
    }

    pub fn with_decoder_config(mut self, config: DecoderConfig) -> Self {
        self.decoder_config = Some(config);
        self
    }

    pub fn with_parse_policy(mut self, policy: ParsePolicy) -> Self {
        self.parse_policy = policy;
        self
    }
}
