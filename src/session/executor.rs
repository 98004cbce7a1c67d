use crate::query::Param;
use crate::session::Context;
use crate::types::ColumnDescriptor;
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

/// One row of raw cells; `None` is SQL NULL.
pub type RawRow = Vec<Option<Bytes>>;

/// Result of a mutating statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

/// The connection/executor handle rowcast runs statements through.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run an INSERT/UPDATE/DELETE.
    async fn execute(&self, ctx: &Context, query: &str, args: &[Param]) -> Result<ExecOutcome>;

    /// Run a row-producing statement and hand back a cursor over its rows.
    async fn query(&self, ctx: &Context, query: &str, args: &[Param]) -> Result<Box<dyn RowCursor>>;
}

/// Forward-only cursor over a statement's rows.
///
/// Dropping a cursor must release it; `close` exists so callers can observe
/// release failures.
#[async_trait]
pub trait RowCursor: Send {
    fn columns(&self) -> &[ColumnDescriptor];

    /// Advance and return the next row's cells, `Ok(None)` at the end.
    /// Iteration faults surface here.
    async fn next_row(&mut self) -> Result<Option<RawRow>>;

    fn close(&mut self) -> Result<()>;
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for std::sync::Arc<E> {
    async fn execute(&self, ctx: &Context, query: &str, args: &[Param]) -> Result<ExecOutcome> {
        (**self).execute(ctx, query, args).await
    }

    async fn query(&self, ctx: &Context, query: &str, args: &[Param]) -> Result<Box<dyn RowCursor>> {
        (**self).query(ctx, query, args).await
    }
}

/// Cursor over rows that were already fetched in full.
#[derive(Debug, Default)]
pub struct BufferedCursor {
    columns: Vec<ColumnDescriptor>,
    rows: std::vec::IntoIter<RawRow>,
    closed: bool,
}

impl BufferedCursor {
    pub fn new(columns: Vec<ColumnDescriptor>, rows: Vec<RawRow>) -> Self {
        Self {
            columns,
            rows: rows.into_iter(),
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl RowCursor for BufferedCursor {
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    async fn next_row(&mut self) -> Result<Option<RawRow>> {
        if self.closed {
            return Ok(None);
        }
        Ok(self.rows.next())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        // Release buffered rows now rather than at drop
        self.rows = Vec::new().into_iter();
        Ok(())
    }
}
