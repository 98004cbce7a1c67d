#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use rowcast::session::RawRow;
use rowcast::{
    ColumnDescriptor, Context, DbHandler, ExecOutcome, Executor, Param, Result, RowCursor, RowcastError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A call the scripted executor received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Execute { query: String, args: Vec<Param> },
    Query { query: String, args: Vec<Param> },
}

/// In-memory executor that replays a fixed result set and records every call.
#[derive(Default)]
pub struct ScriptedExecutor {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<RawRow>,
    outcome: ExecOutcome,
    fail_execute: Option<String>,
    fail_query: Option<String>,
    fail_at_row: Option<usize>,
    fail_close: Option<String>,
    calls: Mutex<Vec<Call>>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(mut self, columns: Vec<ColumnDescriptor>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_row(mut self, cells: &[Option<&str>]) -> Self {
        self.rows.push(raw_row(cells));
        self
    }

    pub fn with_outcome(mut self, rows_affected: u64, last_insert_id: Option<i64>) -> Self {
        self.outcome = ExecOutcome {
            rows_affected,
            last_insert_id,
        };
        self
    }

    pub fn failing_execute(mut self, message: &str) -> Self {
        self.fail_execute = Some(message.to_string());
        self
    }

    pub fn failing_query(mut self, message: &str) -> Self {
        self.fail_query = Some(message.to_string());
        self
    }

    /// Fail iteration when the cursor reaches row `index`.
    pub fn failing_at_row(mut self, index: usize) -> Self {
        self.fail_at_row = Some(index);
        self
    }

    pub fn failing_close(mut self, message: &str) -> Self {
        self.fail_close = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn execute(&self, _ctx: &Context, query: &str, args: &[Param]) -> Result<ExecOutcome> {
        self.calls.lock().push(Call::Execute {
            query: query.to_string(),
            args: args.to_vec(),
        });
        match &self.fail_execute {
            Some(message) => Err(RowcastError::Execution(message.clone())),
            None => Ok(self.outcome),
        }
    }

    async fn query(&self, _ctx: &Context, query: &str, args: &[Param]) -> Result<Box<dyn RowCursor>> {
        self.calls.lock().push(Call::Query {
            query: query.to_string(),
            args: args.to_vec(),
        });
        if let Some(message) = &self.fail_query {
            return Err(RowcastError::Execution(message.clone()));
        }
        Ok(Box::new(ScriptedCursor {
            columns: self.columns.clone(),
            rows: self.rows.clone().into_iter(),
            position: 0,
            fail_at_row: self.fail_at_row,
            fail_close: self.fail_close.clone(),
            closes: self.closes.clone(),
        }))
    }
}

struct ScriptedCursor {
    columns: Vec<ColumnDescriptor>,
    rows: std::vec::IntoIter<RawRow>,
    position: usize,
    fail_at_row: Option<usize>,
    fail_close: Option<String>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl RowCursor for ScriptedCursor {
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    async fn next_row(&mut self) -> Result<Option<RawRow>> {
        if self.fail_at_row == Some(self.position) {
            return Err(RowcastError::Cursor(format!("iteration failed at row {}", self.position)));
        }
        self.position += 1;
        Ok(self.rows.next())
    }

    fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        match &self.fail_close {
            Some(message) => Err(RowcastError::Cursor(message.clone())),
            None => Ok(()),
        }
    }
}

pub fn raw_row(cells: &[Option<&str>]) -> RawRow {
    cells
        .iter()
        .map(|cell| cell.map(|s| Bytes::copy_from_slice(s.as_bytes())))
        .collect()
}

/// Fresh in-memory SQLite executor, with `init` already applied.
pub async fn memory_db(init: &str) -> DbHandler {
    let db = DbHandler::new(":memory:").unwrap();
    if !init.is_empty() {
        db.execute_batch(init).await.unwrap();
    }
    db
}
