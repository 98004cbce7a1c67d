use crate::query::Param;
use crate::session::{BufferedCursor, Context, ExecOutcome, Executor, RawRow, RowCursor};
use crate::types::{ColumnDescriptor, NativeWidth};
use crate::{Result, RowcastError};
use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, InterruptHandle};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

pub enum DbCommand {
    Execute {
        id: u64,
        query: String,
        args: Vec<Param>,
        response: oneshot::Sender<Result<ExecOutcome>>,
    },
    Query {
        id: u64,
        query: String,
        args: Vec<Param>,
        response: oneshot::Sender<Result<DbResponse>>,
    },
    Batch {
        id: u64,
        sql: String,
        response: oneshot::Sender<Result<()>>,
    },
    Shutdown,
}

/// Fully materialized result of a row-producing statement
pub struct DbResponse {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<RawRow>,
}

/// The command the worker thread is running right now.
///
/// The connection has a single interrupt handle shared by every caller, so
/// an interrupt is only issued while the requesting caller's own command
/// holds the slot.
struct ActiveCommand {
    current: Mutex<Option<u64>>,
    interrupt: InterruptHandle,
}

impl ActiveCommand {
    fn begin(&self, id: u64) -> ActiveGuard<'_> {
        *self.current.lock() = Some(id);
        ActiveGuard { owner: self }
    }

    /// Interrupt SQLite if `id` is the running command. The lock is held
    /// across the interrupt so the worker cannot move on to another command
    /// in between.
    fn interrupt(&self, id: u64) -> bool {
        let current = self.current.lock();
        if *current == Some(id) {
            self.interrupt.interrupt();
            true
        } else {
            false
        }
    }
}

struct ActiveGuard<'a> {
    owner: &'a ActiveCommand,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        *self.owner.current.lock() = None;
    }
}

/// SQLite executor. The connection lives on a dedicated thread and is driven
/// through a command channel, so callers never block the async runtime.
///
/// SQLite cannot prove a result column is NOT NULL through its statement
/// API, so every column is reported nullable.
#[derive(Clone)]
pub struct DbHandler {
    sender: mpsc::Sender<DbCommand>,
    active: Arc<ActiveCommand>,
    next_id: Arc<AtomicU64>,
}

impl DbHandler {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = if db_path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(db_path)?
        };

        // Set pragmas
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA cache_size=-64000;
             PRAGMA temp_store=MEMORY;",
        )?;

        let active = Arc::new(ActiveCommand {
            current: Mutex::new(None),
            interrupt: conn.get_interrupt_handle(),
        });
        let (sender, mut receiver) = mpsc::channel(100);
        debug!("Opened SQLite database {}", db_path);

        // Spawn a dedicated thread for SQLite operations
        let worker_active = active.clone();
        thread::spawn(move || {
            let active = worker_active;
            while let Some(cmd) = receiver.blocking_recv() {
                // Claim the slot before checking the caller is still waiting
                match cmd {
                    DbCommand::Execute { id, query, args, response } => {
                        let _running = active.begin(id);
                        if response.is_closed() {
                            continue;
                        }
                        let _ = response.send(execute_dml(&conn, &query, &args));
                    }
                    DbCommand::Query { id, query, args, response } => {
                        let _running = active.begin(id);
                        if response.is_closed() {
                            continue;
                        }
                        let _ = response.send(execute_query(&conn, &query, &args));
                    }
                    DbCommand::Batch { id, sql, response } => {
                        let _running = active.begin(id);
                        if response.is_closed() {
                            continue;
                        }
                        let _ = response.send(conn.execute_batch(&sql).map_err(Into::into));
                    }
                    DbCommand::Shutdown => break,
                }
            }

            info!("Database handler thread shutting down");
        });

        Ok(DbHandler {
            sender,
            active,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Run several `;`-separated statements without parameters.
    pub async fn execute_batch(&self, sql: &str) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let id = self.next_command_id();
        let command = DbCommand::Batch {
            id,
            sql: sql.to_string(),
            response: tx,
        };
        self.request(&Context::background(), id, command, rx).await
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(DbCommand::Shutdown).await;
    }

    fn next_command_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Stop command `id` if it is the one SQLite is running. A command still
    /// queued is skipped by the worker once its caller has gone.
    fn abandon(&self, id: u64) {
        if self.active.interrupt(id) {
            warn!("Interrupted running statement {}", id);
        } else {
            debug!("Statement {} abandoned before it started", id);
        }
    }

    async fn request<T>(
        &self,
        ctx: &Context,
        id: u64,
        command: DbCommand,
        response: oneshot::Receiver<Result<T>>,
    ) -> Result<T> {
        if ctx.is_cancelled() {
            return Err(RowcastError::Cancelled);
        }
        if ctx.is_expired() {
            return Err(RowcastError::DeadlineExceeded);
        }

        self.sender
            .send(command)
            .await
            .map_err(|_| {
                error!("Database handler thread is gone, dropping statement");
                RowcastError::HandlerUnavailable
            })?;

        let deadline = async {
            match ctx.deadline() {
                Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = response => result.map_err(|_| RowcastError::HandlerUnavailable)?,
            _ = ctx.cancellation_token().cancelled() => {
                warn!("Statement {} cancelled", id);
                self.abandon(id);
                Err(RowcastError::Cancelled)
            }
            _ = deadline => {
                warn!("Statement {} deadline exceeded", id);
                self.abandon(id);
                Err(RowcastError::DeadlineExceeded)
            }
        }
    }
}

#[async_trait]
impl Executor for DbHandler {
    async fn execute(&self, ctx: &Context, query: &str, args: &[Param]) -> Result<ExecOutcome> {
        let (tx, rx) = oneshot::channel();
        let id = self.next_command_id();
        let command = DbCommand::Execute {
            id,
            query: query.to_string(),
            args: args.to_vec(),
            response: tx,
        };
        self.request(ctx, id, command, rx).await
    }

    async fn query(&self, ctx: &Context, query: &str, args: &[Param]) -> Result<Box<dyn RowCursor>> {
        let (tx, rx) = oneshot::channel();
        let id = self.next_command_id();
        let command = DbCommand::Query {
            id,
            query: query.to_string(),
            args: args.to_vec(),
            response: tx,
        };
        let response = self.request(ctx, id, command, rx).await?;
        Ok(Box::new(BufferedCursor::new(response.columns, response.rows)))
    }
}

impl ToSql for Param {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Param::Null => ToSqlOutput::Owned(SqlValue::Null),
            Param::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(*b as i64)),
            Param::Int(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Param::Float(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Param::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Param::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

fn execute_dml(conn: &Connection, query: &str, args: &[Param]) -> Result<ExecOutcome> {
    let rows_affected = conn.execute(query, params_from_iter(args.iter()))?;

    Ok(ExecOutcome {
        rows_affected: rows_affected as u64,
        last_insert_id: Some(conn.last_insert_rowid()),
    })
}

fn execute_query(conn: &Connection, query: &str, args: &[Param]) -> Result<DbResponse> {
    let mut stmt = conn.prepare(query)?;

    // Column names and declared types
    let declared: Vec<(String, Option<String>)> = stmt
        .columns()
        .iter()
        .map(|c| {
            let decl = c.decl_type().map(str::trim).filter(|d| !d.is_empty());
            (c.name().to_string(), decl.map(str::to_string))
        })
        .collect();
    let column_count = declared.len();

    // Widest storage class seen per column, for columns without a declared type
    let mut inferred: Vec<Option<Storage>> = vec![None; column_count];
    let mut rows = Vec::new();
    let mut int_buf = itoa::Buffer::new();

    let mut result_rows = stmt.query(params_from_iter(args.iter()))?;
    while let Some(row) = result_rows.next()? {
        let mut cells = Vec::with_capacity(column_count);
        for (i, storage) in inferred.iter_mut().enumerate() {
            let cell = match row.get_ref(i)? {
                ValueRef::Null => None,
                ValueRef::Integer(v) => {
                    widen(storage, Storage::Integer);
                    Some(Bytes::copy_from_slice(int_buf.format(v).as_bytes()))
                }
                ValueRef::Real(v) => {
                    widen(storage, Storage::Real);
                    Some(Bytes::from(v.to_string()))
                }
                ValueRef::Text(s) => {
                    widen(storage, Storage::Text);
                    Some(Bytes::copy_from_slice(s))
                }
                ValueRef::Blob(b) => {
                    widen(storage, Storage::Blob);
                    Some(Bytes::copy_from_slice(b))
                }
            };
            cells.push(cell);
        }
        rows.push(cells);
    }

    let columns = declared
        .into_iter()
        .zip(inferred)
        .map(|((name, decl), storage)| {
            let (type_name, width) = match decl {
                Some(decl) => normalize_decl_type(&decl),
                None => {
                    let type_name = storage.map_or("NULL", Storage::type_name);
                    let width = (storage == Some(Storage::Integer)).then_some(NativeWidth::I64);
                    (type_name.to_string(), width)
                }
            };
            ColumnDescriptor {
                name,
                type_name,
                nullable: true,
                native_width: width,
            }
        })
        .collect();

    debug!("SQLite query returned {} rows", rows.len());
    Ok(DbResponse { columns, rows })
}

/// SQLite storage classes, ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Storage {
    Integer,
    Real,
    Blob,
    Text,
}

impl Storage {
    fn type_name(self) -> &'static str {
        match self {
            Storage::Integer => "INT8",
            Storage::Real => "FLOAT8",
            Storage::Blob => "BLOB",
            Storage::Text => "TEXT",
        }
    }
}

/// Columns mixing storage classes take the widest one, so a REAL after an
/// INTEGER reads as FLOAT8 and any text or blob cell turns the column textual.
fn widen(inferred: &mut Option<Storage>, seen: Storage) {
    if inferred.is_none_or(|current| seen > current) {
        *inferred = Some(seen);
    }
}

/// Normalize a SQLite declared type to a reported type name and width hint.
///
/// Length and precision modifiers are dropped and common multi-word SQL
/// spellings are folded onto the short names the coercion engine dispatches
/// on. `UNSIGNED` selects the unsigned width.
pub fn normalize_decl_type(decl: &str) -> (String, Option<NativeWidth>) {
    let upper = decl.to_ascii_uppercase();

    // VARCHAR(255) -> VARCHAR, TIMESTAMP(3) WITH TIME ZONE -> TIMESTAMP WITH TIME ZONE
    let mut stripped = String::with_capacity(upper.len());
    let mut depth = 0usize;
    for ch in upper.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(ch),
            _ => {}
        }
    }

    let unsigned = stripped.split_whitespace().any(|w| w == "UNSIGNED");
    let base = stripped
        .split_whitespace()
        .filter(|w| *w != "UNSIGNED")
        .collect::<Vec<_>>()
        .join(" ");

    let type_name = match base.as_str() {
        "INTEGER" => "INT8",
        "BOOLEAN" => "BOOL",
        "REAL" => "FLOAT8",
        "DOUBLE PRECISION" => "DOUBLE",
        "CHARACTER VARYING" | "VARYING CHARACTER" => "VARCHAR",
        "CHARACTER" | "NCHAR" | "NATIVE CHARACTER" => "CHAR",
        "TIMESTAMP WITH TIME ZONE" => "TIMESTAMPTZ",
        "TIMESTAMP WITHOUT TIME ZONE" => "TIMESTAMP",
        "TIME WITHOUT TIME ZONE" => "TIME",
        other => other,
    }
    .to_string();

    let width = match type_name.as_str() {
        "TINYINT" => Some((NativeWidth::I8, NativeWidth::U8)),
        "SMALLINT" | "INT2" => Some((NativeWidth::I16, NativeWidth::U16)),
        "MEDIUMINT" | "INT" | "INT4" => Some((NativeWidth::I32, NativeWidth::U32)),
        "BIGINT" | "INT8" => Some((NativeWidth::I64, NativeWidth::U64)),
        _ => None,
    }
    .map(|(signed, unsigned_width)| if unsigned { unsigned_width } else { signed });

    (type_name, width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_decl_type() {
        assert_eq!(normalize_decl_type("integer"), ("INT8".to_string(), Some(NativeWidth::I64)));
        assert_eq!(normalize_decl_type("VARCHAR(255)"), ("VARCHAR".to_string(), None));
        assert_eq!(normalize_decl_type("numeric(10, 2)"), ("NUMERIC".to_string(), None));
        assert_eq!(normalize_decl_type("boolean"), ("BOOL".to_string(), None));
        assert_eq!(normalize_decl_type("REAL"), ("FLOAT8".to_string(), None));
        assert_eq!(
            normalize_decl_type("timestamp(3) with time zone"),
            ("TIMESTAMPTZ".to_string(), None)
        );
        assert_eq!(normalize_decl_type("character varying(20)"), ("VARCHAR".to_string(), None));
        assert_eq!(normalize_decl_type("SMALLINT"), ("SMALLINT".to_string(), Some(NativeWidth::I16)));
        assert_eq!(
            normalize_decl_type("int unsigned"),
            ("INT".to_string(), Some(NativeWidth::U32))
        );
        assert_eq!(
            normalize_decl_type("TINYINT(1) UNSIGNED"),
            ("TINYINT".to_string(), Some(NativeWidth::U8))
        );
        assert_eq!(normalize_decl_type("blob"), ("BLOB".to_string(), None));
    }

    #[test]
    fn test_widen_storage() {
        let mut inferred = None;
        widen(&mut inferred, Storage::Integer);
        assert_eq!(inferred, Some(Storage::Integer));
        widen(&mut inferred, Storage::Real);
        assert_eq!(inferred, Some(Storage::Real));
        widen(&mut inferred, Storage::Integer);
        assert_eq!(inferred, Some(Storage::Real));
        widen(&mut inferred, Storage::Text);
        assert_eq!(inferred.map(Storage::type_name), Some("TEXT"));
        widen(&mut inferred, Storage::Blob);
        assert_eq!(inferred, Some(Storage::Text));
    }

    #[test]
    fn test_mixed_storage_column_is_widened() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "create table t (id INTEGER, v);
             insert into t values (1, 1), (2, 2.5), (3, NULL);",
        )
        .unwrap();

        let response = execute_query(&conn, "select v from t order by id", &[]).unwrap();
        assert_eq!(response.columns[0].type_name, "FLOAT8");
        assert_eq!(response.columns[0].native_width, None);
        assert_eq!(response.rows[1][0].as_deref(), Some(b"2.5".as_slice()));

        conn.execute("insert into t values (4, 'abc')", []).unwrap();
        let response = execute_query(&conn, "select v from t order by id", &[]).unwrap();
        assert_eq!(response.columns[0].type_name, "TEXT");
    }

    #[test]
    fn test_interrupt_only_targets_running_command() {
        let conn = Connection::open_in_memory().unwrap();
        let active = ActiveCommand {
            current: Mutex::new(None),
            interrupt: conn.get_interrupt_handle(),
        };

        assert!(!active.interrupt(1));
        {
            let _running = active.begin(1);
            assert!(!active.interrupt(2));
            assert!(active.interrupt(1));
        }
        assert!(!active.interrupt(1));
    }

    #[test]
    fn test_param_to_sql() {
        assert!(matches!(
            Param::Bool(true).to_sql().unwrap(),
            ToSqlOutput::Owned(SqlValue::Integer(1))
        ));
        assert!(matches!(
            Param::Text("a".into()).to_sql().unwrap(),
            ToSqlOutput::Borrowed(ValueRef::Text(b"a"))
        ));
        assert!(matches!(Param::Null.to_sql().unwrap(), ToSqlOutput::Owned(SqlValue::Null)));
    }
}
