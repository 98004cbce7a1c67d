//! Query entry points and result shaping.

use crate::decode::RowDecoder;
use crate::query::assembler::assemble;
use crate::query::{Args, IntoArgs, Options, QueryTypeDetector, StatementKind};
use crate::session::{Context, ExecOutcome, Executor};
use crate::types::{Row, TypeCoercer};
use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

/// What a call produced.
///
/// Mutating statements always yield `Executed`. Row-producing statements
/// yield `Rows`, or `Single` when [`Options::single_result`] is set;
/// `Single(None)` means nothing matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutput<T = Row> {
    Executed(ExecOutcome),
    Rows(Vec<T>),
    Single(Option<T>),
}

impl<T> QueryOutput<T> {
    pub fn outcome(&self) -> Option<&ExecOutcome> {
        match self {
            QueryOutput::Executed(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// The rows of a `Rows` result.
    pub fn into_rows(self) -> Option<Vec<T>> {
        match self {
            QueryOutput::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// The row of a `Single` result, `None` for other variants as well as
    /// for an empty single result.
    pub fn into_single(self) -> Option<T> {
        match self {
            QueryOutput::Single(row) => row,
            _ => None,
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, QueryOutput::Executed(_))
    }
}

/// Runs statements through an [`Executor`] and normalizes what comes back.
pub struct QueryRunner;

impl QueryRunner {
    /// Run `sql` and return rows as [`Row`] mappings.
    ///
    /// INSERT, UPDATE and DELETE go to [`Executor::execute`]; anything else
    /// is treated as a query.
    pub async fn query<E, A>(
        ctx: &Context,
        executor: &E,
        sql: &str,
        options: &Options,
        args: A,
    ) -> Result<QueryOutput<Row>>
    where
        E: Executor + ?Sized,
        A: IntoArgs,
    {
        let result = Self::run(ctx, executor, sql, options, args.into_args(), Ok).await;
        settle(result, options)
    }

    /// Like [`query`](Self::query) but decodes every row into `T`.
    ///
    /// The first row that fails to decode aborts the call.
    pub async fn query_as<T, E, A>(
        ctx: &Context,
        executor: &E,
        sql: &str,
        options: &Options,
        args: A,
    ) -> Result<QueryOutput<T>>
    where
        T: DeserializeOwned,
        E: Executor + ?Sized,
        A: IntoArgs,
    {
        let decoder = RowDecoder::new(options.decoder_config.as_ref());
        let result = Self::run(ctx, executor, sql, options, args.into_args(), |row| decoder.decode(row)).await;
        settle(result, options)
    }

    /// Run an INSERT, UPDATE or DELETE.
    ///
    /// # Panics
    ///
    /// Panics before touching the executor when `sql` is not one of those
    /// statements.
    pub async fn execute<E, A>(
        ctx: &Context,
        executor: &E,
        sql: &str,
        options: &Options,
        args: A,
    ) -> Result<ExecOutcome>
    where
        E: Executor + ?Sized,
        A: IntoArgs,
    {
        if !QueryTypeDetector::is_mutating(sql) {
            panic!("execute only accepts INSERT, UPDATE or DELETE statements, got: {sql}");
        }

        let args = args.into_args();
        debug!("Executing mutating statement with {} args", args.len());
        let result = executor.execute(ctx, sql, args.as_slice()).await;
        settle(result, options)
    }

    async fn run<T, E, F>(
        ctx: &Context,
        executor: &E,
        sql: &str,
        options: &Options,
        args: Args,
        each: F,
    ) -> Result<QueryOutput<T>>
    where
        E: Executor + ?Sized,
        F: FnMut(Row) -> Result<T>,
    {
        let kind = QueryTypeDetector::classify(sql);
        debug!("Running {} statement with {} args", kind.name(), args.len());

        match kind {
            StatementKind::Mutating => {
                let outcome = executor.execute(ctx, sql, args.as_slice()).await?;
                Ok(QueryOutput::Executed(outcome))
            }
            StatementKind::RowProducing => {
                let cursor = executor.query(ctx, sql, args.as_slice()).await?;
                let rows = assemble(cursor, TypeCoercer::new(options.parse_policy), each).await?;
                debug!("Query returned {} rows", rows.len());
                Ok(collapse(rows, options.single_result))
            }
        }
    }
}

fn collapse<T>(rows: Vec<T>, single_result: bool) -> QueryOutput<T> {
    if single_result {
        QueryOutput::Single(rows.into_iter().next())
    } else {
        QueryOutput::Rows(rows)
    }
}

/// Return the result, or raise the error as the panic payload when the
/// caller asked for it.
fn settle<T>(result: Result<T>, options: &Options) -> Result<T> {
    match result {
        Err(err) if options.panic_on_error => {
            error!("Raising query error: {}", err);
            std::panic::panic_any(err)
        }
        other => other,
    }
}
