mod common;

use common::{Call, ScriptedExecutor};
use pretty_assertions::assert_eq;
use rowcast::{
    ColumnDescriptor, Context, ErrorKind, NativeWidth, Options, Param, QueryOutput, QueryRunner, Row, RowcastError,
    TypedValue, Value, PANIC, SINGLE_RESULT,
};
use serde_json::json;
use std::sync::Arc;

fn ctx() -> Context {
    Context::background()
}

fn rows_of(output: QueryOutput<Row>) -> Vec<Row> {
    output.into_rows().expect("expected a row list")
}

#[tokio::test]
async fn test_select_non_nullable_int_is_bare() {
    let exec = ScriptedExecutor::new()
        .with_columns(vec![ColumnDescriptor::new("n", "INT4", false).with_native_width(NativeWidth::I32)])
        .with_row(&[Some("1")]);

    let output = QueryRunner::query(&ctx(), &exec, "select 1 as n", &Options::new(), ()).await.unwrap();
    assert_eq!(serde_json::to_value(&output).unwrap(), json!([{"n": 1}]));

    let rows = rows_of(output);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("n"), Some(&TypedValue::Bare(Value::Int32(1))));
}

#[tokio::test]
async fn test_select_null_varchar_is_absent() {
    let exec = ScriptedExecutor::new()
        .with_columns(vec![ColumnDescriptor::new("n", "VARCHAR", true)])
        .with_row(&[None]);

    let rows = rows_of(QueryRunner::query(&ctx(), &exec, "select null as n", &Options::new(), ()).await.unwrap());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("n"), Some(&TypedValue::Nullable(None)));
}

#[tokio::test]
async fn test_shapes_follow_nullability_for_every_class() {
    let cases = [
        ("VARCHAR", "x"),
        ("FLOAT8", "1.5"),
        ("INT8", "7"),
        ("BOOL", "true"),
        ("TIMESTAMPTZ", "2024-01-02T03:04:05Z"),
        ("DATE", "2024-01-02"),
        ("TIME", "03:04:05"),
        ("JSONB", "{\"a\":1}"),
        ("UUID", "abc"),
    ];

    for (type_name, raw) in cases {
        let exec = ScriptedExecutor::new()
            .with_columns(vec![
                ColumnDescriptor::new("required", type_name, false),
                ColumnDescriptor::new("optional", type_name, true),
            ])
            .with_row(&[Some(raw), Some(raw)]);

        let rows = rows_of(QueryRunner::query(&ctx(), &exec, "select", &Options::new(), ()).await.unwrap());
        let row = &rows[0];
        assert_eq!(row.len(), 2, "{type_name}");
        assert!(row.get("required").unwrap().is_bare(), "{type_name}");
        assert!(row.get("optional").unwrap().is_optional(), "{type_name}");
        assert_eq!(row.get("required").unwrap().value(), row.get("optional").unwrap().value());
    }
}

#[tokio::test]
async fn test_rows_keep_cursor_order() {
    let exec = ScriptedExecutor::new()
        .with_columns(vec![ColumnDescriptor::new("id", "BIGINT", false)])
        .with_row(&[Some("3")])
        .with_row(&[Some("1")])
        .with_row(&[Some("2")]);

    let output = QueryRunner::query(&ctx(), &exec, "SELECT id FROM t", &Options::new(), ()).await.unwrap();
    assert_eq!(serde_json::to_value(&output).unwrap(), json!([{"id": 3}, {"id": 1}, {"id": 2}]));
    assert_eq!(exec.closes(), 1);
}

#[tokio::test]
async fn test_execute_only_rejects_select_without_running_it() {
    let exec = Arc::new(ScriptedExecutor::new());

    let handle = tokio::spawn({
        let exec = exec.clone();
        async move { QueryRunner::execute(&Context::background(), exec.as_ref(), "select 1", &Options::new(), ()).await }
    });

    let err = handle.await.unwrap_err();
    assert!(err.is_panic());
    let message = err.into_panic().downcast::<String>().unwrap();
    assert!(message.contains("INSERT, UPDATE or DELETE"));
    assert!(exec.calls().is_empty());
}

#[tokio::test]
async fn test_execute_only_runs_mutations() {
    let exec = ScriptedExecutor::new().with_outcome(2, None);

    let outcome = QueryRunner::execute(&ctx(), &exec, "  delete from t where id in (?, ?)", &Options::new(), (1, 2))
        .await
        .unwrap();
    assert_eq!(outcome.rows_affected, 2);
    assert_eq!(
        exec.calls(),
        vec![Call::Execute {
            query: "  delete from t where id in (?, ?)".into(),
            args: vec![Param::Int(1), Param::Int(2)],
        }]
    );
}

#[tokio::test]
async fn test_mutating_statements_never_yield_rows() {
    let exec = ScriptedExecutor::new()
        .with_columns(vec![ColumnDescriptor::new("n", "INT8", false)])
        .with_row(&[Some("1")])
        .with_outcome(1, Some(10));

    for sql in ["INSERT INTO t VALUES (1)", "update t set n = 2", "\n\tDelete from t"] {
        let output = QueryRunner::query(&ctx(), &exec, sql, &SINGLE_RESULT, ()).await.unwrap();
        assert_eq!(output.outcome().map(|o| o.last_insert_id), Some(Some(10)), "{sql}");
    }
    assert!(exec.calls().iter().all(|c| matches!(c, Call::Execute { .. })));
    assert_eq!(exec.closes(), 0);
}

#[tokio::test]
async fn test_single_result_on_zero_rows_is_absence_marker() {
    let exec = ScriptedExecutor::new().with_columns(vec![ColumnDescriptor::new("n", "INT8", false)]);

    let output = QueryRunner::query(&ctx(), &exec, "select n from t", &SINGLE_RESULT, ()).await.unwrap();
    assert_eq!(output, QueryOutput::Single(None));
}

#[tokio::test]
async fn test_single_result_returns_first_row() {
    let exec = ScriptedExecutor::new()
        .with_columns(vec![ColumnDescriptor::new("n", "INT8", false)])
        .with_row(&[Some("5")])
        .with_row(&[Some("6")]);

    let output = QueryRunner::query(&ctx(), &exec, "select n from t", &Options::single(), ()).await.unwrap();
    let row = output.into_single().unwrap();
    assert_eq!(row.value("n"), Some(&Value::Int64(5)));
}

#[tokio::test]
async fn test_zero_rows_without_single_result_is_empty_list() {
    let exec = ScriptedExecutor::new().with_columns(vec![ColumnDescriptor::new("n", "INT8", false)]);

    let output = QueryRunner::query(&ctx(), &exec, "select n from t", &Options::new(), ()).await.unwrap();
    assert_eq!(output, QueryOutput::Rows(Vec::new()));
}

#[tokio::test]
async fn test_list_argument_matches_individual_arguments() {
    let spread = ScriptedExecutor::new();
    let individual = ScriptedExecutor::new();
    let sql = "select * from t where id in (?, ?, ?)";

    QueryRunner::query(&ctx(), &spread, sql, &Options::new(), vec![1, 2, 3]).await.unwrap();
    QueryRunner::query(&ctx(), &spread, sql, &Options::new(), [1, 2, 3]).await.unwrap();
    QueryRunner::query(&ctx(), &spread, sql, &Options::new(), &[1, 2, 3][..]).await.unwrap();
    QueryRunner::query(&ctx(), &individual, sql, &Options::new(), (1, 2, 3)).await.unwrap();

    let expected = Call::Query {
        query: sql.into(),
        args: vec![Param::Int(1), Param::Int(2), Param::Int(3)],
    };
    assert_eq!(spread.calls(), vec![expected.clone(), expected.clone(), expected.clone()]);
    assert_eq!(individual.calls(), vec![expected]);
}

#[tokio::test]
async fn test_mixed_individual_arguments() {
    let exec = ScriptedExecutor::new();
    QueryRunner::query(&ctx(), &exec, "select ?, ?, ?", &Options::new(), ("a", None::<i32>, 2.5))
        .await
        .unwrap();

    assert_eq!(
        exec.calls(),
        vec![Call::Query {
            query: "select ?, ?, ?".into(),
            args: vec![Param::Text("a".into()), Param::Null, Param::Float(2.5)],
        }]
    );
}

#[tokio::test]
async fn test_execution_error_is_returned() {
    let exec = ScriptedExecutor::new().failing_query("no such table: t");

    let err = QueryRunner::query(&ctx(), &exec, "select * from t", &Options::new(), ()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution);
    assert_eq!(err.to_string(), "Execution error: no such table: t");
    assert_eq!(exec.closes(), 0);
}

#[tokio::test]
async fn test_panic_mode_raises_the_same_error() {
    let exec = Arc::new(ScriptedExecutor::new().failing_query("boom"));

    let handle = tokio::spawn({
        let exec = exec.clone();
        async move { QueryRunner::query(&Context::background(), exec.as_ref(), "select 1", &PANIC, ()).await }
    });

    let err = handle.await.unwrap_err();
    let payload = err.into_panic().downcast::<RowcastError>().unwrap();
    assert!(matches!(*payload, RowcastError::Execution(ref msg) if msg == "boom"));
}

#[tokio::test]
async fn test_panic_mode_on_mutating_path() {
    let exec = Arc::new(ScriptedExecutor::new().failing_execute("constraint failed"));

    let handle = tokio::spawn({
        let exec = exec.clone();
        async move {
            QueryRunner::execute(&Context::background(), exec.as_ref(), "insert into t values (1)", &PANIC, ()).await
        }
    });

    let payload = handle.await.unwrap_err().into_panic().downcast::<RowcastError>().unwrap();
    assert_eq!(payload.kind(), ErrorKind::Execution);
}

#[tokio::test]
async fn test_panic_mode_without_error_returns_normally() {
    let exec = ScriptedExecutor::new()
        .with_columns(vec![ColumnDescriptor::new("n", "INT8", false)])
        .with_row(&[Some("1")]);

    let output = QueryRunner::query(&ctx(), &exec, "select 1", &PANIC, ()).await.unwrap();
    assert_eq!(rows_of(output).len(), 1);
}

#[tokio::test]
async fn test_cursor_failure_closes_cursor_and_returns_no_rows() {
    let exec = ScriptedExecutor::new()
        .with_columns(vec![ColumnDescriptor::new("n", "INT8", false)])
        .with_row(&[Some("1")])
        .with_row(&[Some("2")])
        .failing_at_row(1);

    let err = QueryRunner::query(&ctx(), &exec, "select n from t", &Options::new(), ()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cursor);
    assert_eq!(exec.closes(), 1);
}

#[tokio::test]
async fn test_close_failure_is_surfaced() {
    let exec = ScriptedExecutor::new()
        .with_columns(vec![ColumnDescriptor::new("n", "INT8", false)])
        .with_row(&[Some("1")])
        .failing_close("close failed");

    let err = QueryRunner::query(&ctx(), &exec, "select n from t", &Options::new(), ()).await.unwrap_err();
    assert!(matches!(err, RowcastError::Cursor(ref msg) if msg == "close failed"));
}

#[tokio::test]
async fn test_iteration_error_wins_over_close_error() {
    let exec = ScriptedExecutor::new()
        .with_columns(vec![ColumnDescriptor::new("n", "INT8", false)])
        .with_row(&[Some("1")])
        .failing_at_row(0)
        .failing_close("close failed");

    let err = QueryRunner::query(&ctx(), &exec, "select n from t", &Options::new(), ()).await.unwrap_err();
    assert!(err.to_string().contains("iteration failed"));
    assert_eq!(exec.closes(), 1);
}

#[tokio::test]
async fn test_duplicate_column_names_keep_last_value() {
    let exec = ScriptedExecutor::new()
        .with_columns(vec![
            ColumnDescriptor::new("v", "INT8", false),
            ColumnDescriptor::new("v", "TEXT", false),
        ])
        .with_row(&[Some("1"), Some("one")]);

    let rows = rows_of(QueryRunner::query(&ctx(), &exec, "select 1 v, 'one' v", &Options::new(), ()).await.unwrap());
    assert_eq!(rows[0].len(), 1);
    assert_eq!(rows[0].value("v"), Some(&Value::Text("one".into())));
}

#[tokio::test]
async fn test_row_with_missing_cells_is_cursor_error() {
    let exec = ScriptedExecutor::new()
        .with_columns(vec![
            ColumnDescriptor::new("id", "INT8", false),
            ColumnDescriptor::new("name", "TEXT", false),
        ])
        .with_row(&[Some("1")]);

    let err = QueryRunner::query(&ctx(), &exec, "select id, name from t", &Options::new(), ()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cursor);
    assert_eq!(exec.closes(), 1);
}
