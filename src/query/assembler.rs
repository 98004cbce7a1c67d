use crate::session::RowCursor;
use crate::types::{Row, TypeCoercer};
use crate::{Result, RowcastError};
use tracing::{debug, trace};

/// Drain `cursor`, coercing every cell and handing each [`Row`] to `each`.
///
/// The cursor is closed on every exit path. A close failure is reported only
/// when nothing else failed first.
pub async fn assemble<T, F>(mut cursor: Box<dyn RowCursor>, coercer: TypeCoercer, mut each: F) -> Result<Vec<T>>
where
    F: FnMut(Row) -> Result<T>,
{
    let outcome = drain(cursor.as_mut(), coercer, &mut each).await;
    let closed = cursor.close();
    debug!("Cursor closed after {}", if outcome.is_ok() { "success" } else { "failure" });

    match (outcome, closed) {
        (Ok(rows), Ok(())) => Ok(rows),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), _) => Err(e),
    }
}

async fn drain<T, F>(cursor: &mut dyn RowCursor, coercer: TypeCoercer, each: &mut F) -> Result<Vec<T>>
where
    F: FnMut(Row) -> Result<T>,
{
    let mut out = Vec::new();

    while let Some(raw) = cursor.next_row().await? {
        let columns = cursor.columns();
        if raw.len() != columns.len() {
            return Err(RowcastError::Cursor(format!(
                "row {} has {} cells for {} columns",
                out.len(),
                raw.len(),
                columns.len()
            )));
        }

        let mut row = Row::new();
        for (column, cell) in columns.iter().zip(&raw) {
            row.insert(column.name.clone(), coercer.coerce(column, cell.as_deref())?);
        }
        trace!("Assembled row {} with {} columns", out.len(), row.len());
        out.push(each(row)?);
    }

    Ok(out)
}
