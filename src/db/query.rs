use anyhow::{Context, Result};
use log::debug;
use rusqlite::types::{ToSql, ValueRef};
use rusqlite::{Row, Statement};

use super::connection::Database;

/// A single value as it came back from SQLite.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl CellValue {
    fn from_ref(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(v) => CellValue::Integer(v),
            ValueRef::Real(v) => CellValue::Real(v),
            ValueRef::Text(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => CellValue::Text(format!("<{} bytes>", bytes.len())),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(v) => Some(*v as f64),
            CellValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }

    /// Text used by tables and chart labels.
    pub fn display(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Integer(v) => v.to_string(),
            CellValue::Real(v) => format!("{v:.2}"),
            CellValue::Text(v) => v.clone(),
        }
    }
}

/// Fully materialized result set: column names in statement order and every
/// row in the order SQLite produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl QueryTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Pair the first column (as labels) with the first numeric column after
    /// it. Returns `None` when there is nothing to plot, for example a
    /// single-column list of names.
    pub fn numeric_series(&self) -> Option<Vec<(String, f64)>> {
        if self.columns.len() < 2 || self.rows.is_empty() {
            return None;
        }

        let value_idx = (1..self.columns.len()).find(|idx| {
            self.rows
                .iter()
                .all(|row| row.get(*idx).is_some_and(CellValue::is_numeric))
        })?;

        Some(
            self.rows
                .iter()
                .map(|row| {
                    let label = row.first().map(CellValue::display).unwrap_or_default();
                    let value = row[value_idx].as_f64().unwrap_or_default();
                    (label, value)
                })
                .collect(),
        )
    }
}

/// Run a statement that takes no parameters and collect every row.
pub fn run_query(db: &Database, sql: &str) -> Result<QueryTable> {
    run_query_with_params(db, sql, &[])
}

/// Run a statement with exactly one bound parameter (`?1`).
pub fn run_query_with_param<P: ToSql>(db: &Database, sql: &str, param: P) -> Result<QueryTable> {
    run_query_with_params(db, sql, &[&param as &dyn ToSql])
}

fn run_query_with_params(db: &Database, sql: &str, params: &[&dyn ToSql]) -> Result<QueryTable> {
    debug!("running query: {}", sql.trim());
    let conn = db.connect().context("failed to open SQLite database")?;
    let mut stmt = conn.prepare(sql).context("failed to prepare query")?;
    let table = collect_table(&mut stmt, params)?;
    debug!("query returned {} rows", table.len());
    Ok(table)
}

fn collect_table(stmt: &mut Statement<'_>, params: &[&dyn ToSql]) -> Result<QueryTable> {
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let width = columns.len();

    let mut rows = stmt.query(params).context("failed to execute query")?;
    let mut collected = Vec::new();
    while let Some(row) = rows.next().context("failed to fetch row")? {
        collected.push(read_row(row, width)?);
    }

    Ok(QueryTable {
        columns,
        rows: collected,
    })
}

fn read_row(row: &Row<'_>, width: usize) -> Result<Vec<CellValue>> {
    (0..width)
        .map(|idx| {
            row.get_ref(idx)
                .map(CellValue::from_ref)
                .context("failed to read column value")
        })
        .collect()
}
