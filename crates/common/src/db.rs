//! SQLite query helpers for database-backed assertions

use crate::{Error, Result};
use parking_lot::Mutex;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Params};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared connection used by tests to read and verify application data
#[derive(Clone, Debug)]
pub struct QueryRunner {
    conn: Arc<Mutex<Connection>>,
}

impl QueryRunner {
    /// Open an existing database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        info!("Opened database at {:?}", path.as_ref());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run one or more statements without reading results
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.lock().execute_batch(sql)?;
        Ok(())
    }

    /// Run a statement and return the number of affected rows
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        Ok(self.conn.lock().execute(sql, params)?)
    }

    /// Run a query and collect every row as JSON values
    pub fn query<P: Params>(&self, sql: &str, params: P) -> Result<QueryResponse> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params)?;
        let mut collected = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                values.push(to_json(row.get_ref(index)?));
            }
            collected.push(values);
        }

        debug!("Query returned {} row(s): {}", collected.len(), sql);
        Ok(QueryResponse {
            columns,
            rows: collected,
        })
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}

/// Result set of a query
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResponse {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_index(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .ok_or_else(|| Error::not_found(format!("column '{}' in query result", column)))
    }

    /// All values of one column
    pub fn column(&self, column: &str) -> Result<Vec<&Value>> {
        let index = self.column_index(column)?;
        Ok(self.rows.iter().map(|row| &row[index]).collect())
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column).ok()?;
        self.rows.get(row).map(|r| &r[index])
    }

    pub fn expect_row_count(&self, expected: usize) -> Result<&Self> {
        if self.rows.len() != expected {
            return Err(Error::Assertion(format!(
                "expected {} row(s), query returned {}",
                expected,
                self.rows.len()
            )));
        }
        Ok(self)
    }

    pub fn expect_not_empty(&self) -> Result<&Self> {
        if self.rows.is_empty() {
            return Err(Error::Assertion("query returned no rows".to_string()));
        }
        Ok(self)
    }

    pub fn expect_value(&self, row: usize, column: &str, expected: impl Into<Value>) -> Result<&Self> {
        let expected = expected.into();
        match self.value(row, column) {
            Some(actual) if *actual == expected => Ok(self),
            Some(actual) => Err(Error::Assertion(format!(
                "row {} column '{}': expected {}, found {}",
                row, column, expected, actual
            ))),
            None => Err(Error::Assertion(format!(
                "row {} column '{}' is not present",
                row, column
            ))),
        }
    }
}
