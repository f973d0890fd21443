//! Snapshot of a rendered table and lookups over it
//!
//! A [`TableData`] is plain text read once from the page by a table component;
//! everything here works on that snapshot without touching the browser.

mod assertions;

pub use assertions::TableAssertions;

use quest_common::{matches_text, Error, Result};
use serde::{Deserialize, Serialize};

/// Expected cell value in a named column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellCriteria {
    pub column: String,
    pub value: String,
}

impl CellCriteria {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the header matching `name` (trimmed, case-insensitive)
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| matches_text(h, name))
            .ok_or_else(|| Error::not_found(format!("table column '{}'", name.trim())))
    }

    /// Every value of a column, top to bottom; short rows yield ""
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let index = self.column_index(name)?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(index).map(String::as_str).unwrap_or(""))
            .collect())
    }

    pub fn cell(&self, row: usize, column: &str) -> Result<&str> {
        let index = self.column_index(column)?;
        self.rows
            .get(row)
            .and_then(|r| r.get(index))
            .map(String::as_str)
            .ok_or_else(|| Error::not_found(format!("cell ({}, '{}')", row, column)))
    }

    /// Index of the first row satisfying every criterion
    pub fn find_row(&self, criteria: &[CellCriteria]) -> Result<Option<usize>> {
        let indices = criteria
            .iter()
            .map(|c| Ok((self.column_index(&c.column)?, c.value.as_str())))
            .collect::<Result<Vec<_>>>()?;

        Ok(self.rows.iter().position(|row| {
            indices
                .iter()
                .all(|(i, value)| row.get(*i).is_some_and(|cell| matches_text(cell, value)))
        }))
    }

    pub fn assert(&self) -> TableAssertions<'_> {
        TableAssertions::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_common::ErrorKind;

    fn orders() -> TableData {
        TableData::new(
            vec!["Id".into(), "Customer".into(), "Status".into()],
            vec![
                vec!["1".into(), "Ana".into(), "Shipped".into()],
                vec!["2".into(), "Boris".into(), "Pending".into()],
                vec!["3".into(), "Ana".into(), "Pending".into()],
            ],
        )
    }

    #[test]
    fn test_column_lookup_ignores_case() {
        let table = orders();
        assert_eq!(table.column(" customer ").unwrap(), vec!["Ana", "Boris", "Ana"]);
        assert_eq!(table.cell(1, "STATUS").unwrap(), "Pending");
    }

    #[test]
    fn test_find_row_requires_every_criterion() {
        let table = orders();
        let criteria = [
            CellCriteria::new("Customer", "ana"),
            CellCriteria::new("Status", "pending"),
        ];
        assert_eq!(table.find_row(&criteria).unwrap(), Some(2));
        assert_eq!(
            table.find_row(&[CellCriteria::new("Customer", "Zoe")]).unwrap(),
            None
        );
    }

    #[test]
    fn test_unknown_column_is_not_found() {
        let err = orders()
            .find_row(&[CellCriteria::new("Total", "10")])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
