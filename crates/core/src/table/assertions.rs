use quest_common::{contains_text, Error, Result};
use std::collections::HashSet;

use super::{CellCriteria, TableData};

/// Chainable checks over a [`TableData`]; each failure is an `Assertion` error
pub struct TableAssertions<'a> {
    table: &'a TableData,
}

impl<'a> TableAssertions<'a> {
    pub fn new(table: &'a TableData) -> Self {
        Self { table }
    }

    pub fn row_count(&self, expected: usize) -> Result<&Self> {
        if self.table.len() != expected {
            return Err(Error::Assertion(format!(
                "expected {} table row(s), found {}",
                expected,
                self.table.len()
            )));
        }
        Ok(self)
    }

    /// Every row has at least one non-blank cell
    pub fn all_rows_not_empty(&self) -> Result<&Self> {
        if let Some(index) = self
            .table
            .rows
            .iter()
            .position(|row| row.iter().all(|cell| cell.trim().is_empty()))
        {
            return Err(Error::Assertion(format!("table row {} is empty", index)));
        }
        Ok(self)
    }

    pub fn no_duplicate_rows(&self) -> Result<&Self> {
        let mut seen = HashSet::new();
        for (index, row) in self.table.rows.iter().enumerate() {
            if !seen.insert(row) {
                return Err(Error::Assertion(format!(
                    "table row {} duplicates an earlier row: {:?}",
                    index, row
                )));
            }
        }
        Ok(self)
    }

    /// Some cell of `column` contains `value`
    pub fn column_contains(&self, column: &str, value: &str) -> Result<&Self> {
        let values = self.table.column(column)?;
        if !values.iter().any(|cell| contains_text(cell, value)) {
            return Err(Error::Assertion(format!(
                "column '{}' has no cell containing '{}'",
                column, value
            )));
        }
        Ok(self)
    }

    /// Column values are ordered; numeric when every cell parses as a number
    pub fn column_sorted(&self, column: &str, ascending: bool) -> Result<&Self> {
        let values = self.table.column(column)?;
        let numbers: Option<Vec<f64>> = values.iter().map(|v| v.trim().parse().ok()).collect();

        let unordered = match numbers {
            Some(numbers) => numbers.windows(2).position(|w| {
                if ascending {
                    w[0] > w[1]
                } else {
                    w[0] < w[1]
                }
            }),
            None => values.windows(2).position(|w| {
                let (a, b) = (w[0].trim().to_lowercase(), w[1].trim().to_lowercase());
                if ascending {
                    a > b
                } else {
                    a < b
                }
            }),
        };

        if let Some(index) = unordered {
            return Err(Error::Assertion(format!(
                "column '{}' is not sorted {}: '{}' before '{}'",
                column,
                if ascending { "ascending" } else { "descending" },
                values[index],
                values[index + 1]
            )));
        }
        Ok(self)
    }

    pub fn has_row(&self, criteria: &[CellCriteria]) -> Result<&Self> {
        if self.table.find_row(criteria)?.is_none() {
            return Err(Error::Assertion(format!("no table row matches {:?}", criteria)));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_common::ErrorKind;
    use test_case::test_case;

    fn table(rows: &[&[&str]]) -> TableData {
        TableData::new(
            vec!["Name".into(), "Price".into()],
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_chained_checks_pass() {
        let data = table(&[&["Apple", "2"], &["Banana", "10"], &["cherry", "12.5"]]);
        data.assert()
            .row_count(3)
            .unwrap()
            .all_rows_not_empty()
            .unwrap()
            .no_duplicate_rows()
            .unwrap()
            .column_contains("name", "nan")
            .unwrap()
            .column_sorted("Name", true)
            .unwrap()
            .column_sorted("Price", true)
            .unwrap()
            .has_row(&[CellCriteria::new("Name", "banana")])
            .unwrap();
    }

    #[test_case(&[&["a", "1"], &["a", "1"]] ; "duplicate rows")]
    #[test_case(&[&["a", "1"], &[" ", ""]] ; "blank row")]
    fn test_row_checks_fail(rows: &[&[&str]]) {
        let data = table(rows);
        let checks = data.assert();
        let result = checks
            .no_duplicate_rows()
            .and_then(|c| c.all_rows_not_empty());
        assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Assertion));
    }

    #[test]
    fn test_numeric_sort_is_not_lexicographic() {
        let data = table(&[&["x", "10"], &["y", "9"]]);
        assert!(data.assert().column_sorted("Price", false).is_ok());
        let err = data.assert().column_sorted("Price", true).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Assertion);
    }

    #[test]
    fn test_missing_row_fails() {
        let data = table(&[&["Apple", "2"]]);
        let err = data
            .assert()
            .has_row(&[CellCriteria::new("Name", "Pear")])
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Assertion);
    }
}
