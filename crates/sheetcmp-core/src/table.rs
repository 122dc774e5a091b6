//! Core table types for representing spreadsheet data

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// A table read from one sheet or CSV file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Display name (usually the file stem)
    pub name: String,
    /// Column definitions, in header order
    pub columns: Vec<Column>,
    /// Row data, one cell per column
    pub rows: Vec<Row>,
    /// Source file path, if the table was loaded from disk
    pub source_path: Option<PathBuf>,
}

impl Table {
    /// Create a new empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            source_path: None,
        }
    }

    /// Create a table with the given header and no rows
    pub fn with_columns<I, S>(name: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(i, n)| Column::new(n.into(), i))
            .collect();
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
            source_path: None,
        }
    }

    /// Build a table from a header and rows, checking the table invariants
    pub fn from_rows<I, S>(
        name: impl Into<String>,
        names: I,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::with_columns(name, names);
        table.rows = rows.into_iter().map(Row::new).collect();
        table.validate()?;
        Ok(table)
    }

    /// Append a row. The caller is responsible for its width.
    pub fn push_row(&mut self, cells: Vec<CellValue>) {
        self.rows.push(Row::new(cells));
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in header order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a cell by row index and column name
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.find_column(column)?;
        self.rows.get(row).and_then(|r| r.get(col.index))
    }

    /// Check that column names are unique, indices are positional and every
    /// row carries exactly one value per column.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.columns.len());
        for (i, col) in self.columns.iter().enumerate() {
            if col.index != i {
                return Err(Error::engine(format!(
                    "table '{}': column '{}' has index {} at position {}",
                    self.name, col.name, col.index, i
                )));
            }
            if !seen.insert(col.name.as_str()) {
                return Err(Error::engine(format!(
                    "table '{}': duplicate column name '{}'",
                    self.name, col.name
                )));
            }
        }

        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(Error::engine(format!(
                    "table '{}': row {} has {} cells, expected {}",
                    self.name,
                    i + 1,
                    row.len(),
                    self.columns.len()
                )));
            }
        }

        Ok(())
    }
}

/// A column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, taken from the header row
    pub name: String,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: String, index: usize) -> Self {
        Self { name, index }
    }
}

/// A row of data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Cell values for each column
    pub cells: Vec<CellValue>,
}

impl Row {
    /// Create a new row
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }

    /// Number of cells in the row
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when the row has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A cell value with type detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CellValue {
    /// Text value
    String(String),
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// No value, either a blank cell or a column the source table lacks
    Missing,
}

impl CellValue {
    /// Parse a string into a CellValue, detecting the type.
    ///
    /// A token only becomes a number when the number renders back to the same
    /// text, so `00123`, `+5`, `1e3` and integers too long for an `i64` stay
    /// strings and keep their exact content.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return CellValue::Missing;
        }

        if let Ok(i) = trimmed.parse::<i64>() {
            if i.to_string() == trimmed {
                return CellValue::Integer(i);
            }
        }

        // Rust accepts "nan" and "inf" as floats; text without digits stays text
        if trimmed.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(f) = trimmed.parse::<f64>() {
                // Display gives "2.5", Debug keeps the "1.0" form
                if f.is_finite() && (f.to_string() == trimmed || format!("{:?}", f) == trimmed) {
                    return CellValue::Float(f);
                }
            }
        }

        if trimmed.eq_ignore_ascii_case("true") {
            return CellValue::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return CellValue::Boolean(false);
        }

        CellValue::String(s.to_string())
    }

    /// Check if the cell is missing
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

/// Floats compare by bit pattern, so `NaN` equals itself and a table always
/// equals its own clone.
impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::String(a), CellValue::String(b)) => a == b,
            (CellValue::Integer(a), CellValue::Integer(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => a.to_bits() == b.to_bits(),
            (CellValue::Boolean(a), CellValue::Boolean(b)) => a == b,
            (CellValue::Missing, CellValue::Missing) => true,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(fl) => write!(f, "{}", fl),
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::Missing => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Missing, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_parse_integer() {
        assert_eq!(CellValue::parse("42"), CellValue::Integer(42));
        assert_eq!(CellValue::parse("-123"), CellValue::Integer(-123));
        assert_eq!(CellValue::parse(" 0 "), CellValue::Integer(0));
    }

    #[test]
    fn test_cell_value_parse_float() {
        assert_eq!(CellValue::parse("3.5"), CellValue::Float(3.5));
        assert_eq!(CellValue::parse("-2.5"), CellValue::Float(-2.5));
        assert_eq!(CellValue::parse("1.0"), CellValue::Float(1.0));
        assert_eq!(CellValue::parse("0.30000000000000004"), CellValue::Float(0.1 + 0.2));
    }

    #[test]
    fn test_cell_value_parse_keeps_non_canonical_numbers_as_text() {
        for text in ["00123", "+5", "1e3", "2.50", "12345678901234567890"] {
            assert_eq!(CellValue::parse(text), CellValue::String(text.to_string()), "{}", text);
        }
    }

    #[test]
    fn test_float_equality_is_bitwise() {
        assert_eq!(CellValue::Float(f64::NAN), CellValue::Float(f64::NAN));
        assert_ne!(CellValue::Float(0.0), CellValue::Float(-0.0));
        assert_ne!(CellValue::Float(1.0), CellValue::Integer(1));
    }

    #[test]
    fn test_cell_value_parse_keeps_word_floats_as_text() {
        assert_eq!(CellValue::parse("nan"), CellValue::String("nan".to_string()));
        assert_eq!(CellValue::parse("inf"), CellValue::String("inf".to_string()));
    }

    #[test]
    fn test_cell_value_parse_boolean() {
        assert_eq!(CellValue::parse("TRUE"), CellValue::Boolean(true));
        assert_eq!(CellValue::parse("false"), CellValue::Boolean(false));
    }

    #[test]
    fn test_cell_value_parse_string_keeps_original_text() {
        assert_eq!(CellValue::parse("hello"), CellValue::String("hello".to_string()));
        assert_eq!(CellValue::parse(" Ali "), CellValue::String(" Ali ".to_string()));
    }

    #[test]
    fn test_cell_value_parse_missing() {
        assert_eq!(CellValue::parse(""), CellValue::Missing);
        assert_eq!(CellValue::parse("   "), CellValue::Missing);
    }

    #[test]
    fn test_cell_value_display() {
        assert_eq!(CellValue::Missing.to_string(), "");
        assert_eq!(CellValue::Float(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Boolean(true).to_string(), "true");
    }

    #[test]
    fn test_from_rows_rejects_ragged_row() {
        let err = Table::from_rows(
            "t",
            ["a", "b"],
            vec![vec![1i64.into(), 2i64.into()], vec![3i64.into()]],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Engine { .. }));
    }

    #[test]
    fn test_validate_rejects_duplicate_columns() {
        let table = Table::with_columns("t", ["a", "a"]);
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_cell_lookup_by_name() {
        let table = Table::from_rows(
            "t",
            ["Name", "Age"],
            vec![vec!["Ali".into(), 30i64.into()]],
        )
        .unwrap();
        assert_eq!(table.cell(0, "Age"), Some(&CellValue::Integer(30)));
        assert_eq!(table.cell(0, "City"), None);
        assert_eq!(table.cell(1, "Age"), None);
    }
}
