//! Column alignment between two independently shaped tables

use crate::table::{CellValue, Column, Table};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

static MISSING: CellValue = CellValue::Missing;

/// An ordered list of unique column names
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// Take the schema of a single table
    pub fn of(table: &Table) -> Self {
        Self {
            columns: table.columns.iter().map(|c| c.name.clone()).collect(),
        }
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when there are no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column by name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Column definitions, indexed by schema position
    pub fn to_columns(&self) -> Vec<Column> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, name)| Column::new(name.clone(), i))
            .collect()
    }
}

/// Unify two column lists: every column of `a` in order, then the columns of
/// `b` that `a` lacks, in `b`'s order.
pub fn align(a: &[Column], b: &[Column]) -> Schema {
    let mut columns: Vec<String> = Vec::with_capacity(a.len() + b.len());
    let mut seen: HashSet<&str> = HashSet::with_capacity(a.len() + b.len());

    for col in a.iter().chain(b.iter()) {
        if seen.insert(col.name.as_str()) {
            columns.push(col.name.clone());
        }
    }

    Schema { columns }
}

/// A table's rows re-expressed over a unified schema.
///
/// Cells borrow from the source table; columns the source lacks point at a
/// shared `Missing` value.
#[derive(Debug, Clone)]
pub struct AlignedTable<'a> {
    pub schema: &'a Schema,
    pub rows: Vec<Vec<&'a CellValue>>,
}

impl AlignedTable<'_> {
    /// Number of aligned rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Clone one aligned row into owned values
    pub fn owned_row(&self, index: usize) -> Vec<CellValue> {
        self.rows[index].iter().map(|c| (*c).clone()).collect()
    }
}

/// Re-key a table's rows onto `schema` by column name.
pub fn project<'a>(table: &'a Table, schema: &'a Schema) -> AlignedTable<'a> {
    let source_index: HashMap<&str, usize> = table
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.index))
        .collect();

    let mapping: Vec<Option<usize>> = schema
        .columns
        .iter()
        .map(|name| source_index.get(name.as_str()).copied())
        .collect();

    let rows = table
        .rows
        .iter()
        .map(|row| {
            mapping
                .iter()
                .map(|src| src.and_then(|i| row.get(i)).unwrap_or(&MISSING))
                .collect()
        })
        .collect();

    AlignedTable { schema, rows }
}

/// How two schemas overlap
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaDiff {
    /// Columns present in both, in the first table's order
    pub shared: Vec<String>,
    /// Columns only in the first table
    pub only_left: Vec<String>,
    /// Columns only in the second table
    pub only_right: Vec<String>,
}

impl SchemaDiff {
    /// Compare two column lists
    pub fn between(a: &[Column], b: &[Column]) -> Self {
        let a_names: HashSet<&str> = a.iter().map(|c| c.name.as_str()).collect();
        let b_names: HashSet<&str> = b.iter().map(|c| c.name.as_str()).collect();

        let mut diff = SchemaDiff::default();
        for col in a {
            if b_names.contains(col.name.as_str()) {
                diff.shared.push(col.name.clone());
            } else {
                diff.only_left.push(col.name.clone());
            }
        }
        diff.only_right = b
            .iter()
            .filter(|c| !a_names.contains(c.name.as_str()))
            .map(|c| c.name.clone())
            .collect();
        diff
    }

    /// True when both tables have exactly the same set of columns
    pub fn is_identical(&self) -> bool {
        self.only_left.is_empty() && self.only_right.is_empty()
    }
}
