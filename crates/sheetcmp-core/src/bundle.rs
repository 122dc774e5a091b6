//! The immutable output of one reconciliation run

use crate::schema::{Schema, SchemaDiff};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The five tables a bundle exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    SourceA,
    SourceB,
    Common,
    UniqueA,
    UniqueB,
}

impl TableKind {
    /// All kinds, in presentation order
    pub const ALL: [TableKind; 5] = [
        TableKind::SourceA,
        TableKind::SourceB,
        TableKind::Common,
        TableKind::UniqueA,
        TableKind::UniqueB,
    ];

    /// Stable storage name
    pub fn name(self) -> &'static str {
        match self {
            TableKind::SourceA => "file1_data",
            TableKind::SourceB => "file2_data",
            TableKind::Common => "common_rows",
            TableKind::UniqueA => "unique1_rows",
            TableKind::UniqueB => "unique2_rows",
        }
    }

    /// Human-readable title, also used as the sheet name on export
    pub fn title(self) -> &'static str {
        match self {
            TableKind::SourceA => "File 1",
            TableKind::SourceB => "File 2",
            TableKind::Common => "Common Rows",
            TableKind::UniqueA => "Unique Rows (File 1)",
            TableKind::UniqueB => "Unique Rows (File 2)",
        }
    }

    /// Look a kind up by its stable name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// True for the three derived tables
    pub fn is_derived(self) -> bool {
        matches!(self, TableKind::Common | TableKind::UniqueA | TableKind::UniqueB)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableKind::from_name(s).ok_or_else(|| format!("unknown table name '{}'", s))
    }
}

/// A matched pair of rows, by index into each source table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMatch {
    pub left: usize,
    pub right: usize,
}

/// Row counts per table kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BundleCounts {
    pub source_a: usize,
    pub source_b: usize,
    pub common: usize,
    pub unique_a: usize,
    pub unique_b: usize,
}

/// Result of reconciling two tables.
///
/// Built in full by the engine and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBundle {
    source_a: Arc<Table>,
    source_b: Arc<Table>,
    schema: Schema,
    schema_diff: SchemaDiff,
    common: Table,
    unique_a: Table,
    unique_b: Table,
    matches: Vec<RowMatch>,
}

impl ResultBundle {
    pub(crate) fn new(
        source_a: Arc<Table>,
        source_b: Arc<Table>,
        schema: Schema,
        common: Table,
        unique_a: Table,
        unique_b: Table,
        matches: Vec<RowMatch>,
    ) -> Self {
        let schema_diff = SchemaDiff::between(&source_a.columns, &source_b.columns);
        Self {
            source_a,
            source_b,
            schema,
            schema_diff,
            common,
            unique_a,
            unique_b,
            matches,
        }
    }

    /// Get one of the five tables
    pub fn get(&self, kind: TableKind) -> &Table {
        match kind {
            TableKind::SourceA => self.source_a.as_ref(),
            TableKind::SourceB => self.source_b.as_ref(),
            TableKind::Common => &self.common,
            TableKind::UniqueA => &self.unique_a,
            TableKind::UniqueB => &self.unique_b,
        }
    }

    /// Get a table by its stable name
    pub fn by_name(&self, name: &str) -> Option<&Table> {
        TableKind::from_name(name).map(|k| self.get(k))
    }

    /// All five tables with their kinds, in presentation order
    pub fn iter(&self) -> impl Iterator<Item = (TableKind, &Table)> {
        TableKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }

    /// Shared handle to the first source table
    pub fn source_a(&self) -> &Arc<Table> {
        &self.source_a
    }

    /// Shared handle to the second source table
    pub fn source_b(&self) -> &Arc<Table> {
        &self.source_b
    }

    /// The unified column order of the derived tables
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// How the two source schemas overlap
    pub fn schema_diff(&self) -> &SchemaDiff {
        &self.schema_diff
    }

    /// Matched row pairs, in first-table order
    pub fn matches(&self) -> &[RowMatch] {
        &self.matches
    }

    /// Row counts per table
    pub fn counts(&self) -> BundleCounts {
        BundleCounts {
            source_a: self.source_a.row_count(),
            source_b: self.source_b.row_count(),
            common: self.common.row_count(),
            unique_a: self.unique_a.row_count(),
            unique_b: self.unique_b.row_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_names_round_trip() {
        for kind in TableKind::ALL {
            assert_eq!(TableKind::from_name(kind.name()), Some(kind));
            assert_eq!(kind.name().parse::<TableKind>(), Ok(kind));
        }
        assert_eq!(TableKind::from_name("nope"), None);
    }

    #[test]
    fn test_titles_fit_sheet_name_limit() {
        for kind in TableKind::ALL {
            assert!(kind.title().len() <= 31, "{}", kind.title());
        }
    }

    #[test]
    fn test_derived_kinds() {
        assert!(!TableKind::SourceA.is_derived());
        assert!(TableKind::Common.is_derived());
        assert!(TableKind::UniqueB.is_derived());
    }
}
