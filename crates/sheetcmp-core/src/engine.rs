//! Row reconciliation: partition two tables into common and unique rows
//!
//! Rows are compared on their full content over the unified schema. Matching
//! is multiset-based: every row of the second table can be claimed by at most
//! one row of the first, so duplicates keep their multiplicity.

use crate::bundle::{ResultBundle, RowMatch, TableKind};
use crate::error::Result;
use crate::normalize::{normalize_with, KeyPart, NormalizeOptions};
use crate::schema::{align, project, Schema};
use crate::table::{CellValue, Row, Table};
use log::{debug, info};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Structured equality key of one aligned row.
///
/// Holds one part per unified column, so two rows whose values differ only in
/// where a separator would fall never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComparisonKey(Vec<KeyPart>);

impl ComparisonKey {
    /// Build the key of an aligned row
    pub fn of(row: &[&CellValue], options: &NormalizeOptions) -> Self {
        Self(row.iter().map(|c| normalize_with(c, options)).collect())
    }

    /// The key parts in schema order
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }
}

/// Reconcile two tables with the default comparison policy
pub fn reconcile(a: impl Into<Arc<Table>>, b: impl Into<Arc<Table>>) -> Result<ResultBundle> {
    reconcile_with(a, b, &NormalizeOptions::default())
}

/// Reconcile two tables.
///
/// Returns the common rows (taken from `a`), the rows only in `a` and the rows
/// only in `b`, all over the unified schema with original values. Fails with
/// [`Error::Engine`](crate::Error::Engine) if either table breaks the table
/// invariants; no bundle is produced in that case.
pub fn reconcile_with(
    a: impl Into<Arc<Table>>,
    b: impl Into<Arc<Table>>,
    options: &NormalizeOptions,
) -> Result<ResultBundle> {
    let a: Arc<Table> = a.into();
    let b: Arc<Table> = b.into();
    a.validate()?;
    b.validate()?;

    let schema = align(&a.columns, &b.columns);
    debug!(
        "unified schema for '{}' and '{}': {:?}",
        a.name,
        b.name,
        schema.columns()
    );

    let partition = partition(&a, &b, &schema, options);

    info!(
        "reconciled '{}' ({} rows) with '{}' ({} rows): {} common, {} only in first, {} only in second",
        a.name,
        a.row_count(),
        b.name,
        b.row_count(),
        partition.common.len(),
        partition.unique_a.len(),
        partition.unique_b.len()
    );

    let common = derived_table(TableKind::Common, &schema, partition.common);
    let unique_a = derived_table(TableKind::UniqueA, &schema, partition.unique_a);
    let unique_b = derived_table(TableKind::UniqueB, &schema, partition.unique_b);

    Ok(ResultBundle::new(
        a,
        b,
        schema,
        common,
        unique_a,
        unique_b,
        partition.matches,
    ))
}

struct Partition {
    common: Vec<Vec<CellValue>>,
    unique_a: Vec<Vec<CellValue>>,
    unique_b: Vec<Vec<CellValue>>,
    matches: Vec<RowMatch>,
}

fn partition(a: &Table, b: &Table, schema: &Schema, options: &NormalizeOptions) -> Partition {
    let aligned_a = project(a, schema);
    let aligned_b = project(b, schema);

    // key -> indices of b rows not yet claimed, in b order
    let mut pending: HashMap<ComparisonKey, VecDeque<usize>> = HashMap::new();
    for (j, row) in aligned_b.rows.iter().enumerate() {
        pending
            .entry(ComparisonKey::of(row, options))
            .or_default()
            .push_back(j);
    }

    let mut claimed = vec![false; aligned_b.row_count()];
    let mut result = Partition {
        common: Vec::new(),
        unique_a: Vec::new(),
        unique_b: Vec::new(),
        matches: Vec::new(),
    };

    for (i, row) in aligned_a.rows.iter().enumerate() {
        let key = ComparisonKey::of(row, options);
        match pending.get_mut(&key).and_then(VecDeque::pop_front) {
            Some(j) => {
                claimed[j] = true;
                result.matches.push(RowMatch { left: i, right: j });
                result.common.push(aligned_a.owned_row(i));
            }
            None => result.unique_a.push(aligned_a.owned_row(i)),
        }
    }

    result.unique_b = (0..aligned_b.row_count())
        .filter(|&j| !claimed[j])
        .map(|j| aligned_b.owned_row(j))
        .collect();

    result
}

fn derived_table(kind: TableKind, schema: &Schema, rows: Vec<Vec<CellValue>>) -> Table {
    Table {
        name: kind.name().to_string(),
        columns: schema.to_columns(),
        rows: rows.into_iter().map(Row::new).collect(),
        source_path: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::parser::parse_csv_str;

    fn table(name: &str, columns: &[&str], rows: Vec<Vec<CellValue>>) -> Table {
        Table::from_rows(name, columns.iter().copied(), rows).unwrap()
    }

    #[test]
    fn test_identical_tables_are_all_common() {
        let a = parse_csv_str("ID,Name\n1,foo\n2,bar\n", "a.csv").unwrap();
        let b = a.clone();

        let bundle = reconcile(a, b).unwrap();

        assert_eq!(bundle.get(TableKind::Common).row_count(), 2);
        assert_eq!(bundle.get(TableKind::UniqueA).row_count(), 0);
        assert_eq!(bundle.get(TableKind::UniqueB).row_count(), 0);
    }

    #[test]
    fn test_basic_partition() {
        let a = parse_csv_str("ID,Name\n1,foo\n2,bar\n", "a.csv").unwrap();
        let b = parse_csv_str("ID,Name\n2,bar\n3,baz\n", "b.csv").unwrap();

        let bundle = reconcile(a, b).unwrap();

        let common = bundle.get(TableKind::Common);
        assert_eq!(common.row_count(), 1);
        assert_eq!(common.cell(0, "ID"), Some(&CellValue::Integer(2)));
        assert_eq!(
            bundle.get(TableKind::UniqueA).cell(0, "Name"),
            Some(&CellValue::from("foo"))
        );
        assert_eq!(
            bundle.get(TableKind::UniqueB).cell(0, "Name"),
            Some(&CellValue::from("baz"))
        );
        assert_eq!(bundle.matches(), [RowMatch { left: 1, right: 0 }]);
    }

    #[test]
    fn test_integer_matches_integral_float() {
        let a = table("a", &["Name", "Qty"], vec![vec!["x".into(), 5i64.into()]]);
        let b = table("b", &["Name", "Qty"], vec![vec!["x".into(), 5.0f64.into()]]);

        let bundle = reconcile(a, b).unwrap();

        assert_eq!(bundle.get(TableKind::Common).row_count(), 1);
        assert!(bundle.get(TableKind::UniqueA).is_empty());
        assert!(bundle.get(TableKind::UniqueB).is_empty());
        // original value from the first table is kept
        assert_eq!(
            bundle.get(TableKind::Common).cell(0, "Qty"),
            Some(&CellValue::Integer(5))
        );
    }

    #[test]
    fn test_numeric_and_string_age_match() {
        let a = table("a", &["Name", "Age"], vec![vec!["Ali".into(), 30i64.into()]]);
        let b = table("b", &["Name", "Age"], vec![vec!["Ali".into(), "30".into()]]);

        let bundle = reconcile(a, b).unwrap();

        assert_eq!(bundle.get(TableKind::Common).row_count(), 1);
        assert_eq!(
            bundle.get(TableKind::Common).cell(0, "Age"),
            Some(&CellValue::Integer(30))
        );
    }

    #[test]
    fn test_missing_column_matches_empty_string_by_default() {
        let a = table("a", &["Name"], vec![vec!["Ali".into()]]);
        let b = table("b", &["Name", "City"], vec![vec!["Ali".into(), "".into()]]);

        let bundle = reconcile(a, b).unwrap();

        let common = bundle.get(TableKind::Common);
        assert_eq!(common.row_count(), 1);
        assert_eq!(common.column_names(), ["Name", "City"]);
        // the missing marker is not reconstructed from the second table
        assert_eq!(common.cell(0, "City"), Some(&CellValue::Missing));
    }

    #[test]
    fn test_missing_column_differs_from_empty_string_when_strict() {
        let a = table("a", &["Name"], vec![vec!["Ali".into()]]);
        let b = table("b", &["Name", "City"], vec![vec!["Ali".into(), "".into()]]);
        let strict = NormalizeOptions {
            missing_matches_empty: false,
            ..Default::default()
        };

        let bundle = reconcile_with(a, b, &strict).unwrap();

        assert!(bundle.get(TableKind::Common).is_empty());
        assert_eq!(bundle.get(TableKind::UniqueA).row_count(), 1);
        assert_eq!(bundle.get(TableKind::UniqueB).row_count(), 1);
    }

    #[test]
    fn test_missing_column_never_matches_real_value() {
        let a = table("a", &["Name"], vec![vec!["Ali".into()]]);
        let b = table("b", &["Name", "City"], vec![vec!["Ali".into(), "Tabriz".into()]]);

        let bundle = reconcile(a, b).unwrap();

        assert!(bundle.get(TableKind::Common).is_empty());
        assert_eq!(
            bundle.get(TableKind::UniqueB).cell(0, "City"),
            Some(&CellValue::from("Tabriz"))
        );
        assert_eq!(
            bundle.get(TableKind::UniqueA).cell(0, "City"),
            Some(&CellValue::Missing)
        );
    }

    #[test]
    fn test_duplicate_rows_keep_multiplicity() {
        let a = parse_csv_str("ID,Name\n1,foo\n1,foo\n", "a.csv").unwrap();
        let b = parse_csv_str("ID,Name\n1,foo\n", "b.csv").unwrap();

        let bundle = reconcile(a, b).unwrap();

        assert_eq!(bundle.get(TableKind::Common).row_count(), 1);
        assert_eq!(bundle.get(TableKind::UniqueA).row_count(), 1);
        assert_eq!(bundle.get(TableKind::UniqueB).row_count(), 0);
        assert_eq!(bundle.matches(), [RowMatch { left: 0, right: 0 }]);
    }

    #[test]
    fn test_duplicates_on_both_sides_pair_in_order() {
        let a = parse_csv_str("V\n1\n1\n2\n", "a.csv").unwrap();
        let b = parse_csv_str("V\n1\n2\n1\n1\n", "b.csv").unwrap();

        let bundle = reconcile(a, b).unwrap();

        assert_eq!(
            bundle.matches(),
            [
                RowMatch { left: 0, right: 0 },
                RowMatch { left: 1, right: 2 },
                RowMatch { left: 2, right: 1 },
            ]
        );
        assert_eq!(bundle.get(TableKind::UniqueB).row_count(), 1);
    }

    #[test]
    fn test_empty_first_table() {
        let a = Table::with_columns("a", ["ID", "Name"]);
        let b = parse_csv_str("ID,Name\n1,a\n2,b\n3,c\n", "b.csv").unwrap();

        let bundle = reconcile(a, b).unwrap();

        assert!(bundle.get(TableKind::Common).is_empty());
        assert!(bundle.get(TableKind::UniqueA).is_empty());
        assert_eq!(bundle.get(TableKind::UniqueB).row_count(), 3);
        assert_eq!(bundle.schema().columns(), ["ID", "Name"]);
        assert_eq!(bundle.get(TableKind::Common).column_count(), 2);
    }

    #[test]
    fn test_disjoint_schemas_never_match() {
        let a = table("a", &["x"], vec![vec![1i64.into()]]);
        let b = table("b", &["y"], vec![vec![1i64.into()]]);

        let bundle = reconcile(a, b).unwrap();

        assert_eq!(bundle.schema().columns(), ["x", "y"]);
        assert!(bundle.get(TableKind::Common).is_empty());
        assert_eq!(
            bundle.get(TableKind::UniqueA).rows[0].cells,
            [CellValue::Integer(1), CellValue::Missing]
        );
        assert_eq!(
            bundle.get(TableKind::UniqueB).rows[0].cells,
            [CellValue::Missing, CellValue::Integer(1)]
        );
    }

    #[test]
    fn test_separator_in_values_does_not_collide() {
        let a = table("a", &["p", "q"], vec![vec!["a,b".into(), "c".into()]]);
        let b = table("b", &["p", "q"], vec![vec!["a".into(), "b,c".into()]]);

        let bundle = reconcile(a, b).unwrap();

        assert!(bundle.get(TableKind::Common).is_empty());
        assert_eq!(bundle.get(TableKind::UniqueA).row_count(), 1);
        assert_eq!(bundle.get(TableKind::UniqueB).row_count(), 1);
    }

    #[test]
    fn test_reordered_columns_align_by_name() {
        let a = parse_csv_str("Name,ID\nfoo,1\n", "a.csv").unwrap();
        let b = parse_csv_str("ID,Name\n1,foo\n", "b.csv").unwrap();

        let bundle = reconcile(a, b).unwrap();

        assert_eq!(bundle.get(TableKind::Common).row_count(), 1);
        assert_eq!(bundle.schema().columns(), ["Name", "ID"]);
    }

    #[test]
    fn test_partition_completeness() {
        let a = parse_csv_str("V,W\n1,a\n2,b\n2,b\n3,\n", "a.csv").unwrap();
        let b = parse_csv_str("W,V\nb,2\n,3\nz,9\n", "b.csv").unwrap();

        let bundle = reconcile(a, b).unwrap();
        let counts = bundle.counts();

        assert_eq!(counts.common + counts.unique_a, counts.source_a);
        assert_eq!(counts.common + counts.unique_b, counts.source_b);
        assert_eq!(bundle.matches().len(), counts.common);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let a = Arc::new(parse_csv_str("ID,Name\n1,foo\n2,bar\n2,bar\n", "a.csv").unwrap());
        let b = Arc::new(parse_csv_str("Name,ID,Extra\nbar,2,\nqux,4,x\n", "b.csv").unwrap());

        let first = reconcile(a.clone(), b.clone()).unwrap();
        let second = reconcile(a, b).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_reconcile_is_idempotent_with_nan_cells() {
        let a = Arc::new(table("a", &["V"], vec![vec![f64::NAN.into()], vec![1.5f64.into()]]));
        let b = Arc::new(table("b", &["V"], vec![vec![f64::NAN.into()]]));

        let first = reconcile(a.clone(), b.clone()).unwrap();
        let second = reconcile(a, b).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.get(TableKind::Common).row_count(), 1);
    }

    #[test]
    fn test_long_digit_ids_stay_distinct() {
        let a = parse_csv_str("ID\n12345678901234567890\n", "a.csv").unwrap();
        let b = parse_csv_str("ID\n12345678901234567891\n", "b.csv").unwrap();

        let bundle = reconcile(a, b).unwrap();

        assert!(bundle.get(TableKind::Common).is_empty());
        assert_eq!(
            bundle.get(TableKind::UniqueA).cell(0, "ID"),
            Some(&CellValue::from("12345678901234567890"))
        );
    }

    #[test]
    fn test_leading_zeros_are_not_numbers() {
        let a = parse_csv_str("Zip\n00123\n", "a.csv").unwrap();
        let b = parse_csv_str("Zip\n123\n", "b.csv").unwrap();

        let bundle = reconcile(a.clone(), b).unwrap();

        assert!(bundle.get(TableKind::Common).is_empty());
        assert_eq!(
            bundle.get(TableKind::UniqueA).cell(0, "Zip"),
            Some(&CellValue::from("00123"))
        );

        let same = reconcile(a, parse_csv_str("Zip\n00123\n", "c.csv").unwrap()).unwrap();
        assert_eq!(
            same.get(TableKind::Common).cell(0, "Zip"),
            Some(&CellValue::from("00123"))
        );
    }

    #[test]
    fn test_case_insensitive_option() {
        let a = table("a", &["Name"], vec![vec!["ALI".into()]]);
        let b = table("b", &["Name"], vec![vec!["ali".into()]]);
        let folded = NormalizeOptions {
            case_insensitive: true,
            ..Default::default()
        };

        assert!(reconcile(a.clone(), b.clone()).unwrap().get(TableKind::Common).is_empty());
        assert_eq!(
            reconcile_with(a, b, &folded).unwrap().get(TableKind::Common).row_count(),
            1
        );
    }

    #[test]
    fn test_ragged_input_is_an_engine_error() {
        let mut a = Table::with_columns("a", ["x", "y"]);
        a.push_row(vec![CellValue::Integer(1)]);
        let b = Table::with_columns("b", ["x", "y"]);

        let err = reconcile(a, b).unwrap_err();

        assert!(matches!(err, Error::Engine { .. }));
    }

    #[test]
    fn test_derived_tables_use_stable_names() {
        let bundle = reconcile(Table::with_columns("a", ["x"]), Table::with_columns("b", ["x"]))
            .unwrap();
        assert_eq!(bundle.get(TableKind::Common).name, "common_rows");
        assert_eq!(bundle.by_name("unique2_rows").map(|t| t.name.as_str()), Some("unique2_rows"));
        assert_eq!(bundle.by_name("file1_data").map(|t| t.name.as_str()), Some("a"));
    }

    #[test]
    fn test_comparison_key_parts_follow_schema_order() {
        let values = [CellValue::from("a"), CellValue::Integer(1), CellValue::Missing];
        let row: Vec<&CellValue> = values.iter().collect();
        let key = ComparisonKey::of(&row, &NormalizeOptions::default());
        assert_eq!(
            key.parts(),
            [
                KeyPart::Text("a".to_string()),
                KeyPart::Text("1".to_string()),
                KeyPart::Text(String::new()),
            ]
        );
    }
}
