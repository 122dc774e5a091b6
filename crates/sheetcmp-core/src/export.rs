//! Export of result tables to XLSX workbooks and CSV files
//!
//! Each exported table becomes its own sheet (or file). Absent and empty
//! tables are skipped; asking to export nothing at all is an error.

use crate::bundle::{ResultBundle, TableKind};
use crate::error::{Error, Result};
use crate::table::{CellValue, Table};
use log::info;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One table offered to a writer
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    pub kind: TableKind,
    pub table: Option<&'a Table>,
}

impl<'a> Section<'a> {
    /// A section with a table present
    pub fn new(kind: TableKind, table: &'a Table) -> Self {
        Self {
            kind,
            table: Some(table),
        }
    }

    /// A section whose table was never produced
    pub fn absent(kind: TableKind) -> Self {
        Self { kind, table: None }
    }

    fn writable(&self) -> Option<&'a Table> {
        self.table.filter(|t| !t.is_empty())
    }
}

impl ResultBundle {
    /// All five tables as export sections
    pub fn sections(&self) -> Vec<Section<'_>> {
        self.iter().map(|(kind, table)| Section::new(kind, table)).collect()
    }
}

/// Presentation settings for workbook export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Lay sheets out right to left. Does not change any cell content.
    pub right_to_left: bool,
}

/// What an export wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Output file or directory
    pub path: PathBuf,
    /// Tables that were written, in order
    pub written: Vec<TableKind>,
    /// Tables skipped because they were absent or empty
    pub skipped: Vec<TableKind>,
    /// Data rows written across all tables
    pub rows_written: usize,
}

impl ExportSummary {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            written: Vec::new(),
            skipped: Vec::new(),
            rows_written: 0,
        }
    }
}

/// Write each non-empty section to its own sheet of an XLSX workbook.
///
/// Sheets are named by [`TableKind::title`].
pub fn write_workbook<P: AsRef<Path>>(
    path: P,
    sections: &[Section<'_>],
    options: &ExportOptions,
) -> Result<ExportSummary> {
    let path = path.as_ref();
    let mut summary = ExportSummary::new(path);

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for section in sections {
        let Some(table) = section.writable() else {
            summary.skipped.push(section.kind);
            continue;
        };

        let worksheet = workbook.add_worksheet().set_name(section.kind.title())?;
        worksheet.set_right_to_left(options.right_to_left);
        write_sheet(worksheet, table, &header_format)?;

        summary.written.push(section.kind);
        summary.rows_written += table.row_count();
    }

    if summary.written.is_empty() {
        return Err(Error::NoData(path.to_path_buf()));
    }

    workbook.save(path)?;
    info!(
        "wrote {} sheets ({} rows) to {}",
        summary.written.len(),
        summary.rows_written,
        path.display()
    );
    Ok(summary)
}

fn write_sheet(worksheet: &mut Worksheet, table: &Table, header_format: &Format) -> Result<()> {
    for col in &table.columns {
        worksheet.write_string_with_format(0, to_col(col.index)?, &col.name, header_format)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let row_num = to_row(r + 1)?;
        for (c, cell) in row.cells.iter().enumerate() {
            write_cell(worksheet, row_num, to_col(c)?, cell)?;
        }
    }

    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &CellValue) -> Result<()> {
    match cell {
        CellValue::String(s) => {
            worksheet.write_string(row, col, s)?;
        }
        CellValue::Integer(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        CellValue::Float(f) if f.is_finite() => {
            worksheet.write_number(row, col, *f)?;
        }
        // XLSX has no NaN or infinity
        CellValue::Float(f) => {
            worksheet.write_string(row, col, f.to_string())?;
        }
        CellValue::Boolean(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        CellValue::Missing => {}
    }
    Ok(())
}

fn to_row(index: usize) -> Result<u32> {
    u32::try_from(index).map_err(|_| Error::Xlsx(XlsxError::RowColumnLimitError))
}

fn to_col(index: usize) -> Result<u16> {
    u16::try_from(index).map_err(|_| Error::Xlsx(XlsxError::RowColumnLimitError))
}

/// Write a single table as CSV with a header row
pub fn write_csv<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    let csv_error = |e: csv::Error| Error::Csv {
        path: path.to_path_buf(),
        source: e,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    writer
        .write_record(table.columns.iter().map(|c| c.name.as_str()))
        .map_err(csv_error)?;
    for row in &table.rows {
        writer
            .write_record(row.cells.iter().map(|c| c.to_string()))
            .map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write each non-empty section to `<dir>/<stable name>.csv`
pub fn write_csv_dir<P: AsRef<Path>>(dir: P, sections: &[Section<'_>]) -> Result<ExportSummary> {
    let dir = dir.as_ref();
    let mut summary = ExportSummary::new(dir);

    if sections.iter().all(|s| s.writable().is_none()) {
        return Err(Error::NoData(dir.to_path_buf()));
    }

    fs::create_dir_all(dir)?;

    for section in sections {
        match section.writable() {
            Some(table) => {
                write_csv(table, dir.join(format!("{}.csv", section.kind.name())))?;
                summary.written.push(section.kind);
                summary.rows_written += table.row_count();
            }
            None => summary.skipped.push(section.kind),
        }
    }

    info!(
        "wrote {} CSV files ({} rows) to {}",
        summary.written.len(),
        summary.rows_written,
        dir.display()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reconcile;
    use crate::parser::{load_table, parse_csv_str, parse_workbook, sheet_names, LoadOptions};

    fn sample_bundle() -> ResultBundle {
        let a = parse_csv_str("ID,Name,Score\n1,foo,1.5\n2,bar,\n", "a.csv").unwrap();
        let b = parse_csv_str("ID,Name,Score\n2,bar,\n", "b.csv").unwrap();
        reconcile(a, b).unwrap()
    }

    #[test]
    fn test_workbook_skips_empty_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let bundle = sample_bundle();

        let summary = write_workbook(&path, &bundle.sections(), &ExportOptions::default()).unwrap();

        assert_eq!(
            summary.written,
            [TableKind::SourceA, TableKind::SourceB, TableKind::Common, TableKind::UniqueA]
        );
        assert_eq!(summary.skipped, [TableKind::UniqueB]);
        assert_eq!(
            sheet_names(&path).unwrap(),
            ["File 1", "File 2", "Common Rows", "Unique Rows (File 1)"]
        );
    }

    #[test]
    fn test_workbook_values_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let bundle = sample_bundle();

        write_workbook(
            &path,
            &bundle.sections(),
            &ExportOptions {
                right_to_left: true,
            },
        )
        .unwrap();

        let unique = parse_workbook(&path, Some("Unique Rows (File 1)")).unwrap();
        assert_eq!(unique.column_names(), ["ID", "Name", "Score"]);
        assert_eq!(unique.cell(0, "Name"), Some(&CellValue::from("foo")));
        assert_eq!(unique.cell(0, "Score"), Some(&CellValue::Float(1.5)));

        let common = parse_workbook(&path, Some("Common Rows")).unwrap();
        assert_eq!(common.cell(0, "Score"), Some(&CellValue::Missing));
    }

    #[test]
    fn test_workbook_with_nothing_to_write_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let empty = Table::with_columns("t", ["a"]);
        let sections = [
            Section::absent(TableKind::SourceA),
            Section::new(TableKind::Common, &empty),
        ];

        let err = write_workbook(&path, &sections, &ExportOptions::default()).unwrap_err();

        assert!(matches!(err, Error::NoData(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_csv_dir_uses_stable_names() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("csv");
        let bundle = sample_bundle();

        let summary = write_csv_dir(&out, &bundle.sections()).unwrap();

        assert_eq!(summary.rows_written, 2 + 1 + 1 + 1);
        assert!(out.join("common_rows.csv").exists());
        assert!(!out.join("unique2_rows.csv").exists());

        let reloaded = load_table(out.join("unique1_rows.csv"), &LoadOptions::default()).unwrap();
        assert_eq!(reloaded.rows[0].cells, bundle.get(TableKind::UniqueA).rows[0].cells);
    }

    #[test]
    fn test_write_csv_quotes_separators() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let table = Table::from_rows("t", ["a"], vec![vec!["x,y".into()]]).unwrap();

        write_csv(&table, &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a\n\"x,y\"\n");
    }
}
