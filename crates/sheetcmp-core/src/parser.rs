//! Table loaders for CSV files and spreadsheet workbooks
//!
//! The first row is always the header. Duplicate header names get `.1`, `.2`
//! suffixes and blank ones become `Unnamed: <index>`, so every loaded table has
//! a unique column schema.

use crate::error::{Error, Result};
use crate::table::{CellValue, Column, Table};
use calamine::{open_workbook_auto, Data, Reader};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// File extensions `load_table` understands
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "tsv", "xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Options for loading a table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Sheet to read from a workbook; the first sheet when unset
    pub sheet: Option<String>,
}

impl LoadOptions {
    /// Load a specific sheet
    pub fn sheet(name: impl Into<String>) -> Self {
        Self {
            sheet: Some(name.into()),
        }
    }
}

/// Tabular source formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Tsv,
    Workbook,
}

impl SourceFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(SourceFormat::Csv),
            "tsv" => Some(SourceFormat::Tsv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(SourceFormat::Workbook),
            _ => None,
        }
    }
}

/// Load a table from any supported file
pub fn load_table<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Table> {
    let path = path.as_ref();
    let format =
        SourceFormat::from_path(path).ok_or_else(|| Error::UnsupportedFormat(path.to_path_buf()))?;

    let table = match format {
        SourceFormat::Csv => parse_csv(path)?,
        SourceFormat::Tsv => parse_delimited(path, b'\t')?,
        SourceFormat::Workbook => parse_workbook(path, options.sheet.as_deref())?,
    };

    debug!(
        "loaded '{}': {} columns, {} rows",
        path.display(),
        table.column_count(),
        table.row_count()
    );
    Ok(table)
}

/// Parse a CSV file into a Table
pub fn parse_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
    parse_delimited(path.as_ref(), b',')
}

fn parse_delimited(path: &Path, delimiter: u8) -> Result<Table> {
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut table = read_csv(BufReader::new(file), delimiter, path)?;
    table.source_path = Some(path.to_path_buf());
    Ok(table)
}

/// Parse CSV from a string (useful for testing)
pub fn parse_csv_str(content: &str, source_name: &str) -> Result<Table> {
    read_csv(content.as_bytes(), b',', Path::new(source_name))
}

fn read_csv<R: Read>(reader: R, delimiter: u8, path: &Path) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // Allow varying number of fields
        .delimiter(delimiter)
        .from_reader(reader);

    let headers = csv_reader.headers().map_err(|e| Error::Csv {
        path: path.to_path_buf(),
        source: e,
    })?;

    if headers.is_empty() {
        return Err(Error::EmptyHeader(path.to_path_buf()));
    }

    let columns = header_columns(headers.iter().map(str::to_string));
    let mut table = Table {
        name: table_name(path),
        columns,
        rows: Vec::new(),
        source_path: None,
    };

    for (row_idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;

        let cells: Vec<CellValue> = record.iter().map(CellValue::parse).collect();
        table.push_row(fit_row(cells, table.columns.len(), row_idx + 1, path));
    }

    Ok(table)
}

/// List the sheets of a workbook
pub fn sheet_names<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let workbook = open_workbook_auto(path).map_err(|e| Error::Workbook {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(workbook.sheet_names().to_vec())
}

/// Parse one sheet of a workbook (xlsx, xlsm, xlsb, xls, ods) into a Table
pub fn parse_workbook<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> Result<Table> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path).map_err(|e| Error::Workbook {
        path: path.to_path_buf(),
        source: e,
    })?;

    let names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| Error::SheetNotFound {
                sheet: wanted.to_string(),
                path: path.to_path_buf(),
            })?,
        None => {
            let first = names
                .first()
                .cloned()
                .ok_or_else(|| Error::EmptyHeader(path.to_path_buf()))?;
            if names.len() > 1 {
                warn!(
                    "'{}' has {} sheets, reading the first one ('{}')",
                    path.display(),
                    names.len(),
                    first
                );
            }
            first
        }
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::Workbook {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| Error::EmptyHeader(path.to_path_buf()))?;
    let columns = header_columns(header.iter().map(header_text));

    let mut table = Table {
        name: table_name(path),
        columns,
        rows: Vec::new(),
        source_path: Some(path.to_path_buf()),
    };

    let mut blank_rows = 0usize;
    for (row_idx, row) in rows.enumerate() {
        let cells: Vec<CellValue> = row.iter().map(cell_from_data).collect();
        if cells.iter().all(CellValue::is_missing) {
            blank_rows += 1;
            continue;
        }
        table.push_row(fit_row(cells, table.columns.len(), row_idx + 1, path));
    }

    if blank_rows > 0 {
        debug!(
            "skipped {} blank rows in sheet '{}' of '{}'",
            blank_rows,
            sheet_name,
            path.display()
        );
    }

    Ok(table)
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Missing,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Boolean(*b),
        // Excel serial date, the same number the sheet stores
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(format!("#{:?}", e)),
    }
}

/// Build unique column definitions from raw header names
fn header_columns<I: IntoIterator<Item = String>>(names: I) -> Vec<Column> {
    let names: Vec<String> = names.into_iter().collect();
    let mut taken: HashSet<String> = HashSet::with_capacity(names.len());
    let mut columns = Vec::with_capacity(names.len());

    for (i, raw) in names.into_iter().enumerate() {
        let base = if raw.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            raw
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while taken.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }

        taken.insert(name.clone());
        columns.push(Column::new(name, i));
    }

    columns
}

/// Pad a short row with missing cells, truncate a long one
fn fit_row(mut cells: Vec<CellValue>, width: usize, row_no: usize, path: &Path) -> Vec<CellValue> {
    if cells.len() > width {
        warn!(
            "row {} in {} has more cells than columns, truncating",
            row_no,
            path.display()
        );
        cells.truncate(width);
    }
    cells.resize(width, CellValue::Missing);
    cells
}

fn table_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
