//! sheetcmp-core: Core library for reconciling the rows of two tables
//!
//! This library provides functionality to:
//! - Load CSV files and spreadsheet workbooks into typed tables
//! - Align two tables onto one column schema
//! - Split their rows into common rows and rows unique to either side,
//!   counting duplicates
//! - Export the results to XLSX, CSV or SQLite
//! - Run comparisons from JSON job files and record run reports

pub mod bundle;
pub mod engine;
pub mod error;
pub mod export;
pub mod job;
pub mod normalize;
pub mod parser;
pub mod render;
pub mod report;
pub mod scanner;
pub mod schema;
pub mod session;
pub mod store;
pub mod table;

pub use bundle::{BundleCounts, ResultBundle, RowMatch, TableKind};
pub use engine::{reconcile, reconcile_with, ComparisonKey};
pub use error::{Error, Result};
pub use export::{write_csv, write_csv_dir, write_workbook, ExportOptions, ExportSummary, Section};
pub use job::{BatchJob, CompareJob};
pub use normalize::{normalize, normalize_with, KeyPart, NormalizeOptions};
pub use parser::{load_table, parse_csv, parse_csv_str, parse_workbook, sheet_names, LoadOptions};
pub use render::{GridView, ViewOptions};
pub use report::{InputSummary, ReportLog, RunReport};
pub use scanner::{pair_directories, FilePair, ScanResult};
pub use schema::{align, project, AlignedTable, Schema, SchemaDiff};
pub use session::{Session, Side};
pub use store::{persist_bundle, SqliteSink, TableSink};
pub use table::{CellValue, Column, Row, Table};
