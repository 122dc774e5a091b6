//! JSON job files describing comparisons to run
//!
//! A `CompareJob` names two inputs and where results go. A `BatchJob` pairs
//! whole directory trees.

use crate::error::{Error, Result};
use crate::export::ExportOptions;
use crate::normalize::NormalizeOptions;
use crate::parser::LoadOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_right_to_left() -> bool {
    true
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(Error::Json)
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)?;
    Ok(())
}

/// A single comparison of two files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareJob {
    /// First input (file 1)
    pub left: PathBuf,
    /// Second input (file 2)
    pub right: PathBuf,
    /// Sheet to read from the first input, if it is a workbook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_left: Option<String>,
    /// Sheet to read from the second input, if it is a workbook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_right: Option<String>,
    #[serde(default)]
    pub normalize: NormalizeOptions,
    /// Workbook to write all five tables to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_xlsx: Option<PathBuf>,
    /// Directory to write one CSV per table to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_csv_dir: Option<PathBuf>,
    /// Lay exported sheets out right to left
    #[serde(default = "default_right_to_left")]
    pub right_to_left: bool,
    /// SQLite database to store the tables in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    /// Where to save the run report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,
}

impl CompareJob {
    /// A job comparing two files with default settings and no outputs
    pub fn new(left: impl Into<PathBuf>, right: impl Into<PathBuf>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            sheet_left: None,
            sheet_right: None,
            normalize: NormalizeOptions::default(),
            output_xlsx: None,
            output_csv_dir: None,
            right_to_left: default_right_to_left(),
            database: None,
            report: None,
        }
    }

    /// An example job with every output filled in
    pub fn template() -> Self {
        Self {
            sheet_left: Some("Sheet1".to_string()),
            output_xlsx: Some(PathBuf::from("comparison_results.xlsx")),
            database: Some(PathBuf::from("comparison_results.db")),
            report: Some(PathBuf::from("comparison_report.json")),
            ..Self::new("file1.xlsx", "file2.xlsx")
        }
    }

    /// Load options for the first input
    pub fn left_options(&self) -> LoadOptions {
        LoadOptions {
            sheet: self.sheet_left.clone(),
        }
    }

    /// Load options for the second input
    pub fn right_options(&self) -> LoadOptions {
        LoadOptions {
            sheet: self.sheet_right.clone(),
        }
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            right_to_left: self.right_to_left,
        }
    }

    /// Load a job file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        read_json(path.as_ref())
    }

    /// Save the job file to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_json(self, path.as_ref())
    }
}

/// A comparison of every matching file in two directory trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJob {
    pub left_root: PathBuf,
    pub right_root: PathBuf,
    /// One workbook per pair is written here
    pub output_dir: PathBuf,
    #[serde(default)]
    pub normalize: NormalizeOptions,
    #[serde(default = "default_right_to_left")]
    pub right_to_left: bool,
}

impl BatchJob {
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            right_to_left: self.right_to_left,
        }
    }

    /// Load a batch file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        read_json(path.as_ref())
    }

    /// Save the batch file to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_json(self, path.as_ref())
    }
}
