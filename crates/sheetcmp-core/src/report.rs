//! Run reports and the history of past comparisons

use crate::bundle::{BundleCounts, ResultBundle};
use crate::error::{Error, Result};
use crate::normalize::NormalizeOptions;
use crate::schema::SchemaDiff;
use crate::table::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Where one input came from and how big it was
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSummary {
    pub name: String,
    pub path: Option<PathBuf>,
    pub rows: usize,
    pub columns: usize,
}

impl InputSummary {
    pub fn of(table: &Table) -> Self {
        Self {
            name: table.name.clone(),
            path: table.source_path.clone(),
            rows: table.row_count(),
            columns: table.column_count(),
        }
    }
}

/// A record of one comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// When the comparison ran
    pub timestamp: DateTime<Utc>,
    pub left: InputSummary,
    pub right: InputSummary,
    /// Unified column order used for the derived tables
    pub schema: Vec<String>,
    pub schema_diff: SchemaDiff,
    pub normalize: NormalizeOptions,
    pub counts: BundleCounts,
}

impl RunReport {
    /// Summarize a finished comparison
    pub fn from_bundle(bundle: &ResultBundle, normalize: &NormalizeOptions) -> Self {
        Self {
            timestamp: Utc::now(),
            left: InputSummary::of(bundle.source_a()),
            right: InputSummary::of(bundle.source_b()),
            schema: bundle.schema().columns().to_vec(),
            schema_diff: bundle.schema_diff().clone(),
            normalize: *normalize,
            counts: bundle.counts(),
        }
    }

    /// True when every row of both inputs was matched
    pub fn is_match(&self) -> bool {
        self.counts.unique_a == 0 && self.counts.unique_b == 0
    }

    /// Load a report from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the report to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// History file of past runs
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReportLog {
    /// Runs grouped by the name of the first input
    pub entries: HashMap<String, Vec<RunReport>>,
}

impl ReportLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load history from a file, or create empty if not exists
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save history to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn add(&mut self, report: RunReport) {
        self.entries
            .entry(report.left.name.clone())
            .or_default()
            .push(report);
    }

    /// Past runs for one input, oldest first
    pub fn runs_for(&self, name: &str) -> &[RunReport] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn latest(&self, name: &str) -> Option<&RunReport> {
        self.runs_for(name).last()
    }

    pub fn total_runs(&self) -> usize {
        self.entries.values().map(|v| v.len()).sum()
    }
}
