//! Orchestration of a comparison between two loaded tables
//!
//! A `Session` holds the two source tables and the latest result bundle.
//! Loading either side discards the bundle; `reconcile` only runs once both
//! sides are present.

use crate::bundle::{ResultBundle, TableKind};
use crate::engine::reconcile_with;
use crate::error::Result;
use crate::export::{write_workbook, ExportOptions, ExportSummary, Section};
use crate::normalize::NormalizeOptions;
use crate::parser::{load_table, LoadOptions};
use crate::store::TableSink;
use crate::table::Table;
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

/// Which input a table fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// The bundle kind of this side's source table
    pub fn kind(self) -> TableKind {
        match self {
            Side::Left => TableKind::SourceA,
            Side::Right => TableKind::SourceB,
        }
    }
}

/// Two inputs and the result of comparing them
#[derive(Debug, Default)]
pub struct Session {
    left: Option<Arc<Table>>,
    right: Option<Arc<Table>>,
    options: NormalizeOptions,
    bundle: Option<ResultBundle>,
}

impl Session {
    /// Create an empty session
    pub fn new(options: NormalizeOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Comparison options used by `reconcile`
    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Change the comparison options; discards the current result
    pub fn set_options(&mut self, options: NormalizeOptions) {
        if self.options != options {
            self.options = options;
            self.bundle = None;
        }
    }

    /// Replace one input table; discards the current result
    pub fn set_table(&mut self, side: Side, table: Table) {
        let table = Arc::new(table);
        match side {
            Side::Left => self.left = Some(table),
            Side::Right => self.right = Some(table),
        }
        self.bundle = None;
    }

    /// Load one input from a file. On failure the session is left unchanged.
    pub fn load<P: AsRef<Path>>(
        &mut self,
        side: Side,
        path: P,
        options: &LoadOptions,
    ) -> Result<()> {
        let table = load_table(path.as_ref(), options)?;
        info!(
            "loaded {:?} input '{}' ({} rows)",
            side,
            table.name,
            table.row_count()
        );
        self.set_table(side, table);
        Ok(())
    }

    /// True once both inputs are loaded
    pub fn is_ready(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }

    /// Reconcile the two inputs if both are present.
    ///
    /// Returns `Ok(None)` without running the engine while an input is
    /// missing. A result already computed for the current inputs is reused.
    pub fn reconcile(&mut self) -> Result<Option<&ResultBundle>> {
        let (Some(left), Some(right)) = (&self.left, &self.right) else {
            debug!("reconcile skipped, both inputs are required");
            return Ok(None);
        };

        if self.bundle.is_none() {
            let bundle = reconcile_with(Arc::clone(left), Arc::clone(right), &self.options)?;
            self.bundle = Some(bundle);
        }
        Ok(self.bundle.as_ref())
    }

    /// The latest result, if any
    pub fn bundle(&self) -> Option<&ResultBundle> {
        self.bundle.as_ref()
    }

    /// Any available table: sources once loaded, derived tables once reconciled
    pub fn table(&self, kind: TableKind) -> Option<&Table> {
        match kind {
            TableKind::SourceA => self.left.as_deref(),
            TableKind::SourceB => self.right.as_deref(),
            _ => self.bundle.as_ref().map(|b| b.get(kind)),
        }
    }

    /// All five tables as export sections, absent where not yet available
    pub fn sections(&self) -> Vec<Section<'_>> {
        TableKind::ALL
            .into_iter()
            .map(|kind| match self.table(kind) {
                Some(table) => Section::new(kind, table),
                None => Section::absent(kind),
            })
            .collect()
    }

    /// Write every available table to a workbook
    pub fn export_workbook<P: AsRef<Path>>(
        &self,
        path: P,
        options: &ExportOptions,
    ) -> Result<ExportSummary> {
        write_workbook(path, &self.sections(), options)
    }

    /// Store every available table in `sink` under its stable name.
    /// Returns the number of tables stored.
    pub fn persist(&self, sink: &mut dyn TableSink) -> Result<usize> {
        let mut stored = 0;
        for kind in TableKind::ALL {
            if let Some(table) = self.table(kind) {
                sink.store(kind.name(), table)?;
                stored += 1;
            }
        }
        Ok(stored)
    }
}
