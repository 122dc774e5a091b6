//! Persistence of tables into a local SQLite database
//!
//! Stored tables are a cache for later inspection. Nothing in this crate reads
//! them back.

use crate::bundle::ResultBundle;
use crate::error::Result;
use crate::table::{CellValue, Table};
use log::{debug, info, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::collections::HashSet;
use std::path::Path;

/// Destination for finished tables, keyed by name
pub trait TableSink {
    /// Store `table` under `name`, replacing whatever was stored there before
    fn store(&mut self, name: &str, table: &Table) -> Result<()>;
}

/// Store every table of a bundle under its stable name
pub fn persist_bundle(sink: &mut dyn TableSink, bundle: &ResultBundle) -> Result<()> {
    for (kind, table) in bundle.iter() {
        sink.store(kind.name(), table)?;
    }
    Ok(())
}

/// A [`TableSink`] backed by a SQLite database file
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Open (or create) a database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        debug!("opened {} (journal mode {})", path.as_ref().display(), mode);
        Ok(Self { conn })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Access the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl TableSink for SqliteSink {
    fn store(&mut self, name: &str, table: &Table) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", quote_ident(name)))?;

        if table.columns.is_empty() {
            debug!("table '{}' has no columns, nothing stored", name);
            return Ok(tx.commit()?);
        }

        let column_defs: Vec<String> = table
            .columns
            .iter()
            .zip(sql_column_names(table))
            .map(|(c, name)| format!("{} {}", quote_ident(&name), declared_type(table, c.index)))
            .collect();
        tx.execute_batch(&format!(
            "CREATE TABLE {} ({});",
            quote_ident(name),
            column_defs.join(", ")
        ))?;

        {
            let placeholders = vec!["?"; table.column_count()].join(", ");
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} VALUES ({})",
                quote_ident(name),
                placeholders
            ))?;
            for row in &table.rows {
                stmt.execute(params_from_iter(row.cells.iter().map(sql_value)))?;
            }
        }

        tx.commit()?;
        info!("stored {} rows in table '{}'", table.row_count(), name);
        Ok(())
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Column names made unique under SQLite's case-insensitive comparison.
/// A later `ID` next to `id` is stored as `ID.1`.
fn sql_column_names(table: &Table) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(table.columns.len());
    let mut names = Vec::with_capacity(table.columns.len());

    for col in &table.columns {
        let mut name = col.name.clone();
        let mut suffix = 1;
        while taken.contains(&name.to_ascii_lowercase()) {
            name = format!("{}.{}", col.name, suffix);
            suffix += 1;
        }
        if name != col.name {
            warn!("table '{}': column '{}' stored as '{}'", table.name, col.name, name);
        }
        taken.insert(name.to_ascii_lowercase());
        names.push(name);
    }

    names
}

fn sql_value(cell: &CellValue) -> Value {
    match cell {
        CellValue::String(s) => Value::Text(s.clone()),
        CellValue::Integer(i) => Value::Integer(*i),
        CellValue::Float(f) => Value::Real(*f),
        CellValue::Boolean(b) => Value::Integer(i64::from(*b)),
        CellValue::Missing => Value::Null,
    }
}

/// Pick a declared column type from the values it holds
fn declared_type(table: &Table, index: usize) -> &'static str {
    let mut integer = true;
    let mut numeric = true;
    let mut any = false;

    for cell in table.rows.iter().filter_map(|r| r.get(index)) {
        match cell {
            CellValue::Missing => continue,
            CellValue::Integer(_) | CellValue::Boolean(_) => {}
            CellValue::Float(_) => integer = false,
            CellValue::String(_) => {
                integer = false;
                numeric = false;
            }
        }
        any = true;
    }

    match (any, integer, numeric) {
        (false, _, _) => "TEXT",
        (true, true, _) => "INTEGER",
        (true, false, true) => "REAL",
        (true, false, false) => "TEXT",
    }
}
