//! Text grid views of tables for terminal display

use crate::table::Table;

/// Header of the placeholder column shown for empty tables
pub const PLACEHOLDER_HEADER: &str = "Message";

/// Placeholder row shown for empty tables
pub const NO_DATA_MESSAGE: &str = "No data to display in this section.";

/// How to lay a table out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// Show at most this many data rows
    pub max_rows: Option<usize>,
    /// Reverse the column order for right-to-left reading
    pub rtl: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            max_rows: Some(1_000_000),
            rtl: false,
        }
    }
}

/// A table rendered to display strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// True when rows were cut off by `max_rows`
    pub truncated: bool,
}

impl GridView {
    /// Build a view of a table.
    ///
    /// A table without rows renders as a single placeholder row instead of an
    /// empty grid.
    pub fn from_table(table: &Table, options: &ViewOptions) -> Self {
        if table.is_empty() {
            return Self {
                headers: vec![PLACEHOLDER_HEADER.to_string()],
                rows: vec![vec![NO_DATA_MESSAGE.to_string()]],
                truncated: false,
            };
        }

        let mut headers: Vec<String> = table.columns.iter().map(|c| c.name.clone()).collect();
        let limit = options.max_rows.unwrap_or(usize::MAX);

        let mut rows: Vec<Vec<String>> = table
            .rows
            .iter()
            .take(limit)
            .map(|row| {
                let mut values: Vec<String> = row.cells.iter().map(|c| c.to_string()).collect();
                if options.rtl {
                    values.reverse();
                }
                values
            })
            .collect();

        let truncated = table.row_count() > limit;
        if truncated {
            rows.push(vec![format!(
                "... {} more rows (display limited to {} rows)",
                table.row_count() - limit,
                limit
            )]);
        }

        if options.rtl {
            headers.reverse();
        }

        Self {
            headers,
            rows,
            truncated,
        }
    }

    /// Render as a padded text grid
    pub fn to_text(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            // a truncation notice spans the grid and is not measured
            if row.len() != self.headers.len() {
                continue;
            }
            for (w, value) in widths.iter_mut().zip(row) {
                *w = (*w).max(value.chars().count());
            }
        }

        let mut out = String::new();
        out.push_str(&format_line(&self.headers, &widths));
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("-+-"));
        out.push('\n');

        for row in &self.rows {
            if row.len() == self.headers.len() {
                out.push_str(&format_line(row, &widths));
            } else {
                out.push_str(&row.join(" "));
            }
            out.push('\n');
        }

        out
    }
}

fn format_line(values: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = values
        .iter()
        .zip(widths)
        .map(|(v, w)| {
            let pad = w.saturating_sub(v.chars().count());
            format!("{}{}", v, " ".repeat(pad))
        })
        .collect();
    padded.join(" | ").trim_end().to_string()
}
