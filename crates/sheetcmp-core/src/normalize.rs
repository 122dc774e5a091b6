//! Canonical string forms of cell values, used only for row comparison

use crate::table::CellValue;
use serde::{Deserialize, Serialize};

/// Largest magnitude at which every integer is exactly representable in an f64
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Comparison policy knobs. None of these change output values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    /// Treat a missing cell and an empty string as equal
    pub missing_matches_empty: bool,
    /// Trim leading and trailing whitespace from strings
    pub trim_strings: bool,
    /// Compare strings lowercased
    pub case_insensitive: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            missing_matches_empty: true,
            trim_strings: false,
            case_insensitive: false,
        }
    }
}

/// One element of a comparison key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyPart {
    /// A missing cell, kept apart from every real value
    Absent,
    /// The canonical text of a value
    Text(String),
}

/// Render a cell value as its canonical comparison string.
///
/// Integers and integral floats share one form, so `5` and `5.0` both give `"5"`.
/// Missing gives `""`, the same as an empty string.
pub fn normalize(value: &CellValue) -> String {
    match value {
        CellValue::Missing => String::new(),
        CellValue::String(s) => s.clone(),
        CellValue::Integer(i) => i.to_string(),
        CellValue::Float(f) => normalize_float(*f),
        CellValue::Boolean(b) => b.to_string(),
    }
}

/// Normalize a value under the given options
pub fn normalize_with(value: &CellValue, options: &NormalizeOptions) -> KeyPart {
    match value {
        CellValue::Missing if !options.missing_matches_empty => KeyPart::Absent,
        CellValue::String(s) => {
            let s = if options.trim_strings { s.trim() } else { s.as_str() };
            if options.case_insensitive {
                KeyPart::Text(s.to_lowercase())
            } else {
                KeyPart::Text(s.to_string())
            }
        }
        other => KeyPart::Text(normalize(other)),
    }
}

fn normalize_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < MAX_EXACT_FLOAT_INT {
        // also folds -0.0 into "0"
        (f as i64).to_string()
    } else {
        f.to_string()
    }
}
