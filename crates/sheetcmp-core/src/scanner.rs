//! Directory scanner for pairing tables across two trees

use crate::error::Result;
use crate::parser::SourceFormat;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Two files found at the same relative location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePair {
    /// Relative path without extension, e.g. `reports/march`
    pub key: String,
    pub left: PathBuf,
    pub right: PathBuf,
}

/// Result of pairing two directory trees
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Matched files, sorted by key
    pub pairs: Vec<FilePair>,
    /// Files with no counterpart under the right root
    pub left_only: Vec<PathBuf>,
    /// Files with no counterpart under the left root
    pub right_only: Vec<PathBuf>,
    /// Files skipped because another file in the same tree has the same key
    /// (e.g. `data.csv` next to `data.xlsx`)
    pub ambiguous: Vec<PathBuf>,
}

/// Walk both roots and pair supported files by relative path, ignoring the
/// extension, so `old/q1.xlsx` pairs with `new/q1.csv`.
pub fn pair_directories<P: AsRef<Path>, Q: AsRef<Path>>(
    left_root: P,
    right_root: Q,
) -> Result<ScanResult> {
    let mut result = ScanResult::default();
    let left = collect_tables(left_root.as_ref(), &mut result.ambiguous)?;
    let mut right = collect_tables(right_root.as_ref(), &mut result.ambiguous)?;

    for (key, left_path) in left {
        match right.remove(&key) {
            Some(right_path) => result.pairs.push(FilePair {
                key,
                left: left_path,
                right: right_path,
            }),
            None => result.left_only.push(left_path),
        }
    }
    result.right_only = right.into_values().collect();

    debug!(
        "paired {} files ({} left only, {} right only)",
        result.pairs.len(),
        result.left_only.len(),
        result.right_only.len()
    );
    Ok(result)
}

fn collect_tables(root: &Path, ambiguous: &mut Vec<PathBuf>) -> Result<BTreeMap<String, PathBuf>> {
    let mut tables = BTreeMap::new();

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || SourceFormat::from_path(path).is_none() {
            continue;
        }

        let Some(key) = relative_key(root, path) else {
            continue;
        };

        if tables.contains_key(&key) {
            warn!("skipping {}: another file has the same name", path.display());
            ambiguous.push(path.to_path_buf());
        } else {
            tables.insert(key, path.to_path_buf());
        }
    }

    Ok(tables)
}

/// `root/a/b.xlsx` -> `a/b`, with `/` separators on every platform
fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "a\n1\n").unwrap();
    }

    #[test]
    fn test_pairs_by_relative_stem() {
        let left = tempfile::tempdir().unwrap();
        let right = tempfile::tempdir().unwrap();
        touch(left.path(), "q1.xlsx");
        touch(left.path(), "sub/q2.csv");
        touch(left.path(), "old.csv");
        touch(right.path(), "q1.csv");
        touch(right.path(), "sub/q2.csv");
        touch(right.path(), "new.tsv");

        let result = pair_directories(left.path(), right.path()).unwrap();

        let keys: Vec<&str> = result.pairs.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["q1", "sub/q2"]);
        assert_eq!(result.pairs[0].left, left.path().join("q1.xlsx"));
        assert_eq!(result.pairs[0].right, right.path().join("q1.csv"));
        assert_eq!(result.left_only, [left.path().join("old.csv")]);
        assert_eq!(result.right_only, [right.path().join("new.tsv")]);
    }

    #[test]
    fn test_ignores_unsupported_files() {
        let left = tempfile::tempdir().unwrap();
        let right = tempfile::tempdir().unwrap();
        touch(left.path(), "notes.txt");
        touch(right.path(), "notes.txt");

        let result = pair_directories(left.path(), right.path()).unwrap();

        assert!(result.pairs.is_empty());
        assert!(result.left_only.is_empty());
    }

    #[test]
    fn test_same_stem_in_one_tree_is_ambiguous() {
        let left = tempfile::tempdir().unwrap();
        let right = tempfile::tempdir().unwrap();
        touch(left.path(), "data.csv");
        touch(left.path(), "data.xlsx");
        touch(right.path(), "data.csv");

        let result = pair_directories(left.path(), right.path()).unwrap();

        assert_eq!(result.pairs.len(), 1);
        assert_eq!(result.pairs[0].left, left.path().join("data.csv"));
        assert_eq!(result.ambiguous, [left.path().join("data.xlsx")]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let right = tempfile::tempdir().unwrap();
        assert!(pair_directories("/nonexistent/root", right.path()).is_err());
    }

    #[test]
    fn test_relative_key() {
        let root = Path::new("/data");
        assert_eq!(relative_key(root, Path::new("/data/a/b.xlsx")).as_deref(), Some("a/b"));
        assert_eq!(relative_key(root, Path::new("/other/b.xlsx")), None);
    }
}
