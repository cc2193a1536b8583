//! Working-tree file selection.
//!
//! Walks the tree in serial, sorted order so the selection is deterministic,
//! and keeps the relative paths of regular files matching the pattern set.
//! Directories are traversed but never listed.

use std::io;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use tracing::debug;

use super::pattern::PatternSet;
use crate::error::SyncError;

/// Collect the relative paths of all files under `workdir` matching `patterns`.
///
/// Files larger than `max_file_size` bytes are skipped when a limit is set.
pub fn select_files(
    workdir: &Path,
    patterns: &PatternSet,
    max_file_size: Option<u64>,
) -> Result<Vec<PathBuf>, SyncError> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }

    let mut selected = Vec::new();

    for entry_result in WalkDir::new(workdir)
        .parallelism(jwalk::Parallelism::Serial)
        .sort(true)
        .skip_hidden(false)
        .follow_links(false)
    {
        let entry = entry_result.map_err(|e| SyncError::Selection {
            path: workdir.to_path_buf(),
            source: io::Error::other(e.to_string()),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = match path.strip_prefix(workdir) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => continue,
        };

        if !patterns.matches(&relative.to_string_lossy()) {
            continue;
        }

        if let Some(limit) = max_file_size {
            let size = std::fs::metadata(&path)
                .map_err(|e| SyncError::Selection {
                    path: path.clone(),
                    source: e,
                })?
                .len();
            if size > limit {
                debug!(path = %relative.display(), size, limit, "skipping oversized file");
                continue;
            }
        }

        selected.push(relative);
    }

    debug!(count = selected.len(), "selection complete");
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn patterns(raw: &[&str]) -> PatternSet {
        let owned: Vec<String> = raw.iter().map(|p| p.to_string()).collect();
        PatternSet::compile(&owned).unwrap()
    }

    #[test]
    fn test_select_by_pattern() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("assets/a.png"), b"X").unwrap();
        fs::write(dir.path().join("docs/readme.md"), b"hello").unwrap();

        let selected = select_files(dir.path(), &patterns(&["assets/*"]), None).unwrap();

        assert_eq!(selected, vec![PathBuf::from("assets/a.png")]);
    }

    #[test]
    fn test_selection_is_sorted() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/c.png"), b"c").unwrap();
        fs::write(dir.path().join("assets/a.png"), b"a").unwrap();
        fs::write(dir.path().join("assets/b.png"), b"b").unwrap();

        let selected = select_files(dir.path(), &patterns(&["assets/*"]), None).unwrap();

        assert_eq!(
            selected,
            vec![
                PathBuf::from("assets/a.png"),
                PathBuf::from("assets/b.png"),
                PathBuf::from("assets/c.png"),
            ]
        );
    }

    #[test]
    fn test_empty_pattern_set_selects_nothing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();

        let selected = select_files(dir.path(), &patterns(&[]), None).unwrap();

        assert!(selected.is_empty());
    }

    #[test]
    fn test_max_file_size_skips_large_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/small.bin"), b"123").unwrap();
        fs::write(dir.path().join("assets/large.bin"), vec![0u8; 1024]).unwrap();

        let selected = select_files(dir.path(), &patterns(&["assets/*"]), Some(16)).unwrap();

        assert_eq!(selected, vec![PathBuf::from("assets/small.bin")]);
    }

    #[test]
    fn test_directories_are_traversed_not_listed() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets/deep")).unwrap();
        fs::write(dir.path().join("assets/deep/x.dat"), b"x").unwrap();

        let selected = select_files(dir.path(), &patterns(&["assets/*"]), None).unwrap();

        assert_eq!(selected, vec![PathBuf::from("assets/deep/x.dat")]);
    }
}
