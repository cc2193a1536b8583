//! Archive retention in the cloud directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::archive::Codec;
use crate::error::SyncError;

/// Delete every archive in `cloud_dir` belonging to `branch`, any revision.
///
/// An archive belongs to a branch when its name starts with `{branch}_` and
/// ends with a recognized archive extension (both codecs are recognized, so
/// switching codecs cannot strand stale archives). Returns the removed
/// paths. A deletion failure aborts with the blocking file named; archives
/// already removed at that point stay removed.
pub fn rotate(branch: &str, cloud_dir: &Path) -> Result<Vec<PathBuf>, SyncError> {
    let prefix = format!("{}_", branch);
    let mut removed = Vec::new();

    let entries = fs::read_dir(cloud_dir).map_err(|e| SyncError::Rotation {
        path: cloud_dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| SyncError::Rotation {
            path: cloud_dir.to_path_buf(),
            source: e,
        })?;

        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(&prefix) || Codec::from_file_name(name).is_none() {
            continue;
        }

        let path = entry.path();
        fs::remove_file(&path).map_err(|e| SyncError::Rotation {
            path: path.clone(),
            source: e,
        })?;
        debug!(path = %path.display(), "removed stale archive");
        removed.push(path);
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rotate_removes_branch_archives_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("main_abc123.tar.zst"), b"old").unwrap();
        fs::write(dir.path().join("main_def456.tar.gz"), b"older").unwrap();
        fs::write(dir.path().join("dev_abc123.tar.zst"), b"other branch").unwrap();
        fs::write(dir.path().join("main_notes.txt"), b"not an archive").unwrap();

        let removed = rotate("main", dir.path()).unwrap();

        assert_eq!(removed.len(), 2);
        assert!(!dir.path().join("main_abc123.tar.zst").exists());
        assert!(!dir.path().join("main_def456.tar.gz").exists());
        assert!(dir.path().join("dev_abc123.tar.zst").exists());
        assert!(dir.path().join("main_notes.txt").exists());
    }

    #[test]
    fn test_rotate_empty_directory() {
        let dir = tempdir().unwrap();

        let removed = rotate("main", dir.path()).unwrap();

        assert!(removed.is_empty());
    }

    #[test]
    fn test_rotate_missing_directory_fails() {
        let dir = tempdir().unwrap();

        let err = rotate("main", &dir.path().join("nope")).unwrap_err();

        assert!(matches!(err, SyncError::Rotation { .. }));
    }

    #[test]
    fn test_rotate_does_not_cross_branch_prefix() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("main_abc.tar.zst"), b"a").unwrap();
        fs::write(dir.path().join("maintenance_abc.tar.zst"), b"b").unwrap();

        let removed = rotate("main", dir.path()).unwrap();

        assert_eq!(removed.len(), 1);
        assert!(dir.path().join("maintenance_abc.tar.zst").exists());
    }
}
