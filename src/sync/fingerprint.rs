//! Content fingerprinting for change detection.
//!
//! Each selected file is digested with SHA-256; the per-file digests are
//! concatenated in sorted path order and digested again into one value, so
//! the fingerprint is independent of traversal order. The last fingerprint
//! is persisted to a `.lasthash` state file in the working directory.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::SyncError;

/// Name of the state file holding the last recorded fingerprint.
pub const STATE_FILE: &str = ".lasthash";

/// A digest summarizing the content of a selected file set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Digest the selected files (relative to `workdir`) into a fingerprint.
    ///
    /// Any unreadable file aborts the whole computation; no partial
    /// fingerprint is produced.
    pub fn compute(workdir: &Path, files: &[PathBuf]) -> Result<Self, SyncError> {
        let mut sorted: Vec<&PathBuf> = files.iter().collect();
        sorted.sort();

        let mut combined = Sha256::new();
        for relative in sorted {
            let digest = hash_file(&workdir.join(relative))?;
            combined.update(digest);
        }

        let fingerprint = Self(format!("{:x}", combined.finalize()));
        debug!(files = files.len(), fingerprint = %fingerprint.0, "computed fingerprint");
        Ok(fingerprint)
    }

    /// The fingerprint as a lowercase hex string.
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Compare against the persisted state in `workdir`.
    ///
    /// A missing state file counts as a mismatch: the first run always
    /// archives.
    pub fn matches_state(&self, workdir: &Path) -> Result<bool, SyncError> {
        let state_path = workdir.join(STATE_FILE);
        let recorded = match fs::read_to_string(&state_path) {
            Ok(recorded) => recorded,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(SyncError::Detection {
                    operation: "reading state file",
                    path: state_path,
                    source: e,
                })
            }
        };
        Ok(recorded.trim() == self.0)
    }

    /// Persist this fingerprint as the new state.
    ///
    /// The engine calls this only after the archive write succeeded, so a
    /// failed write is re-detected as a change on the next run.
    pub fn commit(&self, workdir: &Path) -> Result<(), SyncError> {
        let state_path = workdir.join(STATE_FILE);
        fs::write(&state_path, format!("{}\n", self.0)).map_err(|e| SyncError::Detection {
            operation: "writing state file",
            path: state_path,
            source: e,
        })
    }
}

fn hash_file(path: &Path) -> Result<[u8; 32], SyncError> {
    let mut file = File::open(path).map_err(|e| SyncError::Detection {
        operation: "opening",
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 65536];
    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| SyncError::Detection {
            operation: "reading",
            path: path.to_path_buf(),
            source: e,
        })?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_fingerprint_ignores_traversal_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"aaa").unwrap();
        fs::write(dir.path().join("b.txt"), b"bbb").unwrap();

        let forward = vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")];
        let reversed = vec![PathBuf::from("b.txt"), PathBuf::from("a.txt")];

        let first = Fingerprint::compute(dir.path(), &forward).unwrap();
        let second = Fingerprint::compute(dir.path(), &reversed).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let dir = tempdir().unwrap();
        let files = vec![PathBuf::from("a.txt")];

        fs::write(dir.path().join("a.txt"), b"before").unwrap();
        let before = Fingerprint::compute(dir.path(), &files).unwrap();

        fs::write(dir.path().join("a.txt"), b"after").unwrap();
        let after = Fingerprint::compute(dir.path(), &files).unwrap();

        assert_ne!(before, after);
    }

    #[test]
    fn test_missing_state_counts_as_changed() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"aaa").unwrap();

        let fingerprint =
            Fingerprint::compute(dir.path(), &[PathBuf::from("a.txt")]).unwrap();

        assert!(!fingerprint.matches_state(dir.path()).unwrap());
    }

    #[test]
    fn test_commit_then_match() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"aaa").unwrap();
        let files = vec![PathBuf::from("a.txt")];

        let fingerprint = Fingerprint::compute(dir.path(), &files).unwrap();
        fingerprint.commit(dir.path()).unwrap();

        let recomputed = Fingerprint::compute(dir.path(), &files).unwrap();
        assert!(recomputed.matches_state(dir.path()).unwrap());
    }

    #[test]
    fn test_unreadable_file_aborts() {
        let dir = tempdir().unwrap();

        let err = Fingerprint::compute(dir.path(), &[PathBuf::from("missing.txt")]).unwrap_err();

        assert!(matches!(err, SyncError::Detection { .. }));
    }
}
