//! Archive container extraction.
//!
//! Decodes entries in stored order, recreating directories and permission
//! bits. Entry paths that would resolve outside the target directory are
//! rejected before anything is written for them.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Component, Path};

use tar::Archive;
use tracing::debug;

use super::codec::Codec;
use crate::error::SyncError;

/// Counters from one extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractStats {
    pub files_written: usize,
    pub dirs_created: usize,
    pub bytes_written: u64,
}

/// Extract the archive at `source` into `target_dir`.
///
/// The codec is inferred from the file name. Missing parent directories are
/// created for every entry, so entry order is never load-bearing; existing
/// files are truncated. End-of-stream is normal termination. Files already
/// extracted before a failure are not rolled back.
pub fn extract(source: &Path, target_dir: &Path) -> Result<ExtractStats, SyncError> {
    let name = source
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let codec = Codec::from_file_name(name).ok_or_else(|| SyncError::UnknownArchiveFormat {
        path: source.to_path_buf(),
    })?;

    let file = File::open(source).map_err(|e| extract_error("opening", source, e))?;
    let decoder = codec
        .reader(BufReader::new(file))
        .map_err(|e| extract_error("decoding", source, e))?;
    let mut archive = Archive::new(decoder);
    archive.set_preserve_permissions(true);

    fs::create_dir_all(target_dir)
        .map_err(|e| extract_error("creating target directory", target_dir, e))?;

    let mut stats = ExtractStats::default();
    let entries = archive
        .entries()
        .map_err(|e| extract_error("reading", source, e))?;

    for entry_result in entries {
        let mut entry = entry_result.map_err(|e| extract_error("reading entry from", source, e))?;
        let entry_path = entry
            .path()
            .map_err(|e| extract_error("decoding entry path in", source, e))?
            .into_owned();
        reject_unsafe_path(&entry_path)?;

        let target = target_dir.join(&entry_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| extract_error("creating parents for", &target, e))?;
        }

        let is_dir = entry.header().entry_type().is_dir();
        let size = entry.header().size().unwrap_or(0);
        entry
            .unpack(&target)
            .map_err(|e| extract_error("unpacking", &target, e))?;

        if is_dir {
            stats.dirs_created += 1;
        } else {
            stats.files_written += 1;
            stats.bytes_written += size;
        }
        debug!(path = %entry_path.display(), is_dir, size, "extracted entry");
    }

    Ok(stats)
}

/// Reject entry paths that could escape the extraction target.
fn reject_unsafe_path(path: &Path) -> Result<(), SyncError> {
    if path.as_os_str().is_empty() {
        return Err(SyncError::UnsafeEntryPath(String::from("<empty>")));
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(SyncError::UnsafeEntryPath(
                    path.display().to_string(),
                ));
            }
        }
    }
    Ok(())
}

fn extract_error(operation: &'static str, path: &Path, source: std::io::Error) -> SyncError {
    SyncError::Extraction {
        operation,
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_reject_parent_components() {
        assert!(reject_unsafe_path(Path::new("../../etc/passwd")).is_err());
        assert!(reject_unsafe_path(Path::new("assets/../../../etc/passwd")).is_err());
        assert!(reject_unsafe_path(Path::new("/etc/passwd")).is_err());
    }

    #[test]
    fn test_accept_relative_paths() {
        assert!(reject_unsafe_path(Path::new("assets/a.png")).is_ok());
        assert!(reject_unsafe_path(Path::new("./assets/a.png")).is_ok());
        assert!(reject_unsafe_path(Path::new("deep/nested/dir/file.bin")).is_ok());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let err = extract(&PathBuf::from("main_abc.zip"), Path::new("/tmp")).unwrap_err();

        assert!(matches!(err, SyncError::UnknownArchiveFormat { .. }));
    }
}
