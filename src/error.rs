// Centralized error handling module
// One variant per failure class, each carrying the operation and path context

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Settings file missing or unparseable.
    #[error("configuration error: {0}")]
    Config(String),

    /// Branch or revision lookup failed.
    #[error("version control query failed: {0}")]
    Collaborator(String),

    /// A sync pattern did not compile.
    #[error("invalid sync pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The working-tree walk failed.
    #[error("selection failed under {}: {}", .path.display(), .source)]
    Selection {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A selected file could not be read during fingerprinting.
    #[error("change detection failed while {} {}: {}", .operation, .path.display(), .source)]
    Detection {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Archive creation failed partway.
    #[error("archive write failed while {} {}: {}", .operation, .path.display(), .source)]
    Write {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stale archive could not be deleted.
    #[error("rotation failed for {}: {}", .path.display(), .source)]
    Rotation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Corrupt or truncated archive, or an unwritable extraction target.
    #[error("extraction failed while {} {}: {}", .operation, .path.display(), .source)]
    Extraction {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An archive entry whose path would resolve outside the target directory.
    #[error("archive entry {0:?} escapes the extraction target")]
    UnsafeEntryPath(String),

    /// A file that does not carry a recognized archive extension.
    #[error("{} is not named like a recognized archive", .path.display())]
    UnknownArchiveFormat { path: PathBuf },
}
