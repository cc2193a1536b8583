//! Push/pull orchestration.
//!
//! A push runs `Selecting → Detecting → (Skipped | Archiving → Rotating →
//! Archived)`: select files, fingerprint them, skip when nothing changed,
//! otherwise rotate stale archives (when configured) and write a new one.
//! The fingerprint state is committed only after the archive landed.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::archive::{self, ArchiveWriter, Codec, ExtractStats};
use crate::config::SyncSettings;
use crate::error::SyncError;

use super::fingerprint::Fingerprint;
use super::pattern::PatternSet;
use super::retention;
use super::select;

/// Branch/revision pair naming one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveIdentity {
    pub branch: String,
    pub revision: String,
}

impl ArchiveIdentity {
    /// Create an identity, warning when either part contains the `_`
    /// separator used by the archive naming convention.
    pub fn new(branch: impl Into<String>, revision: impl Into<String>) -> Self {
        let identity = Self {
            branch: branch.into(),
            revision: revision.into(),
        };
        if identity.branch.contains('_') || identity.revision.contains('_') {
            warn!(
                branch = %identity.branch,
                revision = %identity.revision,
                "identifier contains '_', the archive name separator; retention may match other archives"
            );
        }
        identity
    }

    /// Archive file name under the cloud directory.
    pub fn file_name(&self, codec: Codec) -> String {
        format!("{}_{}.{}", self.branch, self.revision, codec.extension())
    }
}

/// Statistics from a completed push.
#[derive(Debug, Clone, Default)]
pub struct PushStats {
    /// Files packed into the archive.
    pub files_archived: usize,
    /// Payload bytes read from the working tree.
    pub bytes_read: u64,
    /// Stale archives removed by rotation.
    pub archives_rotated: usize,
    /// Total duration.
    pub duration_ms: u64,
}

/// Terminal state of a push.
#[derive(Debug)]
pub enum PushOutcome {
    /// No files matched the configured patterns.
    NoFiles,
    /// Selection unchanged since the last push; nothing written.
    Skipped,
    /// A new archive was produced.
    Archived {
        path: PathBuf,
        files: Vec<PathBuf>,
        stats: PushStats,
    },
}

/// Orchestrates selection, change detection, rotation, and archiving.
pub struct SyncEngine<'a> {
    settings: &'a SyncSettings,
    workdir: PathBuf,
    writer: ArchiveWriter,
}

impl<'a> SyncEngine<'a> {
    /// Create an engine over `workdir` with the default archive writer.
    pub fn new(settings: &'a SyncSettings, workdir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            workdir: workdir.into(),
            writer: ArchiveWriter::new(Codec::default()),
        }
    }

    /// Replace the archive writer (codec, level, progress callback).
    pub fn with_writer(mut self, writer: ArchiveWriter) -> Self {
        self.writer = writer;
        self
    }

    /// Produce an archive for `identity` if the selection changed.
    pub fn push(&self, identity: &ArchiveIdentity) -> Result<PushOutcome, SyncError> {
        let start = Instant::now();

        let patterns = PatternSet::compile(&self.settings.patterns)?;
        let files = select::select_files(&self.workdir, &patterns, self.settings.max_file_size)?;
        if files.is_empty() {
            info!("no files matched the sync patterns");
            return Ok(PushOutcome::NoFiles);
        }
        debug!(count = files.len(), "files selected");

        let fingerprint = Fingerprint::compute(&self.workdir, &files)?;
        if fingerprint.matches_state(&self.workdir)? {
            info!("selection unchanged since last push");
            return Ok(PushOutcome::Skipped);
        }

        let cloud_dir = self.cloud_dir();
        fs::create_dir_all(&cloud_dir).map_err(|e| SyncError::Write {
            operation: "creating cloud directory",
            path: cloud_dir.clone(),
            source: e,
        })?;

        let mut stats = PushStats {
            files_archived: files.len(),
            ..Default::default()
        };

        if self.settings.keep_latest {
            let removed = retention::rotate(&identity.branch, &cloud_dir)?;
            stats.archives_rotated = removed.len();
        }

        let destination = cloud_dir.join(identity.file_name(self.writer.codec()));
        stats.bytes_read = self.writer.write(&self.workdir, &files, &destination)?;

        fingerprint.commit(&self.workdir)?;

        stats.duration_ms = start.elapsed().as_millis() as u64;
        info!(path = %destination.display(), "archive written");
        Ok(PushOutcome::Archived {
            path: destination,
            files,
            stats,
        })
    }

    /// Extract the archive for `identity` into `target`.
    pub fn pull(
        &self,
        identity: &ArchiveIdentity,
        target: &Path,
    ) -> Result<ExtractStats, SyncError> {
        let source = self.archive_path(identity);
        archive::extract(&source, target)
    }

    /// Full path of the archive for `identity` under the cloud directory.
    pub fn archive_path(&self, identity: &ArchiveIdentity) -> PathBuf {
        self.cloud_dir().join(identity.file_name(self.writer.codec()))
    }

    /// The cloud directory, resolved against the working directory when the
    /// configured path is relative.
    fn cloud_dir(&self) -> PathBuf {
        self.workdir.join(&self.settings.cloud_dir)
    }
}
