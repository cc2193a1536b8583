//! Archive container writer.
//!
//! Serializes files and directories into a tar stream nested inside one
//! compressing sink per archive, so whole files are never buffered in
//! memory and the compression context spans every entry.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tar::Builder;
use tracing::debug;

use super::codec::{Codec, CompressionLevel};
use crate::error::SyncError;

/// Callback invoked with each entry path as it is archived.
pub type ProgressCallback = Box<dyn Fn(&Path) + Send + Sync>;

/// Streaming writer for compressed tar containers.
pub struct ArchiveWriter {
    codec: Codec,
    level: CompressionLevel,
    progress_callback: Option<ProgressCallback>,
}

impl ArchiveWriter {
    /// Create a new writer with the default compression level.
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            level: CompressionLevel::default(),
            progress_callback: None,
        }
    }

    /// Set the compression level.
    pub fn with_level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

    /// Set a progress callback invoked per archived entry.
    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Path) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Stream `entries` (paths relative to `workdir`) into a compressed tar
    /// container at `destination`. Returns the number of payload bytes read.
    ///
    /// Entries are written in caller order; a directory entry recurses
    /// depth-first with lexicographically sorted children. The container is
    /// written to a `.partial` sibling and renamed into place once complete,
    /// so a half-written archive never carries the destination name. On
    /// failure the `.partial` file is left behind for inspection.
    pub fn write(
        &self,
        workdir: &Path,
        entries: &[PathBuf],
        destination: &Path,
    ) -> Result<u64, SyncError> {
        let partial = partial_path(destination);

        let file =
            File::create(&partial).map_err(|e| write_error("creating", &partial, e))?;
        let sink = self
            .codec
            .writer(BufWriter::new(file), self.level)
            .map_err(|e| write_error("opening codec for", &partial, e))?;
        let mut builder = Builder::new(sink);
        builder.follow_symlinks(false);

        let mut bytes_read = 0u64;
        for entry in entries {
            bytes_read += self.append_path(&mut builder, workdir, entry)?;
        }

        let sink = builder
            .into_inner()
            .map_err(|e| write_error("finishing container in", &partial, e))?;
        let buffered = sink
            .finish()
            .map_err(|e| write_error("finishing compression in", &partial, e))?;
        buffered
            .into_inner()
            .map_err(|e| write_error("flushing", &partial, e.into_error()))?;

        fs::rename(&partial, destination)
            .map_err(|e| write_error("renaming archive to", destination, e))?;

        debug!(
            path = %destination.display(),
            entries = entries.len(),
            bytes_read,
            codec = self.codec.name(),
            "archive written"
        );
        Ok(bytes_read)
    }

    fn append_path<W: Write>(
        &self,
        builder: &mut Builder<W>,
        workdir: &Path,
        relative: &Path,
    ) -> Result<u64, SyncError> {
        let full = workdir.join(relative);
        let metadata =
            fs::symlink_metadata(&full).map_err(|e| write_error("inspecting", &full, e))?;

        if metadata.is_dir() {
            self.append_dir_recursive(builder, workdir, relative)
        } else if metadata.is_file() {
            self.append_file(builder, workdir, relative, metadata.len())
        } else {
            // Symlinks and special files are not archived.
            Ok(0)
        }
    }

    fn append_file<W: Write>(
        &self,
        builder: &mut Builder<W>,
        workdir: &Path,
        relative: &Path,
        size: u64,
    ) -> Result<u64, SyncError> {
        if let Some(ref callback) = self.progress_callback {
            callback(relative);
        }

        let full = workdir.join(relative);
        let mut file = File::open(&full).map_err(|e| write_error("opening", &full, e))?;
        builder
            .append_file(relative, &mut file)
            .map_err(|e| write_error("archiving", &full, e))?;
        Ok(size)
    }

    fn append_dir_recursive<W: Write>(
        &self,
        builder: &mut Builder<W>,
        workdir: &Path,
        relative: &Path,
    ) -> Result<u64, SyncError> {
        let full = workdir.join(relative);
        builder
            .append_dir(relative, &full)
            .map_err(|e| write_error("archiving", &full, e))?;

        let mut children: Vec<_> = fs::read_dir(&full)
            .map_err(|e| write_error("listing", &full, e))?
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|e| write_error("listing", &full, e))?;
        children.sort_by_key(|child| child.file_name());

        let mut bytes_read = 0u64;
        for child in children {
            let child_relative = relative.join(child.file_name());
            let file_type = child
                .file_type()
                .map_err(|e| write_error("inspecting", &child.path(), e))?;

            if file_type.is_dir() {
                bytes_read += self.append_dir_recursive(builder, workdir, &child_relative)?;
            } else if file_type.is_file() {
                let size = child
                    .metadata()
                    .map_err(|e| write_error("inspecting", &child.path(), e))?
                    .len();
                bytes_read += self.append_file(builder, workdir, &child_relative, size)?;
            }
        }
        Ok(bytes_read)
    }
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(".partial");
    PathBuf::from(name)
}

fn write_error(operation: &'static str, path: &Path, source: std::io::Error) -> SyncError {
    SyncError::Write {
        operation,
        path: path.to_path_buf(),
        source,
    }
}
