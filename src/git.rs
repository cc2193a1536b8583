//! Git collaborator: branch/revision lookup and `.gitignore` upkeep.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::SyncError;

/// Current branch name, from `git rev-parse --abbrev-ref HEAD`.
pub fn current_branch(workdir: &Path) -> Result<String, SyncError> {
    rev_parse(workdir, &["--abbrev-ref", "HEAD"])
}

/// Current short revision id, from `git rev-parse --short HEAD`.
pub fn current_revision(workdir: &Path) -> Result<String, SyncError> {
    rev_parse(workdir, &["--short", "HEAD"])
}

fn rev_parse(workdir: &Path, args: &[&str]) -> Result<String, SyncError> {
    let output = Command::new("git")
        .arg("rev-parse")
        .args(args)
        .current_dir(workdir)
        .output()
        .map_err(|e| SyncError::Collaborator(format!("cannot run git: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SyncError::Collaborator(format!(
            "git rev-parse {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }

    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    debug!(args = ?args, value = %value, "git rev-parse");
    Ok(value)
}

/// Append archived paths to `.gitignore` when not already listed.
///
/// A missing `.gitignore` is created. The file is rewritten only when at
/// least one new line is added.
pub fn append_gitignore(workdir: &Path, paths: &[PathBuf]) -> io::Result<()> {
    let ignore_path = workdir.join(".gitignore");
    let mut content = match fs::read_to_string(&ignore_path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };

    let mut appended = false;
    for path in paths {
        let line = path.to_string_lossy();
        if content.lines().any(|existing| existing.trim() == line) {
            continue;
        }
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&line);
        content.push('\n');
        appended = true;
    }

    if appended {
        fs::write(&ignore_path, content)?;
        debug!(path = %ignore_path.display(), "updated .gitignore");
    }
    Ok(())
}
