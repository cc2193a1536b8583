use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use treestash::archive::{ArchiveWriter, Codec, CompressionLevel};
use treestash::config::{SyncSettings, SETTINGS_FILE};
use treestash::git;
use treestash::sync::{ArchiveIdentity, PushOutcome, SyncEngine};

#[derive(Parser)]
#[command(
    name = "treestash",
    about = "Branch-keyed archive sync for working-tree assets",
    version
)]
struct Cli {
    /// Working directory to operate in (defaults to the current directory).
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Archive the files matching the configured patterns.
    Push {
        /// Use gzip instead of zstd.
        #[arg(long)]
        gzip: bool,
        /// Favor speed over compression ratio.
        #[arg(long)]
        fast: bool,
    },
    /// Extract the archive for the current branch and revision.
    Pull {
        /// Look for a gzip archive instead of zstd.
        #[arg(long)]
        gzip: bool,
    },
    /// Write a default sync.toml if none exists.
    Init,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let workdir = match cli.dir {
        Some(dir) => dir,
        None => env::current_dir().context("cannot determine current directory")?,
    };

    match cli.command {
        Commands::Init => init(&workdir),
        Commands::Push { gzip, fast } => push(&workdir, codec_for(gzip), fast),
        Commands::Pull { gzip } => pull(&workdir, codec_for(gzip)),
    }
}

fn codec_for(gzip: bool) -> Codec {
    if gzip {
        Codec::Gzip
    } else {
        Codec::Zstd
    }
}

fn init(workdir: &Path) -> Result<()> {
    let path = workdir.join(SETTINGS_FILE);
    if path.exists() {
        println!("{} already exists.", SETTINGS_FILE);
        return Ok(());
    }

    fs::write(&path, SyncSettings::default_file_contents())
        .with_context(|| format!("cannot write {}", path.display()))?;

    println!(
        "{} created with default configuration.",
        SETTINGS_FILE.green()
    );
    println!("Edit it to point cloud_dir at your archive store.");
    Ok(())
}

fn push(workdir: &Path, codec: Codec, fast: bool) -> Result<()> {
    let settings = SyncSettings::load(workdir)?;
    let identity = ArchiveIdentity::new(
        git::current_branch(workdir)?,
        git::current_revision(workdir)?,
    );

    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} archiving {msg}")
            .unwrap(),
    );

    let level = if fast {
        CompressionLevel::fast()
    } else {
        CompressionLevel::balanced()
    };
    let progress = bar.clone();
    let writer = ArchiveWriter::new(codec)
        .with_level(level)
        .with_progress_callback(move |path: &Path| {
            progress.set_message(path.display().to_string());
            progress.tick();
        });

    let engine = SyncEngine::new(&settings, workdir).with_writer(writer);
    let outcome = engine.push(&identity)?;
    bar.finish_and_clear();

    match outcome {
        PushOutcome::NoFiles => {
            println!("{}", "No files matched the patterns.".yellow());
        }
        PushOutcome::Skipped => {
            println!("{}", "No changes detected, nothing to push.".yellow());
        }
        PushOutcome::Archived { path, files, stats } => {
            git::append_gitignore(workdir, &files).context("cannot update .gitignore")?;
            println!(
                "{} {} ({} files, {} bytes, {} ms)",
                "Archive created:".green(),
                path.display(),
                stats.files_archived,
                stats.bytes_read,
                stats.duration_ms
            );
            if stats.archives_rotated > 0 {
                println!("Removed {} stale archive(s).", stats.archives_rotated);
            }
        }
    }
    Ok(())
}

fn pull(workdir: &Path, codec: Codec) -> Result<()> {
    let settings = SyncSettings::load(workdir)?;
    let identity = ArchiveIdentity::new(
        git::current_branch(workdir)?,
        git::current_revision(workdir)?,
    );

    let engine = SyncEngine::new(&settings, workdir).with_writer(ArchiveWriter::new(codec));
    let source = engine.archive_path(&identity);
    let stats = engine.pull(&identity, workdir)?;

    println!(
        "{} {} ({} files, {} directories)",
        "Extracted:".green(),
        source.display(),
        stats.files_written,
        stats.dirs_created
    );
    Ok(())
}
