//! devportal-fs: inspect the device portal's asset filesystem.
//!
//! Builds the same layered view the portal serves from (the built-in web
//! bundle, optionally overridden by a directory on disk) and lets an operator
//! check which file wins where:
//!
//! - `ls PATH`: merged listing
//! - `cat PATH`: file contents
//! - `stat PATH`: kind and size
//! - `tree PATH`: recursive merged listing
//! - `layers PATH`: which layer provides each entry

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use include_dir::{Dir, include_dir};
use tokio::io::AsyncReadExt;

use devportal_vfs::assets::asset_fs;
use devportal_vfs::config::TemplatesConfig;
use devportal_vfs::{
    DirEntry, EmbeddedFs, EntryKind, Filesystem, LocalFs, OverlayFs, Set, is_not_found,
};

/// The portal's built-in templates and static assets.
static WEB: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/web");

/// Read size used when copying a file to the output.
const CHUNK_SIZE: usize = 8 * 1024;

/// Command-line interface.
#[derive(Debug, Parser)]
#[command(name = "devportal-fs", version, about)]
pub struct Cli {
    /// Override directory layered over the assets.
    /// Defaults to `$TEMPLATES_PATH`.
    #[arg(long, global = true)]
    pub upper: Option<PathBuf>,

    /// Directory to use instead of the built-in assets.
    #[arg(long, global = true)]
    pub lower: Option<PathBuf>,

    /// View the assets from this subdirectory.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List a directory.
    Ls {
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Print entries as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print a file.
    Cat { path: PathBuf },
    /// Show the kind and size of an entry.
    Stat { path: PathBuf },
    /// Recursively list a directory.
    Tree {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Show which layer provides each entry of a directory.
    Layers {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

/// Build the layered filesystem described by the command line.
pub fn build_fs(cli: &Cli) -> Result<OverlayFs> {
    let config = match &cli.upper {
        Some(path) => TemplatesConfig::with_path(path),
        None => TemplatesConfig::from_env(),
    };
    let bundle: Arc<dyn Filesystem> = match &cli.lower {
        Some(path) => {
            tracing::info!(path = %path.display(), "Using directory as lower layer");
            Arc::new(LocalFs::new(path))
        }
        None => {
            tracing::debug!("Using built-in web bundle as lower layer");
            Arc::new(EmbeddedFs::new(&WEB))
        }
    };

    let fs = asset_fs(&config, bundle);
    match &cli.root {
        Some(root) => {
            tracing::debug!(root = %root.display(), "Scoping view to subtree");
            fs.sub(root)
                .with_context(|| format!("Failed to open subtree {}", root.display()))
        }
        None => Ok(fs),
    }
}

/// Run `cli`, writing command output to `out`.
pub async fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    let fs = build_fs(cli)?;
    execute(&fs, &cli.command, out).await
}

/// Run one command against `fs`.
pub async fn execute(fs: &OverlayFs, command: &Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Ls { path, json } => {
            let entries = list(fs, path).await?;
            if *json {
                serde_json::to_writer_pretty(&mut *out, &entries)?;
                writeln!(out)?;
            } else {
                for entry in &entries {
                    writeln!(out, "{}", display_name(entry))?;
                }
            }
        }
        Command::Cat { path } => {
            let mut file = fs
                .open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let mut buf = vec![0u8; CHUNK_SIZE];
            loop {
                let n = file
                    .read(&mut buf)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                if n == 0 {
                    break;
                }
                out.write_all(&buf[..n])?;
            }
        }
        Command::Stat { path } => {
            let meta = fs
                .stat(path)
                .await
                .with_context(|| format!("Failed to stat {}", path.display()))?;
            let kind = match meta.kind {
                EntryKind::File => "file",
                EntryKind::Directory => "directory",
            };
            writeln!(out, "kind: {kind}")?;
            writeln!(out, "size: {}", meta.size)?;
        }
        Command::Tree { path } => tree(fs, path, out).await?,
        Command::Layers { path } => layers(fs, path, out).await?,
    }
    Ok(())
}

async fn list(fs: &dyn Filesystem, path: &Path) -> Result<Vec<DirEntry>> {
    fs.read_dir(path)
        .await
        .with_context(|| format!("Failed to list {}", path.display()))
}

fn display_name(entry: &DirEntry) -> String {
    match entry.kind {
        EntryKind::Directory => format!("{}/", entry.name),
        EntryKind::File => entry.name.clone(),
    }
}

async fn tree(fs: &OverlayFs, path: &Path, out: &mut impl Write) -> Result<()> {
    // Depth-first, children pushed in reverse so they pop in sorted order
    let mut stack: Vec<(PathBuf, DirEntry, usize)> = list(fs, path)
        .await?
        .into_iter()
        .rev()
        .map(|entry| (path.join(&entry.name), entry, 0))
        .collect();

    while let Some((full, entry, depth)) = stack.pop() {
        writeln!(out, "{}{}", "  ".repeat(depth), display_name(&entry))?;
        if entry.is_dir() {
            for child in list(fs, &full).await?.into_iter().rev() {
                stack.push((full.join(&child.name), child, depth + 1));
            }
        }
    }
    Ok(())
}

/// Names listed by one layer, empty if the layer lacks the directory.
async fn layer_names(fs: &dyn Filesystem, path: &Path) -> Result<Set<String>> {
    match fs.read_dir(path).await {
        Ok(entries) => Ok(entries.into_iter().map(|e| e.name).collect()),
        Err(e) if is_not_found(&e) => Ok(Set::new()),
        Err(e) => Err(e).with_context(|| format!("Failed to list {}", path.display())),
    }
}

async fn layers(fs: &OverlayFs, path: &Path, out: &mut impl Write) -> Result<()> {
    let merged = list(fs, path).await?;
    let lower = layer_names(fs.lower().as_ref(), path).await?;
    let upper = match fs.upper() {
        Some(upper) => layer_names(upper.as_ref(), path).await?,
        None => Set::new(),
    };

    let upper_only = upper.difference(&lower);
    let lower_only = lower.difference(&upper);
    for entry in &merged {
        let origin = if upper_only.has(&entry.name) {
            "upper"
        } else if lower_only.has(&entry.name) {
            "lower"
        } else {
            "both"
        };
        writeln!(out, "{origin:<6} {}", display_name(entry))?;
    }
    Ok(())
}
