//! Local filesystem backend.
//!
//! Provides read-only access to a real directory, such as an operator's
//! template override directory.

use super::traits::{DirEntry, EntryKind, FileHandle, Filesystem, Metadata};
use crate::paths;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

/// Local filesystem backend.
///
/// All operations are relative to `root`. For example, if `root` is
/// `/home/pi/device-portal/templates`, then `read_file("home/index.html")`
/// reads `/home/pi/device-portal/templates/home/index.html`.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
    /// Directory no resolved path may leave. Subtree views inherit it from
    /// their parent.
    boundary: PathBuf,
}

impl LocalFs {
    /// Create a local filesystem rooted at the given path.
    ///
    /// The root is not checked here; operations on a missing root report
    /// `NotFound`, which an overlay treats as an empty layer.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            boundary: root.clone(),
            root,
        }
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path to a canonical absolute path within the root.
    ///
    /// Missing paths report the OS `NotFound`. Returns `PermissionDenied` if
    /// a symlink leads outside the boundary.
    async fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
        let normalized = paths::normalize(path);
        let full = if paths::is_root(&normalized) {
            self.root.clone()
        } else {
            self.root.join(&normalized)
        };

        // Canonicalize to resolve symlinks
        let canonical = fs::canonicalize(&full).await?;

        // Verify we haven't escaped the boundary
        let canonical_root = fs::canonicalize(&self.boundary)
            .await
            .unwrap_or_else(|_| self.boundary.clone());
        if !canonical.starts_with(&canonical_root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "path escapes root: {} is not under {}",
                    canonical.display(),
                    canonical_root.display()
                ),
            ));
        }

        Ok(canonical)
    }

    fn metadata_from(meta: &std::fs::Metadata) -> Metadata {
        // Sockets, pipes and devices are reported as files
        let base = if meta.is_dir() {
            Metadata::directory()
        } else {
            Metadata::file(meta.len())
        };
        base.with_modified(meta.modified().ok())
    }
}

#[async_trait]
impl Filesystem for LocalFs {
    async fn open(&self, path: &Path) -> io::Result<FileHandle> {
        let full_path = self.resolve(path).await?;
        let file = fs::File::open(&full_path).await?;
        let meta = file.metadata().await?;
        if meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", path.display()),
            ));
        }
        Ok(FileHandle::new(Self::metadata_from(&meta), file))
    }

    async fn stat(&self, path: &Path) -> io::Result<Metadata> {
        let full_path = self.resolve(path).await?;
        // stat follows symlinks
        let meta = fs::metadata(&full_path).await?;
        Ok(Self::metadata_from(&meta))
    }

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let full_path = self.resolve(path).await?;
        fs::read(&full_path).await
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let full_path = self.resolve(path).await?;
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&full_path).await?;

        while let Some(entry) = dir.next_entry().await? {
            // Follow symlinks so an entry's kind agrees with stat()
            let kind = match fs::metadata(entry.path()).await {
                Ok(meta) if meta.is_dir() => EntryKind::Directory,
                Ok(_) => EntryKind::File,
                // Dangling symlink: list it as a file, opening it will fail
                Err(e) if e.kind() == io::ErrorKind::NotFound => EntryKind::File,
                Err(e) => return Err(e),
            };

            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn sub(&self, dir: &Path) -> Option<io::Result<Arc<dyn Filesystem>>> {
        let nested = LocalFs {
            root: self.root.join(dir),
            boundary: self.boundary.clone(),
        };
        Some(Ok(Arc::new(nested)))
    }
}
