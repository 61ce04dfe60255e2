//! Core VFS traits and types.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::SystemTime;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

/// Kind of filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// A directory entry, as returned by `read_dir()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    /// Name of the entry (a single path segment).
    pub name: String,
    /// Kind of entry.
    pub kind: EntryKind,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }

    /// Create a new file entry.
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// File metadata, as returned by `stat()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub kind: EntryKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modification time, if the backend tracks one.
    pub modified: Option<SystemTime>,
}

impl Metadata {
    pub fn directory() -> Self {
        Self {
            kind: EntryKind::Directory,
            size: 0,
            modified: None,
        }
    }

    pub fn file(size: u64) -> Self {
        Self {
            kind: EntryKind::File,
            size,
            modified: None,
        }
    }

    pub fn with_modified(mut self, modified: Option<SystemTime>) -> Self {
        self.modified = modified;
        self
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// An open, readable file.
///
/// Dropping the handle releases whatever the backend holds for it (an OS
/// file descriptor for `LocalFs`, nothing for in-memory backends).
pub struct FileHandle {
    metadata: Metadata,
    reader: Pin<Box<dyn AsyncRead + Send>>,
}

impl FileHandle {
    pub fn new(metadata: Metadata, reader: impl AsyncRead + Send + 'static) -> Self {
        Self {
            metadata,
            reader: Box::pin(reader),
        }
    }

    /// Handle over a buffer already in memory.
    pub fn from_bytes(metadata: Metadata, data: impl AsRef<[u8]> + Send + Unpin + 'static) -> Self {
        Self::new(metadata, io::Cursor::new(data))
    }

    /// Metadata captured when the file was opened.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Read the remaining contents and close the handle.
    pub async fn read_all(mut self) -> io::Result<Vec<u8>> {
        let mut data = Vec::with_capacity(usize::try_from(self.metadata.size).unwrap_or(0));
        self.read_to_end(&mut data).await?;
        Ok(data)
    }
}

impl AsyncRead for FileHandle {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.reader.as_mut().poll_read(cx, buf)
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Abstract read-only filesystem interface.
///
/// All operations use paths relative to the filesystem root; implementations
/// normalize them with [`crate::paths::normalize`]. For example, if a
/// `LocalFs` is rooted at `/srv/portal/templates`, then
/// `read_file("home/index.html")` reads
/// `/srv/portal/templates/home/index.html`.
///
/// Implementations must be safe for concurrent reads: the same backend is
/// routinely shared between several overlays and subtree views.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Open a file for reading.
    ///
    /// Opening a directory fails with `IsADirectory`.
    async fn open(&self, path: &Path) -> io::Result<FileHandle>;

    /// Get metadata for a file or directory.
    async fn stat(&self, path: &Path) -> io::Result<Metadata>;

    /// Read the entire contents of a file.
    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// List entries in a directory, sorted by name.
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Native subtree support.
    ///
    /// Returns `None` when the backend has no cheaper way to root itself at
    /// `dir` than prefixing every path, in which case [`super::sub`] wraps it
    /// in a [`super::SubFs`]. `dir` is already normalized and never the root.
    fn sub(&self, dir: &Path) -> Option<io::Result<Arc<dyn Filesystem>>> {
        let _ = dir;
        None
    }

    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> bool {
        self.stat(path).await.is_ok()
    }
}
