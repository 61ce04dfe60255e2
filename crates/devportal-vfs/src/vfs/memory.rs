//! In-memory filesystem implementation.
//!
//! Used for test fixtures and scratch layers. All data is ephemeral.

use super::traits::{DirEntry, EntryKind, FileHandle, Filesystem, Metadata};
use crate::paths;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tokio::sync::RwLock;

/// Entry in the memory filesystem.
#[derive(Debug, Clone)]
enum Entry {
    File { data: Vec<u8>, modified: SystemTime },
    Directory { modified: SystemTime },
}

impl Entry {
    fn metadata(&self) -> Metadata {
        match self {
            Entry::File { data, modified } => {
                Metadata::file(data.len() as u64).with_modified(Some(*modified))
            }
            Entry::Directory { modified } => Metadata::directory().with_modified(Some(*modified)),
        }
    }
}

/// In-memory filesystem.
///
/// Thread-safe via internal `RwLock`. All data is lost when dropped. The
/// `Filesystem` impl is read-only; content goes in through [`MemoryFs::write`],
/// [`MemoryFs::mkdir`] or [`MemoryFs::from_files`].
#[derive(Debug)]
pub struct MemoryFs {
    entries: RwLock<HashMap<PathBuf, Entry>>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// Create a new empty in-memory filesystem.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Self::empty_tree()),
        }
    }

    /// Build a filesystem from `(path, contents)` pairs, creating parents.
    ///
    /// A pair that collides with an existing entry of the other kind (a file
    /// below a file, say) is skipped with a warning.
    pub fn from_files<P, D>(files: impl IntoIterator<Item = (P, D)>) -> Self
    where
        P: AsRef<Path>,
        D: AsRef<[u8]>,
    {
        let mut entries = Self::empty_tree();
        for (path, data) in files {
            let path = path.as_ref();
            if let Err(e) = Self::insert_file(&mut entries, path, data.as_ref()) {
                tracing::warn!(path = %path.display(), error = %e, "Skipping fixture file");
            }
        }
        Self {
            entries: RwLock::new(entries),
        }
    }

    fn empty_tree() -> HashMap<PathBuf, Entry> {
        let mut entries = HashMap::new();
        // Root directory always exists
        entries.insert(
            PathBuf::new(),
            Entry::Directory {
                modified: SystemTime::now(),
            },
        );
        entries
    }

    /// Ensure all parent directories of `path` exist.
    fn ensure_parents(entries: &mut HashMap<PathBuf, Entry>, path: &Path) -> io::Result<()> {
        let mut current = PathBuf::new();
        for component in path.parent().into_iter().flat_map(|p| p.components()) {
            if let Component::Normal(s) = component {
                current.push(s);
                let entry = entries.entry(current.clone()).or_insert(Entry::Directory {
                    modified: SystemTime::now(),
                });
                if let Entry::File { .. } = entry {
                    return Err(io::Error::new(
                        io::ErrorKind::NotADirectory,
                        format!("not a directory: {}", current.display()),
                    ));
                }
            }
        }
        Ok(())
    }

    fn insert_file(
        entries: &mut HashMap<PathBuf, Entry>,
        path: &Path,
        data: &[u8],
    ) -> io::Result<()> {
        let normalized = paths::normalize(path);
        if paths::is_root(&normalized) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                "is a directory: root",
            ));
        }
        Self::ensure_parents(entries, &normalized)?;

        // Check we're not overwriting a directory
        if let Some(Entry::Directory { .. }) = entries.get(&normalized) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", path.display()),
            ));
        }

        entries.insert(
            normalized,
            Entry::File {
                data: data.to_vec(),
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    /// Write a file, creating it and its parent directories as needed.
    pub async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut entries = self.entries.write().await;
        Self::insert_file(&mut entries, path, data)
    }

    /// Create a directory (and parent directories if needed).
    pub async fn mkdir(&self, path: &Path) -> io::Result<()> {
        let normalized = paths::normalize(path);
        let mut entries = self.entries.write().await;
        Self::ensure_parents(&mut entries, &normalized)?;

        // Check if something already exists
        if let Some(existing) = entries.get(&normalized) {
            return match existing {
                Entry::Directory { .. } => Ok(()), // Already exists, fine
                Entry::File { .. } => Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("file exists: {}", path.display()),
                )),
            };
        }

        entries.insert(
            normalized,
            Entry::Directory {
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("not found: {}", path.display()),
        )
    }
}

#[async_trait]
impl Filesystem for MemoryFs {
    async fn open(&self, path: &Path) -> io::Result<FileHandle> {
        let normalized = paths::normalize(path);
        let entries = self.entries.read().await;

        match entries.get(&normalized) {
            Some(Entry::File { data, modified }) => {
                let metadata = Metadata::file(data.len() as u64).with_modified(Some(*modified));
                Ok(FileHandle::from_bytes(metadata, data.clone()))
            }
            Some(Entry::Directory { .. }) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", path.display()),
            )),
            None => Err(Self::not_found(path)),
        }
    }

    async fn stat(&self, path: &Path) -> io::Result<Metadata> {
        let normalized = paths::normalize(path);
        let entries = self.entries.read().await;

        entries
            .get(&normalized)
            .map(Entry::metadata)
            .ok_or_else(|| Self::not_found(path))
    }

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let normalized = paths::normalize(path);
        let entries = self.entries.read().await;

        match entries.get(&normalized) {
            Some(Entry::File { data, .. }) => Ok(data.clone()),
            Some(Entry::Directory { .. }) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", path.display()),
            )),
            None => Err(Self::not_found(path)),
        }
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let normalized = paths::normalize(path);
        let entries = self.entries.read().await;

        // Verify the path is a directory
        match entries.get(&normalized) {
            Some(Entry::Directory { .. }) => {}
            Some(Entry::File { .. }) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("not a directory: {}", path.display()),
                ));
            }
            None => return Err(Self::not_found(path)),
        }

        // Find all direct children
        let mut result = Vec::new();
        for (entry_path, entry) in entries.iter() {
            if entry_path == &normalized || entry_path.parent() != Some(normalized.as_path()) {
                continue;
            }
            if let Some(name) = entry_path.file_name() {
                let kind = match entry {
                    Entry::File { .. } => EntryKind::File,
                    Entry::Directory { .. } => EntryKind::Directory,
                };
                result.push(DirEntry {
                    name: name.to_string_lossy().into_owned(),
                    kind,
                });
            }
        }

        // Sort for consistent ordering
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }
}
