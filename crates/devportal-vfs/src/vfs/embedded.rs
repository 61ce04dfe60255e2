//! EmbeddedFs: read-only VFS over an asset bundle compiled into the binary.
//!
//! Bundles come from `include_dir!`. Entry paths inside an `include_dir::Dir`
//! are relative to the directory originally embedded, so a subtree view keeps
//! pointing into the same bundle and joins its own path onto every lookup.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use include_dir::{Dir, DirEntry as BundleEntry};

use super::traits::{DirEntry, EntryKind, FileHandle, Filesystem, Metadata};
use crate::paths;

/// A read-only filesystem over an embedded directory tree.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedFs {
    dir: &'static Dir<'static>,
}

/// What a path resolves to inside the bundle.
enum Found {
    Dir(&'static Dir<'static>),
    File(&'static [u8]),
}

impl EmbeddedFs {
    pub fn new(dir: &'static Dir<'static>) -> Self {
        Self { dir }
    }

    fn lookup(&self, path: &Path) -> io::Result<Found> {
        let normalized = paths::normalize(path);
        if paths::is_root(&normalized) {
            return Ok(Found::Dir(self.dir));
        }

        let full: PathBuf = self.dir.path().join(&normalized);
        match self.dir.get_entry(&full) {
            Some(BundleEntry::Dir(dir)) => Ok(Found::Dir(dir)),
            Some(BundleEntry::File(file)) => Ok(Found::File(file.contents())),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("not found in bundle: {}", normalized.display()),
            )),
        }
    }

    fn entry_name(entry: &BundleEntry<'_>) -> String {
        paths::base_name(entry.path())
    }
}

#[async_trait]
impl Filesystem for EmbeddedFs {
    async fn open(&self, path: &Path) -> io::Result<FileHandle> {
        match self.lookup(path)? {
            Found::File(contents) => Ok(FileHandle::from_bytes(
                Metadata::file(contents.len() as u64),
                contents,
            )),
            Found::Dir(_) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", path.display()),
            )),
        }
    }

    async fn stat(&self, path: &Path) -> io::Result<Metadata> {
        Ok(match self.lookup(path)? {
            Found::File(contents) => Metadata::file(contents.len() as u64),
            Found::Dir(_) => Metadata::directory(),
        })
    }

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        match self.lookup(path)? {
            Found::File(contents) => Ok(contents.to_vec()),
            Found::Dir(_) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", path.display()),
            )),
        }
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let dir = match self.lookup(path)? {
            Found::Dir(dir) => dir,
            Found::File(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("not a directory: {}", path.display()),
                ));
            }
        };

        let mut entries: Vec<DirEntry> = dir
            .entries()
            .iter()
            .map(|entry| DirEntry {
                name: Self::entry_name(entry),
                kind: match entry {
                    BundleEntry::Dir(_) => EntryKind::Directory,
                    BundleEntry::File(_) => EntryKind::File,
                },
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn sub(&self, dir: &Path) -> Option<io::Result<Arc<dyn Filesystem>>> {
        match self.lookup(dir) {
            Ok(Found::Dir(dir)) => Some(Ok(Arc::new(EmbeddedFs::new(dir)))),
            Ok(Found::File(_)) => Some(Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: {}", dir.display()),
            ))),
            // Missing: let the generic view report NotFound lazily
            Err(_) => None,
        }
    }
}
