//! Generic subtree view.
//!
//! Roots any filesystem at one of its subdirectories by prefixing every path.
//! Used for backends without native subtree support.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::traits::{DirEntry, FileHandle, Filesystem, Metadata};
use crate::paths;

/// A filesystem seen from `prefix` downwards.
///
/// Paths are normalized before they are joined, so `..` can never climb out
/// of the prefix.
#[derive(Clone)]
pub struct SubFs {
    inner: Arc<dyn Filesystem>,
    prefix: PathBuf,
}

impl SubFs {
    pub fn new(inner: Arc<dyn Filesystem>, prefix: impl AsRef<Path>) -> Self {
        Self {
            inner,
            prefix: paths::normalize(prefix.as_ref()),
        }
    }

    /// The directory of the inner filesystem this view is rooted at.
    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    fn full_path(&self, path: &Path) -> PathBuf {
        let path = paths::normalize(path);
        if paths::is_root(&path) {
            self.prefix.clone()
        } else {
            self.prefix.join(path)
        }
    }
}

#[async_trait]
impl Filesystem for SubFs {
    async fn open(&self, path: &Path) -> io::Result<FileHandle> {
        self.inner.open(&self.full_path(path)).await
    }

    async fn stat(&self, path: &Path) -> io::Result<Metadata> {
        self.inner.stat(&self.full_path(path)).await
    }

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.inner.read_file(&self.full_path(path)).await
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        self.inner.read_dir(&self.full_path(path)).await
    }

    fn sub(&self, dir: &Path) -> Option<io::Result<Arc<dyn Filesystem>>> {
        // Collapse nested views into a single prefix
        let nested = SubFs {
            inner: Arc::clone(&self.inner),
            prefix: self.full_path(dir),
        };
        Some(Ok(Arc::new(nested)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::{MemoryFs, sub};

    fn fixture() -> Arc<dyn Filesystem> {
        Arc::new(MemoryFs::from_files([
            ("assets/css/a.css", "a"),
            ("assets/css/b.css", "b"),
            ("assets/logo.svg", "<svg/>"),
            ("index.html", "<html/>"),
        ]))
    }

    #[tokio::test]
    async fn test_read_through_prefix() {
        let view = SubFs::new(fixture(), "assets");
        assert_eq!(view.read_file(Path::new("css/a.css")).await.unwrap(), b"a");
        assert!(view.stat(Path::new("")).await.unwrap().is_dir());

        let names: Vec<_> = view
            .read_dir(Path::new(""))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["css", "logo.svg"]);
    }

    #[tokio::test]
    async fn test_parent_segments_stay_inside_prefix() {
        let view = SubFs::new(fixture(), "assets");
        let result = view.read_file(Path::new("../index.html")).await;
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_nested_sub_matches_joined_sub() {
        let fs = fixture();
        let once = sub(&fs, Path::new("assets/css")).unwrap();
        let twice = sub(&sub(&fs, Path::new("assets")).unwrap(), Path::new("css")).unwrap();

        assert_eq!(
            once.read_dir(Path::new("")).await.unwrap(),
            twice.read_dir(Path::new("")).await.unwrap()
        );
        assert_eq!(
            twice.read_file(Path::new("b.css")).await.unwrap(),
            once.read_file(Path::new("b.css")).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_sub_of_root_is_identity() {
        let fs = fixture();
        let same = sub(&fs, Path::new("./")).unwrap();
        assert!(Arc::ptr_eq(&fs, &same));
    }
}
