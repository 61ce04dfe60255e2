//! OverlayFs: an upper filesystem layered over a lower one.
//!
//! The overlay is read-only and holds nothing but its two layers. Every call
//! queries the layers directly.
//!
//! # Precedence
//!
//! - `open`, `stat`, `read_file`: the upper layer answers if it can. The lower
//!   layer is consulted only when the upper layer reports the path does not
//!   exist ([`is_not_found`]). Any other upper-layer failure is returned as-is
//!   (wrapped with context) instead of being masked by a lower-layer read.
//! - `read_dir`: both layers are listed, names are deduplicated with the upper
//!   entry winning, and the result is sorted by name. A plain file where a
//!   directory is expected, in either layer, is an error.
//! - Without an upper layer every call is handed to the lower layer unchanged.

use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::sync::Arc;

use super::traits::{DirEntry, FileHandle, Filesystem, Metadata};
use crate::error::{Layer, Op, OverlayError, is_not_found};
use crate::paths;
use crate::set::Set;

/// A filesystem presenting `upper` over `lower`.
///
/// Both layers are shared; cloning an overlay clones two `Arc`s.
#[derive(Clone)]
pub struct OverlayFs {
    upper: Option<Arc<dyn Filesystem>>,
    lower: Arc<dyn Filesystem>,
}

impl OverlayFs {
    /// Layer `upper` over `lower`.
    pub fn new(upper: Arc<dyn Filesystem>, lower: Arc<dyn Filesystem>) -> Self {
        Self {
            upper: Some(upper),
            lower,
        }
    }

    /// An overlay with no upper layer: a pure pass-through to `lower`.
    pub fn passthrough(lower: Arc<dyn Filesystem>) -> Self {
        Self { upper: None, lower }
    }

    /// Layer `upper` over `lower` if there is one.
    pub fn with_optional_upper(
        upper: Option<Arc<dyn Filesystem>>,
        lower: Arc<dyn Filesystem>,
    ) -> Self {
        Self { upper, lower }
    }

    pub fn upper(&self) -> Option<&Arc<dyn Filesystem>> {
        self.upper.as_ref()
    }

    pub fn lower(&self) -> &Arc<dyn Filesystem> {
        &self.lower
    }

    /// Derive an overlay rooted at `dir` in both layers.
    ///
    /// The root yields the same view. Deriving `a` then `b` is equivalent to
    /// deriving `a/b`.
    pub fn sub(&self, dir: &Path) -> io::Result<OverlayFs> {
        let dir = paths::normalize(dir);
        if paths::is_root(&dir) {
            return Ok(self.clone());
        }
        tracing::debug!(dir = %dir.display(), "deriving overlay subtree");

        let upper = match &self.upper {
            Some(upper) => Some(super::sub(upper, &dir).map_err(|source| OverlayError::Subtree {
                path: dir.clone(),
                layer: Layer::Upper,
                source,
            })?),
            None => None,
        };
        let lower = super::sub(&self.lower, &dir).map_err(|source| OverlayError::Subtree {
            path: dir.clone(),
            layer: Layer::Lower,
            source,
        })?;

        Ok(OverlayFs { upper, lower })
    }

    /// Read one layer's listing of `path`, if that layer has the directory.
    async fn layer_dir(fs: &dyn Filesystem, path: &Path, layer: Layer) -> io::Result<Listing> {
        let meta = match fs.stat(path).await {
            Ok(meta) => meta,
            Err(e) if is_not_found(&e) => return Ok(Listing::Missing(e)),
            Err(source) => {
                return Err(OverlayError::Layer {
                    op: Op::ReadDir,
                    path: path.to_path_buf(),
                    layer,
                    source,
                }
                .into());
            }
        };
        if !meta.is_dir() {
            return Err(OverlayError::NotADirectory {
                op: Op::ReadDir,
                path: path.to_path_buf(),
                layer,
            }
            .into());
        }

        let entries = fs.read_dir(path).await.map_err(|source| OverlayError::Layer {
            op: Op::ReadDir,
            path: path.to_path_buf(),
            layer,
            source,
        })?;
        Ok(Listing::Found(entries))
    }
}

/// One layer's contribution to a merged listing.
enum Listing {
    Found(Vec<DirEntry>),
    /// The layer's own not-found error, kept for when neither layer has the path.
    Missing(io::Error),
}

/// Wrap a layer failure with the operation, path and layer.
fn wrap(op: Op, path: &Path, layer: Layer) -> impl FnOnce(io::Error) -> io::Error {
    move |source| {
        OverlayError::Layer {
            op,
            path: path.to_path_buf(),
            layer,
            source,
        }
        .into()
    }
}

#[async_trait]
impl Filesystem for OverlayFs {
    async fn open(&self, path: &Path) -> io::Result<FileHandle> {
        let path = paths::normalize(path);
        let Some(upper) = &self.upper else {
            return self.lower.open(&path).await;
        };

        match upper.open(&path).await {
            Ok(file) => Ok(file),
            Err(e) if is_not_found(&e) => {
                tracing::trace!(path = %path.display(), "open: falling back to lower layer");
                self.lower
                    .open(&path)
                    .await
                    .map_err(wrap(Op::Open, &path, Layer::Lower))
            }
            Err(e) => Err(wrap(Op::Open, &path, Layer::Upper)(e)),
        }
    }

    async fn stat(&self, path: &Path) -> io::Result<Metadata> {
        let path = paths::normalize(path);
        let Some(upper) = &self.upper else {
            return self.lower.stat(&path).await;
        };

        match upper.stat(&path).await {
            Ok(meta) => Ok(meta),
            Err(e) if is_not_found(&e) => {
                tracing::trace!(path = %path.display(), "stat: falling back to lower layer");
                self.lower
                    .stat(&path)
                    .await
                    .map_err(wrap(Op::Stat, &path, Layer::Lower))
            }
            Err(e) => Err(wrap(Op::Stat, &path, Layer::Upper)(e)),
        }
    }

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let path = paths::normalize(path);
        let Some(upper) = &self.upper else {
            return self.lower.read_file(&path).await;
        };

        match upper.read_file(&path).await {
            Ok(contents) => Ok(contents),
            Err(e) if is_not_found(&e) => {
                tracing::trace!(path = %path.display(), "read_file: falling back to lower layer");
                self.lower
                    .read_file(&path)
                    .await
                    .map_err(wrap(Op::ReadFile, &path, Layer::Lower))
            }
            Err(e) => Err(wrap(Op::ReadFile, &path, Layer::Upper)(e)),
        }
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let path = paths::normalize(path);
        let Some(upper) = &self.upper else {
            return self.lower.read_dir(&path).await;
        };

        let upper_listing = Self::layer_dir(upper.as_ref(), &path, Layer::Upper).await?;
        let lower_listing = Self::layer_dir(self.lower.as_ref(), &path, Layer::Lower).await?;

        let (mut entries, lower_entries) = match (upper_listing, lower_listing) {
            (Listing::Missing(_), Listing::Missing(source)) => {
                return Err(wrap(Op::ReadDir, &path, Layer::Lower)(source));
            }
            (Listing::Found(upper), Listing::Found(lower)) => (upper, lower),
            (Listing::Found(upper), Listing::Missing(_)) => (upper, Vec::new()),
            (Listing::Missing(_), Listing::Found(lower)) => (Vec::new(), lower),
        };

        let mut names = Set::new();
        names.add(entries.iter().map(|entry| entry.name.clone()));

        for entry in lower_entries {
            if !names.has(&entry.name) {
                names.add([entry.name.clone()]);
                entries.push(entry);
            }
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        tracing::trace!(path = %path.display(), count = entries.len(), "read_dir: merged layers");
        Ok(entries)
    }

    fn sub(&self, dir: &Path) -> Option<io::Result<Arc<dyn Filesystem>>> {
        Some(OverlayFs::sub(self, dir).map(|overlay| Arc::new(overlay) as Arc<dyn Filesystem>))
    }
}
