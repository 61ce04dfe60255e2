//! Virtual Filesystem (VFS) for the device portal.
//!
//! Every backend implements the same read-only [`Filesystem`] capability set:
//!
//! - **MemoryFs**: In-memory tree (fixtures, scratch layers)
//! - **LocalFs**: Real directory on disk (operator template overrides)
//! - **EmbeddedFs**: Asset bundle compiled into the binary
//! - **SubFs**: Any filesystem viewed from one of its subdirectories
//! - **OverlayFs**: An upper filesystem layered over a lower one
//!
//! # Design
//!
//! Backends are shared as `Arc<dyn Filesystem>`, so an overlay can itself be
//! a layer of another overlay:
//!
//! ```text
//! OverlayFs
//! ├── upper: LocalFs("/home/pi/device-portal/templates")   (optional)
//! └── lower: EmbeddedFs(web bundle)
//! ```

mod embedded;
mod local;
mod memory;
mod overlay;
mod subtree;
mod traits;

use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::paths;

pub use embedded::EmbeddedFs;
pub use local::LocalFs;
pub use memory::MemoryFs;
pub use overlay::OverlayFs;
pub use subtree::SubFs;
pub use traits::{DirEntry, EntryKind, FileHandle, Filesystem, Metadata};

/// Derive a view of `fs` rooted at `dir`.
///
/// The root returns `fs` itself. Backends with native subtree support provide
/// their own view (which may fail, e.g. when `dir` is a plain file); all
/// others are wrapped in a [`SubFs`].
pub fn sub(fs: &Arc<dyn Filesystem>, dir: &Path) -> io::Result<Arc<dyn Filesystem>> {
    let dir = paths::normalize(dir);
    if paths::is_root(&dir) {
        return Ok(Arc::clone(fs));
    }
    match fs.sub(&dir) {
        Some(result) => result,
        None => Ok(Arc::new(SubFs::new(Arc::clone(fs), dir))),
    }
}
