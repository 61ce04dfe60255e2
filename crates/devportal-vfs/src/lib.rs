//! devportal-vfs: the layered asset filesystem behind the device portal.
//!
//! This crate provides:
//!
//! - **Filesystem**: an async capability trait (open, stat, read_file,
//!   read_dir, sub) implemented by every backend
//! - **Backends**: `MemoryFs`, `LocalFs`, `EmbeddedFs` and the generic `SubFs`
//! - **OverlayFs**: a read-only upper-over-lower view with per-path precedence
//!   and merged directory listings
//! - **Set**: the small deduplicating container used while merging listings
//!
//! The portal composes its assets with [`assets::asset_fs`]: the compiled-in
//! web bundle is always the lower layer, and an operator-supplied override
//! directory (see [`config::TemplatesConfig`]) becomes the upper layer when
//! configured.

pub mod assets;
pub mod config;
pub mod error;
pub mod paths;
pub mod set;
pub mod vfs;

pub use error::{ErrorClass, Layer, Op, OverlayError, classify, is_not_found};
pub use set::Set;
pub use vfs::{
    DirEntry, EmbeddedFs, EntryKind, FileHandle, Filesystem, LocalFs, MemoryFs, Metadata,
    OverlayFs, SubFs, sub,
};
