//! Path normalization shared by every backend.
//!
//! All filesystem paths are relative to the tree root. The normalized root is
//! the empty path.

use std::path::{Component, Path, PathBuf};

/// Normalize a path: drop leading `/` and `.` segments, resolve `..`.
///
/// `..` at the root stays at the root, so `"a/../a/b"`, `"/a/b"` and
/// `"../a/b"` all normalize to `"a/b"`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(s) => result.push(s),
        }
    }
    result
}

/// True if the (normalized) path denotes the tree root.
pub fn is_root(path: &Path) -> bool {
    path.as_os_str().is_empty()
}

/// Name of the last segment, or `"."` for the root.
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string())
}
