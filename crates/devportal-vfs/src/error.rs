//! Overlay error context and error classification.
//!
//! Backends report failures as `std::io::Error`. The overlay wraps them with
//! the operation, the normalized path and the originating layer, then hands
//! them back as `io::Error` with the classified kind preserved, so an overlay
//! stacked inside another overlay still sees `NotFound` for a missing path.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Which side of an overlay an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Upper,
    Lower,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Upper => f.write_str("upper"),
            Layer::Lower => f.write_str("lower"),
        }
    }
}

/// Filesystem operation named in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Open,
    Stat,
    ReadFile,
    ReadDir,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Op::Open => "open",
            Op::Stat => "stat",
            Op::ReadFile => "read",
            Op::ReadDir => "readdir",
        };
        f.write_str(name)
    }
}

/// A failure inside one layer of an overlay.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// The layer itself failed the operation.
    #[error("{op} {}: couldn't {op} {} in {layer}", .path.display(), .path.display())]
    Layer {
        op: Op,
        path: PathBuf,
        layer: Layer,
        #[source]
        source: io::Error,
    },

    /// A directory listing found a plain file in one of the layers.
    #[error("{op} {}: {} is a non-directory file in {layer}", .path.display(), .path.display())]
    NotADirectory { op: Op, path: PathBuf, layer: Layer },

    /// A layer could not produce a view rooted at `path`.
    #[error("sub {}: couldn't make subtree for {layer}", .path.display())]
    Subtree {
        path: PathBuf,
        layer: Layer,
        #[source]
        source: io::Error,
    },
}

impl OverlayError {
    /// The layer this error originated in.
    pub fn layer(&self) -> Layer {
        match self {
            OverlayError::Layer { layer, .. }
            | OverlayError::NotADirectory { layer, .. }
            | OverlayError::Subtree { layer, .. } => *layer,
        }
    }

    /// The normalized path the failing operation was given.
    pub fn path(&self) -> &std::path::Path {
        match self {
            OverlayError::Layer { path, .. }
            | OverlayError::NotADirectory { path, .. }
            | OverlayError::Subtree { path, .. } => path,
        }
    }

    /// The `io::ErrorKind` this error is reported as.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            OverlayError::Layer { source, .. } | OverlayError::Subtree { source, .. } => {
                match classify(source) {
                    ErrorClass::NotExist => io::ErrorKind::NotFound,
                    _ => source.kind(),
                }
            }
            OverlayError::NotADirectory { .. } => io::ErrorKind::NotADirectory,
        }
    }
}

impl From<OverlayError> for io::Error {
    fn from(err: OverlayError) -> Self {
        io::Error::new(err.kind(), err)
    }
}

/// Coarse classification of a filesystem failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The path is absent from the consulted filesystem.
    NotExist,
    /// The path exists, but as the wrong kind of entry.
    TypeMismatch,
    /// Anything else: permissions, I/O, corruption.
    Underlying,
}

fn class_of_kind(kind: io::ErrorKind) -> Option<ErrorClass> {
    match kind {
        io::ErrorKind::NotFound => Some(ErrorClass::NotExist),
        io::ErrorKind::NotADirectory | io::ErrorKind::IsADirectory => {
            Some(ErrorClass::TypeMismatch)
        }
        _ => None,
    }
}

/// Classify an error, looking through every wrapped cause.
///
/// The outermost kind wins when it is decisive; otherwise the source chain is
/// searched for a wrapped `io::Error` or `OverlayError` that is.
pub fn classify(err: &io::Error) -> ErrorClass {
    if let Some(class) = class_of_kind(err.kind()) {
        return class;
    }

    let mut cause = err
        .get_ref()
        .map(|inner| inner as &(dyn StdError + 'static));
    while let Some(current) = cause {
        if let Some(io_err) = current.downcast_ref::<io::Error>() {
            if let Some(class) = class_of_kind(io_err.kind()) {
                return class;
            }
        }
        if let Some(OverlayError::NotADirectory { .. }) = current.downcast_ref::<OverlayError>() {
            return ErrorClass::TypeMismatch;
        }
        cause = current.source();
    }
    ErrorClass::Underlying
}

/// True if `err` means "this path does not exist", however deeply wrapped.
///
/// This is the only condition under which an overlay consults its lower layer.
pub fn is_not_found(err: &io::Error) -> bool {
    classify(err) == ErrorClass::NotExist
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("backend failure")]
    struct Opaque(#[source] io::Error);

    #[test]
    fn test_classify_plain_kinds() {
        assert_eq!(classify(&io::Error::from(io::ErrorKind::NotFound)), ErrorClass::NotExist);
        assert_eq!(
            classify(&io::Error::from(io::ErrorKind::NotADirectory)),
            ErrorClass::TypeMismatch
        );
        assert_eq!(
            classify(&io::Error::from(io::ErrorKind::PermissionDenied)),
            ErrorClass::Underlying
        );
    }

    #[test]
    fn test_classify_looks_through_wrappers() {
        // A backend that reports NotFound under an opaque kind
        let inner = io::Error::from(io::ErrorKind::NotFound);
        let wrapped = io::Error::other(Opaque(inner));
        assert_eq!(wrapped.kind(), io::ErrorKind::Other);
        assert!(is_not_found(&wrapped));
    }

    #[test]
    fn test_permission_denied_is_not_not_found() {
        let wrapped = io::Error::other(Opaque(io::Error::from(io::ErrorKind::PermissionDenied)));
        assert!(!is_not_found(&wrapped));
        assert_eq!(classify(&wrapped), ErrorClass::Underlying);
    }

    #[test]
    fn test_overlay_error_preserves_not_found() {
        let err: io::Error = OverlayError::Layer {
            op: Op::Open,
            path: PathBuf::from("theme.css"),
            layer: Layer::Lower,
            source: io::Error::other(Opaque(io::Error::from(io::ErrorKind::NotFound))),
        }
        .into();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(is_not_found(&err));
    }

    #[test]
    fn test_overlay_error_message() {
        let err = OverlayError::NotADirectory {
            op: Op::ReadDir,
            path: PathBuf::from("icons"),
            layer: Layer::Upper,
        };
        assert_eq!(err.to_string(), "readdir icons: icons is a non-directory file in upper");
        assert_eq!(err.layer(), Layer::Upper);

        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::NotADirectory);
        assert_eq!(classify(&io_err), ErrorClass::TypeMismatch);
    }

    #[test]
    fn test_layer_message_names_op_path_and_layer() {
        let err = OverlayError::Layer {
            op: Op::Stat,
            path: PathBuf::from("a/b"),
            layer: Layer::Upper,
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.to_string(), "stat a/b: couldn't stat a/b in upper");
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_subtree_message_names_layer() {
        let err = OverlayError::Subtree {
            path: PathBuf::from("static"),
            layer: Layer::Lower,
            source: io::Error::from(io::ErrorKind::NotADirectory),
        };
        assert_eq!(err.to_string(), "sub static: couldn't make subtree for lower");
        assert_eq!(err.layer(), Layer::Lower);
        assert_eq!(err.kind(), io::ErrorKind::NotADirectory);
    }
}
