//! Asset filesystem composition.
//!
//! The portal renders templates and serves static files from a single
//! filesystem: the compiled-in bundle, optionally overridden by a directory
//! on disk.

use std::sync::Arc;

use crate::config::TemplatesConfig;
use crate::vfs::{Filesystem, LocalFs, OverlayFs};

/// Compose the portal's asset filesystem.
///
/// `bundle` is always the lower layer. When `config` names an override
/// directory, a [`LocalFs`] over it becomes the upper layer; otherwise the
/// result passes every call straight through to `bundle`.
pub fn asset_fs(config: &TemplatesConfig, bundle: Arc<dyn Filesystem>) -> OverlayFs {
    let upper = config.path.as_ref().map(|path| {
        tracing::info!(path = %path.display(), "Using template overrides");
        Arc::new(LocalFs::new(path.clone())) as Arc<dyn Filesystem>
    });
    if upper.is_none() {
        tracing::info!("No template overrides configured, serving built-in assets");
    }
    OverlayFs::with_optional_upper(upper, bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryFs;
    use std::path::Path;

    fn bundle() -> Arc<dyn Filesystem> {
        Arc::new(MemoryFs::from_files([
            ("templates/home.html", "built-in home"),
            ("static/theme.css", "built-in theme"),
        ]))
    }

    #[tokio::test]
    async fn test_without_override_is_passthrough() {
        let fs = asset_fs(&TemplatesConfig::default(), bundle());
        assert!(fs.upper().is_none());
        assert_eq!(
            fs.read_file(Path::new("static/theme.css")).await.unwrap(),
            b"built-in theme"
        );
    }

    #[tokio::test]
    async fn test_override_directory_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("static")).unwrap();
        std::fs::write(dir.path().join("static/theme.css"), b"custom theme").unwrap();

        let fs = asset_fs(&TemplatesConfig::with_path(dir.path()), bundle());
        assert_eq!(
            fs.read_file(Path::new("static/theme.css")).await.unwrap(),
            b"custom theme"
        );
        assert_eq!(
            fs.read_file(Path::new("templates/home.html")).await.unwrap(),
            b"built-in home"
        );
    }

    #[tokio::test]
    async fn test_missing_override_directory_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let config = TemplatesConfig::with_path(dir.path().join("not-created"));
        let fs = asset_fs(&config, bundle());

        let names: Vec<_> = fs
            .read_dir(Path::new(""))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["static", "templates"]);
    }
}
