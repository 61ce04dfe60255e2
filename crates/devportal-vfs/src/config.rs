//! Template override configuration.
//!
//! Operators can replace any of the portal's built-in templates and static
//! assets by pointing `TEMPLATES_PATH` at a directory. Files found there take
//! precedence over the compiled-in bundle; everything else falls through.

use std::path::PathBuf;

/// Where to find operator-supplied template overrides, if anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplatesConfig {
    /// Override directory. `None` serves the built-in bundle only.
    pub path: Option<PathBuf>,
}

impl TemplatesConfig {
    /// Environment variable holding the override directory.
    pub const PATH_VAR: &'static str = "TEMPLATES_PATH";

    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// An unset or empty `TEMPLATES_PATH` means no override.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = lookup(Self::PATH_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self { path }
    }

    /// Configuration with an explicit override directory.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}
