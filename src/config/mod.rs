//! Runtime configuration: binary, timeout, editor, mode, and target root.
pub mod toml_loader;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Application name, used for config, cache, and data directories.
pub const APP_NAME: &str = "chezdeck";

/// Default per-call timeout for the external tool.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whether mutations are permitted. Fixed for the process lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Mutations allowed.
    #[default]
    Write,
    /// Every mutating operation is rejected.
    ReadOnly,
}

/// Loaded configuration.
///
/// Every field is optional in the file; see [`Config::load`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path to the chezmoi binary; resolved on `PATH` when unset.
    pub binary: Option<PathBuf>,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
    /// Editor command overriding `$VISUAL` / `$EDITOR`.
    pub editor: Option<String>,
    /// Mutation mode.
    pub mode: Mode,
    /// Managed target root; asked from chezmoi when unset.
    pub target: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            binary: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            editor: None,
            mode: Mode::default(),
            target: None,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from [`Config::default_path`] when
    /// `path` is `None`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Ok(Self::default());
        };
        let mut config: Self = toml_loader::load_config(&path)?;
        config.target = config.target.map(|t| dunce::simplified(&t).to_path_buf());
        tracing::debug!(path = %path.display(), mode = ?config.mode, "loaded config");
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/chezdeck/config.toml` (or the platform equivalent).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_NAME).join("config.toml"))
    }

    /// The timeout as a [`Duration`], with zero mapped to the default.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        if self.timeout_secs == 0 {
            DEFAULT_TIMEOUT
        } else {
            Duration::from_secs(self.timeout_secs)
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.mode, Mode::Write);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.binary.is_none());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn parses_all_fields() {
        let (_dir, path) = write_config(
            "binary = \"/usr/bin/chezmoi\"\n\
             timeout_secs = 5\n\
             editor = \"nvim\"\n\
             mode = \"read-only\"\n\
             target = \"/home/u\"\n",
        );
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.binary, Some(PathBuf::from("/usr/bin/chezmoi")));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.editor.as_deref(), Some("nvim"));
        assert_eq!(config.mode, Mode::ReadOnly);
        assert_eq!(config.target, Some(PathBuf::from("/home/u")));
    }

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let (_dir, path) = write_config("timeout_secs = 0\n");
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let (_dir, path) = write_config("mode = \"sometimes\"\n");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let (_dir, path) = write_config("colour = true\n");
        assert!(Config::load(Some(&path)).is_err());
    }
}
