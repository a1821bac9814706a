//! Configuration file support.
//!
//! Portlint reads an optional `portlint.toml` next to the roots it is
//! pointed at (or wherever `--config` says). The file carries tool
//! overrides and toggles for checks that exist but are not enabled by
//! default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Portlint configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External tool overrides
    pub tools: ToolsConfig,

    /// Checks that are specified but disabled by default
    pub experimental: ExperimentalConfig,
}

/// External tool settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Path to dumpbin.exe. Overrides the `DUMPBIN` environment variable
    /// and PATH discovery.
    pub dumpbin: Option<PathBuf>,
}

/// Toggles for checks kept behind a flag.
///
/// Both checks are fully implemented; they stay off until the port
/// catalog is clean enough to turn them on without mass breakage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentalConfig {
    /// Verify the CRT linkage of every static library against the
    /// declared `CRTLinkage` of the build.
    pub crt_linkage_check: bool,

    /// Reject subdirectories under /lib and /debug/lib.
    pub lib_subdirectory_check: bool,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.tools.dumpbin.is_none());
        assert!(!config.experimental.crt_linkage_check);
        assert!(!config.experimental.lib_subdirectory_check);
    }

    #[test]
    fn test_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("portlint.toml");
        std::fs::write(
            &path,
            r#"
[tools]
dumpbin = "C:/VS/dumpbin.exe"

[experimental]
crt_linkage_check = true
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.tools.dumpbin.as_deref(),
            Some(Path::new("C:/VS/dumpbin.exe"))
        );
        assert!(config.experimental.crt_linkage_check);
        assert!(!config.experimental.lib_subdirectory_check);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load_or_default(&tmp.path().join("missing.toml"));
        assert!(config.tools.dumpbin.is_none());
    }
}
