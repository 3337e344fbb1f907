//! Configuration loading.
//!
//! A single TOML file, read once at startup:
//!
//! ```toml
//! workspace_root = "/home/agent/workspace"
//!
//! [policy]
//! deny_commands = ["drop table"]
//! deny_network = ["tailscale"]
//! protected_paths = ["/srv/secrets"]
//! deny_extensions = ["apk"]
//! ```
//!
//! The default location is `~/.config/cmdgate/config.toml`, overridable with
//! `CMDGATE_CONFIG`. A missing file yields the defaults; policy lists only
//! ever extend the built-in tables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{GateError, Result};
use crate::security::policy::PolicyExtensions;

/// Environment variable naming an explicit config file path.
const CONFIG_PATH_ENV: &str = "CMDGATE_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Absolute workspace root used when the CLI is not given `--workspace`.
    pub workspace_root: Option<PathBuf>,
    /// Additions to the built-in policy tables.
    pub policy: PolicyExtensions,
}

impl GateConfig {
    /// Configuration directory (`~/.config/cmdgate`).
    pub fn dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cmdgate")
    }

    /// Resolved config file path, honoring `CMDGATE_CONFIG`.
    pub fn path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::dir().join("config.toml"))
    }

    /// Load the config file, or defaults when none exists.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    /// Load a specific config file, or defaults when it does not exist.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| {
            GateError::Config(format!("Invalid config file {}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let cfg: GateConfig = toml::from_str("").unwrap();
        assert!(cfg.workspace_root.is_none());
        assert!(cfg.policy.deny_commands.is_empty());
        assert!(cfg.policy.deny_extensions.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let cfg: GateConfig = toml::from_str(
            r#"
            workspace_root = "/home/agent/workspace"

            [policy]
            deny_commands = ["drop table"]
            deny_network = ["tailscale"]
            deny_file_ops = ["dedupe --purge"]
            protected_paths = ["/srv/secrets"]
            deny_extensions = ["apk"]
            "#,
        )
        .unwrap();
        assert_eq!(
            cfg.workspace_root.as_deref(),
            Some(std::path::Path::new("/home/agent/workspace"))
        );
        assert_eq!(cfg.policy.deny_commands, vec!["drop table"]);
        assert_eq!(cfg.policy.protected_paths, vec!["/srv/secrets"]);
    }

    #[test]
    fn test_unknown_file_yields_defaults() {
        let cfg = GateConfig::load_from(std::path::Path::new("/nonexistent/cmdgate.toml")).unwrap();
        assert!(cfg.workspace_root.is_none());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = std::env::temp_dir().join("cmdgate-test-config");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(&path, "workspace_root = [not toml").unwrap();
        let err = GateConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, GateError::Config(_)));
    }
}
