// ABOUTME: Application configuration loaded from a TOML file
// ABOUTME: Defaults cover local development against a fleet API on localhost

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Where the durable session slot lives.
    pub state_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            request_timeout_secs: 30,
            state_path: PathBuf::from("fleet-session.db"),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Loads from `path` when given, otherwise falls back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_point_at_localhost() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:8080/api");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn partial_config_keeps_defaults_for_the_rest() {
        let config: AppConfig =
            toml::from_str(r#"api_base_url = "https://fleet.internal/api""#).unwrap();
        assert_eq!(config.api_base_url, "https://fleet.internal/api");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn load_reads_a_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "request_timeout_secs = 5").unwrap();
        writeln!(file, "state_path = \"/var/lib/fleet/session.db\"").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.state_path, PathBuf::from("/var/lib/fleet/session.db"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: std::result::Result<AppConfig, _> = toml::from_str("api_base = \"oops\"");
        assert!(result.is_err());
    }
}
