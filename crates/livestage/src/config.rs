//! Application configuration
//!
//! One TOML file with `[server]`, `[server.auth]`, `[session]`, `[logging]`
//! and `[stage]` sections. Every field has a default, so an empty file (or
//! no file) is a valid configuration.

use std::path::Path;

use anyhow::{Context, Result};
use livestage_control::{SessionConfig, WebServerConfig};
use livestage_core::{LogConfig, StageConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: WebServerConfig,
    pub session: SessionConfig,
    pub logging: LogConfig,
    pub stage: StageConfig,
}

impl AppConfig {
    /// Load from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config file {:?}", path))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.session.fallback_song, "assets/audio/song1.mp3");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.stage.audience_size, 400);
        assert!(!config.server.auth.is_enabled());
    }

    #[test]
    fn test_sections() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [server.auth]
            admin_password = "stage-door"

            [session]
            fallback_song = "assets/audio/opener.mp3"

            [logging]
            level = "debug"
            file_output = true

            [stage]
            seed = 7
            audience_size = 50

            [stage.particles]
            confetti_burst = 300

            [stage.formations]
            smoothing = 0.2
            "#,
        )
        .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(config.server.enable_cors);
        assert!(config.server.auth.validate("stage-door"));
        assert_eq!(config.session.fallback_song, "assets/audio/opener.mp3");
        assert!(config.logging.file_output);
        assert_eq!(config.stage.seed, Some(7));
        assert_eq!(config.stage.audience_size, 50);
        assert_eq!(config.stage.particles.confetti_burst, 300);
        assert_eq!(config.stage.particles.fire_burst, 30);
        assert_eq!(config.stage.formations.smoothing, 0.2);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("livestage.toml");
        std::fs::write(&path, "[server]\nport = 9000\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(AppConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
        assert!(AppConfig::load(None).is_ok());
    }

    #[test]
    fn test_unknown_value_type_rejected() {
        assert!(AppConfig::from_toml("[server]\nport = \"eighty\"").is_err());
    }
}
