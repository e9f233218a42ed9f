//! Configuration management for shipment
//!
//! Destination profiles are loaded from:
//! 1. TOML configuration file
//! 2. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use shipment::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! let profile = config.select_profile(Some("mirror")).expect("unknown profile");
//! println!("Uploading with: {}", profile.method);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `SHIPMENT__<section>__<key>`
//!
//! Examples:
//! - `SHIPMENT__DEFAULT_HOST=mirror`
//! - `SHIPMENT__PROFILES__MIRROR__INCOMING=/srv/other`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `shipment.toml`.
//! This can be overridden using the `SHIPMENT_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{Config, ProfileConfig};
pub use sources::default_path;
pub use validation::ValidationError;

use thiserror::Error;

use crate::profile::DestinationProfile;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("No such profile: `{0}'")]
    UnknownProfile(String),

    #[error("No host given and no default_host configured")]
    NoDefaultHost,
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed
    /// - Validation fails (missing method, unknown default host, etc.)
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path.as_ref())?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Resolve a profile by name
    pub fn profile(&self, name: &str) -> Result<DestinationProfile, ConfigError> {
        self.profiles
            .get(name)
            .map(|profile| profile.to_profile(name))
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))
    }

    /// Resolve `host`, falling back to `default_host`
    pub fn select_profile(&self, host: Option<&str>) -> Result<DestinationProfile, ConfigError> {
        let name = host
            .or(self.default_host.as_deref())
            .ok_or(ConfigError::NoDefaultHost)?;
        self.profile(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_and_select_profile() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
default_host = "mirror"

[profiles.mirror]
method = "local"
fqdn = "mirror.example.org"
incoming = "/srv/mirror/incoming"
checkers = ["checksum"]

[profiles.staging]
method = "local"
incoming = "/srv/staging"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(&config_path).unwrap();

        let default = config.select_profile(None).unwrap();
        assert_eq!(default.name, "mirror");
        assert_eq!(default.display_host(), "mirror.example.org");
        assert_eq!(default.checkers, vec!["checksum"]);

        let staging = config.select_profile(Some("staging")).unwrap();
        assert_eq!(staging.incoming, "/srv/staging");
    }

    #[test]
    fn test_unknown_profile() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");
        fs::write(
            &config_path,
            "[profiles.mirror]\nmethod = \"local\"\nincoming = \"/srv\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(&config_path).unwrap();
        assert!(matches!(
            config.select_profile(Some("ftp-master")),
            Err(ConfigError::UnknownProfile(ref name)) if name == "ftp-master"
        ));
        assert!(matches!(
            config.select_profile(None),
            Err(ConfigError::NoDefaultHost)
        ));
    }

    #[test]
    fn test_validation_runs_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");
        fs::write(
            &config_path,
            "default_host = \"nowhere\"\n[profiles.mirror]\nmethod = \"local\"\nincoming = \"/srv\"\n",
        )
        .unwrap();

        let result = Config::load_from_path(&config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::UnknownDefaultHost { .. })
        ));
    }
}
