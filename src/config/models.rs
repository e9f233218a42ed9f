use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::profile::{DEFAULT_INTERFACE, DestinationProfile};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when no host is named on the command line
    pub default_host: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,
}

/// One `[profiles.<name>]` table
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileConfig {
    /// Backend name (e.g. "local", "ftp", "scp")
    pub method: String,
    pub fqdn: Option<String>,
    pub incoming: String,
    #[serde(default = "default_interface")]
    pub interface: String,
    pub login: Option<String>,
    pub pre_upload_command: Option<String>,
    pub post_upload_command: Option<String>,
    /// Checkers to run, in order
    #[serde(default)]
    pub checkers: Vec<String>,
    #[serde(default)]
    pub passive_ftp: bool,
    /// Backend-specific options (arbitrary JSON)
    #[serde(default)]
    pub options: serde_json::Value,
}

fn default_interface() -> String {
    DEFAULT_INTERFACE.to_string()
}

impl ProfileConfig {
    pub fn to_profile(&self, name: &str) -> DestinationProfile {
        DestinationProfile {
            name: name.to_string(),
            method: self.method.clone(),
            fqdn: self.fqdn.clone(),
            incoming: self.incoming.clone(),
            interface: self.interface.clone(),
            login: self.login.clone(),
            pre_upload_command: self.pre_upload_command.clone(),
            post_upload_command: self.post_upload_command.clone(),
            checkers: self.checkers.clone(),
            passive_ftp: self.passive_ftp,
            delayed: None,
            options: self.options.clone(),
        }
    }
}
