//! Destination profiles
//!
//! A [`DestinationProfile`] is the resolved, immutable view of one
//! `[profiles.<name>]` table. Command-line overrides (delayed queue,
//! passive FTP) produce a new profile before an upload starts.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_INTERFACE: &str = "cli";
pub const MAX_DELAYED_DAYS: u8 = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OverrideError {
    #[error("delayed uploads accept 0 to {max} days, got {days}")]
    DelayOutOfRange { days: u8, max: u8 },
}

/// Named destination an artifact set can be uploaded to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationProfile {
    /// Logical profile name, also used in marker file names
    pub name: String,
    /// Backend name resolved through the backend registry
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    pub incoming: String,
    pub interface: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_upload_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_upload_command: Option<String>,
    pub checkers: Vec<String>,
    pub passive_ftp: bool,
    /// Delayed-queue tag in days, set by [`DestinationProfile::delayed`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delayed: Option<u8>,
    /// Backend-specific options
    #[serde(skip_serializing_if = "Value::is_null")]
    pub options: Value,
}

impl DestinationProfile {
    /// Minimal profile with every optional setting left unset
    pub fn new(
        name: impl Into<String>,
        method: impl Into<String>,
        incoming: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            method: method.into(),
            fqdn: None,
            incoming: incoming.into(),
            interface: DEFAULT_INTERFACE.to_string(),
            login: None,
            pre_upload_command: None,
            post_upload_command: None,
            checkers: Vec::new(),
            passive_ftp: false,
            delayed: None,
            options: Value::Null,
        }
    }

    /// Host shown to the operator and written to marker lines
    pub fn display_host(&self) -> &str {
        self.fqdn
            .as_deref()
            .filter(|fqdn| !fqdn.is_empty())
            .unwrap_or(&self.name)
    }

    /// Route the upload into the `DELAYED/<days>-day` queue below `incoming`
    pub fn delayed(mut self, days: u8) -> Result<Self, OverrideError> {
        if days > MAX_DELAYED_DAYS {
            return Err(OverrideError::DelayOutOfRange {
                days,
                max: MAX_DELAYED_DAYS,
            });
        }

        let base = self.incoming.trim_end_matches('/');
        self.incoming = format!("{base}/DELAYED/{days}-day");
        self.delayed = Some(days);
        tracing::debug!(profile = %self.name, incoming = %self.incoming, "Delayed upload queue selected");
        Ok(self)
    }

    pub fn passive_ftp(mut self) -> Self {
        self.passive_ftp = true;
        tracing::debug!(profile = %self.name, "Forcing passive FTP");
        self
    }
}
