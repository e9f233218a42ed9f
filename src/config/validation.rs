use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("No profiles configured")]
    NoProfilesConfigured,

    #[error("Profile name '{profile}' may not contain path separators or be empty")]
    InvalidProfileName { profile: String },

    #[error("Profile '{profile}' has no method")]
    MissingMethod { profile: String },

    #[error("Profile '{profile}' has no incoming directory")]
    MissingIncoming { profile: String },

    #[error("Profile '{profile}' lists an empty checker name")]
    EmptyCheckerName { profile: String },

    #[error("default_host '{host}' does not name a configured profile")]
    UnknownDefaultHost { host: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_profiles(config)?;
    validate_default_host(config)?;
    Ok(())
}

fn validate_profiles(config: &Config) -> Result<(), ValidationError> {
    if config.profiles.is_empty() {
        return Err(ValidationError::NoProfilesConfigured);
    }

    for (name, profile) in &config.profiles {
        // The name ends up inside marker file names
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(ValidationError::InvalidProfileName {
                profile: name.clone(),
            });
        }

        if profile.method.trim().is_empty() {
            return Err(ValidationError::MissingMethod {
                profile: name.clone(),
            });
        }

        if profile.incoming.trim().is_empty() {
            return Err(ValidationError::MissingIncoming {
                profile: name.clone(),
            });
        }

        if profile.checkers.iter().any(|c| c.trim().is_empty()) {
            return Err(ValidationError::EmptyCheckerName {
                profile: name.clone(),
            });
        }
    }

    Ok(())
}

fn validate_default_host(config: &Config) -> Result<(), ValidationError> {
    match &config.default_host {
        Some(host) if !config.profiles.contains_key(host) => {
            Err(ValidationError::UnknownDefaultHost { host: host.clone() })
        }
        _ => Ok(()),
    }
}
