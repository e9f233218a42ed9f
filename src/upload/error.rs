use std::path::PathBuf;
use thiserror::Error;

use crate::artifacts::ArtifactError;
use crate::checkers::CheckError;
use crate::config::ConfigError;
use crate::hooks::HookError;
use crate::marker::MarkerError;
use crate::profile::OverrideError;
use crate::registry::RegistryError;
use crate::transport::TransportError;

/// Every way an upload can stop, as seen by the host application
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(
        "Package {package} was already uploaded to {destination}\nIf you want to upload nonetheless, use --force or remove {}",
        marker.display()
    )]
    AlreadyUploaded {
        package: String,
        destination: String,
        marker: PathBuf,
    },

    #[error("checker `{checker}' rejected the upload: {reason}")]
    CheckerRejected { checker: String, reason: String },

    #[error("hook failed: {0}")]
    Hook(#[from] HookError),

    #[error("could not initialize backend: {0}")]
    Connection(#[source] TransportError),

    #[error("upload of {} failed: {source}", path.display())]
    Transfer {
        path: PathBuf,
        #[source]
        source: TransportError,
    },

    #[error("File {} does not look like a .changes file", path.display())]
    InputShape { path: PathBuf },

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("failed to write marker {}: {source}", path.display())]
    Marker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl UploadError {
    /// Stable identifier for the failure class
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::Configuration(_) => "configuration",
            UploadError::AlreadyUploaded { .. } => "already_uploaded",
            UploadError::CheckerRejected { .. } => "checker_rejected",
            UploadError::Hook(_) => "hook_failed",
            UploadError::Connection(_) => "connection",
            UploadError::Transfer { .. } => "transfer",
            UploadError::InputShape { .. } => "input_shape",
            UploadError::Artifact(_) => "artifact",
            UploadError::Marker { .. } => "marker",
        }
    }
}

impl From<MarkerError> for UploadError {
    fn from(value: MarkerError) -> Self {
        match value {
            MarkerError::InputShape { path } => UploadError::InputShape { path },
            MarkerError::AlreadyUploaded {
                package,
                destination,
                marker,
            } => UploadError::AlreadyUploaded {
                package,
                destination,
                marker,
            },
            MarkerError::Io { path, source } => UploadError::Marker { path, source },
        }
    }
}

impl From<CheckError> for UploadError {
    fn from(value: CheckError) -> Self {
        match value {
            CheckError::Unknown(e) => UploadError::Configuration(e.to_string()),
            CheckError::Rejected { checker, reason } => {
                UploadError::CheckerRejected { checker, reason }
            }
        }
    }
}

impl From<RegistryError> for UploadError {
    fn from(value: RegistryError) -> Self {
        UploadError::Configuration(value.to_string())
    }
}

impl From<ConfigError> for UploadError {
    fn from(value: ConfigError) -> Self {
        UploadError::Configuration(value.to_string())
    }
}

impl From<OverrideError> for UploadError {
    fn from(value: OverrideError) -> Self {
        UploadError::Configuration(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_errors_keep_their_class() {
        let err: UploadError = MarkerError::InputShape {
            path: PathBuf::from("foo_1.0.tar.gz"),
        }
        .into();
        assert_eq!(err.kind(), "input_shape");
        assert_eq!(
            err.to_string(),
            "File foo_1.0.tar.gz does not look like a .changes file"
        );

        let err: UploadError = MarkerError::AlreadyUploaded {
            package: "foo".to_string(),
            destination: "myhost".to_string(),
            marker: PathBuf::from("foo_1.0_amd64.myhost.upload"),
        }
        .into();
        assert_eq!(err.kind(), "already_uploaded");
        assert!(err.to_string().ends_with("remove foo_1.0_amd64.myhost.upload"));
    }

    #[test]
    fn test_unknown_checker_is_configuration() {
        let err: UploadError = CheckError::Unknown(RegistryError::NotFound {
            kind: "checker",
            name: "gpg".to_string(),
        })
        .into();
        assert_eq!(err.kind(), "configuration");
        assert_eq!(err.to_string(), "configuration error: no checker registered under `gpg'");
    }
}
