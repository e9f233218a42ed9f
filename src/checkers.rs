//! Pre-upload checkers
//!
//! Checkers run in the order a profile lists them and stop at the first
//! rejection. A profile without checkers still uploads, but the operator
//! is warned.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tracing::{Level, info};

use crate::artifacts::ArtifactSet;
use crate::observability::{Metrics, UploadObserver};
use crate::profile::DestinationProfile;
use crate::registry::{Registry, RegistryError};

#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("{0}")]
    Rejected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a checker run
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Unknown(#[from] RegistryError),

    #[error("checker `{checker}' rejected the upload: {reason}")]
    Rejected { checker: String, reason: String },
}

/// Named pre-upload check
#[async_trait]
pub trait Checker: Send + Sync {
    async fn check(
        &self,
        artifacts: &ArtifactSet,
        profile: &DestinationProfile,
    ) -> Result<(), CheckerError>;
}

pub type CheckerRegistry = Registry<dyn Checker>;

/// Registry holding the checkers shipped with this crate
pub fn builtin_checkers() -> CheckerRegistry {
    CheckerRegistry::new("checker").with("checksum", Arc::new(ChecksumChecker))
}

/// Runs a profile's checkers in order against an artifact set
pub struct CheckerRunner {
    registry: Arc<CheckerRegistry>,
    observer: Arc<dyn UploadObserver>,
    metrics: Arc<Metrics>,
}

impl CheckerRunner {
    pub fn new(
        registry: Arc<CheckerRegistry>,
        observer: Arc<dyn UploadObserver>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            registry,
            observer,
            metrics,
        }
    }

    pub async fn run_all(
        &self,
        names: &[String],
        artifacts: &ArtifactSet,
        profile: &DestinationProfile,
    ) -> Result<(), CheckError> {
        if names.is_empty() {
            self.observer.notice(
                Level::WARN,
                &format!(
                    "No checkers defined in profile `{}'. Not checking upload.",
                    profile.name
                ),
            );
            return Ok(());
        }

        for name in names {
            let checker = self.registry.resolve(name)?;
            info!(checker = %name, package = %artifacts.package, "Running checker");
            self.metrics.checker_run();

            checker
                .check(artifacts, profile)
                .await
                .map_err(|e| CheckError::Rejected {
                    checker: name.clone(),
                    reason: match e {
                        CheckerError::Rejected(reason) => reason,
                        other => other.to_string(),
                    },
                })?;
        }

        Ok(())
    }
}

/// Verifies every file against the descriptor's SHA-256 entries
#[derive(Debug, Default, Clone, Copy)]
pub struct ChecksumChecker;

#[async_trait]
impl Checker for ChecksumChecker {
    async fn check(
        &self,
        artifacts: &ArtifactSet,
        _profile: &DestinationProfile,
    ) -> Result<(), CheckerError> {
        for file in &artifacts.files {
            let Some(expected) = file.sha256.as_deref() else {
                return Err(CheckerError::Rejected(format!(
                    "no SHA-256 checksum recorded for {}",
                    file.file_name()
                )));
            };

            let actual = sha256_file(&file.path).await?;
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(CheckerError::Rejected(format!(
                    "checksum mismatch for {}: expected {expected}, got {actual}",
                    file.file_name()
                )));
            }
        }
        Ok(())
    }
}

async fn sha256_file(path: &std::path::Path) -> Result<String, std::io::Error> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ArtifactFile;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Notices(Mutex<Vec<(Level, String)>>);

    impl UploadObserver for Notices {
        fn notice(&self, level: Level, message: &str) {
            self.0.lock().unwrap().push((level, message.to_string()));
        }

        fn hook_output(&self, _command: &str, _output: &str) {}
    }

    struct Recording {
        name: &'static str,
        verdict: Option<&'static str>,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Checker for Recording {
        async fn check(
            &self,
            _artifacts: &ArtifactSet,
            _profile: &DestinationProfile,
        ) -> Result<(), CheckerError> {
            self.log.lock().unwrap().push(self.name);
            match self.verdict {
                Some(reason) => Err(CheckerError::Rejected(reason.to_string())),
                None => Ok(()),
            }
        }
    }

    fn artifacts() -> ArtifactSet {
        ArtifactSet::new("foo", "1.0", "foo_1.0_amd64.changes", Vec::new())
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_first_rejection_stops_the_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CheckerRegistry::new("checker");
        for (name, verdict) in [("a", None), ("b", Some("lintian errors")), ("c", None)] {
            registry.register(
                name,
                Arc::new(Recording {
                    name,
                    verdict,
                    log: log.clone(),
                }),
            );
        }
        let runner = CheckerRunner::new(
            Arc::new(registry),
            Arc::new(Notices::default()),
            Arc::new(Metrics::new()),
        );
        let profile = DestinationProfile::new("myhost", "local", "/tmp");

        let err = runner
            .run_all(&names(&["a", "b", "c"]), &artifacts(), &profile)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckError::Rejected { ref checker, ref reason } if checker == "b" && reason == "lintian errors"
        ));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_unknown_checker() {
        let runner = CheckerRunner::new(
            Arc::new(builtin_checkers()),
            Arc::new(Notices::default()),
            Arc::new(Metrics::new()),
        );
        let profile = DestinationProfile::new("myhost", "local", "/tmp");

        let err = runner
            .run_all(&names(&["gpg"]), &artifacts(), &profile)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckError::Unknown(_)));
    }

    #[tokio::test]
    async fn test_no_checkers_warns() {
        let notices = Arc::new(Notices::default());
        let runner = CheckerRunner::new(
            Arc::new(builtin_checkers()),
            notices.clone(),
            Arc::new(Metrics::new()),
        );
        let profile = DestinationProfile::new("myhost", "local", "/tmp");

        runner.run_all(&[], &artifacts(), &profile).await.unwrap();

        let notices = notices.0.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].0, Level::WARN);
        assert!(notices[0].1.contains("No checkers defined"));
    }

    #[tokio::test]
    async fn test_checksum_checker() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("foo_1.0.dsc");
        fs::write(&path, "hello").unwrap();
        let profile = DestinationProfile::new("myhost", "local", "/tmp");

        let mut file = ArtifactFile::new(&path);
        file.sha256 = Some(
            "2CF24DBA5FB0A30E26E83B2AC5B9E29E1B161E5C1FA7425E73043362938B9824".to_string(),
        );
        let good = ArtifactSet::new("foo", "1.0", "foo.changes", vec![file.clone()]);
        ChecksumChecker.check(&good, &profile).await.unwrap();

        file.sha256 = Some("00".repeat(32));
        let bad = ArtifactSet::new("foo", "1.0", "foo.changes", vec![file.clone()]);
        let err = ChecksumChecker.check(&bad, &profile).await.unwrap_err();
        assert!(err.to_string().contains("checksum mismatch for foo_1.0.dsc"));

        file.sha256 = None;
        let unrecorded = ArtifactSet::new("foo", "1.0", "foo.changes", vec![file]);
        let err = ChecksumChecker.check(&unrecorded, &profile).await.unwrap_err();
        assert!(matches!(err, CheckerError::Rejected(_)));
    }
}
