//! Upload driver
//!
//! [`Uploader::upload`] runs the whole pipeline for one artifact set and
//! one destination, failing fast at each gate:
//!
//! 1. profile overrides and backend/interface resolution
//! 2. marker check (already uploaded?)
//! 3. checkers, in profile order
//! 4. [`UploadScope`] open: initialize + pre-upload hook
//! 5. each file, then the descriptor, is sent and recorded in the marker
//! 6. [`UploadScope`] close: post-upload hook + shutdown
//!
//! In simulate mode only the transfers are skipped. Hooks, checkers and
//! marker lines all still happen.

mod error;

pub use error::UploadError;

use bon::Builder;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};

use crate::artifacts::{ArtifactSet, file_name};
use crate::checkers::{CheckerRegistry, CheckerRunner, builtin_checkers};
use crate::config::Config;
use crate::hooks::HookRunner;
use crate::interface::{InterfaceRegistry, builtin_interfaces};
use crate::lifecycle::UploadScope;
use crate::marker::UploadMarker;
use crate::observability::{Metrics, MetricsSnapshot, TracingObserver, UploadObserver};
use crate::profile::DestinationProfile;
use crate::transport::{BackendRegistry, TransportError, builtin_backends};

const WRITE_DENIED_NOTICE: &str = "Upload permissions error

You either don't have the rights to upload a file, or you may have tried
to overwrite a file already on the server.

Continuing anyway in case you want to recover from an incomplete upload.
No file was uploaded, however.";

/// Per-invocation switches
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder)]
pub struct UploadOptions {
    /// Upload even if a marker records a previous upload
    #[builder(default)]
    pub force: bool,
    /// Skip the actual transfers (dry run)
    #[builder(default)]
    pub simulate: bool,
    /// Route into the delayed queue for this many days
    pub delayed: Option<u8>,
    /// Force passive FTP regardless of the profile
    #[builder(default)]
    pub passive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Sent,
    /// Not sent because the upload is a dry run
    Simulated,
    /// Remote refused the write; not recorded in the marker
    WriteDenied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub name: String,
    pub outcome: FileOutcome,
}

/// What a finished upload did
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub package: String,
    pub version: String,
    pub destination: String,
    pub host: String,
    pub marker: PathBuf,
    pub simulated: bool,
    pub files: Vec<FileReport>,
    pub metrics: MetricsSnapshot,
}

/// Orchestrates uploads against statically built registries
#[derive(Clone)]
pub struct Uploader {
    backends: Arc<BackendRegistry>,
    checkers: Arc<CheckerRegistry>,
    interfaces: Arc<InterfaceRegistry>,
    observer: Arc<dyn UploadObserver>,
}

impl Uploader {
    pub fn new(
        backends: BackendRegistry,
        checkers: CheckerRegistry,
        interfaces: InterfaceRegistry,
        observer: Arc<dyn UploadObserver>,
    ) -> Self {
        Self {
            backends: Arc::new(backends),
            checkers: Arc::new(checkers),
            interfaces: Arc::new(interfaces),
            observer,
        }
    }

    /// Uploader wired with the built-in backends, checkers and interface
    pub fn with_defaults() -> Self {
        Self::new(
            builtin_backends(),
            builtin_checkers(),
            builtin_interfaces(),
            Arc::new(TracingObserver),
        )
    }

    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    /// Look up `host` (or the default host) in `config`, then upload
    pub async fn upload_to_host(
        &self,
        config: &Config,
        host: Option<&str>,
        artifacts: &ArtifactSet,
        options: &UploadOptions,
    ) -> Result<UploadReport, UploadError> {
        let profile = config.select_profile(host)?;
        self.upload(profile, artifacts, options).await
    }

    /// Upload `artifacts` to the destination described by `profile`
    pub async fn upload(
        &self,
        profile: DestinationProfile,
        artifacts: &ArtifactSet,
        options: &UploadOptions,
    ) -> Result<UploadReport, UploadError> {
        let metrics = Arc::new(Metrics::new());
        let profile = apply_overrides(profile, options)?;
        self.ensure_resolvable(&profile)?;

        let marker = UploadMarker::for_descriptor(&artifacts.changes, &profile.name)?;
        marker
            .ensure_not_uploaded(&artifacts.package, &profile.name, options.force)
            .await?;

        info!(
            destination = %profile.name,
            fqdn = profile.fqdn.as_deref().unwrap_or("-"),
            "Uploading to: {}",
            profile.display_host()
        );
        if options.simulate {
            self.observer
                .notice(Level::WARN, "Not uploading for real - dry run");
        }

        CheckerRunner::new(self.checkers.clone(), self.observer.clone(), metrics.clone())
            .run_all(&profile.checkers, artifacts, &profile)
            .await?;

        info!(
            "Uploading {} to {} ({})",
            artifacts.package,
            profile.display_host(),
            profile.incoming
        );

        let hooks = HookRunner::new(self.observer.clone(), metrics.clone());
        let mut scope = UploadScope::open(
            &self.backends,
            &self.interfaces,
            &profile,
            hooks,
            self.observer.clone(),
        )
        .await?;

        let outcome = self
            .transfer_all(&mut scope, &marker, artifacts, &profile, options, &metrics)
            .await;
        let files = scope.close(outcome).await?;

        Ok(UploadReport {
            package: artifacts.package.clone(),
            version: artifacts.version.clone(),
            destination: profile.name.clone(),
            host: profile.display_host().to_string(),
            marker: marker.path().to_path_buf(),
            simulated: options.simulate,
            files,
            metrics: metrics.snapshot(),
        })
    }

    /// Reject unknown backend, interface or checker names before anything
    /// touches disk
    fn ensure_resolvable(&self, profile: &DestinationProfile) -> Result<(), UploadError> {
        if !self.backends.contains(&profile.method) {
            return Err(UploadError::Configuration(format!(
                "Failed to resolve method {} to an uploader",
                profile.method
            )));
        }
        if !self.interfaces.contains(&profile.interface) {
            return Err(UploadError::Configuration(format!(
                "No such interface: `{}'",
                profile.interface
            )));
        }
        if let Some(name) = profile
            .checkers
            .iter()
            .find(|name| !self.checkers.contains(name))
        {
            return Err(UploadError::Configuration(format!(
                "No such checker: `{name}'"
            )));
        }
        Ok(())
    }

    async fn transfer_all(
        &self,
        scope: &mut UploadScope,
        marker: &UploadMarker,
        artifacts: &ArtifactSet,
        profile: &DestinationProfile,
        options: &UploadOptions,
        metrics: &Metrics,
    ) -> Result<Vec<FileReport>, UploadError> {
        let mut log = marker.open().await?;
        let mut files = Vec::new();

        for path in artifacts.upload_order() {
            let name = file_name(path);
            info!("Uploading {} => {}", name, profile.name);

            let outcome = if options.simulate {
                metrics.file_simulated();
                FileOutcome::Simulated
            } else {
                match scope.send_file(path).await {
                    Ok(()) => {
                        metrics.file_sent();
                        FileOutcome::Sent
                    }
                    Err(e) if e.is_write_denied() => {
                        self.report_write_denied(&e);
                        metrics.file_write_denied();
                        FileOutcome::WriteDenied
                    }
                    Err(source) => {
                        return Err(UploadError::Transfer {
                            path: path.to_path_buf(),
                            source,
                        });
                    }
                }
            };

            if outcome != FileOutcome::WriteDenied {
                log.record(&name, profile.display_host(), &profile.name)
                    .await?;
            }
            files.push(FileReport { name, outcome });
        }

        Ok(files)
    }

    fn report_write_denied(&self, error: &TransportError) {
        self.observer
            .notice(Level::WARN, &format!("{WRITE_DENIED_NOTICE}\n({error})"));
    }
}

fn apply_overrides(
    profile: DestinationProfile,
    options: &UploadOptions,
) -> Result<DestinationProfile, UploadError> {
    let profile = match options.delayed {
        Some(days) => profile.delayed(days)?,
        None => profile,
    };
    Ok(if options.passive {
        profile.passive_ftp()
    } else {
        profile
    })
}
