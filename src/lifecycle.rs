//! Scoped transport lifecycle
//!
//! [`UploadScope::open`] resolves and initializes a backend and runs the
//! pre-upload hook. [`UploadScope::close`] runs the post-upload hook and
//! then shuts the backend down, whatever the outcome it is handed. The
//! driver keeps every fallible step between the two as a value, so no
//! exit path skips `close`.

use std::path::Path;
use std::sync::Arc;
use tracing::{Level, debug, error};

use crate::hooks::HookRunner;
use crate::interface::{InterfaceRegistry, Prompter};
use crate::observability::UploadObserver;
use crate::profile::DestinationProfile;
use crate::transport::{BackendRegistry, Transport, TransportContext, TransportError};
use crate::upload::UploadError;

const PRE_UPLOAD_HOOK: &str = "pre_upload_command";
const POST_UPLOAD_HOOK: &str = "post_upload_command";

/// Lifecycle of the transport held by a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Uninitialized,
    Ready,
    ShutDown,
}

pub struct UploadScope {
    transport: Box<dyn Transport>,
    state: TransportState,
    hooks: HookRunner,
    post_upload_command: Option<String>,
    observer: Arc<dyn UploadObserver>,
}

impl UploadScope {
    /// Build the profile's backend, initialize it and run the pre-upload hook
    ///
    /// If initialization or the pre-upload hook fails the backend is shut
    /// down before the error is returned; the post-upload hook only runs
    /// for scopes that opened successfully.
    pub async fn open(
        backends: &BackendRegistry,
        interfaces: &InterfaceRegistry,
        profile: &DestinationProfile,
        hooks: HookRunner,
        observer: Arc<dyn UploadObserver>,
    ) -> Result<Self, UploadError> {
        let factory = backends.resolve(&profile.method).map_err(|e| {
            error!(method = %profile.method, "Failed to resolve method to an uploader");
            UploadError::Configuration(format!(
                "Failed to resolve method {} to an uploader: {e}",
                profile.method
            ))
        })?;
        let interface = interfaces.resolve(&profile.interface)?;
        debug!(interface = %profile.interface, "Using interface");

        let transport = factory.create(TransportContext {
            profile: profile.clone(),
            prompter: Prompter::new(interface.create()),
        });

        let mut scope = Self {
            transport,
            state: TransportState::Uninitialized,
            hooks,
            post_upload_command: profile.post_upload_command.clone(),
            observer,
        };

        if let Err(e) = scope.transport.initialize().await {
            scope.shutdown().await;
            return Err(UploadError::Connection(e));
        }
        scope.state = TransportState::Ready;
        debug!(method = %profile.method, "Backend initialized");

        if let Err(e) = scope
            .hooks
            .run_hook(PRE_UPLOAD_HOOK, profile.pre_upload_command.as_deref())
            .await
        {
            scope.shutdown().await;
            return Err(e.into());
        }

        Ok(scope)
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Send one file through the backend; only valid while the scope is open
    pub async fn send_file(&mut self, path: &Path) -> Result<(), TransportError> {
        debug_assert_eq!(self.state, TransportState::Ready);
        self.transport.send_file(path).await
    }

    /// Run the post-upload hook, shut the backend down and settle the outcome
    ///
    /// The first error wins: a failing post-upload hook only replaces a
    /// successful outcome. When both fail the hook error goes to the
    /// observer and `outcome` is returned.
    pub async fn close<T>(mut self, outcome: Result<T, UploadError>) -> Result<T, UploadError> {
        let post = self
            .hooks
            .run_hook(POST_UPLOAD_HOOK, self.post_upload_command.as_deref())
            .await;
        self.shutdown().await;

        match (outcome, post) {
            (Ok(value), Ok(_)) => Ok(value),
            (Ok(_), Err(hook)) => Err(hook.into()),
            (Err(primary), Ok(_)) => Err(primary),
            (Err(primary), Err(hook)) => {
                self.observer.notice(
                    Level::ERROR,
                    &format!("post-upload hook failed after an earlier error: {hook}"),
                );
                Err(primary)
            }
        }
    }

    async fn shutdown(&mut self) {
        if self.state == TransportState::ShutDown {
            return;
        }
        self.transport.shutdown().await;
        self.state = TransportState::ShutDown;
        debug!("Backend shut down");
    }
}

impl Drop for UploadScope {
    fn drop(&mut self) {
        if self.state != TransportState::ShutDown {
            error!(state = ?self.state, "Upload scope dropped without being closed");
        }
    }
}
