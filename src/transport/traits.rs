use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::interface::{InterfaceError, Prompter};
use crate::profile::DestinationProfile;

/// Transport errors
///
/// `WriteDenied` is the dedicated signal for a permission or overwrite
/// refusal on the remote side; the driver downgrades it to a warning.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("remote refused to write {}: {reason}", path.display())]
    WriteDenied { path: PathBuf, reason: String },

    #[error("transfer of {} failed: {reason}", path.display())]
    Transfer { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[from] InterfaceError),
}

impl TransportError {
    pub fn is_write_denied(&self) -> bool {
        matches!(self, TransportError::WriteDenied { .. })
    }
}

/// Everything a backend gets at construction
#[derive(Debug)]
pub struct TransportContext {
    pub profile: DestinationProfile,
    pub prompter: Prompter,
}

/// File-transfer capability implemented once per destination protocol
///
/// The lifecycle manager calls `initialize` once, `send_file` only while
/// initialized, and `shutdown` exactly once at the end. `shutdown` must be
/// safe to call after a failed `initialize`.
#[async_trait]
pub trait Transport: Send {
    /// Connect and authenticate
    async fn initialize(&mut self) -> Result<(), TransportError>;

    /// Upload a single file into the profile's incoming directory
    async fn send_file(&mut self, path: &Path) -> Result<(), TransportError>;

    /// Disconnect; never fails
    async fn shutdown(&mut self);
}

/// Constructs a transport for one upload
pub trait TransportFactory: Send + Sync {
    fn create(&self, context: TransportContext) -> Box<dyn Transport>;
}

impl<F> TransportFactory for F
where
    F: Fn(TransportContext) -> Box<dyn Transport> + Send + Sync,
{
    fn create(&self, context: TransportContext) -> Box<dyn Transport> {
        self(context)
    }
}
