use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::traits::{Transport, TransportContext, TransportError};

/// Built-in backend that copies files into a local `incoming` directory
///
/// Useful for mirrors mounted on the local filesystem and for exercising
/// profiles without a network. Existing files are never overwritten.
#[derive(Debug)]
pub struct LocalTransport {
    incoming: PathBuf,
    ready: bool,
}

impl LocalTransport {
    pub fn new(context: TransportContext) -> Self {
        Self {
            incoming: PathBuf::from(&context.profile.incoming),
            ready: false,
        }
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn initialize(&mut self) -> Result<(), TransportError> {
        tokio::fs::create_dir_all(&self.incoming)
            .await
            .map_err(|e| {
                TransportError::Connect(format!("cannot use {}: {e}", self.incoming.display()))
            })?;
        self.ready = true;
        info!(incoming = %self.incoming.display(), "Local transport ready");
        Ok(())
    }

    async fn send_file(&mut self, path: &Path) -> Result<(), TransportError> {
        let name = path.file_name().ok_or_else(|| TransportError::Transfer {
            path: path.to_path_buf(),
            reason: "path has no file name".to_string(),
        })?;
        let target = self.incoming.join(name);
        let transfer_error = |e: std::io::Error| TransportError::Transfer {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let mut source = File::open(path).await.map_err(transfer_error)?;
        let mut destination = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(TransportError::WriteDenied {
                    path: path.to_path_buf(),
                    reason: format!("{} already exists", target.display()),
                });
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return Err(TransportError::WriteDenied {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(transfer_error(e)),
        };

        let copied = match tokio::io::copy(&mut source, &mut destination).await {
            Ok(bytes) => destination.flush().await.map(|()| bytes),
            Err(e) => Err(e),
        };
        match copied {
            Ok(bytes) => {
                debug!(file = %path.display(), target = %target.display(), bytes, "Copied file");
                Ok(())
            }
            Err(e) => {
                drop(destination);
                // Remove the partial copy
                let _ = tokio::fs::remove_file(&target).await;
                Err(transfer_error(e))
            }
        }
    }

    async fn shutdown(&mut self) {
        if self.ready {
            debug!(incoming = %self.incoming.display(), "Local transport shut down");
        }
        self.ready = false;
    }
}
