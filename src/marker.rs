//! Upload markers
//!
//! A marker file sits next to the `.changes` descriptor and records which
//! files were sent to a destination. Its presence blocks a second upload of
//! the same artifact set to the same destination unless forced.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub const DESCRIPTOR_SUFFIX: &str = ".changes";
pub const MARKER_SUFFIX: &str = "upload";

#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("File {} does not look like a .changes file", path.display())]
    InputShape { path: PathBuf },

    #[error(
        "Package {package} was already uploaded to {destination}\nIf you want to upload nonetheless, use --force or remove {}",
        marker.display()
    )]
    AlreadyUploaded {
        package: String,
        destination: String,
        marker: PathBuf,
    },

    #[error("failed to write marker {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Marker location for one (artifact set, destination) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMarker {
    path: PathBuf,
}

impl UploadMarker {
    /// Derive the marker path: `<stem>.changes` becomes `<stem>.<destination>.upload`
    ///
    /// Pure path computation; the filesystem is not touched.
    pub fn for_descriptor(changes: &Path, destination: &str) -> Result<Self, MarkerError> {
        let stem = changes
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_suffix(DESCRIPTOR_SUFFIX))
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| MarkerError::InputShape {
                path: changes.to_path_buf(),
            })?;

        Ok(Self {
            path: changes.with_file_name(format!("{stem}.{destination}.{MARKER_SUFFIX}")),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fail with [`MarkerError::AlreadyUploaded`] if the marker exists and
    /// `force` is not set
    pub async fn ensure_not_uploaded(
        &self,
        package: &str,
        destination: &str,
        force: bool,
    ) -> Result<(), MarkerError> {
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .map_err(|source| MarkerError::Io {
                path: self.path.clone(),
                source,
            })?;

        if exists && !force {
            return Err(MarkerError::AlreadyUploaded {
                package: package.to_string(),
                destination: destination.to_string(),
                marker: self.path.clone(),
            });
        }
        if exists {
            debug!(marker = %self.path.display(), "Marker exists, upload forced");
        }
        Ok(())
    }

    /// Open the marker for appending, creating it if needed
    pub async fn open(&self) -> Result<MarkerLog, MarkerError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| MarkerError::Io {
                path: self.path.clone(),
                source,
            })?;

        debug!(marker = %self.path.display(), "Writing log");
        Ok(MarkerLog {
            path: self.path.clone(),
            file,
            lines: 0,
        })
    }
}

/// Open marker file, one line per transferred file
#[derive(Debug)]
pub struct MarkerLog {
    path: PathBuf,
    file: File,
    lines: usize,
}

impl MarkerLog {
    /// Append and flush one entry so an interrupted upload leaves the
    /// lines written so far
    pub async fn record(
        &mut self,
        file_name: &str,
        host: &str,
        destination: &str,
    ) -> Result<(), MarkerError> {
        let line = format!("Successfully uploaded {file_name} to {host} for {destination}.\n");
        self.file
            .write_all(line.as_bytes())
            .await
            .map_err(|source| MarkerError::Io {
                path: self.path.clone(),
                source,
            })?;
        self.file.flush().await.map_err(|source| MarkerError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.lines += 1;
        Ok(())
    }

    pub fn lines_written(&self) -> usize {
        self.lines
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_marker_path_from_descriptor() {
        let marker =
            UploadMarker::for_descriptor(Path::new("foo_1.0_amd64.changes"), "myhost").unwrap();
        assert_eq!(marker.path(), Path::new("foo_1.0_amd64.myhost.upload"));

        let marker =
            UploadMarker::for_descriptor(Path::new("/build/foo_1.0_amd64.changes"), "myhost")
                .unwrap();
        assert_eq!(marker.path(), Path::new("/build/foo_1.0_amd64.myhost.upload"));
    }

    #[test]
    fn test_marker_path_rejects_other_suffixes() {
        for name in ["foo_1.0.tar.gz", "foo_1.0.changes.asc", ".changes"] {
            let result = UploadMarker::for_descriptor(Path::new(name), "myhost");
            assert!(
                matches!(result, Err(MarkerError::InputShape { .. })),
                "{name} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_existing_marker_blocks_upload() {
        let temp_dir = TempDir::new().unwrap();
        let changes = temp_dir.path().join("foo_1.0_amd64.changes");
        let marker = UploadMarker::for_descriptor(&changes, "myhost").unwrap();

        marker.ensure_not_uploaded("foo", "myhost", false).await.unwrap();

        fs::write(marker.path(), "Successfully uploaded foo.dsc to myhost for myhost.\n").unwrap();
        let err = marker
            .ensure_not_uploaded("foo", "myhost", false)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Package foo was already uploaded to myhost"));
        assert!(message.contains(&marker.path().display().to_string()));

        marker.ensure_not_uploaded("foo", "myhost", true).await.unwrap();
    }

    #[tokio::test]
    async fn test_marker_log_appends_lines() {
        let temp_dir = TempDir::new().unwrap();
        let changes = temp_dir.path().join("foo_1.0_amd64.changes");
        let marker = UploadMarker::for_descriptor(&changes, "myhost").unwrap();

        let mut log = marker.open().await.unwrap();
        log.record("foo_1.0.dsc", "upload.example.org", "myhost")
            .await
            .unwrap();
        log.record("foo_1.0_amd64.changes", "upload.example.org", "myhost")
            .await
            .unwrap();
        assert_eq!(log.lines_written(), 2);
        drop(log);

        let content = fs::read_to_string(marker.path()).unwrap();
        assert_eq!(
            content,
            "Successfully uploaded foo_1.0.dsc to upload.example.org for myhost.\n\
             Successfully uploaded foo_1.0_amd64.changes to upload.example.org for myhost.\n"
        );
    }
}
