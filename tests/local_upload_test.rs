//! Uploads through the built-in `local` backend, driven from a config file

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use shipment::config::Config;
use shipment::upload::FileOutcome;
use shipment::{ArtifactSet, UploadError, UploadOptions, Uploader};

struct Fixture {
    _temp_dir: TempDir,
    build: PathBuf,
    incoming: PathBuf,
    config: Config,
}

impl Fixture {
    fn new(checkers: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let build = temp_dir.path().join("build");
        let incoming = temp_dir.path().join("incoming");
        fs::create_dir_all(&build).unwrap();

        let config_path = temp_dir.path().join("shipment.toml");
        fs::write(
            &config_path,
            format!(
                r#"
default_host = "mirror"

[profiles.mirror]
method = "local"
fqdn = "mirror.example.org"
incoming = "{}"
checkers = [{checkers}]
"#,
                incoming.display()
            ),
        )
        .unwrap();
        let config = Config::load_from_path(&config_path).unwrap();

        Self {
            _temp_dir: temp_dir,
            build,
            incoming,
            config,
        }
    }

    /// Write the payload files and a matching descriptor
    fn write_changes(&self, tamper: bool) -> ArtifactSet {
        let payloads = [
            ("hello_2.10-3.dsc", "Source: hello\n"),
            ("hello_2.10-3_amd64.deb", "not really an ar archive"),
        ];

        let mut files = String::from("Files:\n");
        let mut sums = String::from("Checksums-Sha256:\n");
        for (name, content) in payloads {
            fs::write(self.build.join(name), content).unwrap();
            let digest = hex::encode(Sha256::digest(content.as_bytes()));
            files.push_str(&format!(
                " d41d8cd98f00b204e9800998ecf8427e {} devel optional {name}\n",
                content.len()
            ));
            sums.push_str(&format!(" {digest} {} {name}\n", content.len()));
        }

        let changes = self.build.join("hello_2.10-3_amd64.changes");
        fs::write(
            &changes,
            format!("Format: 1.8\nSource: hello\nVersion: 2.10-3\n{files}{sums}"),
        )
        .unwrap();

        if tamper {
            fs::write(self.build.join("hello_2.10-3_amd64.deb"), "swapped").unwrap();
        }

        ArtifactSet::from_changes_file(&changes).unwrap()
    }

    fn marker(&self) -> PathBuf {
        self.build.join("hello_2.10-3_amd64.mirror.upload")
    }
}

fn incoming_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_upload_to_default_host() {
    let fixture = Fixture::new(r#""checksum""#);
    let artifacts = fixture.write_changes(false);

    let report = Uploader::with_defaults()
        .upload_to_host(&fixture.config, None, &artifacts, &UploadOptions::default())
        .await
        .unwrap();

    assert_eq!(report.destination, "mirror");
    assert_eq!(report.host, "mirror.example.org");
    assert_eq!(report.metrics.checkers_run, 1);
    assert_eq!(
        incoming_listing(&fixture.incoming),
        vec![
            "hello_2.10-3.dsc",
            "hello_2.10-3_amd64.changes",
            "hello_2.10-3_amd64.deb",
        ]
    );

    let marker = fs::read_to_string(fixture.marker()).unwrap();
    assert_eq!(marker.lines().count(), 3);
    assert!(marker.ends_with(
        "Successfully uploaded hello_2.10-3_amd64.changes to mirror.example.org for mirror.\n"
    ));
}

#[tokio::test]
async fn test_second_upload_needs_force() {
    let fixture = Fixture::new("");
    let artifacts = fixture.write_changes(false);
    let uploader = Uploader::with_defaults();

    uploader
        .upload_to_host(&fixture.config, Some("mirror"), &artifacts, &UploadOptions::default())
        .await
        .unwrap();

    let err = uploader
        .upload_to_host(&fixture.config, Some("mirror"), &artifacts, &UploadOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "already_uploaded");

    // Forced, but every file already sits in incoming: all refused, none recorded
    let options = UploadOptions::builder().force(true).build();
    let report = uploader
        .upload_to_host(&fixture.config, Some("mirror"), &artifacts, &options)
        .await
        .unwrap();
    assert!(report
        .files
        .iter()
        .all(|file| file.outcome == FileOutcome::WriteDenied));
    assert_eq!(
        fs::read_to_string(fixture.marker()).unwrap().lines().count(),
        3
    );
}

#[tokio::test]
async fn test_checksum_mismatch_blocks_upload() {
    let fixture = Fixture::new(r#""checksum""#);
    let artifacts = fixture.write_changes(true);

    let err = Uploader::with_defaults()
        .upload_to_host(&fixture.config, None, &artifacts, &UploadOptions::default())
        .await
        .unwrap_err();

    match err {
        UploadError::CheckerRejected { checker, reason } => {
            assert_eq!(checker, "checksum");
            assert!(reason.contains("hello_2.10-3_amd64.deb"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!fixture.incoming.exists());
    assert!(!fixture.marker().exists());
}

#[tokio::test]
async fn test_delayed_upload_lands_in_queue() {
    let fixture = Fixture::new("");
    let artifacts = fixture.write_changes(false);

    let options = UploadOptions::builder().delayed(3).build();
    Uploader::with_defaults()
        .upload_to_host(&fixture.config, None, &artifacts, &options)
        .await
        .unwrap();

    let queue = fixture.incoming.join("DELAYED").join("3-day");
    assert_eq!(incoming_listing(&queue).len(), 3);
}

#[tokio::test]
async fn test_unknown_host_is_configuration_error() {
    let fixture = Fixture::new("");
    let artifacts = fixture.write_changes(false);

    let err = Uploader::with_defaults()
        .upload_to_host(&fixture.config, Some("nowhere"), &artifacts, &UploadOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "configuration");
    assert!(!fixture.marker().exists());
}
