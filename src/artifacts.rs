//! Artifact sets and the `.changes` descriptor that lists them

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

const PGP_SIGNED_HEADER: &str = "-----BEGIN PGP SIGNED MESSAGE-----";
const PGP_SIGNATURE_HEADER: &str = "-----BEGIN PGP SIGNATURE-----";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is missing the `{field}' field", path.display())]
    MissingField { path: PathBuf, field: &'static str },

    #[error("{} lists `{name}', which is not a plain file name", path.display())]
    UnsafeFileName { path: PathBuf, name: String },

    #[error("{}: malformed line {line}: {content}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        content: String,
    },
}

/// One file referenced by a descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub path: PathBuf,
    pub size: Option<u64>,
    /// Lowercase hex SHA-256 recorded in the descriptor, if any
    pub sha256: Option<String>,
}

impl ArtifactFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: None,
            sha256: None,
        }
    }

    pub fn file_name(&self) -> String {
        file_name(&self.path)
    }
}

/// A package descriptor plus the files it references, uploaded as a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub package: String,
    pub version: String,
    /// The descriptor (`.changes`) file itself
    pub changes: PathBuf,
    /// Referenced files, in descriptor order
    pub files: Vec<ArtifactFile>,
}

impl ArtifactSet {
    pub fn new(
        package: impl Into<String>,
        version: impl Into<String>,
        changes: impl Into<PathBuf>,
        files: Vec<ArtifactFile>,
    ) -> Self {
        Self {
            package: package.into(),
            version: version.into(),
            changes: changes.into(),
            files,
        }
    }

    /// Read and parse a Debian-style `.changes` descriptor
    pub fn from_changes_file(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    /// Parse descriptor `content` as if it was read from `path`
    ///
    /// Referenced files are resolved relative to the descriptor's directory.
    pub fn parse(path: &Path, content: &str) -> Result<Self, ArtifactError> {
        let fields = parse_fields(path, strip_signature(content))?;
        let field = |name: &'static str| {
            fields
                .get(&name.to_ascii_lowercase())
                .map(|value| value.trim().to_string())
                .ok_or_else(|| ArtifactError::MissingField {
                    path: path.to_path_buf(),
                    field: name,
                })
        };

        let package = field("Source")?;
        let version = field("Version")?;
        let listing = field("Files")?;
        let checksums = fields
            .get("checksums-sha256")
            .map(|value| parse_checksums(value))
            .unwrap_or_default();

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let mut files = Vec::new();
        for entry in listing.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let columns: Vec<&str> = entry.split_whitespace().collect();
            let (Some(name), Some(size)) = (columns.last(), columns.get(1)) else {
                return Err(ArtifactError::MissingField {
                    path: path.to_path_buf(),
                    field: "Files",
                });
            };
            if !is_plain_file_name(name) {
                return Err(ArtifactError::UnsafeFileName {
                    path: path.to_path_buf(),
                    name: name.to_string(),
                });
            }
            files.push(ArtifactFile {
                path: base.join(name),
                size: size.parse().ok(),
                sha256: checksums.get(*name).cloned(),
            });
        }

        tracing::debug!(
            changes = %path.display(),
            package = %package,
            version = %version,
            files = files.len(),
            "Parsed descriptor"
        );

        Ok(Self {
            package,
            version,
            changes: path.to_path_buf(),
            files,
        })
    }

    /// Paths to transfer, in order, with the descriptor last
    pub fn upload_order(&self) -> impl Iterator<Item = &Path> {
        self.files
            .iter()
            .map(|file| file.path.as_path())
            .chain(std::iter::once(self.changes.as_path()))
    }

    pub fn changes_name(&self) -> String {
        file_name(&self.changes)
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// A single normal path component: no separators, no `.` or `..`
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// Drop an inline PGP armor, keeping only the signed body
fn strip_signature(content: &str) -> &str {
    let Some(start) = content.find(PGP_SIGNED_HEADER) else {
        return content;
    };
    let signed = &content[start + PGP_SIGNED_HEADER.len()..];
    // Armor headers (`Hash: ...`) end at the first blank line
    let body = signed
        .find("\n\n")
        .map(|offset| &signed[offset + 2..])
        .unwrap_or(signed);
    body.find(PGP_SIGNATURE_HEADER)
        .map(|end| &body[..end])
        .unwrap_or(body)
}

/// Split a control paragraph into lowercase field name -> raw value
fn parse_fields(path: &Path, content: &str) -> Result<HashMap<String, String>, ArtifactError> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut current: Option<String> = None;

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with(' ') || line.starts_with('\t') {
            let Some(value) = current.as_ref().and_then(|key| fields.get_mut(key)) else {
                return Err(ArtifactError::Malformed {
                    path: path.to_path_buf(),
                    line: index + 1,
                    content: line.to_string(),
                });
            };
            value.push('\n');
            value.push_str(line.trim());
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            return Err(ArtifactError::Malformed {
                path: path.to_path_buf(),
                line: index + 1,
                content: line.to_string(),
            });
        };
        let key = key.trim().to_ascii_lowercase();
        fields.insert(key.clone(), value.trim().to_string());
        current = Some(key);
    }

    Ok(fields)
}

/// `<sha256> <size> <name>` lines keyed by file name
fn parse_checksums(value: &str) -> HashMap<String, String> {
    value
        .lines()
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let digest = columns.next()?;
            let name = columns.nth(1)?;
            Some((name.to_string(), digest.to_ascii_lowercase()))
        })
        .collect()
}
