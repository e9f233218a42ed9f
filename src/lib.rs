pub mod artifacts;
pub mod checkers;
pub mod config;
pub mod hooks;
pub mod interface;
pub mod lifecycle;
pub mod marker;
pub mod observability;
pub mod profile;
pub mod registry;
pub mod transport;
pub mod upload;

pub use artifacts::{ArtifactFile, ArtifactSet};
pub use profile::DestinationProfile;
pub use upload::{UploadError, UploadOptions, UploadReport, Uploader};
