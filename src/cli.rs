use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "shipment")]
#[command(about = "Upload package artifact sets to configured destinations", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $SHIPMENT_CONFIG or shipment.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload the files listed in a .changes file
    Upload(UploadArgs),
    /// List configured profiles
    Profiles(ProfilesArgs),
}

#[derive(clap::Args, Debug)]
pub struct UploadArgs {
    /// Profile to upload to, followed by the .changes file. The profile
    /// may be omitted when default_host is configured.
    #[arg(required = true, num_args = 1..=2, value_names = ["HOST", "CHANGES"])]
    pub targets: Vec<String>,

    /// Upload even if a previous upload was recorded
    #[arg(short, long)]
    pub force: bool,

    /// Do everything except transferring files
    #[arg(short, long)]
    pub simulate: bool,

    /// Upload to the DELAYED/<days>-day queue
    #[arg(short = 'e', long, value_parser = clap::value_parser!(u8).range(0..=15))]
    pub delayed: Option<u8>,

    /// Force passive FTP
    #[arg(short = 'P', long)]
    pub passive: bool,
}

impl UploadArgs {
    /// Split the positional arguments into (host, changes file)
    pub fn host_and_changes(&self) -> (Option<&str>, PathBuf) {
        match self.targets.as_slice() {
            [host, changes] => (Some(host.as_str()), PathBuf::from(changes)),
            [changes] => (None, PathBuf::from(changes)),
            _ => (None, PathBuf::new()),
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ProfilesArgs {
    /// Print the resolved settings of this profile as TOML
    #[arg(long)]
    pub show: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_with_host() {
        let cli = Cli::parse_from(["shipment", "upload", "-s", "mirror", "foo_1.0_amd64.changes"]);
        let Commands::Upload(args) = cli.command else {
            panic!("expected upload");
        };
        assert!(args.simulate);
        assert_eq!(
            args.host_and_changes(),
            (Some("mirror"), PathBuf::from("foo_1.0_amd64.changes"))
        );
    }

    #[test]
    fn test_upload_without_host() {
        let cli = Cli::parse_from(["shipment", "upload", "--delayed", "7", "foo.changes"]);
        let Commands::Upload(args) = cli.command else {
            panic!("expected upload");
        };
        assert_eq!(args.delayed, Some(7));
        assert_eq!(args.host_and_changes(), (None, PathBuf::from("foo.changes")));
    }

    #[test]
    fn test_delayed_range() {
        let result = Cli::try_parse_from(["shipment", "upload", "--delayed", "16", "foo.changes"]);
        assert!(result.is_err());
    }
}
