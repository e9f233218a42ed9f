mod cli;

use clap::Parser;
use cli::{Cli, Commands, ProfilesArgs, UploadArgs};
use shipment::config::Config;
use shipment::{ArtifactSet, UploadOptions, Uploader};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let result = match &cli.command {
        Commands::Upload(args) => upload(&cli, args).await,
        Commands::Profiles(args) => profiles(&cli, args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, AnyError> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

async fn upload(cli: &Cli, args: &UploadArgs) -> Result<(), AnyError> {
    let config = load_config(cli)?;
    let (host, changes) = args.host_and_changes();
    let artifacts = ArtifactSet::from_changes_file(&changes)?;

    let options = UploadOptions::builder()
        .force(args.force)
        .simulate(args.simulate)
        .maybe_delayed(args.delayed)
        .passive(args.passive)
        .build();

    let report = Uploader::with_defaults()
        .upload_to_host(&config, host, &artifacts, &options)
        .await
        .map_err(|e| {
            tracing::debug!(kind = e.kind(), "Upload aborted");
            e
        })?;

    tracing::info!(
        package = %report.package,
        version = %report.version,
        destination = %report.destination,
        sent = report.metrics.files_sent,
        simulated = report.metrics.files_simulated,
        refused = report.metrics.files_write_denied,
        marker = %report.marker.display(),
        "Upload finished"
    );
    Ok(())
}

fn profiles(cli: &Cli, args: &ProfilesArgs) -> Result<(), AnyError> {
    let config = load_config(cli)?;

    if let Some(name) = &args.show {
        let profile = config.profile(name)?;
        print!("{}", toml::to_string_pretty(&profile)?);
        return Ok(());
    }

    for (name, profile) in &config.profiles {
        let marker = if config.default_host.as_deref() == Some(name.as_str()) {
            " (default)"
        } else {
            ""
        };
        println!(
            "{name}{marker} => {} via {} into {}",
            profile.fqdn.as_deref().unwrap_or(name),
            profile.method,
            profile.incoming
        );
    }
    Ok(())
}
