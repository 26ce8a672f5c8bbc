//! Main CLI entry point for debrelease

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::BuildArgs;

/// debrelease - Build and upload Debian source packages for several Ubuntu series
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Decrease logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    quiet: u8,

    /// Configuration file path (global option)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Package one source tree for every configured distribution
    Package {
        /// Source tree to package (defaults to build.source_tree)
        #[arg(short, long, value_name = "DIR")]
        source: Option<PathBuf>,

        /// Write a JSON run report to FILE
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        #[command(flatten)]
        build: BuildArgs,
    },

    /// Package every untracked release listed in a manifest
    Release {
        /// YAML list of `{version, location}` entries
        #[arg(long, value_name = "FILE")]
        releases: PathBuf,

        /// Directory holding packaged-version markers
        #[arg(long, value_name = "DIR")]
        tracking_dir: Option<PathBuf>,

        /// Directory where each release is copied before packaging
        #[arg(long, value_name = "DIR")]
        work_dir: Option<PathBuf>,

        #[command(flatten)]
        build: BuildArgs,
    },

    /// Validate configuration and resolve package metadata
    Validate {
        /// Also check that the external tools are installed
        #[arg(long)]
        check_tools: bool,
    },

    /// Initialize a new configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, value_name = "FILE", default_value = commands::DEFAULT_CONFIG_FILE)]
        output: PathBuf,

        /// Force overwrite existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet)?;

    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(commands::DEFAULT_CONFIG_FILE));

    let result = match cli.command {
        Commands::Package { source, report, build } => {
            commands::PackageCommand::new(config_path, source, report, build)
                .execute()
                .await
        }

        Commands::Release { releases, tracking_dir, work_dir, build } => {
            commands::ReleaseCommand::new(config_path, releases, tracking_dir, work_dir, build)
                .execute()
                .await
        }

        Commands::Validate { check_tools } => {
            commands::ValidateCommand::new(config_path, check_tools)
                .execute()
                .await
        }

        Commands::Init { output, force } => commands::InitCommand::new(output, force).execute().await,
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn setup_logging(verbose: u8, quiet: u8) -> Result<()> {
    let log_level = match (verbose, quiet) {
        (0, 0) => "info",
        (1, 0) => "debug",
        (_, 0) => "trace",
        (0, 1) => "warn",
        (0, 2) => "error",
        (0, _) => "off",
        _ => "info",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
