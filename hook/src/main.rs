//! Manual auth/cleanup hook publishing DNS-01 challenge records through the
//! SchlundTech XML gateway.
//!
//! ACME clients that support external hooks (certbot's
//! `--manual-auth-hook` / `--manual-cleanup-hook`) run `schlund-hook auth`
//! before validation and `schlund-hook cleanup` afterwards, passing the
//! challenge in `CERTBOT_DOMAIN` and `CERTBOT_VALIDATION`.

mod challenge;
mod config;

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use challenge::ChallengeArgs;
use config::{HookConfig, DEFAULT_CONFIG_PATH};

/// SchlundTech DNS-01 hook command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (YAML); a missing file is ignored
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Publish the challenge TXT record and wait for it to propagate
    Auth(ChallengeArgs),

    /// Remove the challenge TXT record
    Cleanup(ChallengeArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = HookConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    debug!(?config, "configuration loaded");
    let client = config.client()?;

    match &cli.command {
        Command::Auth(args) => {
            let challenge = args.resolve()?;
            client
                .add_txt_record(&challenge.zone, &challenge.record_name, &challenge.value)
                .with_context(|| format!("publishing {}", challenge.record_name))?;

            info!(
                record = %challenge.record_name,
                seconds = config.propagation_seconds,
                "waiting for propagation"
            );
            thread::sleep(Duration::from_secs(config.propagation_seconds));
        }
        Command::Cleanup(args) => {
            let challenge = args.resolve()?;
            client
                .del_txt_record(&challenge.zone, &challenge.record_name, &challenge.value)
                .with_context(|| format!("removing {}", challenge.record_name))?;
        }
    }

    Ok(())
}

/// `-v` forces debug; otherwise `RUST_LOG` applies, defaulting to info.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
