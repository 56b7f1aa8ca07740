//! Chainseed
//!
//! Reads an emulation description, configures every chain and writes each
//! chain's genesis plus the startup script of every node.

use anyhow::{Context, Result};
use chainseed_core::config::EmulationConfig;
use chainseed_core::storage::SaveDirOutcome;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chainseed")]
#[command(about = "Genesis and discovery coordinator for emulated private Ethereum networks")]
struct Cli {
    /// Emulation description (TOML)
    config: PathBuf,

    /// Where genesis files and startup scripts are written
    #[arg(long, default_value = "./chainseed-out")]
    out: PathBuf,

    /// Keep node datadirs on the host
    #[arg(long)]
    save_state: bool,

    /// Move an existing save directory aside instead of failing
    #[arg(long = "override")]
    override_existing: bool,

    /// Host directory for saved node state
    #[arg(long)]
    save_path: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = EmulationConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if cli.save_state {
        config.save_state.enabled = true;
    }
    if cli.override_existing {
        config.save_state.override_existing = true;
    }
    if let Some(path) = cli.save_path {
        config.save_state.path = path;
    }

    let (mut registry, book) = config.build().context("creating chains")?;
    let report = registry
        .run_configuration(&book)
        .context("configuring chains")?;

    if let Some(SaveDirOutcome::Replaced { moved_to }) = &report.save_dir {
        warn!("previous saved state moved to {}", moved_to.display());
    }

    for chain in registry.chains() {
        let fingerprint = chain.genesis()?.fingerprint()?;
        info!("chain {} genesis {}", chain.name(), fingerprint);
    }

    let written = registry
        .write_artifacts(&cli.out)
        .with_context(|| format!("writing artifacts to {}", cli.out.display()))?;

    print!("{}", registry.summary());
    println!(
        "Configured {} node(s) on {} chain(s), wrote {} file(s) to {}",
        report.collected,
        report.finalized.len(),
        written.len(),
        cli.out.display()
    );
    Ok(())
}
