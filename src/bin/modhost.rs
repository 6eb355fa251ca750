//! Inspect a host configuration and its persisted module manifest
//!
//! `modhost order` prints the manifest entries in activation order (and with
//! `--write` stores them back in that order),
//! `modhost check` validates the configuration and the manifest.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use modhost::module::registry::{sort_by_activation, ManifestLoader, ModuleManifest};
use modhost::utils::{init_logging, init_logging_from_config};
use modhost::HostConfig;

#[derive(Parser)]
#[command(name = "modhost", version, about = "Module host manifest tooling")]
struct Cli {
    /// Host configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the application name from the configuration
    #[arg(short, long)]
    app: Option<String>,

    /// Log filter, overrides the configuration (RUST_LOG still wins)
    #[arg(long)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print manifest entries in activation order
    Order {
        /// Rewrite the manifest file in activation order
        #[arg(long)]
        write: bool,
    },
    /// Validate configuration and manifest
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => HostConfig::from_file(path)
            .with_context(|| format!("loading configuration from {:?}", path))?,
        None => HostConfig::default(),
    };
    if let Some(app) = cli.app {
        config.application_name = app;
    }

    match cli.log_filter.as_deref() {
        Some(filter) => init_logging(Some(filter)),
        None => init_logging_from_config(&config.logging),
    };

    let loader = ManifestLoader::new(&config.manifest_dir);
    let entries = loader
        .load(&config.application_name)
        .with_context(|| format!("reading {:?}", loader.manifest_path(&config.application_name)))?;

    match cli.command {
        Command::Order { write } => {
            let mut modules = entries;
            sort_by_activation(&mut modules);
            for (position, entry) in modules.iter().enumerate() {
                println!(
                    "{:>3}  {:<10} {:>6}  {}",
                    position + 1,
                    entry.level,
                    entry.priority,
                    entry.identity
                );
            }

            if write {
                let path = loader.manifest_path(&config.application_name);
                let contents = ModuleManifest { modules }.to_toml()?;
                std::fs::write(&path, contents)
                    .with_context(|| format!("writing {:?}", path))?;
                info!("Rewrote {:?} in activation order", path);
            }
        }
        Command::Check => {
            config.validate()?;
            info!(
                "Configuration for {} is valid, {} manifest entries",
                config.application_name,
                entries.len()
            );
            println!("ok: {} manifest entries", entries.len());
        }
    }

    Ok(())
}
