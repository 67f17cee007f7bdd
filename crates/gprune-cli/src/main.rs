use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gprune_config::{report_unused_keys, LoadedConfig, PruneSettings, UnusedKeyPolicy};
use tracing::warn;

mod commands;

#[derive(Parser)]
#[command(name = "gprune")]
#[command(about = "Generation-gated pruning of managed children", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconcile pass: apply desired children, mark them, prune stale ones.
    Reconcile {
        /// Parent state JSON (metadata.generation, spec.children, status.children)
        #[arg(long)]
        state: String,

        /// Inventory JSON (known types + live objects)
        #[arg(long)]
        inventory: String,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Validate deletions only; overrides prune.dry_run from config
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Print the parent's child ledger, one line per entry
    Status {
        #[arg(long)]
        state: String,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> overlay...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Dev-time convenience; absent file is fine.
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Reconcile {
            state,
            inventory,
            config_paths,
            dry_run,
        } => {
            let loaded = load_config(&config_paths)?;
            let mut settings = loaded.settings()?;
            if dry_run {
                settings.dry_run = true;
            }
            init_tracing(&settings.log_filter);

            let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
            for pointer in &report.unused_leaf_pointers {
                warn!(pointer = %pointer, "unused config key");
            }

            commands::reconcile::run(&state, &inventory, &settings)?;
        }

        Commands::Status { state } => {
            init_tracing(&PruneSettings::default().log_filter);
            commands::status::run(&state)?;
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = gprune_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    if paths.is_empty() {
        return LoadedConfig::empty();
    }
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    gprune_config::load_layered_yaml(&path_refs).context("load layered config")
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins over
/// the configured filter.
fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}
