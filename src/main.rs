// ==============================================================================
// main.rs - Variant Loader Entry Point
// ==============================================================================
// Description: Command line entry point for loading annotated variants
// Author: Matt Barham
// Created: 2025-10-31
// Modified: 2026-10-10
// Version: 2.0.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use variant_loader::loader::{LoadRequest, VariantLoader};
use variant_loader::models::VariantType;
use variant_loader::store::{update_local_frequencies, SqliteStore};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the variants of one case
    Load {
        /// Path to the annotated VCF (.vcf or .vcf.gz)
        #[arg(long)]
        vcf: PathBuf,

        /// Path to the pedigree file
        #[arg(long)]
        ped: PathBuf,

        /// Path to the field mapping config (TOML)
        #[arg(long)]
        config: PathBuf,

        /// Institute(s) the case belongs to
        #[arg(short, long, default_value = "CMMS", value_delimiter = ',')]
        institute: Vec<String>,

        /// clinical or research
        #[arg(long, default_value = "clinical")]
        variant_type: VariantType,

        /// Stop at the first variant with rank score at or below this value
        #[arg(long, default_value_t = 0.0)]
        threshold: f64,

        /// SQLite database path
        #[arg(long, env = "VARIANT_DATABASE", default_value = "variants.db")]
        database: PathBuf,
    },

    /// Recompute local frequencies for every stored variant
    UpdateFrequencies {
        /// SQLite database path
        #[arg(long, env = "VARIANT_DATABASE", default_value = "variants.db")]
        database: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let default_filter = if args.verbose {
        "variant_loader=debug"
    } else {
        "variant_loader=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match args.command {
        Command::Load {
            vcf,
            ped,
            config,
            institute,
            variant_type,
            threshold,
            database,
        } => {
            let mut store = SqliteStore::open(&database)
                .with_context(|| format!("Failed to open database {:?}", database))?;

            let loader = VariantLoader::new(LoadRequest {
                vcf,
                ped,
                config,
                institutes: institute,
                variant_type,
                threshold,
            });
            let report = loader.load(&mut store)?;

            info!(
                "Loaded {} variants for case {}",
                report.summary.emitted, report.case_id
            );
            println!("{}", serde_json::to_string_pretty(&report.summary)?);
        }
        Command::UpdateFrequencies { database } => {
            let mut store = SqliteStore::open(&database)
                .with_context(|| format!("Failed to open database {:?}", database))?;
            let updated =
                update_local_frequencies(&mut store).context("Local frequency update failed")?;
            info!("Local frequencies updated for {} variants", updated);
        }
    }

    Ok(())
}
