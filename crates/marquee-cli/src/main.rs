//! Marquee CLI - Headless Manifest and Preload Tool
//!
//! Features:
//! - Manifest analysis (JSON schema, HLS master playlists)
//! - Representation selection under a simulated throughput signal
//! - Best-effort preload against an HTTP backend

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

/// Marquee CLI - adaptive streaming toolkit
#[derive(Parser)]
#[command(name = "marquee-cli")]
#[command(version)]
#[command(about = "Adaptive streaming decision-engine toolkit", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a manifest and list its representations
    Analyze {
        /// Path to a manifest file
        manifest: PathBuf,
    },

    /// Select a representation for a given throughput estimate
    Select {
        /// Path to a manifest file
        manifest: PathBuf,

        /// Throughput estimate in bits per second
        #[arg(short, long, default_value = "0")]
        speed: u64,

        /// Adaptation variant (adaptive, always-best, always-lowest)
        #[arg(short, long, default_value = "adaptive")]
        logic: String,

        /// Fraction of the estimate treated as spendable
        #[arg(long, default_value = "0.8")]
        safety_factor: f64,
    },

    /// Prefetch the leading bytes of each manifest's cheapest representation
    Preload {
        /// Paths to manifest files
        manifests: Vec<PathBuf>,

        /// Concurrent preload workers
        #[arg(short, long, default_value = "4")]
        workers: usize,

        /// Bytes to prefetch per resource
        #[arg(short, long, default_value = "524288")]
        leading_bytes: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    match cli.command {
        Commands::Analyze { manifest } => commands::analyze(&manifest, &cli.format).await,
        Commands::Select {
            manifest,
            speed,
            logic,
            safety_factor,
        } => commands::select(&manifest, speed, &logic, safety_factor, &cli.format).await,
        Commands::Preload {
            manifests,
            workers,
            leading_bytes,
        } => commands::preload(&manifests, workers, leading_bytes).await,
    }
}
