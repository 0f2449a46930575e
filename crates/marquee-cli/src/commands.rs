//! CLI command implementations

use crate::output;
use anyhow::Context;
use marquee_core::{
    adaptation::{create_logic, AdaptiveOptions, LogicKind},
    create_parser, detect_format, HttpPrefetcher, PreloadConfig, PreloadCoordinator,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn parse_logic(name: &str) -> anyhow::Result<LogicKind> {
    match name.to_lowercase().as_str() {
        "adaptive" => Ok(LogicKind::Adaptive),
        "always-best" | "best" => Ok(LogicKind::AlwaysBest),
        "always-lowest" | "lowest" => Ok(LogicKind::AlwaysLowest),
        other => anyhow::bail!("unknown logic variant: {other}"),
    }
}

fn load_playlist(path: &Path) -> anyhow::Result<marquee_core::PlayList> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading manifest {}", path.display()))?;
    let playlist = create_parser(detect_format(&raw))
        .parse(&raw)
        .with_context(|| format!("parsing manifest {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        representations = playlist.representations().len(),
        "manifest loaded"
    );
    Ok(playlist)
}

/// Parse a manifest and list its representations
pub async fn analyze(manifest: &Path, format: &str) -> anyhow::Result<()> {
    let playlist = load_playlist(manifest)?;

    if output::is_json(format) {
        println!("{}", output::to_json(&playlist));
        return Ok(());
    }

    println!("Manifest: {}", manifest.display());
    println!("  Duration: {}s", playlist.adaptation_set.duration_secs);
    println!("  Representations: {}", playlist.representations().len());
    println!();
    for (i, r) in playlist.representations().iter().enumerate() {
        println!(
            "  {}. [{}] {}x{} {}bps weight={} {} {}",
            i,
            r.quality_type,
            r.width,
            r.height,
            r.avg_bitrate,
            r.weight,
            if r.is_default { "(default)" } else { "" },
            r.url
        );
        for backup in &r.backup_urls {
            println!("       backup: {backup}");
        }
    }

    Ok(())
}

/// Select a representation under a simulated throughput signal
pub async fn select(
    manifest: &Path,
    speed: u64,
    logic_name: &str,
    safety_factor: f64,
    format: &str,
) -> anyhow::Result<()> {
    let playlist = load_playlist(manifest)?;
    let kind = parse_logic(logic_name)?;
    let logic = create_logic(
        kind,
        AdaptiveOptions {
            safety_factor,
            ..AdaptiveOptions::default()
        },
    );

    let index = logic.initial_representation(&playlist, speed)?;
    let chosen = &playlist.representations()[index];

    if output::is_json(format) {
        println!(
            "{}",
            output::to_json(&serde_json::json!({
                "logic": kind.to_string(),
                "speed": speed,
                "index": index,
                "representation": chosen,
            }))
        );
        return Ok(());
    }

    println!("Logic: {kind}  Speed: {speed}bps");
    println!(
        "Selected {}: [{}] {}x{} {}bps",
        index, chosen.quality_type, chosen.width, chosen.height, chosen.avg_bitrate
    );
    println!("  URL: {}", chosen.url_list());

    Ok(())
}

/// Prefetch each manifest's resolved representation
pub async fn preload(
    manifests: &[PathBuf],
    workers: usize,
    leading_bytes: u64,
) -> anyhow::Result<()> {
    anyhow::ensure!(!manifests.is_empty(), "no manifests given");

    let coordinator = PreloadCoordinator::new(
        Arc::new(HttpPrefetcher::new()),
        PreloadConfig {
            workers,
            leading_bytes,
            ..PreloadConfig::default()
        },
    );

    for path in manifests {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        coordinator.preload_manifest(&raw);
    }

    println!(
        "Queued {} manifest(s), {} request(s) in flight",
        manifests.len(),
        coordinator.in_flight_count()
    );
    coordinator.close().await;
    println!("Preload pool drained");

    Ok(())
}
