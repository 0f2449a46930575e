//! Marquee Core - Adaptive Streaming Decision Engine
//!
//! This crate provides the decision layer of a media player:
//! - Manifest parsing (JSON multi-quality schema, HLS master playlists)
//! - Representation comparison and selection (always-best, always-lowest,
//!   throughput-adaptive)
//! - Throughput estimation from download-rate samples
//! - Best-effort background preload with dedup and a bounded worker pool
//!
//! It does not decode, render, or move bytes itself: fetching is delegated
//! to a [`preload::PrefetchBackend`], and the decode/render pipeline
//! consumes the URLs this crate selects.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     Marquee Core                        │
//! ├─────────────────────────────────────────────────────────┤
//! │                                                         │
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐       │
//! │  │  Manifest  │   │ Adaptation │   │   Speed    │       │
//! │  │   Parser   │   │   Logic    │   │ Estimator  │       │
//! │  └─────┬──────┘   └─────┬──────┘   └─────┬──────┘       │
//! │        │                │                │              │
//! │        └────────────────┼────────────────┘              │
//! │                         │                               │
//! │                 ┌───────┴────────┐                      │
//! │                 │    Adaptive    │                      │
//! │                 │    Strategy    │                      │
//! │                 └───────┬────────┘                      │
//! │                         │                               │
//! │                 ┌───────┴────────┐                      │
//! │                 │    Preload     │──► PrefetchBackend   │
//! │                 │  Coordinator   │    (external cache)  │
//! │                 └────────────────┘                      │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod adaptation;
pub mod error;
pub mod estimator;
pub mod manifest;
pub mod preload;
pub mod strategy;
pub mod types;

pub use adaptation::{
    AdaptationLogic, AdaptiveLogic, AdaptiveOptions, AlwaysBestLogic, AlwaysLowestLogic,
    CacheBias, CacheStatusProbe, LogicKind,
};
pub use error::{Error, Result};
pub use estimator::{Sample, SpeedEstimator};
pub use manifest::{create_parser, detect_format, ManifestFormat, ManifestParser};
pub use preload::{HttpPrefetcher, PrefetchBackend, PreloadConfig, PreloadCoordinator};
pub use strategy::{AdaptiveStrategy, StrategyConfig};
pub use types::{
    compare_representations, AdaptationSet, PlayList, Representation, StreamType,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the decision engine with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Marquee Core initialized");
}
