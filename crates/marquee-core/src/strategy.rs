//! Session facade tying parser, estimator, and adaptation logic together
//!
//! One `AdaptiveStrategy` instance serves one playback session: it holds the
//! parsed playlist, accumulates download-rate samples, and answers the
//! initial-representation query. Configuration is owned by the instance, not
//! process-global.

use crate::{
    adaptation::{create_logic, AdaptationLogic, AdaptiveOptions, CacheStatusProbe, LogicKind},
    error::Error,
    estimator::SpeedEstimator,
    manifest::{create_parser, detect_format},
    types::PlayList,
    Result,
};
use std::sync::Mutex;
use tracing::{debug, info};

/// Per-session strategy configuration
#[derive(Debug, Clone, Copy)]
pub struct StrategyConfig {
    /// Which adaptation variant drives selection
    pub logic: LogicKind,
    /// Options for the Adaptive variant
    pub adaptive: AdaptiveOptions,
    /// Percentile of the sample window used as the throughput signal
    pub percentile: f64,
    /// Scale applied to the raw estimate before it reaches the logic
    pub scale_factor: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            logic: LogicKind::Adaptive,
            adaptive: AdaptiveOptions::default(),
            percentile: 0.5,
            scale_factor: 1.0,
        }
    }
}

/// Adaptive streaming strategy for one playback session
pub struct AdaptiveStrategy {
    config: StrategyConfig,
    logic: Box<dyn AdaptationLogic>,
    estimator: Mutex<SpeedEstimator>,
    playlist: Option<PlayList>,
}

impl AdaptiveStrategy {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            config,
            logic: create_logic(config.logic, config.adaptive),
            estimator: Mutex::new(SpeedEstimator::new()),
            playlist: None,
        }
    }

    /// Parse a manifest payload and adopt it as this session's playlist.
    ///
    /// On failure the previous playlist (if any) is kept; no partial tree is
    /// ever adopted.
    pub fn set_playlist(&mut self, raw: &str) -> Result<()> {
        let format = detect_format(raw);
        let playlist = create_parser(format).parse(raw)?;
        info!(
            representations = playlist.representations().len(),
            ?format,
            "playlist adopted"
        );
        self.playlist = Some(playlist);
        Ok(())
    }

    pub fn playlist(&self) -> Option<&PlayList> {
        self.playlist.as_ref()
    }

    /// Install the cache-residency probe on the underlying logic
    pub fn set_cache_probe(&mut self, probe: CacheStatusProbe) {
        self.logic.set_cache_probe(probe);
    }

    /// Feed a completed-transfer measurement into the estimator
    pub fn record_download(&self, size_bytes: u64, speed_bps: u64, at_ms: u64) {
        let mut estimator = self.estimator.lock().expect("estimator lock poisoned");
        estimator.record(size_bytes, speed_bps, at_ms);
    }

    /// Current scaled throughput estimate in bits per second; 0 with no
    /// samples yet
    pub fn current_bandwidth(&self) -> u64 {
        let estimator = self.estimator.lock().expect("estimator lock poisoned");
        match estimator.estimate(self.config.percentile) {
            Some(bps) => (bps as f64 * self.config.scale_factor) as u64,
            None => 0,
        }
    }

    /// Select the representation index to start playback with
    pub fn initial_representation(&self) -> Result<usize> {
        let playlist = self.playlist.as_ref().ok_or(Error::InvalidPlaylist)?;
        let speed = self.current_bandwidth();
        let index = self.logic.initial_representation(playlist, speed)?;
        debug!(index, speed, logic = self.logic.name(), "initial representation");
        Ok(index)
    }

    /// Primary URL of the representation at `index`
    pub fn initial_url(&self, index: usize) -> Option<&str> {
        self.playlist
            .as_ref()?
            .representations()
            .get(index)
            .map(|r| r.url.as_str())
    }

    /// Primary URL plus backups of the representation at `index`, joined
    /// with `;` in fallback order
    pub fn initial_url_list(&self, index: usize) -> Option<String> {
        self.playlist
            .as_ref()?
            .representations()
            .get(index)
            .map(|r| r.url_list())
    }
}
