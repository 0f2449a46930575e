//! Adaptation logic - representation selection strategies
//!
//! Three variants, selectable per playback session:
//! - AlwaysBest: maximal representation under the comparator
//! - AlwaysLowest: minimal representation under the comparator
//! - Adaptive: highest bitrate fitting within a throughput budget
//!
//! Selection is a pure query: identical (playlist, speed) inputs yield the
//! identical index. Re-invocation cadence and oscillation hysteresis are the
//! caller's responsibility, not enforced here.

use crate::{
    error::Error,
    types::{best_index, compare_representations, lowest_index, PlayList},
    Result,
};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Callback answering "is this URL's content already resident in the local
/// cache". Must be safe to invoke concurrently from the adaptation path and
/// from preload tasks.
pub type CacheStatusProbe = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Adaptation strategy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogicKind {
    AlwaysBest,
    AlwaysLowest,
    #[default]
    Adaptive,
}

impl std::fmt::Display for LogicKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogicKind::AlwaysBest => write!(f, "always-best"),
            LogicKind::AlwaysLowest => write!(f, "always-lowest"),
            LogicKind::Adaptive => write!(f, "adaptive"),
        }
    }
}

/// Where the cache-residency probe is consulted relative to the throughput
/// bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBias {
    /// Prefer cached entries among those within the throughput budget
    #[default]
    WithinBudget,
    /// Prefer any cached entry, even above the budget
    Overall,
    /// Never consult the probe
    Disabled,
}

/// Configuration for the Adaptive variant
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveOptions {
    /// Fraction of the estimated throughput treated as spendable, guarding
    /// against estimate overshoot. Must be below 1.0.
    pub safety_factor: f64,
    pub cache_bias: CacheBias,
}

impl Default for AdaptiveOptions {
    fn default() -> Self {
        Self {
            safety_factor: 0.8,
            cache_bias: CacheBias::default(),
        }
    }
}

/// Trait for adaptation strategies
pub trait AdaptationLogic: Send + Sync {
    /// Select the representation index to start playback with.
    ///
    /// `speed_bps` is the caller-supplied throughput estimate. The returned
    /// index is always within bounds of the playlist's representations; an
    /// empty playlist is a contract violation reported as
    /// [`Error::InvalidPlaylist`], never coerced to index 0.
    fn initial_representation(&self, playlist: &PlayList, speed_bps: u64) -> Result<usize>;

    /// Install the cache-residency probe. Variants that never consult the
    /// cache ignore this.
    fn set_cache_probe(&mut self, _probe: CacheStatusProbe) {}

    /// Strategy name for diagnostics
    fn name(&self) -> &'static str;
}

/// Create the logic for a strategy variant
pub fn create_logic(kind: LogicKind, options: AdaptiveOptions) -> Box<dyn AdaptationLogic> {
    match kind {
        LogicKind::AlwaysBest => Box::new(AlwaysBestLogic),
        LogicKind::AlwaysLowest => Box::new(AlwaysLowestLogic),
        LogicKind::Adaptive => Box::new(AdaptiveLogic::new(options)),
    }
}

/// Always selects the maximal representation under the comparator
pub struct AlwaysBestLogic;

impl AdaptationLogic for AlwaysBestLogic {
    fn initial_representation(&self, playlist: &PlayList, _speed_bps: u64) -> Result<usize> {
        best_index(playlist.representations()).ok_or(Error::InvalidPlaylist)
    }

    fn name(&self) -> &'static str {
        "always-best"
    }
}

/// Always selects the minimal representation under the comparator
pub struct AlwaysLowestLogic;

impl AdaptationLogic for AlwaysLowestLogic {
    fn initial_representation(&self, playlist: &PlayList, _speed_bps: u64) -> Result<usize> {
        lowest_index(playlist.representations()).ok_or(Error::InvalidPlaylist)
    }

    fn name(&self) -> &'static str {
        "always-lowest"
    }
}

/// Throughput-driven selection with a safety margin and optional
/// cache-residency preference
pub struct AdaptiveLogic {
    options: AdaptiveOptions,
    probe: Option<CacheStatusProbe>,
}

impl AdaptiveLogic {
    pub fn new(options: AdaptiveOptions) -> Self {
        Self {
            options,
            probe: None,
        }
    }

    /// Among `candidates`, the cached entry with the highest bitrate
    /// (comparator, then declaration order, breaks bitrate ties)
    fn best_cached(&self, playlist: &PlayList, candidates: &[usize]) -> Option<usize> {
        let probe = self.probe.as_deref()?;
        if self.options.cache_bias == CacheBias::Disabled {
            return None;
        }
        let reps = playlist.representations();
        let mut best: Option<usize> = None;
        for &i in candidates {
            if !probe(&reps[i].url) {
                continue;
            }
            match best {
                None => best = Some(i),
                Some(j) => {
                    let better = match reps[i].avg_bitrate.cmp(&reps[j].avg_bitrate) {
                        Ordering::Greater => true,
                        Ordering::Equal => {
                            compare_representations(&reps[i], &reps[j]) == Ordering::Greater
                        }
                        Ordering::Less => false,
                    };
                    if better {
                        best = Some(i);
                    }
                }
            }
        }
        best
    }
}

impl AdaptationLogic for AdaptiveLogic {
    fn initial_representation(&self, playlist: &PlayList, speed_bps: u64) -> Result<usize> {
        let reps = playlist.representations();
        if reps.is_empty() {
            return Err(Error::InvalidPlaylist);
        }
        if reps.len() == 1 {
            debug!(url = %reps[0].url, "single representation, nothing to adapt");
            return Ok(0);
        }

        let budget = (speed_bps as f64 * self.options.safety_factor) as u64;
        let qualifying: Vec<usize> = (0..reps.len())
            .filter(|&i| reps[i].avg_bitrate <= budget)
            .collect();

        let candidates: Vec<usize> = match self.options.cache_bias {
            CacheBias::WithinBudget => qualifying.clone(),
            CacheBias::Overall => (0..reps.len()).collect(),
            CacheBias::Disabled => Vec::new(),
        };
        if let Some(cached) = self.best_cached(playlist, &candidates) {
            debug!(
                index = cached,
                url = %reps[cached].url,
                "preferring cache-resident representation"
            );
            return Ok(cached);
        }

        // Highest bitrate within budget; first-declared wins bitrate ties
        let mut pick: Option<usize> = None;
        for &i in &qualifying {
            match pick {
                None => pick = Some(i),
                Some(j) => {
                    if reps[i].avg_bitrate > reps[j].avg_bitrate {
                        pick = Some(i);
                    }
                }
            }
        }

        let index = match pick {
            Some(i) => i,
            // Nothing fits the budget: fall back to the cheapest stream
            // rather than leaving playback without a choice
            None => {
                let mut min = 0;
                for i in 1..reps.len() {
                    if reps[i].avg_bitrate < reps[min].avg_bitrate {
                        min = i;
                    }
                }
                min
            }
        };

        debug!(
            index,
            bitrate = reps[index].avg_bitrate,
            speed_bps,
            budget,
            "adaptive selection"
        );
        Ok(index)
    }

    fn set_cache_probe(&mut self, probe: CacheStatusProbe) {
        self.probe = Some(probe);
    }

    fn name(&self) -> &'static str {
        "adaptive"
    }
}
