//! Throughput estimation from observed download rates
//!
//! Keeps a sliding window of weighted speed samples (weight = bytes moved)
//! and answers a weighted-percentile query over the most recent traffic. The
//! playback controller feeds completed-transfer measurements in and forwards
//! the estimate to the adaptation logic.

use tracing::warn;

/// One observed transfer: `weight` bytes moved at `value_bps`
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub weight: u64,
    pub value_bps: u64,
    pub at_ms: u64,
}

/// Weighted-percentile throughput estimator
#[derive(Debug, Clone)]
pub struct SpeedEstimator {
    samples: Vec<Sample>,
    max_weight: u64,
}

impl SpeedEstimator {
    /// Sliding window length
    const MAX_SAMPLES: usize = 20;
    /// Total sample weight considered by one estimate
    const DEFAULT_MAX_WEIGHT: u64 = 8000;
    /// Used when the caller passes a percentile outside (0, 1)
    const DEFAULT_PERCENTILE: f64 = 0.5;

    pub fn new() -> Self {
        Self::with_max_weight(Self::DEFAULT_MAX_WEIGHT)
    }

    pub fn with_max_weight(max_weight: u64) -> Self {
        Self {
            samples: Vec::with_capacity(Self::MAX_SAMPLES),
            max_weight,
        }
    }

    /// Record a completed transfer
    pub fn record(&mut self, weight: u64, value_bps: u64, at_ms: u64) {
        if self.samples.len() >= Self::MAX_SAMPLES {
            self.samples.remove(0);
        }
        self.samples.push(Sample {
            weight,
            value_bps,
            at_ms,
        });
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Weighted percentile of recent sample speeds.
    ///
    /// Only the newest samples whose weights sum to at most the configured
    /// cap participate; the sample crossing the cap is counted with its
    /// remaining weight. Returns `None` with an empty window.
    pub fn estimate(&self, percentile: f64) -> Option<u64> {
        if self.samples.is_empty() {
            return None;
        }

        // Walk backwards from the newest sample until the weight cap is hit
        let mut window: Vec<Sample> = Vec::with_capacity(self.samples.len());
        let mut total_weight: u64 = 0;
        for sample in self.samples.iter().rev() {
            if total_weight + sample.weight < self.max_weight {
                total_weight += sample.weight;
                window.push(*sample);
            } else {
                let mut clamped = *sample;
                clamped.weight = self.max_weight - total_weight;
                total_weight = self.max_weight;
                window.push(clamped);
                break;
            }
        }

        window.sort_by_key(|s| s.value_bps);

        let percentile = if percentile > 0.0 && percentile < 1.0 {
            percentile
        } else {
            warn!(percentile, "invalid percentile, using default");
            Self::DEFAULT_PERCENTILE
        };
        let desired_weight = (percentile * total_weight as f64) as u64;

        let mut accumulated: u64 = 0;
        for sample in &window {
            accumulated += sample.weight;
            if accumulated >= desired_weight {
                return Some(sample.value_bps);
            }
        }
        window.last().map(|s| s.value_bps)
    }
}

impl Default for SpeedEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_estimate_without_samples() {
        let est = SpeedEstimator::new();
        assert_eq!(est.estimate(0.5), None);
    }

    #[test]
    fn test_single_sample() {
        let mut est = SpeedEstimator::new();
        est.record(1000, 2_000_000, 0);
        assert_eq!(est.estimate(0.5), Some(2_000_000));
    }

    #[test]
    fn test_median_of_equal_weights() {
        let mut est = SpeedEstimator::new();
        est.record(100, 1_000_000, 0);
        est.record(100, 3_000_000, 1);
        est.record(100, 5_000_000, 2);
        // Median lands on the middle sample
        assert_eq!(est.estimate(0.5), Some(3_000_000));
    }

    #[test]
    fn test_low_percentile_is_conservative() {
        let mut est = SpeedEstimator::new();
        est.record(100, 1_000_000, 0);
        est.record(100, 3_000_000, 1);
        est.record(100, 5_000_000, 2);
        assert_eq!(est.estimate(0.1), Some(1_000_000));
        assert_eq!(est.estimate(0.95), Some(5_000_000));
    }

    #[test]
    fn test_invalid_percentile_falls_back_to_median() {
        let mut est = SpeedEstimator::new();
        est.record(100, 1_000_000, 0);
        est.record(100, 3_000_000, 1);
        est.record(100, 5_000_000, 2);
        assert_eq!(est.estimate(1.5), est.estimate(0.5));
        assert_eq!(est.estimate(0.0), est.estimate(0.5));
    }

    #[test]
    fn test_weight_cap_drops_old_traffic() {
        let mut est = SpeedEstimator::with_max_weight(200);
        // Old slow sample is pushed out of the weight budget by new traffic
        est.record(150, 100_000, 0);
        est.record(150, 4_000_000, 1);
        est.record(150, 4_000_000, 2);
        assert_eq!(est.estimate(0.5), Some(4_000_000));
    }

    #[test]
    fn test_window_caps_sample_count() {
        let mut est = SpeedEstimator::new();
        for i in 0..40 {
            est.record(10, 1_000_000 + i, i);
        }
        assert_eq!(est.sample_count(), 20);
    }
}
