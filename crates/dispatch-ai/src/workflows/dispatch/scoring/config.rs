use serde::{Deserialize, Serialize};

use super::super::weights::WeightVector;

/// Matching thresholds and weights, constructed once and passed into every
/// component. Nothing in the core reads the process environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Weights used when no audit history and no override exist.
    pub default_weights: WeightVector,
    /// Manual override; takes precedence over the weight audit trail.
    pub weight_override: Option<WeightVector>,
    /// Share of the real signal when blending with the cold-start prior.
    pub prior_blend: f64,
    /// Minimum wait after a decline before re-offering a shift.
    pub cooldown_minutes: i64,
    /// Maximum accepted/assigned shifts per candidate per date.
    pub max_daily_shifts: usize,
    pub autotune: AutotuneConfig,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            default_weights: WeightVector::DEFAULT,
            weight_override: None,
            prior_blend: 0.7,
            cooldown_minutes: 30,
            max_daily_shifts: 2,
            autotune: AutotuneConfig::default(),
        }
    }
}

/// Control-loop knobs for the periodic weight recalibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutotuneConfig {
    pub enabled: bool,
    /// Exponential smoothing factor toward the target vector.
    pub smoothing_alpha: f64,
    /// Feedback lookback window in days.
    pub window_days: i64,
    /// Minimum feedback rows required before weights may move.
    pub min_samples: usize,
}

impl Default for AutotuneConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smoothing_alpha: 0.3,
            window_days: 30,
            min_samples: 10,
        }
    }
}
