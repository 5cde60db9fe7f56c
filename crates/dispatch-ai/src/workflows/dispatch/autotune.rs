use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::repository::{AuditRepository, FeedbackEntry, FeedbackRepository, FeedbackResult};
use super::scoring::MatchingConfig;
use super::weights::{TuningMetrics, WeightAuditEntry, WeightVector};

/// Responses faster than this count toward the speed correlation.
const FAST_RESPONSE_SECS: i64 = 300;

/// Component movements at or below this threshold are treated as noise and
/// discarded instead of being written to the audit trail.
const NOISE_FLOOR: f64 = 0.01;

/// Phases of the recalibration loop: `Idle → Computing → Applying → Idle`.
/// Each forward step is a pure function; the controller only sequences them
/// and owns the single mutating append at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutotunePhase {
    Idle,
    Computing,
    Applying,
}

/// Terminal classification of one autotune pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutotuneReason {
    AutotuneDisabled,
    AlreadyRunning,
    InsufficientData,
    NoChange,
    AutoTune,
    Error,
}

impl AutotuneReason {
    pub const fn label(self) -> &'static str {
        match self {
            AutotuneReason::AutotuneDisabled => "autotune_disabled",
            AutotuneReason::AlreadyRunning => "already_running",
            AutotuneReason::InsufficientData => "insufficient_data",
            AutotuneReason::NoChange => "no_change",
            AutotuneReason::AutoTune => "auto_tune",
            AutotuneReason::Error => "error",
        }
    }
}

/// Outcome of one autotune pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutotuneReport {
    pub success: bool,
    pub old_weights: WeightVector,
    pub new_weights: WeightVector,
    pub metrics: Option<TuningMetrics>,
    pub reason: AutotuneReason,
}

impl AutotuneReport {
    fn unchanged(weights: WeightVector, metrics: Option<TuningMetrics>, reason: AutotuneReason) -> Self {
        Self {
            success: false,
            old_weights: weights,
            new_weights: weights,
            metrics,
            reason,
        }
    }
}

/// Background recalibration of the scoring weights from observed
/// accept/decline feedback. Triggered externally (CLI, HTTP, cron); at most
/// one pass runs at a time, and the only write is an appended
/// `WeightAuditEntry`, so weight readers always observe a consistent latest
/// vector.
pub struct AutotuneController {
    feedback: Arc<dyn FeedbackRepository>,
    audit: Arc<dyn AuditRepository>,
    config: MatchingConfig,
    state: Mutex<AutotunePhase>,
}

impl AutotuneController {
    pub fn new(
        feedback: Arc<dyn FeedbackRepository>,
        audit: Arc<dyn AuditRepository>,
        config: MatchingConfig,
    ) -> Self {
        Self {
            feedback,
            audit,
            config,
            state: Mutex::new(AutotunePhase::Idle),
        }
    }

    /// Run one pass of the control loop.
    pub fn run(&self) -> AutotuneReport {
        let old_weights = self.current_weights();

        if !self.config.autotune.enabled {
            return AutotuneReport::unchanged(old_weights, None, AutotuneReason::AutotuneDisabled);
        }

        // Mutual exclusion: a concurrent trigger loses immediately instead
        // of queueing behind the running pass.
        let Ok(mut phase) = self.state.try_lock() else {
            return AutotuneReport::unchanged(old_weights, None, AutotuneReason::AlreadyRunning);
        };

        *phase = AutotunePhase::Computing;
        debug!(phase = ?*phase, "autotune pass started");

        let since = Utc::now() - Duration::days(self.config.autotune.window_days);
        let entries = match self.feedback.list_since(since) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(%error, "feedback read failed, weights unchanged");
                *phase = AutotunePhase::Idle;
                return AutotuneReport::unchanged(old_weights, None, AutotuneReason::Error);
            }
        };

        let Some(metrics) = compute_metrics(&entries, self.config.autotune.min_samples) else {
            debug!(samples = entries.len(), "insufficient feedback for tuning");
            *phase = AutotunePhase::Idle;
            return AutotuneReport::unchanged(old_weights, None, AutotuneReason::InsufficientData);
        };

        *phase = AutotunePhase::Applying;
        let target = derive_target(&old_weights, &metrics);
        let new_weights = smooth(&old_weights, &target, self.config.autotune.smoothing_alpha).normalize();

        if new_weights.max_delta(&old_weights) <= NOISE_FLOOR {
            *phase = AutotunePhase::Idle;
            return AutotuneReport::unchanged(old_weights, Some(metrics), AutotuneReason::NoChange);
        }

        let entry = WeightAuditEntry {
            old_weights,
            new_weights,
            reason: AutotuneReason::AutoTune.label().to_string(),
            recorded_at: Utc::now(),
            metrics: Some(metrics),
        };
        let report = match self.audit.append_weight_audit(entry) {
            Ok(()) => {
                info!(
                    accept = new_weights.accept,
                    speed = new_weights.speed,
                    avail = new_weights.avail,
                    "weights recalibrated"
                );
                AutotuneReport {
                    success: true,
                    old_weights,
                    new_weights,
                    metrics: Some(metrics),
                    reason: AutotuneReason::AutoTune,
                }
            }
            Err(error) => {
                warn!(%error, "weight audit append failed, weights unchanged");
                AutotuneReport::unchanged(old_weights, Some(metrics), AutotuneReason::Error)
            }
        };

        *phase = AutotunePhase::Idle;
        report
    }

    /// Same resolution order the ranker uses: override, then latest audit
    /// entry, then configured defaults.
    pub fn current_weights(&self) -> WeightVector {
        if let Some(override_weights) = self.config.weight_override {
            return override_weights.normalize();
        }
        match self.audit.latest_weight_audit() {
            Ok(Some(entry)) => entry.new_weights.normalize(),
            Ok(None) => self.config.default_weights.normalize(),
            Err(error) => {
                warn!(%error, "weight audit read failed, using default weights");
                self.config.default_weights.normalize()
            }
        }
    }
}

/// Computing step: fold the feedback window into rolling metrics. `None`
/// when the sample is too small to act on.
pub fn compute_metrics(entries: &[FeedbackEntry], min_samples: usize) -> Option<TuningMetrics> {
    if entries.len() < min_samples {
        return None;
    }

    let total = entries.len();
    let successes = entries
        .iter()
        .filter(|entry| entry.result == FeedbackResult::Success)
        .count();
    let acceptance_rate = successes as f64 / total as f64;

    let response_times: Vec<i64> = entries.iter().filter_map(|entry| entry.responded_in).collect();
    let avg_response_secs = if response_times.is_empty() {
        0.0
    } else {
        response_times.iter().sum::<i64>() as f64 / response_times.len() as f64
    };

    let fast: Vec<&FeedbackEntry> = entries
        .iter()
        .filter(|entry| matches!(entry.responded_in, Some(secs) if secs < FAST_RESPONSE_SECS))
        .collect();
    let speed_correlation = if fast.is_empty() {
        0.5
    } else {
        fast.iter()
            .filter(|entry| entry.result == FeedbackResult::Success)
            .count() as f64
            / fast.len() as f64
    };

    Some(TuningMetrics {
        acceptance_rate,
        speed_correlation,
        // Proxy until availability mismatches are tracked separately.
        availability_accuracy: acceptance_rate,
        avg_response_secs,
        sample_count: total,
    })
}

/// Applying step, part one: derive the target vector from fixed thresholds.
/// Credentials and distance are held constant.
pub fn derive_target(current: &WeightVector, metrics: &TuningMetrics) -> WeightVector {
    let mut target = *current;

    if metrics.acceptance_rate < 0.5 {
        target.accept = (current.accept * 1.2).min(0.6);
    }

    if metrics.speed_correlation > 0.7 {
        target.speed = (current.speed * 1.15).min(0.4);
    } else if metrics.speed_correlation < 0.4 {
        target.speed = (current.speed * 0.85).max(0.1);
    }

    if metrics.availability_accuracy > 0.7 {
        target.avail = (current.avail * 1.1).min(0.35);
    } else if metrics.availability_accuracy < 0.5 {
        target.avail = (current.avail * 0.9).max(0.1);
    }

    target
}

/// Applying step, part two: exponential smoothing toward the target.
/// Credentials and distance pass through untouched; the caller normalizes.
pub fn smooth(current: &WeightVector, target: &WeightVector, alpha: f64) -> WeightVector {
    WeightVector {
        accept: current.accept + alpha * (target.accept - current.accept),
        speed: current.speed + alpha * (target.speed - current.speed),
        avail: current.avail + alpha * (target.avail - current.avail),
        cred: current.cred,
        distance: current.distance,
    }
}
