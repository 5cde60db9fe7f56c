use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named scoring weights. Kept as a typed structure rather than a keyed map
/// so a misspelled component cannot silently corrupt scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    pub accept: f64,
    pub speed: f64,
    pub avail: f64,
    pub cred: f64,
    pub distance: f64,
}

impl WeightVector {
    /// Hardcoded fallback weights, the lowest rung of the resolution order.
    pub const DEFAULT: WeightVector = WeightVector {
        accept: 0.4,
        speed: 0.3,
        avail: 0.2,
        cred: 0.1,
        distance: 0.0,
    };

    pub fn sum(&self) -> f64 {
        self.accept + self.speed + self.avail + self.cred + self.distance
    }

    /// Scale components so they sum to 1.0. A vector already within
    /// tolerance passes through unchanged; one that sums to zero has no
    /// usable signal and normalizes to the defaults.
    pub fn normalize(&self) -> WeightVector {
        let sum = self.sum();
        if sum <= 0.0 {
            return WeightVector::DEFAULT;
        }
        if (sum - 1.0).abs() < 1e-9 {
            return *self;
        }
        WeightVector {
            accept: self.accept / sum,
            speed: self.speed / sum,
            avail: self.avail / sum,
            cred: self.cred / sum,
            distance: self.distance / sum,
        }
    }

    /// Largest absolute per-component difference against `other`.
    pub fn max_delta(&self, other: &WeightVector) -> f64 {
        [
            (self.accept - other.accept).abs(),
            (self.speed - other.speed).abs(),
            (self.avail - other.avail).abs(),
            (self.cred - other.cred).abs(),
            (self.distance - other.distance).abs(),
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }
}

impl Default for WeightVector {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Rolling performance metrics computed from feedback history; snapshotted
/// into the weight audit trail alongside each recalibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuningMetrics {
    /// Acceptance rate over the configured sample window.
    pub acceptance_rate: f64,
    /// Acceptance rate among candidates who responded in under 300 seconds.
    pub speed_correlation: f64,
    /// Proxy for availability-match quality; currently the overall
    /// acceptance rate.
    pub availability_accuracy: f64,
    pub avg_response_secs: f64,
    pub sample_count: usize,
}

/// Append-only record of one weight recalibration. The latest entry is the
/// active vector unless a manual override is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightAuditEntry {
    pub old_weights: WeightVector,
    pub new_weights: WeightVector,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
    pub metrics: Option<TuningMetrics>,
}
