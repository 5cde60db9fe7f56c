use std::cmp::Ordering;

use super::super::domain::{CandidateId, Criterion};
use super::super::weights::WeightVector;
use super::components::ScoreBreakdown;

/// Components above this value are called out in the reason string.
const REASON_THRESHOLD: f64 = 0.7;

/// A scored candidate before guardrail filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub candidate_id: CandidateId,
    pub score: f64,
    pub reason: String,
    pub breakdown: ScoreBreakdown,
}

/// Weighted sum over the available components, rounded to four decimals.
/// The distance term only participates when the signal exists.
pub fn weighted_score(breakdown: &ScoreBreakdown, weights: &WeightVector) -> f64 {
    let mut score = breakdown.acceptance * weights.accept
        + breakdown.speed * weights.speed
        + breakdown.availability * weights.avail
        + breakdown.credentials * weights.cred;
    if let Some(distance) = breakdown.distance {
        score += distance * weights.distance;
    }
    round4(score)
}

/// Callers that request the credentials criterion get a small rebalance
/// toward the credentials component, capped at 1.0.
pub fn adjust_for_criteria(
    score: f64,
    breakdown: &ScoreBreakdown,
    criteria: &[Criterion],
) -> f64 {
    if criteria.contains(&Criterion::Credentials) {
        round4((score * 0.95 + breakdown.credentials * 0.05).min(1.0))
    } else {
        score
    }
}

/// Human-readable explanation listing the standout components.
pub fn build_reason(breakdown: &ScoreBreakdown) -> String {
    let mut parts = Vec::new();
    if breakdown.speed > REASON_THRESHOLD {
        parts.push("Fast response");
    }
    if breakdown.acceptance > REASON_THRESHOLD {
        parts.push("High acceptance");
    }
    if breakdown.availability > REASON_THRESHOLD {
        parts.push("Good availability");
    }
    if breakdown.credentials > REASON_THRESHOLD {
        parts.push("Matching credentials");
    }
    if parts.is_empty() {
        parts.push("Balanced metrics");
    }
    parts.join(" + ")
}

/// Sort by score descending; ties break by candidate id ascending so that
/// repeated runs over one snapshot produce one ordering.
pub fn rank_candidates(mut rows: Vec<RankedCandidate>) -> Vec<RankedCandidate> {
    rows.sort_by(ranking_order);
    rows
}

pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn ranking_order(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}
