use super::super::domain::{
    AssignmentHistoryEntry, AssignmentStatus, AvailabilityRecord, CandidateProfile,
    OrganizationId, ShiftId, ShiftWindow,
};
use super::prior::ColdStartPrior;

/// Response latency mapping: 0 minutes scores 1.0, an hour or more scores 0.
const SPEED_DECAY_MINUTES: f64 = 60.0;

/// Credential count treated as a full score.
const CREDENTIALS_FULL_COUNT: f64 = 5.0;

/// Normalized sub-scores for one (candidate, shift) pair. All values are in
/// [0, 1]; `distance` is absent when either location is unknown and is then
/// left out of the weighted sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub acceptance: f64,
    pub speed: f64,
    pub availability: f64,
    pub credentials: f64,
    pub distance: Option<f64>,
}

/// Compute blended sub-scores from the candidate's slice of the snapshot.
///
/// Real signals, where defined, are blended with the cold-start prior at the
/// configured ratio; undefined signals fall back to the prior alone. Pure
/// for identical inputs.
#[allow(clippy::too_many_arguments)]
pub fn score_candidate(
    profile: &CandidateProfile,
    window: &ShiftWindow,
    shift: &ShiftId,
    organization: &OrganizationId,
    history: &[AssignmentHistoryEntry],
    availability: &[AvailabilityRecord],
    prior: &ColdStartPrior,
    prior_blend: f64,
) -> ScoreBreakdown {
    let baseline = prior.baseline(&profile.id, shift, organization);

    ScoreBreakdown {
        acceptance: prior.blend(acceptance_signal(history), baseline.acceptance, prior_blend),
        speed: prior.blend(speed_signal(history), baseline.speed, prior_blend),
        availability: prior.blend(
            availability_signal(availability, window),
            baseline.availability,
            prior_blend,
        ),
        credentials: prior.blend(
            credentials_signal(profile),
            baseline.credentials,
            prior_blend,
        ),
        distance: distance_signal(profile, window),
    }
}

/// Accepted / (accepted + declined); undefined without responded history.
fn acceptance_signal(history: &[AssignmentHistoryEntry]) -> Option<f64> {
    let accepted = history
        .iter()
        .filter(|entry| entry.status == AssignmentStatus::Accepted)
        .count();
    let declined = history
        .iter()
        .filter(|entry| entry.status == AssignmentStatus::Declined)
        .count();
    let total = accepted + declined;
    if total == 0 {
        return None;
    }
    Some(accepted as f64 / total as f64)
}

/// Linear decay of response latency averaged over responded entries.
fn speed_signal(history: &[AssignmentHistoryEntry]) -> Option<f64> {
    let speeds: Vec<f64> = history
        .iter()
        .filter_map(AssignmentHistoryEntry::response_minutes)
        .map(|minutes| (1.0 - minutes / SPEED_DECAY_MINUTES).clamp(0.0, 1.0))
        .collect();
    if speeds.is_empty() {
        return None;
    }
    Some(speeds.iter().sum::<f64>() / speeds.len() as f64)
}

/// 1.0 when any availability record fully contains the shift window. Only a
/// real signal when the candidate declared availability at all; without any
/// record there is no data, and the prior takes over (the guardrail still
/// excludes uncovered windows).
fn availability_signal(availability: &[AvailabilityRecord], window: &ShiftWindow) -> Option<f64> {
    if availability.is_empty() {
        return None;
    }
    let covered = availability.iter().any(|record| record.covers(window));
    Some(if covered { 1.0 } else { 0.0 })
}

/// min(1, credential_count / 5); undefined when the roster holds no
/// credential data.
fn credentials_signal(profile: &CandidateProfile) -> Option<f64> {
    profile
        .credentials
        .as_ref()
        .map(|credentials| (credentials.len() as f64 / CREDENTIALS_FULL_COUNT).min(1.0))
}

/// Coarse location-similarity heuristic. Exact match scores 1.0, a shared
/// leading character 0.6, anything else 0.3. Absent when either side is
/// unknown; never blended with the prior.
fn distance_signal(profile: &CandidateProfile, window: &ShiftWindow) -> Option<f64> {
    let home = profile.home_base.as_deref()?.trim();
    let location = window.location.as_deref()?.trim();
    if home.is_empty() || location.is_empty() {
        return None;
    }
    if home == location {
        return Some(1.0);
    }
    let same_lead = match (home.chars().next(), location.chars().next()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    };
    Some(if same_lead { 0.6 } else { 0.3 })
}
