use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    AssignmentHistoryEntry, AssignmentStatus, AvailabilityRecord, CandidateId, CandidateProfile,
    CandidateStatus, ShiftId, ShiftWindow,
};
use super::scoring::MatchingConfig;

/// Badges attached to every candidate that clears all guardrails.
pub const ELIGIBLE_BADGES: [&str; 3] = ["No overlaps", "Cooldown OK", "Availability OK"];

/// Why a candidate was excluded, in guardrail order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    DoNotAssign,
    Inactive,
    MaxDaily,
    Overlap,
    Cooldown,
    NoAvailability,
}

impl SkipReason {
    pub const fn label(self) -> &'static str {
        match self {
            SkipReason::DoNotAssign => "do_not_assign",
            SkipReason::Inactive => "inactive",
            SkipReason::MaxDaily => "max_daily",
            SkipReason::Overlap => "overlap",
            SkipReason::Cooldown => "cooldown",
            SkipReason::NoAvailability => "no_availability",
        }
    }
}

/// Hard eligibility verdict for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardrailOutcome {
    Eligible { badges: Vec<String> },
    Skipped { reason: SkipReason },
}

/// One excluded candidate with the first rule that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCandidate {
    pub candidate_id: CandidateId,
    pub reason: SkipReason,
}

/// Skip list surfaced alongside the recommendations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailReport {
    pub skipped: Vec<SkippedCandidate>,
}

/// Per-candidate view over the snapshot, precomputed so evaluation itself
/// is a pure function with no lookups.
#[derive(Debug, Clone)]
pub struct GuardrailContext<'a> {
    pub profile: &'a CandidateProfile,
    pub window: &'a ShiftWindow,
    /// Windows of the candidate's same-date accepted/assigned shifts.
    pub committed_same_date: Vec<&'a ShiftWindow>,
    pub last_decline: Option<DateTime<Utc>>,
    pub availability: Vec<&'a AvailabilityRecord>,
    pub now: DateTime<Utc>,
}

impl<'a> GuardrailContext<'a> {
    /// Assemble the context for one candidate from snapshot slices.
    /// `same_date_windows` maps history shift ids to their windows; entries
    /// without a known window cannot participate in the daily-load checks.
    pub fn for_candidate(
        profile: &'a CandidateProfile,
        window: &'a ShiftWindow,
        history: &'a [AssignmentHistoryEntry],
        same_date_windows: &'a HashMap<ShiftId, ShiftWindow>,
        availability: &'a [AvailabilityRecord],
        now: DateTime<Utc>,
    ) -> Self {
        let committed_same_date = history
            .iter()
            .filter(|entry| entry.candidate_id == profile.id && entry.status.occupies_day())
            .filter_map(|entry| same_date_windows.get(&entry.shift_id))
            .filter(|candidate_window| candidate_window.date == window.date)
            .collect();

        let last_decline = history
            .iter()
            .filter(|entry| {
                entry.candidate_id == profile.id && entry.status == AssignmentStatus::Declined
            })
            .map(|entry| entry.responded_at.unwrap_or(entry.assigned_at))
            .max();

        let availability = availability
            .iter()
            .filter(|record| record.candidate_id == profile.id)
            .collect();

        Self {
            profile,
            window,
            committed_same_date,
            last_decline,
            availability,
            now,
        }
    }
}

/// Apply the hard eligibility rules in fixed order, stopping at the first
/// failure. No side effects; identical contexts always yield identical
/// outcomes.
pub fn evaluate(context: &GuardrailContext<'_>, config: &MatchingConfig) -> GuardrailOutcome {
    if context.profile.do_not_assign {
        return skipped(SkipReason::DoNotAssign);
    }

    if context.profile.status != CandidateStatus::Active {
        return skipped(SkipReason::Inactive);
    }

    if context.committed_same_date.len() >= config.max_daily_shifts {
        return skipped(SkipReason::MaxDaily);
    }

    if context
        .committed_same_date
        .iter()
        .any(|committed| committed.overlaps(context.window))
    {
        return skipped(SkipReason::Overlap);
    }

    if let Some(declined_at) = context.last_decline {
        if context.now - declined_at < Duration::minutes(config.cooldown_minutes) {
            return skipped(SkipReason::Cooldown);
        }
    }

    if !context
        .availability
        .iter()
        .any(|record| record.covers(context.window))
    {
        return skipped(SkipReason::NoAvailability);
    }

    GuardrailOutcome::Eligible {
        badges: ELIGIBLE_BADGES.iter().map(|badge| badge.to_string()).collect(),
    }
}

fn skipped(reason: SkipReason) -> GuardrailOutcome {
    GuardrailOutcome::Skipped { reason }
}
