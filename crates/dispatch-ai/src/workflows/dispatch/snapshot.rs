use std::collections::HashMap;

use chrono::{DateTime, NaiveTime, Utc};
use tracing::warn;

use super::domain::{
    AssignmentHistoryEntry, AvailabilityRecord, CandidateId, CandidateProfile, OrganizationId,
    ShiftId, ShiftWindow,
};
use super::repository::{
    AssignmentRepository, AvailabilityRepository, RosterRepository, ShiftRepository,
};

/// Point-in-time read snapshot for one prediction run.
///
/// Everything scoring and guardrail evaluation will look at is fetched once
/// up front, so the run never observes a half-updated world. Reads that fail
/// degrade to empty data; an unknown shift degrades to a default window. The
/// run proceeds either way, with reduced confidence.
#[derive(Debug, Clone)]
pub struct DispatchSnapshot {
    pub shift_id: ShiftId,
    pub organization_id: OrganizationId,
    pub window: ShiftWindow,
    pub candidates: Vec<CandidateProfile>,
    history: HashMap<CandidateId, Vec<AssignmentHistoryEntry>>,
    availability: HashMap<CandidateId, Vec<AvailabilityRecord>>,
    /// Windows for history shifts that fall on the snapshot date, used by
    /// the daily-load and overlap guardrails.
    pub same_date_windows: HashMap<ShiftId, ShiftWindow>,
    pub taken_at: DateTime<Utc>,
}

impl DispatchSnapshot {
    pub fn load(
        roster: &dyn RosterRepository,
        shifts: &dyn ShiftRepository,
        availability: &dyn AvailabilityRepository,
        assignments: &dyn AssignmentRepository,
        shift_id: &ShiftId,
        organization_id: &OrganizationId,
        taken_at: DateTime<Utc>,
    ) -> Self {
        let window = match shifts.shift_window(shift_id) {
            Ok(Some(window)) => window,
            Ok(None) => {
                warn!(shift = %shift_id.0, "shift window not found, using default window");
                default_window(taken_at)
            }
            Err(error) => {
                warn!(shift = %shift_id.0, %error, "shift window read failed, using default window");
                default_window(taken_at)
            }
        };

        let candidates = match roster.list_candidates(organization_id) {
            Ok(candidates) => candidates,
            Err(error) => {
                warn!(organization = %organization_id.0, %error, "roster read failed, proceeding with empty pool");
                Vec::new()
            }
        };
        let candidate_ids: Vec<CandidateId> =
            candidates.iter().map(|profile| profile.id.clone()).collect();

        let availability_rows = match availability.list_availability(&candidate_ids, window.date) {
            Ok(rows) => rows,
            Err(error) => {
                warn!(%error, "availability read failed, proceeding without records");
                Vec::new()
            }
        };

        let history_rows = match assignments.list_history(&candidate_ids) {
            Ok(rows) => rows,
            Err(error) => {
                warn!(%error, "assignment history read failed, proceeding without history");
                Vec::new()
            }
        };

        let same_date_windows = same_date_windows(shifts, &history_rows, &window);

        let mut history: HashMap<CandidateId, Vec<AssignmentHistoryEntry>> = HashMap::new();
        for entry in history_rows {
            history
                .entry(entry.candidate_id.clone())
                .or_default()
                .push(entry);
        }

        let mut availability: HashMap<CandidateId, Vec<AvailabilityRecord>> = HashMap::new();
        for record in availability_rows {
            availability
                .entry(record.candidate_id.clone())
                .or_default()
                .push(record);
        }

        Self {
            shift_id: shift_id.clone(),
            organization_id: organization_id.clone(),
            window,
            candidates,
            history,
            availability,
            same_date_windows,
            taken_at,
        }
    }

    /// Construct a snapshot directly, bypassing the repositories. Intended
    /// for tests exercising the pure scoring/guardrail pipeline.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        shift_id: ShiftId,
        organization_id: OrganizationId,
        window: ShiftWindow,
        candidates: Vec<CandidateProfile>,
        history_rows: Vec<AssignmentHistoryEntry>,
        availability_rows: Vec<AvailabilityRecord>,
        same_date_windows: HashMap<ShiftId, ShiftWindow>,
        taken_at: DateTime<Utc>,
    ) -> Self {
        let mut history: HashMap<CandidateId, Vec<AssignmentHistoryEntry>> = HashMap::new();
        for entry in history_rows {
            history
                .entry(entry.candidate_id.clone())
                .or_default()
                .push(entry);
        }
        let mut availability: HashMap<CandidateId, Vec<AvailabilityRecord>> = HashMap::new();
        for record in availability_rows {
            availability
                .entry(record.candidate_id.clone())
                .or_default()
                .push(record);
        }
        Self {
            shift_id,
            organization_id,
            window,
            candidates,
            history,
            availability,
            same_date_windows,
            taken_at,
        }
    }

    pub fn history_for(&self, candidate: &CandidateId) -> &[AssignmentHistoryEntry] {
        self.history
            .get(candidate)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn availability_for(&self, candidate: &CandidateId) -> &[AvailabilityRecord] {
        self.availability
            .get(candidate)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Resolve windows for the distinct history shifts that share the snapshot
/// date. Lookups that fail are skipped rather than aborting the run.
fn same_date_windows(
    shifts: &dyn ShiftRepository,
    history: &[AssignmentHistoryEntry],
    window: &ShiftWindow,
) -> HashMap<ShiftId, ShiftWindow> {
    let distinct: std::collections::HashSet<&ShiftId> =
        history.iter().map(|entry| &entry.shift_id).collect();

    let mut windows = HashMap::new();
    for shift_id in distinct {
        match shifts.shift_window(shift_id) {
            Ok(Some(candidate_window)) if candidate_window.date == window.date => {
                windows.insert(shift_id.clone(), candidate_window);
            }
            Ok(_) => {}
            Err(error) => {
                warn!(shift = %shift_id.0, %error, "history shift window read failed, skipping");
            }
        }
    }
    windows
}

fn default_window(taken_at: DateTime<Utc>) -> ShiftWindow {
    ShiftWindow {
        date: taken_at.date_naive(),
        start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
        end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
        location: None,
    }
}
