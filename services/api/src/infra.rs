use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use dispatch_ai::workflows::dispatch::{
    AssignmentHistoryEntry, AssignmentId, AssignmentRepository, AssignmentStatus, AuditRepository,
    AvailabilityRecord, AvailabilityRepository, CandidateId, CandidateProfile, CandidateStatus,
    CommitReceipt, DispatchDependencies, FeedbackEntry, FeedbackRepository, MatchingConfig,
    OpenShift, OrganizationId, PredictionAuditEntry, RepositoryError, RosterRepository, ShiftId,
    ShiftRepository, ShiftWindow, WeightAuditEntry,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory collaborator store backing development, demos, and the default
/// `serve` wiring. Real deployments swap this for adapters over the actual
/// roster/shift/assignment systems.
#[derive(Default)]
pub(crate) struct InMemoryDispatchStore {
    candidates: Mutex<Vec<CandidateProfile>>,
    windows: Mutex<HashMap<ShiftId, ShiftWindow>>,
    availability: Mutex<Vec<AvailabilityRecord>>,
    history: Mutex<Vec<AssignmentHistoryEntry>>,
    committed: Mutex<HashMap<ShiftId, AssignmentId>>,
    sequence: Mutex<u64>,
    feedback: Mutex<Vec<FeedbackEntry>>,
    prediction_audit: Mutex<Vec<PredictionAuditEntry>>,
    weight_audit: Mutex<Vec<WeightAuditEntry>>,
}

impl InMemoryDispatchStore {
    pub(crate) fn add_candidate(&self, profile: CandidateProfile) {
        self.candidates
            .lock()
            .expect("candidate mutex poisoned")
            .push(profile);
    }

    pub(crate) fn add_shift(&self, id: &str, window: ShiftWindow) {
        self.windows
            .lock()
            .expect("shift mutex poisoned")
            .insert(ShiftId(id.to_string()), window);
    }

    pub(crate) fn add_availability(&self, record: AvailabilityRecord) {
        self.availability
            .lock()
            .expect("availability mutex poisoned")
            .push(record);
    }

    pub(crate) fn add_history(&self, entry: AssignmentHistoryEntry) {
        self.history
            .lock()
            .expect("history mutex poisoned")
            .push(entry);
    }

    pub(crate) fn add_feedback(&self, entry: FeedbackEntry) {
        self.feedback
            .lock()
            .expect("feedback mutex poisoned")
            .push(entry);
    }
}

impl RosterRepository for InMemoryDispatchStore {
    fn list_candidates(
        &self,
        _organization: &OrganizationId,
    ) -> Result<Vec<CandidateProfile>, RepositoryError> {
        Ok(self
            .candidates
            .lock()
            .expect("candidate mutex poisoned")
            .clone())
    }
}

impl ShiftRepository for InMemoryDispatchStore {
    fn shift_window(&self, shift: &ShiftId) -> Result<Option<ShiftWindow>, RepositoryError> {
        Ok(self
            .windows
            .lock()
            .expect("shift mutex poisoned")
            .get(shift)
            .cloned())
    }

    fn list_unassigned_shifts(
        &self,
        _organization: &OrganizationId,
        limit: usize,
    ) -> Result<Vec<OpenShift>, RepositoryError> {
        let windows = self.windows.lock().expect("shift mutex poisoned");
        let committed = self.committed.lock().expect("assignment mutex poisoned");
        let mut open: Vec<OpenShift> = windows
            .iter()
            .filter(|(id, _)| !committed.contains_key(*id))
            .map(|(id, window)| OpenShift {
                id: id.clone(),
                window: window.clone(),
            })
            .collect();
        open.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        open.truncate(limit);
        Ok(open)
    }
}

impl AvailabilityRepository for InMemoryDispatchStore {
    fn list_availability(
        &self,
        candidates: &[CandidateId],
        date: NaiveDate,
    ) -> Result<Vec<AvailabilityRecord>, RepositoryError> {
        let records = self.availability.lock().expect("availability mutex poisoned");
        Ok(records
            .iter()
            .filter(|record| record.date == date && candidates.contains(&record.candidate_id))
            .cloned()
            .collect())
    }
}

impl AssignmentRepository for InMemoryDispatchStore {
    fn list_history(
        &self,
        candidates: &[CandidateId],
    ) -> Result<Vec<AssignmentHistoryEntry>, RepositoryError> {
        let history = self.history.lock().expect("history mutex poisoned");
        Ok(history
            .iter()
            .filter(|entry| candidates.contains(&entry.candidate_id))
            .cloned()
            .collect())
    }

    fn commit_if_unassigned(
        &self,
        shift: &ShiftId,
        candidate: &CandidateId,
    ) -> Result<CommitReceipt, RepositoryError> {
        // One lock across check and insert; the in-memory stand-in for a
        // unique constraint on shift_id.
        let mut committed = self.committed.lock().expect("assignment mutex poisoned");
        if committed.contains_key(shift) {
            return Ok(CommitReceipt::AlreadyAssigned);
        }
        let mut sequence = self.sequence.lock().expect("sequence mutex poisoned");
        *sequence += 1;
        let assignment_id = AssignmentId(format!("asg-{:04}", *sequence));
        committed.insert(shift.clone(), assignment_id.clone());
        self.history
            .lock()
            .expect("history mutex poisoned")
            .push(AssignmentHistoryEntry {
                candidate_id: candidate.clone(),
                shift_id: shift.clone(),
                status: AssignmentStatus::Assigned,
                assigned_at: Utc::now(),
                responded_at: None,
            });
        Ok(CommitReceipt::Committed { assignment_id })
    }

    fn assignment_exists(&self, assignment: &AssignmentId) -> Result<bool, RepositoryError> {
        let committed = self.committed.lock().expect("assignment mutex poisoned");
        Ok(committed.values().any(|id| id == assignment))
    }
}

impl FeedbackRepository for InMemoryDispatchStore {
    fn append(&self, entry: FeedbackEntry) -> Result<FeedbackEntry, RepositoryError> {
        self.add_feedback(entry.clone());
        Ok(entry)
    }

    fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<FeedbackEntry>, RepositoryError> {
        let feedback = self.feedback.lock().expect("feedback mutex poisoned");
        Ok(feedback
            .iter()
            .filter(|entry| entry.recorded_at >= since)
            .cloned()
            .collect())
    }
}

impl AuditRepository for InMemoryDispatchStore {
    fn append_prediction(&self, entry: PredictionAuditEntry) -> Result<(), RepositoryError> {
        self.prediction_audit
            .lock()
            .expect("audit mutex poisoned")
            .push(entry);
        Ok(())
    }

    fn append_weight_audit(&self, entry: WeightAuditEntry) -> Result<(), RepositoryError> {
        self.weight_audit
            .lock()
            .expect("audit mutex poisoned")
            .push(entry);
        Ok(())
    }

    fn latest_weight_audit(&self) -> Result<Option<WeightAuditEntry>, RepositoryError> {
        let audit = self.weight_audit.lock().expect("audit mutex poisoned");
        Ok(audit.last().cloned())
    }
}

pub(crate) fn dependencies(store: &Arc<InMemoryDispatchStore>) -> DispatchDependencies {
    DispatchDependencies {
        roster: store.clone(),
        shifts: store.clone(),
        availability: store.clone(),
        assignments: store.clone(),
        feedback: store.clone(),
        audit: store.clone(),
    }
}

pub(crate) fn default_matching_config() -> MatchingConfig {
    MatchingConfig::default()
}

pub(crate) fn demo_org() -> OrganizationId {
    OrganizationId("org-metro".to_string())
}

fn hms(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn candidate(id: &str, home_base: &str, credentials: &[&str]) -> CandidateProfile {
    CandidateProfile {
        id: CandidateId(id.to_string()),
        status: CandidateStatus::Active,
        do_not_assign: false,
        home_base: Some(home_base.to_string()),
        credentials: Some(credentials.iter().map(|c| c.to_string()).collect()),
    }
}

/// Seed a small, explainable roster: one strong candidate, one flagged, one
/// without availability, one cooling down after a fresh decline.
pub(crate) fn seed_demo_world(store: &InMemoryDispatchStore, shift_date: NaiveDate) {
    store.add_shift(
        "shift-s1",
        ShiftWindow {
            date: shift_date,
            start: hms(9),
            end: hms(17),
            location: Some("Downtown".to_string()),
        },
    );
    store.add_shift(
        "shift-s2",
        ShiftWindow {
            date: shift_date,
            start: hms(18),
            end: hms(22),
            location: Some("Uptown".to_string()),
        },
    );

    store.add_candidate(candidate(
        "cand-alpha",
        "Downtown",
        &["cpr", "first-aid", "security-d", "crowd-mgmt", "radio-ops"],
    ));
    let mut flagged = candidate("cand-bravo", "Downtown", &["cpr"]);
    flagged.do_not_assign = true;
    store.add_candidate(flagged);
    store.add_candidate(candidate("cand-charlie", "Uptown", &["cpr", "first-aid"]));
    store.add_candidate(candidate("cand-delta", "Midtown", &["cpr", "radio-ops"]));

    store.add_availability(AvailabilityRecord {
        candidate_id: CandidateId("cand-alpha".to_string()),
        date: shift_date,
        start: hms(8),
        end: hms(18),
    });
    store.add_availability(AvailabilityRecord {
        candidate_id: CandidateId("cand-bravo".to_string()),
        date: shift_date,
        start: hms(8),
        end: hms(18),
    });
    store.add_availability(AvailabilityRecord {
        candidate_id: CandidateId("cand-delta".to_string()),
        date: shift_date,
        start: hms(8),
        end: hms(18),
    });

    // cand-alpha: dependable history against past shifts.
    for index in 0..3 {
        let assigned_at = Utc::now() - Duration::days(7) + Duration::hours(index);
        store.add_history(AssignmentHistoryEntry {
            candidate_id: CandidateId("cand-alpha".to_string()),
            shift_id: ShiftId(format!("hist-{index}")),
            status: AssignmentStatus::Accepted,
            assigned_at,
            responded_at: Some(assigned_at + Duration::minutes(4)),
        });
    }

    // cand-delta declined five minutes ago and is inside the cooldown.
    let declined_assigned = Utc::now() - Duration::minutes(20);
    store.add_history(AssignmentHistoryEntry {
        candidate_id: CandidateId("cand-delta".to_string()),
        shift_id: ShiftId("hist-decline".to_string()),
        status: AssignmentStatus::Declined,
        assigned_at: declined_assigned,
        responded_at: Some(Utc::now() - Duration::minutes(5)),
    });
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
