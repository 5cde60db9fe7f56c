use std::collections::HashMap;
use std::sync::{Arc, Barrier, Mutex};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::workflows::dispatch::domain::{
    ActorContext, AssignmentHistoryEntry, AssignmentId, AssignmentStatus, AvailabilityRecord,
    CandidateId, CandidateProfile, CandidateStatus, OpenShift, OrganizationId, ShiftId,
    ShiftWindow,
};
use crate::workflows::dispatch::repository::{
    AssignmentRepository, AuditRepository, AvailabilityRepository, CommitReceipt, FeedbackEntry,
    FeedbackRepository, PredictionAuditEntry, RepositoryError, RosterRepository, ShiftRepository,
};
use crate::workflows::dispatch::router::{dispatch_router, DispatchRouterState};
use crate::workflows::dispatch::scoring::MatchingConfig;
use crate::workflows::dispatch::service::{
    DispatchDependencies, MatchingService, PredictRequest,
};
use crate::workflows::dispatch::weights::WeightAuditEntry;
use crate::workflows::dispatch::AutotuneController;

pub(super) fn org() -> OrganizationId {
    OrganizationId("org-metro".to_string())
}

pub(super) fn shift_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

pub(super) fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

pub(super) fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn downtown_window() -> ShiftWindow {
    ShiftWindow {
        date: shift_date(),
        start: time(9, 0),
        end: time(17, 0),
        location: Some("Downtown".to_string()),
    }
}

pub(super) fn window(start_hour: u32, end_hour: u32) -> ShiftWindow {
    ShiftWindow {
        date: shift_date(),
        start: time(start_hour, 0),
        end: time(end_hour, 0),
        location: Some("Downtown".to_string()),
    }
}

pub(super) fn candidate(id: &str) -> CandidateProfile {
    CandidateProfile {
        id: CandidateId(id.to_string()),
        status: CandidateStatus::Active,
        do_not_assign: false,
        home_base: Some("Downtown".to_string()),
        credentials: Some(vec![
            "cpr".to_string(),
            "first-aid".to_string(),
            "security-d".to_string(),
            "crowd-mgmt".to_string(),
            "radio-ops".to_string(),
        ]),
    }
}

pub(super) fn full_availability(id: &str) -> AvailabilityRecord {
    AvailabilityRecord {
        candidate_id: CandidateId(id.to_string()),
        date: shift_date(),
        start: time(8, 0),
        end: time(18, 0),
    }
}

/// History of `accepted` accepted offers responded five minutes after
/// assignment, against unrelated past shifts.
pub(super) fn accepted_history(id: &str, accepted: usize) -> Vec<AssignmentHistoryEntry> {
    (0..accepted)
        .map(|index| {
            let assigned_at = Utc
                .with_ymd_and_hms(2025, 5, 20, 9, 0, 0)
                .single()
                .expect("valid timestamp")
                + Duration::hours(index as i64);
            AssignmentHistoryEntry {
                candidate_id: CandidateId(id.to_string()),
                shift_id: ShiftId(format!("hist-{index}")),
                status: AssignmentStatus::Accepted,
                assigned_at,
                responded_at: Some(assigned_at + Duration::minutes(5)),
            }
        })
        .collect()
}

pub(super) fn predict_request(shift: &str, auto_assign: bool) -> PredictRequest {
    PredictRequest {
        shift_id: ShiftId(shift.to_string()),
        organization_id: org(),
        criteria: Vec::new(),
        auto_assign,
        dry_run: false,
        actor: ActorContext::default(),
    }
}

#[derive(Default)]
pub(super) struct MemoryRoster {
    candidates: Mutex<Vec<CandidateProfile>>,
}

impl MemoryRoster {
    pub(super) fn add(&self, profile: CandidateProfile) {
        self.candidates
            .lock()
            .expect("roster mutex poisoned")
            .push(profile);
    }
}

impl RosterRepository for MemoryRoster {
    fn list_candidates(
        &self,
        _organization: &OrganizationId,
    ) -> Result<Vec<CandidateProfile>, RepositoryError> {
        Ok(self
            .candidates
            .lock()
            .expect("roster mutex poisoned")
            .clone())
    }
}

#[derive(Default)]
pub(super) struct MemoryShifts {
    windows: Mutex<HashMap<ShiftId, ShiftWindow>>,
    open: Mutex<Vec<OpenShift>>,
}

impl MemoryShifts {
    pub(super) fn add_window(&self, id: &str, window: ShiftWindow) {
        self.windows
            .lock()
            .expect("shift mutex poisoned")
            .insert(ShiftId(id.to_string()), window);
    }

    pub(super) fn add_open(&self, id: &str, window: ShiftWindow) {
        self.add_window(id, window.clone());
        self.open
            .lock()
            .expect("shift mutex poisoned")
            .push(OpenShift {
                id: ShiftId(id.to_string()),
                window,
            });
    }
}

impl ShiftRepository for MemoryShifts {
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
        let open = self.open.lock().expect("shift mutex poisoned");
        Ok(open.iter().take(limit).cloned().collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryAvailability {
    records: Mutex<Vec<AvailabilityRecord>>,
}

impl MemoryAvailability {
    pub(super) fn add(&self, record: AvailabilityRecord) {
        self.records
            .lock()
            .expect("availability mutex poisoned")
            .push(record);
    }
}

impl AvailabilityRepository for MemoryAvailability {
    fn list_availability(
        &self,
        candidates: &[CandidateId],
        date: NaiveDate,
    ) -> Result<Vec<AvailabilityRecord>, RepositoryError> {
        let records = self.records.lock().expect("availability mutex poisoned");
        Ok(records
            .iter()
            .filter(|record| record.date == date && candidates.contains(&record.candidate_id))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct AssignmentsInner {
    history: Vec<AssignmentHistoryEntry>,
    committed: HashMap<ShiftId, AssignmentId>,
    known: Vec<AssignmentId>,
    sequence: u64,
}

/// Assignment store whose conditional commit is atomic under one lock, the
/// way a unique constraint would behave.
#[derive(Default)]
pub(super) struct MemoryAssignments {
    inner: Mutex<AssignmentsInner>,
}

impl MemoryAssignments {
    pub(super) fn add_history(&self, entry: AssignmentHistoryEntry) {
        self.inner
            .lock()
            .expect("assignment mutex poisoned")
            .history
            .push(entry);
    }

    pub(super) fn add_known(&self, id: &str) {
        self.inner
            .lock()
            .expect("assignment mutex poisoned")
            .known
            .push(AssignmentId(id.to_string()));
    }

    pub(super) fn committed_count(&self) -> usize {
        self.inner
            .lock()
            .expect("assignment mutex poisoned")
            .committed
            .len()
    }
}

impl AssignmentRepository for MemoryAssignments {
    fn list_history(
        &self,
        candidates: &[CandidateId],
    ) -> Result<Vec<AssignmentHistoryEntry>, RepositoryError> {
        let inner = self.inner.lock().expect("assignment mutex poisoned");
        Ok(inner
            .history
            .iter()
            .filter(|entry| candidates.contains(&entry.candidate_id))
            .cloned()
            .collect())
    }

    fn commit_if_unassigned(
        &self,
        shift: &ShiftId,
        _candidate: &CandidateId,
    ) -> Result<CommitReceipt, RepositoryError> {
        let mut inner = self.inner.lock().expect("assignment mutex poisoned");
        if inner.committed.contains_key(shift) {
            return Ok(CommitReceipt::AlreadyAssigned);
        }
        inner.sequence += 1;
        let assignment_id = AssignmentId(format!("asg-{:04}", inner.sequence));
        inner.committed.insert(shift.clone(), assignment_id.clone());
        inner.known.push(assignment_id.clone());
        Ok(CommitReceipt::Committed { assignment_id })
    }

    fn assignment_exists(&self, assignment: &AssignmentId) -> Result<bool, RepositoryError> {
        let inner = self.inner.lock().expect("assignment mutex poisoned");
        Ok(inner.known.contains(assignment))
    }
}

/// Assignment store whose commit write always fails for infrastructure
/// reasons.
#[derive(Default)]
pub(super) struct FailingCommitAssignments;

impl AssignmentRepository for FailingCommitAssignments {
    fn list_history(
        &self,
        _candidates: &[CandidateId],
    ) -> Result<Vec<AssignmentHistoryEntry>, RepositoryError> {
        Ok(Vec::new())
    }

    fn commit_if_unassigned(
        &self,
        _shift: &ShiftId,
        _candidate: &CandidateId,
    ) -> Result<CommitReceipt, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn assignment_exists(&self, _assignment: &AssignmentId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryFeedback {
    entries: Mutex<Vec<FeedbackEntry>>,
}

impl MemoryFeedback {
    pub(super) fn add(&self, entry: FeedbackEntry) {
        self.entries
            .lock()
            .expect("feedback mutex poisoned")
            .push(entry);
    }

    pub(super) fn entries(&self) -> Vec<FeedbackEntry> {
        self.entries.lock().expect("feedback mutex poisoned").clone()
    }
}

impl FeedbackRepository for MemoryFeedback {
    fn append(&self, entry: FeedbackEntry) -> Result<FeedbackEntry, RepositoryError> {
        self.add(entry.clone());
        Ok(entry)
    }

    fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<FeedbackEntry>, RepositoryError> {
        let entries = self.entries.lock().expect("feedback mutex poisoned");
        Ok(entries
            .iter()
            .filter(|entry| entry.recorded_at >= since)
            .cloned()
            .collect())
    }
}

/// Feedback log that rendezvouses with the test on every read, so a second
/// autotune trigger can be fired while the first pass holds the run lock.
pub(super) struct BlockingFeedback {
    pub(super) barrier: Arc<Barrier>,
}

impl FeedbackRepository for BlockingFeedback {
    fn append(&self, entry: FeedbackEntry) -> Result<FeedbackEntry, RepositoryError> {
        Ok(entry)
    }

    fn list_since(&self, _since: DateTime<Utc>) -> Result<Vec<FeedbackEntry>, RepositoryError> {
        self.barrier.wait();
        self.barrier.wait();
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub(super) struct UnavailableFeedback;

impl FeedbackRepository for UnavailableFeedback {
    fn append(&self, _entry: FeedbackEntry) -> Result<FeedbackEntry, RepositoryError> {
        Err(RepositoryError::Unavailable("feedback offline".to_string()))
    }

    fn list_since(&self, _since: DateTime<Utc>) -> Result<Vec<FeedbackEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("feedback offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryAudit {
    predictions: Mutex<Vec<PredictionAuditEntry>>,
    weights: Mutex<Vec<WeightAuditEntry>>,
}

impl MemoryAudit {
    pub(super) fn predictions(&self) -> Vec<PredictionAuditEntry> {
        self.predictions
            .lock()
            .expect("audit mutex poisoned")
            .clone()
    }

    pub(super) fn weight_entries(&self) -> Vec<WeightAuditEntry> {
        self.weights.lock().expect("audit mutex poisoned").clone()
    }

    pub(super) fn push_weight_entry(&self, entry: WeightAuditEntry) {
        self.weights.lock().expect("audit mutex poisoned").push(entry);
    }
}

impl AuditRepository for MemoryAudit {
    fn append_prediction(&self, entry: PredictionAuditEntry) -> Result<(), RepositoryError> {
        self.predictions
            .lock()
            .expect("audit mutex poisoned")
            .push(entry);
        Ok(())
    }

    fn append_weight_audit(&self, entry: WeightAuditEntry) -> Result<(), RepositoryError> {
        self.weights.lock().expect("audit mutex poisoned").push(entry);
        Ok(())
    }

    fn latest_weight_audit(&self) -> Result<Option<WeightAuditEntry>, RepositoryError> {
        let weights = self.weights.lock().expect("audit mutex poisoned");
        Ok(weights.last().cloned())
    }
}

/// Audit trail whose writes always fail; reads behave as empty.
#[derive(Default)]
pub(super) struct UnavailableAudit;

impl AuditRepository for UnavailableAudit {
    fn append_prediction(&self, _entry: PredictionAuditEntry) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("audit offline".to_string()))
    }

    fn append_weight_audit(&self, _entry: WeightAuditEntry) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("audit offline".to_string()))
    }

    fn latest_weight_audit(&self) -> Result<Option<WeightAuditEntry>, RepositoryError> {
        Ok(None)
    }
}

/// Collaborator bundle backed by the in-memory doubles above.
pub(super) struct TestWorld {
    pub(super) roster: Arc<MemoryRoster>,
    pub(super) shifts: Arc<MemoryShifts>,
    pub(super) availability: Arc<MemoryAvailability>,
    pub(super) assignments: Arc<MemoryAssignments>,
    pub(super) feedback: Arc<MemoryFeedback>,
    pub(super) audit: Arc<MemoryAudit>,
}

pub(super) fn world() -> TestWorld {
    TestWorld {
        roster: Arc::new(MemoryRoster::default()),
        shifts: Arc::new(MemoryShifts::default()),
        availability: Arc::new(MemoryAvailability::default()),
        assignments: Arc::new(MemoryAssignments::default()),
        feedback: Arc::new(MemoryFeedback::default()),
        audit: Arc::new(MemoryAudit::default()),
    }
}

impl TestWorld {
    pub(super) fn dependencies(&self) -> DispatchDependencies {
        DispatchDependencies {
            roster: self.roster.clone(),
            shifts: self.shifts.clone(),
            availability: self.availability.clone(),
            assignments: self.assignments.clone(),
            feedback: self.feedback.clone(),
            audit: self.audit.clone(),
        }
    }

    pub(super) fn service(&self, config: MatchingConfig) -> MatchingService {
        MatchingService::new(self.dependencies(), config)
    }
}

/// Shift `shift-1` downtown with candidate `cand-alpha` (available, strong
/// history) and `cand-bravo` (flagged do-not-assign).
pub(super) fn seeded_world() -> TestWorld {
    let world = world();
    world.shifts.add_window("shift-1", downtown_window());
    world.roster.add(candidate("cand-alpha"));
    let mut flagged = candidate("cand-bravo");
    flagged.do_not_assign = true;
    world.roster.add(flagged);
    world.availability.add(full_availability("cand-alpha"));
    world.availability.add(full_availability("cand-bravo"));
    for entry in accepted_history("cand-alpha", 3) {
        world.assignments.add_history(entry);
    }
    world
}

pub(super) fn router_for(world: &TestWorld) -> axum::Router {
    let config = MatchingConfig::default();
    let service = Arc::new(world.service(config.clone()));
    let autotune = Arc::new(AutotuneController::new(
        world.feedback.clone(),
        world.audit.clone(),
        config,
    ));
    dispatch_router(DispatchRouterState { service, autotune })
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
