use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ActorContext, AssignmentHistoryEntry, AssignmentId, AvailabilityRecord, CandidateId,
    CandidateProfile, Criterion, OpenShift, OrganizationId, ShiftId, ShiftWindow,
};
use super::guardrails::SkippedCandidate;
use super::weights::WeightAuditEntry;

/// Error enumeration for collaborator failures. Reads that fail degrade to
/// empty snapshots inside the core; only the commit write surfaces its
/// failure, and then embedded in the prediction outcome rather than thrown.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("dependency unavailable: {0}")]
    Unavailable(String),
}

/// Roster reads, maintained elsewhere; the core never mutates candidates.
pub trait RosterRepository: Send + Sync {
    fn list_candidates(
        &self,
        organization: &OrganizationId,
    ) -> Result<Vec<CandidateProfile>, RepositoryError>;
}

/// Shift calendar reads.
pub trait ShiftRepository: Send + Sync {
    fn shift_window(&self, shift: &ShiftId) -> Result<Option<ShiftWindow>, RepositoryError>;

    fn list_unassigned_shifts(
        &self,
        organization: &OrganizationId,
        limit: usize,
    ) -> Result<Vec<OpenShift>, RepositoryError>;
}

/// Availability ledger reads.
pub trait AvailabilityRepository: Send + Sync {
    fn list_availability(
        &self,
        candidates: &[CandidateId],
        date: NaiveDate,
    ) -> Result<Vec<AvailabilityRecord>, RepositoryError>;
}

/// Result of the conditional assignment write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitReceipt {
    Committed { assignment_id: AssignmentId },
    /// The shift already holds an active assignment; the caller lost the
    /// race. A normal outcome, not an error.
    AlreadyAssigned,
}

/// Assignment history reads plus the single mutating operation the core
/// performs.
pub trait AssignmentRepository: Send + Sync {
    fn list_history(
        &self,
        candidates: &[CandidateId],
    ) -> Result<Vec<AssignmentHistoryEntry>, RepositoryError>;

    /// Create an assignment only if the shift has no active assignment.
    /// Implementations must make the check-and-insert atomic (unique
    /// constraint or compare-and-swap), not a check-then-act sequence.
    fn commit_if_unassigned(
        &self,
        shift: &ShiftId,
        candidate: &CandidateId,
    ) -> Result<CommitReceipt, RepositoryError>;

    fn assignment_exists(&self, assignment: &AssignmentId) -> Result<bool, RepositoryError>;
}

/// Observed outcome of a committed assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackResult {
    Success,
    Fail,
}

/// One accept/decline observation consumed by the autotune loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub assignment_id: AssignmentId,
    pub result: FeedbackResult,
    /// Response latency in seconds, when the candidate responded.
    pub responded_in: Option<i64>,
    pub recorded_at: DateTime<Utc>,
}

/// Feedback log: appended by callers, read back by autotune.
pub trait FeedbackRepository: Send + Sync {
    fn append(&self, entry: FeedbackEntry) -> Result<FeedbackEntry, RepositoryError>;

    fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<FeedbackEntry>, RepositoryError>;
}

/// One prediction run, as recorded for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionAuditEntry {
    pub shift_id: ShiftId,
    pub organization_id: OrganizationId,
    pub top_candidate: Option<CandidateId>,
    pub top_score: Option<f64>,
    pub criteria: Vec<Criterion>,
    pub skipped: Vec<SkippedCandidate>,
    pub actor: ActorContext,
    pub auto_assigned: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only audit trails. Prediction-audit failures are swallowed by the
/// caller; weight-audit reads back the latest recalibration.
pub trait AuditRepository: Send + Sync {
    fn append_prediction(&self, entry: PredictionAuditEntry) -> Result<(), RepositoryError>;

    fn append_weight_audit(&self, entry: WeightAuditEntry) -> Result<(), RepositoryError>;

    fn latest_weight_audit(&self) -> Result<Option<WeightAuditEntry>, RepositoryError>;
}
