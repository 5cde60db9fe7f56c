use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for candidate workers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

/// Identifier wrapper for shifts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftId(pub String);

/// Identifier wrapper for committed assignments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(pub String);

/// Identifier wrapper for the organization whose roster is being matched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationId(pub String);

/// Roster status tracked externally; the core only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Active,
    Inactive,
}

impl CandidateStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CandidateStatus::Active => "active",
            CandidateStatus::Inactive => "inactive",
        }
    }
}

/// Read-only roster snapshot of a candidate worker.
///
/// `credentials: None` means the roster holds no credential data for the
/// candidate, which is distinct from an empty credential list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: CandidateId,
    pub status: CandidateStatus,
    pub do_not_assign: bool,
    pub home_base: Option<String>,
    pub credentials: Option<Vec<String>>,
}

/// A date/time/location tuple describing labor demand. The time span is
/// half-open: `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftWindow {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub location: Option<String>,
}

impl ShiftWindow {
    /// True when the two windows fall on the same date and their half-open
    /// spans intersect. Touching boundaries do not overlap.
    pub fn overlaps(&self, other: &ShiftWindow) -> bool {
        self.date == other.date && self.start.max(other.start) < self.end.min(other.end)
    }
}

/// An unassigned shift row as returned by the shift calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenShift {
    pub id: ShiftId,
    pub window: ShiftWindow,
}

/// A candidate's declared availability for a single date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub candidate_id: CandidateId,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl AvailabilityRecord {
    /// True when this record fully contains the shift window.
    pub fn covers(&self, window: &ShiftWindow) -> bool {
        self.date == window.date && self.start <= window.start && self.end >= window.end
    }
}

/// Lifecycle status of an assignment offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    Accepted,
    Declined,
}

impl AssignmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "assigned",
            AssignmentStatus::Accepted => "accepted",
            AssignmentStatus::Declined => "declined",
        }
    }

    /// Assigned and accepted shifts both occupy the candidate's day.
    pub const fn occupies_day(self) -> bool {
        matches!(self, AssignmentStatus::Assigned | AssignmentStatus::Accepted)
    }
}

/// One row of a candidate's assignment history. Created by the commit path,
/// mutated externally when the candidate responds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentHistoryEntry {
    pub candidate_id: CandidateId,
    pub shift_id: ShiftId,
    pub status: AssignmentStatus,
    pub assigned_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl AssignmentHistoryEntry {
    /// Minutes between offer and response, when the candidate responded
    /// after (or at) the offer time.
    pub fn response_minutes(&self) -> Option<f64> {
        let responded = self.responded_at?;
        if responded < self.assigned_at {
            return None;
        }
        Some((responded - self.assigned_at).num_seconds() as f64 / 60.0)
    }
}

/// Scoring criteria a caller can request for a prediction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Availability,
    PastAcceptance,
    Credentials,
}

impl Criterion {
    /// The criteria applied when a request does not name any.
    pub fn default_set() -> Vec<Criterion> {
        vec![
            Criterion::Availability,
            Criterion::PastAcceptance,
            Criterion::Credentials,
        ]
    }
}

/// Caller identity carried into the audit trail. Authentication happens
/// outside the core; this is recorded, not verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub user_id: String,
    pub role: String,
}

impl Default for ActorContext {
    fn default() -> Self {
        Self {
            user_id: "system".to_string(),
            role: "scheduler".to_string(),
        }
    }
}
