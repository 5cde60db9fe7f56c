//! Shift-to-worker matching: scoring, guardrails, assignment commit, audit,
//! and adaptive weight tuning.
//!
//! A prediction run is synchronous and pure over a point-in-time snapshot of
//! roster, availability, and assignment history; the only mutating step is
//! the conditional commit of the top eligible candidate. The autotune
//! controller runs independently and communicates with the ranker solely
//! through appended weight-audit entries.

pub mod autotune;
pub mod domain;
pub mod guardrails;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod snapshot;
pub mod weights;

#[cfg(test)]
mod tests;

pub use autotune::{AutotuneController, AutotunePhase, AutotuneReason, AutotuneReport};
pub use domain::{
    ActorContext, AssignmentHistoryEntry, AssignmentId, AssignmentStatus, AvailabilityRecord,
    CandidateId, CandidateProfile, CandidateStatus, Criterion, OpenShift, OrganizationId, ShiftId,
    ShiftWindow,
};
pub use guardrails::{GuardrailOutcome, GuardrailReport, SkipReason, SkippedCandidate};
pub use repository::{
    AssignmentRepository, AuditRepository, AvailabilityRepository, CommitReceipt, FeedbackEntry,
    FeedbackRepository, FeedbackResult, PredictionAuditEntry, RepositoryError, RosterRepository,
    ShiftRepository,
};
pub use scoring::{AutotuneConfig, ColdStartPrior, MatchingConfig, ScoreBreakdown};
pub use service::{
    AutofillOutcome, AutofillRequest, AutofillSkipReason, CommitOutcome, DispatchDependencies,
    DispatchError, FeedbackRequest, FilledShift, MatchingService, PredictRequest,
    PredictionOutcome, Recommendation, SkippedShift, WeightSource, WeightsView,
};
pub use snapshot::DispatchSnapshot;
pub use router::{dispatch_router, DispatchRouterState};
pub use weights::{TuningMetrics, WeightAuditEntry, WeightVector};
