use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{
    ActorContext, AssignmentId, CandidateId, Criterion, OrganizationId, ShiftId,
};
use super::guardrails::{self, GuardrailContext, GuardrailOutcome, GuardrailReport, SkippedCandidate};
use super::repository::{
    AssignmentRepository, AuditRepository, AvailabilityRepository, CommitReceipt, FeedbackEntry,
    FeedbackRepository, FeedbackResult, PredictionAuditEntry, RepositoryError, RosterRepository,
    ShiftRepository,
};
use super::scoring::{rank_candidates, MatchingConfig, ShiftScorer};
use super::snapshot::DispatchSnapshot;
use super::weights::{WeightAuditEntry, WeightVector};

/// Collaborator handles injected into the service. All persistence and
/// transport concerns live behind these traits.
#[derive(Clone)]
pub struct DispatchDependencies {
    pub roster: Arc<dyn RosterRepository>,
    pub shifts: Arc<dyn ShiftRepository>,
    pub availability: Arc<dyn AvailabilityRepository>,
    pub assignments: Arc<dyn AssignmentRepository>,
    pub feedback: Arc<dyn FeedbackRepository>,
    pub audit: Arc<dyn AuditRepository>,
}

/// Service composing scoring, guardrails, the conditional commit, and the
/// audit trail into the prediction operations.
pub struct MatchingService {
    deps: DispatchDependencies,
    config: MatchingConfig,
    scorer: ShiftScorer,
}

/// Inputs for one prediction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub shift_id: ShiftId,
    pub organization_id: OrganizationId,
    /// Empty means "use the default criteria set".
    pub criteria: Vec<Criterion>,
    pub auto_assign: bool,
    pub dry_run: bool,
    pub actor: ActorContext,
}

/// One eligible candidate in ranked order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub candidate_id: CandidateId,
    pub score: f64,
    pub reason: String,
    pub badges: Vec<String>,
}

/// What happened on the commit path of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommitOutcome {
    /// The caller did not ask for auto-assignment.
    NotRequested,
    /// Dry-run: the commit was skipped regardless of `auto_assign`.
    DryRun,
    /// Auto-assign was requested but every candidate was skipped.
    NoEligibleCandidates,
    Committed {
        assignment_id: AssignmentId,
        candidate_id: CandidateId,
    },
    /// Another run committed first. A normal outcome, not an error.
    AlreadyAssigned,
    /// The conditional write failed for infrastructure reasons; the error is
    /// carried here instead of being thrown.
    Failed { detail: String },
}

impl CommitOutcome {
    pub fn auto_assigned(&self) -> bool {
        matches!(self, CommitOutcome::Committed { .. })
    }

    pub fn assignment_id(&self) -> Option<&AssignmentId> {
        match self {
            CommitOutcome::Committed { assignment_id, .. } => Some(assignment_id),
            _ => None,
        }
    }

    fn autofill_skip_reason(&self) -> Option<AutofillSkipReason> {
        match self {
            CommitOutcome::Committed { .. } => None,
            CommitOutcome::AlreadyAssigned => Some(AutofillSkipReason::AlreadyAssigned),
            CommitOutcome::Failed { .. } => Some(AutofillSkipReason::CommitFailed),
            CommitOutcome::NotRequested
            | CommitOutcome::DryRun
            | CommitOutcome::NoEligibleCandidates => Some(AutofillSkipReason::NoCandidates),
        }
    }
}

/// Per-run output: ranked eligible candidates, the skip list, and the
/// commit outcome. Created per run and audited, never stored as state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutcome {
    pub shift_id: ShiftId,
    pub organization_id: OrganizationId,
    pub recommendations: Vec<Recommendation>,
    pub guardrails: GuardrailReport,
    pub commit: CommitOutcome,
    pub dry_run: bool,
}

impl PredictionOutcome {
    pub fn auto_assigned(&self) -> bool {
        self.commit.auto_assigned()
    }

    pub fn assignment_id(&self) -> Option<&AssignmentId> {
        self.commit.assignment_id()
    }
}

/// Inputs for a batch fill of open shifts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutofillRequest {
    pub organization_id: OrganizationId,
    pub limit: usize,
    pub criteria: Vec<Criterion>,
    pub actor: ActorContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilledShift {
    pub shift_id: ShiftId,
    pub candidate_id: CandidateId,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutofillSkipReason {
    NoCandidates,
    AlreadyAssigned,
    CommitFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedShift {
    pub shift_id: ShiftId,
    pub reason: AutofillSkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutofillOutcome {
    pub filled: Vec<FilledShift>,
    pub skipped: Vec<SkippedShift>,
}

/// Inputs for recording an observed assignment outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub assignment_id: AssignmentId,
    pub result: FeedbackResult,
    pub responded_in: Option<i64>,
}

/// Where the active weight vector came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightSource {
    Override,
    Audit,
    Default,
}

/// Observability view over the active weights and their provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightsView {
    pub active: WeightVector,
    pub source: WeightSource,
    pub latest_audit: Option<WeightAuditEntry>,
}

/// Error raised by the matching service.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("shift_id and organization_id are required")]
    MissingIdentifiers,
    #[error("assignment not found: {0}")]
    AssignmentNotFound(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl MatchingService {
    pub fn new(deps: DispatchDependencies, config: MatchingConfig) -> Self {
        let scorer = ShiftScorer::new(config.prior_blend);
        Self {
            deps,
            config,
            scorer,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Rank candidates for one shift, optionally committing the top eligible
    /// candidate, and audit the run.
    pub fn predict(&self, request: PredictRequest) -> Result<PredictionOutcome, DispatchError> {
        if request.shift_id.0.trim().is_empty() || request.organization_id.0.trim().is_empty() {
            return Err(DispatchError::MissingIdentifiers);
        }

        let snapshot = DispatchSnapshot::load(
            self.deps.roster.as_ref(),
            self.deps.shifts.as_ref(),
            self.deps.availability.as_ref(),
            self.deps.assignments.as_ref(),
            &request.shift_id,
            &request.organization_id,
            Utc::now(),
        );

        Ok(self.predict_on(&snapshot, &request))
    }

    /// The prediction pipeline over an already-loaded snapshot. Everything
    /// up to the commit is a pure function of the snapshot and the active
    /// weights; tests drive this directly for determinism checks.
    pub fn predict_on(
        &self,
        snapshot: &DispatchSnapshot,
        request: &PredictRequest,
    ) -> PredictionOutcome {
        let weights = self.current_weights();
        let criteria = if request.criteria.is_empty() {
            Criterion::default_set()
        } else {
            request.criteria.clone()
        };

        let ranked = rank_candidates(
            snapshot
                .candidates
                .iter()
                .map(|profile| {
                    self.scorer.score(
                        profile,
                        &snapshot.window,
                        &snapshot.shift_id,
                        &snapshot.organization_id,
                        snapshot.history_for(&profile.id),
                        snapshot.availability_for(&profile.id),
                        &weights,
                        &criteria,
                    )
                })
                .collect(),
        );

        let profiles: HashMap<&CandidateId, _> = snapshot
            .candidates
            .iter()
            .map(|profile| (&profile.id, profile))
            .collect();

        let mut recommendations = Vec::new();
        let mut report = GuardrailReport::default();
        for row in ranked {
            let Some(profile) = profiles.get(&row.candidate_id) else {
                continue;
            };
            let context = GuardrailContext::for_candidate(
                profile,
                &snapshot.window,
                snapshot.history_for(&row.candidate_id),
                &snapshot.same_date_windows,
                snapshot.availability_for(&row.candidate_id),
                snapshot.taken_at,
            );
            match guardrails::evaluate(&context, &self.config) {
                GuardrailOutcome::Eligible { badges } => recommendations.push(Recommendation {
                    candidate_id: row.candidate_id,
                    score: row.score,
                    reason: row.reason,
                    badges,
                }),
                GuardrailOutcome::Skipped { reason } => report.skipped.push(SkippedCandidate {
                    candidate_id: row.candidate_id,
                    reason,
                }),
            }
        }

        let commit = self.commit_top(snapshot, request, &recommendations);

        let audit_entry = PredictionAuditEntry {
            shift_id: snapshot.shift_id.clone(),
            organization_id: snapshot.organization_id.clone(),
            top_candidate: recommendations
                .first()
                .map(|top| top.candidate_id.clone()),
            top_score: recommendations.first().map(|top| top.score),
            criteria,
            skipped: report.skipped.clone(),
            actor: request.actor.clone(),
            auto_assigned: commit.auto_assigned(),
            recorded_at: snapshot.taken_at,
        };
        if let Err(error) = self.deps.audit.append_prediction(audit_entry) {
            warn!(shift = %snapshot.shift_id.0, %error, "prediction audit append failed");
        }

        PredictionOutcome {
            shift_id: snapshot.shift_id.clone(),
            organization_id: snapshot.organization_id.clone(),
            recommendations,
            guardrails: report,
            commit,
            dry_run: request.dry_run,
        }
    }

    fn commit_top(
        &self,
        snapshot: &DispatchSnapshot,
        request: &PredictRequest,
        recommendations: &[Recommendation],
    ) -> CommitOutcome {
        if !request.auto_assign {
            return CommitOutcome::NotRequested;
        }
        if request.dry_run {
            return CommitOutcome::DryRun;
        }
        let Some(top) = recommendations.first() else {
            return CommitOutcome::NoEligibleCandidates;
        };

        match self
            .deps
            .assignments
            .commit_if_unassigned(&snapshot.shift_id, &top.candidate_id)
        {
            Ok(CommitReceipt::Committed { assignment_id }) => CommitOutcome::Committed {
                assignment_id,
                candidate_id: top.candidate_id.clone(),
            },
            Ok(CommitReceipt::AlreadyAssigned) => CommitOutcome::AlreadyAssigned,
            Err(error) => {
                warn!(shift = %snapshot.shift_id.0, %error, "assignment commit failed");
                CommitOutcome::Failed {
                    detail: error.to_string(),
                }
            }
        }
    }

    /// Fill up to `limit` unassigned shifts by running auto-assign
    /// predictions shift by shift.
    pub fn autofill(&self, request: AutofillRequest) -> Result<AutofillOutcome, DispatchError> {
        if request.organization_id.0.trim().is_empty() {
            return Err(DispatchError::MissingIdentifiers);
        }

        let open = match self
            .deps
            .shifts
            .list_unassigned_shifts(&request.organization_id, request.limit)
        {
            Ok(open) => open,
            Err(error) => {
                warn!(organization = %request.organization_id.0, %error, "unassigned shift listing failed");
                Vec::new()
            }
        };

        let mut outcome = AutofillOutcome::default();
        for shift in open {
            let prediction = self.predict(PredictRequest {
                shift_id: shift.id.clone(),
                organization_id: request.organization_id.clone(),
                criteria: request.criteria.clone(),
                auto_assign: true,
                dry_run: false,
                actor: request.actor.clone(),
            })?;

            match prediction.commit.autofill_skip_reason() {
                None => {
                    // Committed; the top recommendation is the assignee.
                    if let Some(top) = prediction.recommendations.first() {
                        outcome.filled.push(FilledShift {
                            shift_id: shift.id,
                            candidate_id: top.candidate_id.clone(),
                            score: top.score,
                        });
                    }
                }
                Some(reason) => outcome.skipped.push(SkippedShift {
                    shift_id: shift.id,
                    reason,
                }),
            }
        }

        Ok(outcome)
    }

    /// Record an observed accept/decline outcome for a committed assignment.
    /// Feeds the autotune loop.
    pub fn record_feedback(
        &self,
        request: FeedbackRequest,
    ) -> Result<FeedbackEntry, DispatchError> {
        if request.assignment_id.0.trim().is_empty() {
            return Err(DispatchError::MissingIdentifiers);
        }
        if !self
            .deps
            .assignments
            .assignment_exists(&request.assignment_id)?
        {
            return Err(DispatchError::AssignmentNotFound(
                request.assignment_id.0.clone(),
            ));
        }

        let entry = FeedbackEntry {
            assignment_id: request.assignment_id,
            result: request.result,
            responded_in: request.responded_in,
            recorded_at: Utc::now(),
        };
        Ok(self.deps.feedback.append(entry)?)
    }

    /// Resolve the active weight vector: manual override, then the latest
    /// weight audit entry, then the configured defaults. Always normalized.
    pub fn current_weights(&self) -> WeightVector {
        self.resolve_weights().0
    }

    pub fn weights_view(&self) -> WeightsView {
        let (active, source) = self.resolve_weights();
        let latest_audit = self.deps.audit.latest_weight_audit().unwrap_or_else(|error| {
            warn!(%error, "weight audit read failed");
            None
        });
        WeightsView {
            active,
            source,
            latest_audit,
        }
    }

    fn resolve_weights(&self) -> (WeightVector, WeightSource) {
        if let Some(override_weights) = self.config.weight_override {
            return (override_weights.normalize(), WeightSource::Override);
        }
        match self.deps.audit.latest_weight_audit() {
            Ok(Some(entry)) => (entry.new_weights.normalize(), WeightSource::Audit),
            Ok(None) => (self.config.default_weights.normalize(), WeightSource::Default),
            Err(error) => {
                warn!(%error, "weight audit read failed, using default weights");
                (self.config.default_weights.normalize(), WeightSource::Default)
            }
        }
    }
}
