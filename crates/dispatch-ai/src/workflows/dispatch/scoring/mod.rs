mod components;
mod config;
mod prior;
mod ranking;

pub use components::ScoreBreakdown;
pub use config::{AutotuneConfig, MatchingConfig};
pub use prior::{ColdStartPrior, PriorScores};
pub use ranking::{
    adjust_for_criteria, build_reason, rank_candidates, round4, weighted_score, RankedCandidate,
};

use super::domain::{
    AssignmentHistoryEntry, AvailabilityRecord, CandidateProfile, Criterion, OrganizationId,
    ShiftId, ShiftWindow,
};
use super::weights::WeightVector;

/// Stateless scorer turning one candidate's slice of a snapshot into a
/// ranked row: blended sub-scores, weighted total, and reason string.
pub struct ShiftScorer {
    prior: ColdStartPrior,
    prior_blend: f64,
}

impl ShiftScorer {
    pub fn new(prior_blend: f64) -> Self {
        Self {
            prior: ColdStartPrior,
            prior_blend,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn score(
        &self,
        profile: &CandidateProfile,
        window: &ShiftWindow,
        shift: &ShiftId,
        organization: &OrganizationId,
        history: &[AssignmentHistoryEntry],
        availability: &[AvailabilityRecord],
        weights: &WeightVector,
        criteria: &[Criterion],
    ) -> RankedCandidate {
        let breakdown = components::score_candidate(
            profile,
            window,
            shift,
            organization,
            history,
            availability,
            &self.prior,
            self.prior_blend,
        );
        let base = ranking::weighted_score(&breakdown, weights);
        let score = ranking::adjust_for_criteria(base, &breakdown, criteria);

        RankedCandidate {
            candidate_id: profile.id.clone(),
            score,
            reason: ranking::build_reason(&breakdown),
            breakdown,
        }
    }
}
