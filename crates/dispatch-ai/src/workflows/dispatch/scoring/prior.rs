use super::super::domain::{CandidateId, OrganizationId, ShiftId};

/// Deterministic cold-start prior.
///
/// When a candidate has no history for a component, scoring falls back to a
/// stable pseudo-random baseline seeded by the (candidate, shift,
/// organization) triple, so repeated runs over the same snapshot rank
/// identically and new candidates are spread across the score range instead
/// of collapsing onto a shared constant.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColdStartPrior;

/// Baseline values per component, each in [0, 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorScores {
    pub acceptance: f64,
    pub speed: f64,
    pub availability: f64,
    pub credentials: f64,
}

impl ColdStartPrior {
    pub fn baseline(
        &self,
        candidate: &CandidateId,
        shift: &ShiftId,
        organization: &OrganizationId,
    ) -> PriorScores {
        let base = format!("{}|{}|{}", candidate.0, shift.0, organization.0);
        PriorScores {
            acceptance: seeded("A", &base),
            speed: seeded("R", &base),
            availability: seeded("V", &base),
            credentials: seeded("C", &base),
        }
    }

    /// Blend a real signal with its baseline: `blend` is the share given to
    /// the real signal. A missing signal yields the baseline alone.
    pub fn blend(&self, real: Option<f64>, baseline: f64, blend: f64) -> f64 {
        match real {
            Some(value) => blend * value + (1.0 - blend) * baseline,
            None => baseline,
        }
    }
}

fn seeded(tag: &str, base: &str) -> f64 {
    norm01(fnv1a(&format!("{tag}:{base}")))
}

/// 32-bit FNV-1a over the seed string.
fn fnv1a(input: &str) -> u32 {
    let mut hash: u32 = 2_166_136_261;
    for byte in input.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(16_777_619);
    }
    hash
}

fn norm01(hash: u32) -> f64 {
    f64::from(hash % 1000) / 1000.0
}
