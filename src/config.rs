use crate::constants::replenish::{
    DEFAULT_MAX_COHORTS_PER_RUN, DEFAULT_PER_COHORT_BATCH_CAP, MAX_COHORTS_HARD_CAP,
};

/// Budget knobs for one replenishment run.
///
/// The two caps exist to ration the external generator's shared rate/cost
/// budget: a run touches at most `max_cohorts_per_run` cohorts and spends at
/// most `per_cohort_batch_cap` generation units on any one of them, so worst
/// case cost per run is their product.
#[derive(Clone, Debug)]
pub struct ReplenishConfig {
    /// Candidate cohorts considered per run, clamped to a hard ceiling.
    pub max_cohorts_per_run: usize,
    /// Upper bound on generation units for a single deficient cohort.
    pub per_cohort_batch_cap: usize,
    /// Optional override of the schema's target pool size for this run.
    pub target_size: Option<usize>,
}

impl Default for ReplenishConfig {
    fn default() -> Self {
        Self {
            max_cohorts_per_run: DEFAULT_MAX_COHORTS_PER_RUN,
            per_cohort_batch_cap: DEFAULT_PER_COHORT_BATCH_CAP,
            target_size: None,
        }
    }
}

impl ReplenishConfig {
    /// Number of candidate cohorts this run may consider, after the hard
    /// ceiling is applied.
    pub fn candidate_window(&self) -> usize {
        self.max_cohorts_per_run.min(MAX_COHORTS_HARD_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_window_clamps_to_hard_ceiling() {
        let config = ReplenishConfig {
            max_cohorts_per_run: 500,
            ..ReplenishConfig::default()
        };
        assert_eq!(config.candidate_window(), MAX_COHORTS_HARD_CAP);

        let small = ReplenishConfig {
            max_cohorts_per_run: 3,
            ..ReplenishConfig::default()
        };
        assert_eq!(small.candidate_window(), 3);
    }
}
