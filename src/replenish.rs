use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::cohort::{enumerate, Cohort};
use crate::config::ReplenishConfig;
use crate::errors::PoolError;
use crate::generator::{validate_template, ContentGenerator, GenerationRequest, PromptCatalog};
use crate::key::compute_key;
use crate::pool::{PoolEntry, PoolStore};
use crate::schema::{CohortSchema, SchemaRegistry};
use crate::types::{CategoryId, CohortKey};

/// One recovered unit failure from a replenishment run.
#[derive(Clone, Debug, Serialize)]
pub struct RunError {
    /// Cohort the failed unit belonged to.
    pub cohort_key: CohortKey,
    /// What went wrong, from the generator or the store.
    pub reason: String,
}

/// Outcome of one replenishment run.
///
/// `processed` counts only deficient candidates that received generation
/// attempts; candidates already at target are counted in `skipped` instead.
/// `remaining_cohorts` is the untouched tail of the full enumeration — the
/// cohorts a larger window (or a later run) would reach.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    /// Category this run replenished.
    pub category: CategoryId,
    /// Size of the full cohort space implied by the schema.
    pub total_cohorts: usize,
    /// Deficient candidates that received generation attempts.
    pub processed: usize,
    /// Entries successfully generated and inserted.
    pub generated: usize,
    /// Candidates already at or above target.
    pub skipped: usize,
    /// Cohorts beyond this run's candidate window.
    pub remaining_cohorts: usize,
    /// Recovered unit failures, in occurrence order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RunError>,
}

/// Batch orchestrator that tops up under-filled cohort pools.
///
/// A run is partial-failure tolerant: one unit's generator or store failure
/// is recorded and the run moves on. Only resolving the schema can abort a
/// run. Generator calls are issued sequentially, one unit at a time — the
/// per-run caps ration a shared budget and parallel calls would defeat them.
pub struct Replenisher {
    registry: Arc<dyn SchemaRegistry>,
    store: Arc<dyn PoolStore>,
    generator: Arc<dyn ContentGenerator>,
    prompts: PromptCatalog,
}

impl Replenisher {
    /// Wire a replenisher from its collaborators.
    pub fn new(
        registry: Arc<dyn SchemaRegistry>,
        store: Arc<dyn PoolStore>,
        generator: Arc<dyn ContentGenerator>,
        prompts: PromptCatalog,
    ) -> Self {
        Self {
            registry,
            store,
            generator,
            prompts,
        }
    }

    /// Bring as many cohorts as the run budget allows up to target size.
    ///
    /// Every run restarts enumeration from the head of the canonical order,
    /// so early cohorts are kept warm preferentially; under a large cohort
    /// space the tail only fills once the head is saturated.
    pub fn run(&self, category: &str, config: &ReplenishConfig) -> Result<RunSummary, PoolError> {
        let schema = self.registry.active_schema(category)?;
        let target = config.target_size.unwrap_or(schema.target_pool_size);
        let total_cohorts = schema.cohort_space();
        let window = config.candidate_window();
        debug!(
            category,
            total_cohorts,
            window,
            target,
            per_cohort_cap = config.per_cohort_batch_cap,
            "replenishment run started"
        );

        let mut processed = 0;
        let mut generated = 0;
        let mut skipped = 0;
        let mut errors = Vec::new();

        for cohort in enumerate(&schema).take(window) {
            let cohort_key = compute_key(&cohort);
            let size = match self.store.size_of(category, &cohort_key) {
                Ok(size) => size,
                Err(err) => {
                    errors.push(RunError {
                        cohort_key,
                        reason: format!("pool size read failed: {err}"),
                    });
                    continue;
                }
            };
            if size >= target {
                skipped += 1;
                continue;
            }

            let deficit = (target - size).min(config.per_cohort_batch_cap);
            debug!(
                category,
                cohort_key = %cohort_key,
                current = size,
                deficit,
                "topping up deficient cohort"
            );
            for _ in 0..deficit {
                match self.generate_one(&schema, &cohort, &cohort_key) {
                    Ok(()) => generated += 1,
                    Err(err) => errors.push(RunError {
                        cohort_key: cohort_key.clone(),
                        reason: err.to_string(),
                    }),
                }
            }
            processed += 1;
        }

        let remaining_cohorts = total_cohorts.saturating_sub(processed + skipped);
        info!(
            category,
            processed,
            generated,
            skipped,
            remaining_cohorts,
            errors = errors.len(),
            "replenishment run finished"
        );
        Ok(RunSummary {
            category: category.to_string(),
            total_cohorts,
            processed,
            generated,
            skipped,
            remaining_cohorts,
            errors,
        })
    }

    fn generate_one(
        &self,
        schema: &CohortSchema,
        cohort: &Cohort,
        cohort_key: &str,
    ) -> Result<(), PoolError> {
        let prompt = self.prompts.lookup(&schema.category);
        let request = GenerationRequest {
            category: &schema.category,
            instruction: &prompt.instruction,
            response_shape: &prompt.response_shape,
            cohort,
        };
        let document = self.generator.generate(&request)?;
        validate_template(schema, &document)?;
        let entry = PoolEntry::new(
            schema.category.clone(),
            cohort_key.to_string(),
            cohort.clone(),
            document,
        );
        self.store.insert(entry)
    }
}
