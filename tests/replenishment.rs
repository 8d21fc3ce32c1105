use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use cohorts::{
    CategoryPrompt, CohortSchema, ContentGenerator, GenerationRequest, InMemoryPoolStore,
    InMemorySchemaRegistry, PoolEntry, PoolError, PoolStore, PromptCatalog, ReplenishConfig,
    Replenisher,
};

fn age_mood_schema() -> CohortSchema {
    CohortSchema::new("daily")
        .with_dimension("age", ["young", "old"])
        .with_dimension("mood", ["happy", "sad"])
        .with_placeholder("{{userName}}")
        .with_target_pool_size(2)
}

fn default_document() -> Value {
    json!({ "greeting": "Hello {{userName}}", "advice": "Keep going." })
}

/// Generator test double that replays a script of results, then succeeds.
struct ScriptedGenerator {
    calls: AtomicUsize,
    script: Mutex<VecDeque<Result<Value, String>>>,
}

impl ScriptedGenerator {
    fn always_ok() -> Self {
        Self::with_script(Vec::new())
    }

    fn with_script(script: Vec<Result<Value, String>>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            script: Mutex::new(script.into_iter().collect()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ContentGenerator for ScriptedGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<Value, PoolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.script.lock().expect("script lock poisoned");
        match guard.pop_front() {
            Some(Ok(document)) => Ok(document),
            Some(Err(reason)) => Err(PoolError::Generator {
                category: request.category.to_string(),
                reason,
            }),
            None => Ok(default_document()),
        }
    }
}

fn build_replenisher(
    schema: CohortSchema,
    store: Arc<dyn PoolStore>,
    generator: Arc<dyn ContentGenerator>,
) -> Replenisher {
    let registry = Arc::new(InMemorySchemaRegistry::new());
    registry.register(schema).expect("schema registers");
    let prompts = PromptCatalog::new(CategoryPrompt::new(
        "You write warm, practical daily insights. Keep {{userName}} as written.",
        json!({ "greeting": "string", "advice": "string" }),
    ));
    Replenisher::new(registry, store, generator, prompts)
}

#[test]
fn first_run_fills_every_cohort_and_second_run_is_a_no_op() {
    let store = Arc::new(InMemoryPoolStore::new());
    let generator = Arc::new(ScriptedGenerator::always_ok());
    let replenisher = build_replenisher(age_mood_schema(), store.clone(), generator.clone());
    let config = ReplenishConfig {
        max_cohorts_per_run: 10,
        per_cohort_batch_cap: 5,
        target_size: None,
    };

    let first = replenisher.run("daily", &config).expect("first run");
    assert_eq!(first.total_cohorts, 4);
    assert_eq!(first.processed, 4);
    assert_eq!(first.generated, 8);
    assert_eq!(first.skipped, 0);
    assert_eq!(first.remaining_cohorts, 0);
    assert!(first.errors.is_empty());
    assert_eq!(generator.calls(), 8);

    let second = replenisher.run("daily", &config).expect("second run");
    assert_eq!(second.processed, 0);
    assert_eq!(second.generated, 0);
    assert_eq!(second.skipped, 4);
    assert!(second.errors.is_empty());
    // No generation budget was spent on the no-op run.
    assert_eq!(generator.calls(), 8);

    let counts = store.cohort_counts("daily").expect("counts");
    assert_eq!(counts.len(), 4);
    assert!(counts.values().all(|count| *count == 2));
}

#[test]
fn generated_units_never_exceed_the_run_budget_product() {
    let schema = age_mood_schema().with_target_pool_size(10);
    let store = Arc::new(InMemoryPoolStore::new());
    let generator = Arc::new(ScriptedGenerator::always_ok());
    let replenisher = build_replenisher(schema, store, generator.clone());
    let config = ReplenishConfig {
        max_cohorts_per_run: 10,
        per_cohort_batch_cap: 2,
        target_size: None,
    };

    let summary = replenisher.run("daily", &config).expect("run");
    // Deficit per cohort is 10, but the per-cohort cap bounds each to 2.
    assert_eq!(summary.generated, 8);
    assert!(summary.generated <= config.max_cohorts_per_run * config.per_cohort_batch_cap);
    assert_eq!(generator.calls(), 8);
}

#[test]
fn one_failed_unit_leaves_the_rest_of_the_run_intact() {
    let store = Arc::new(InMemoryPoolStore::new());
    let generator = Arc::new(ScriptedGenerator::with_script(vec![
        Ok(default_document()),
        Ok(default_document()),
        Err("model timed out".to_string()),
        Ok(default_document()),
    ]));
    let replenisher = build_replenisher(age_mood_schema(), store.clone(), generator);
    let config = ReplenishConfig::default();

    let summary = replenisher.run("daily", &config).expect("run");
    assert_eq!(summary.processed, 4);
    assert_eq!(summary.generated, 7);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].reason.contains("model timed out"));

    // The failed unit's cohort is short one entry; the others hit target.
    let counts = store.cohort_counts("daily").expect("counts");
    let mut fills: Vec<usize> = counts.values().copied().collect();
    fills.sort_unstable();
    assert_eq!(fills, vec![1, 2, 2, 2]);
}

#[test]
fn target_size_override_shrinks_the_deficit() {
    let store = Arc::new(InMemoryPoolStore::new());
    let generator = Arc::new(ScriptedGenerator::always_ok());
    let replenisher = build_replenisher(age_mood_schema(), store, generator.clone());
    let config = ReplenishConfig {
        target_size: Some(1),
        ..ReplenishConfig::default()
    };

    let summary = replenisher.run("daily", &config).expect("run");
    assert_eq!(summary.generated, 4);
    assert_eq!(generator.calls(), 4);
}

#[test]
fn a_window_smaller_than_the_space_leaves_a_visible_tail() {
    let store = Arc::new(InMemoryPoolStore::new());
    let generator = Arc::new(ScriptedGenerator::always_ok());
    let replenisher = build_replenisher(age_mood_schema(), store, generator);
    let config = ReplenishConfig {
        max_cohorts_per_run: 3,
        ..ReplenishConfig::default()
    };

    let summary = replenisher.run("daily", &config).expect("run");
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.generated, 6);
    assert_eq!(summary.remaining_cohorts, 1);
}

/// Store wrapper whose inserts always fail, for write-failure accounting.
struct RejectingStore {
    inner: InMemoryPoolStore,
}

impl PoolStore for RejectingStore {
    fn size_of(&self, category: &str, cohort_key: &str) -> Result<usize, PoolError> {
        self.inner.size_of(category, cohort_key)
    }

    fn insert(&self, _entry: PoolEntry) -> Result<(), PoolError> {
        Err(PoolError::Store("disk full".to_string()))
    }

    fn sample_with(
        &self,
        category: &str,
        cohort_key: &str,
        rng: &mut dyn rand::RngCore,
    ) -> Result<PoolEntry, PoolError> {
        self.inner.sample_with(category, cohort_key, rng)
    }

    fn cohort_counts(
        &self,
        category: &str,
    ) -> Result<std::collections::HashMap<String, usize>, PoolError> {
        self.inner.cohort_counts(category)
    }
}

#[test]
fn store_write_failures_are_recorded_and_not_counted_as_generated() {
    let store = Arc::new(RejectingStore {
        inner: InMemoryPoolStore::new(),
    });
    let generator = Arc::new(ScriptedGenerator::always_ok());
    let replenisher = build_replenisher(age_mood_schema(), store, generator.clone());

    let summary = replenisher
        .run("daily", &ReplenishConfig::default())
        .expect("run");
    assert_eq!(summary.generated, 0);
    assert_eq!(summary.processed, 4);
    assert_eq!(summary.errors.len(), 8);
    assert!(summary.errors.iter().all(|err| err.reason.contains("disk full")));
    // The generator budget was still spent; only persistence failed.
    assert_eq!(generator.calls(), 8);
}
