use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};

use cohorts::{
    compute_key, enumerate, pool_coverage, CategoryPrompt, Cohort, CohortSchema, ContentGenerator,
    GenerationRequest, InMemoryPoolStore, InMemorySchemaRegistry, PoolError, PoolStore,
    PromptCatalog, ReplenishConfig, Replenisher, SchemaRegistry, ServingEngine,
};

/// Generator that echoes the cohort traits into the document so tests can
/// tell which cohort an entry was generated for.
struct EchoGenerator;

impl ContentGenerator for EchoGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<Value, PoolError> {
        Ok(json!({
            "greeting": "Good day {{userName}}!",
            "traits": request.cohort.description(),
            "advice": "{{userName}}, small steady steps.",
        }))
    }
}

fn fixture() -> (
    Arc<InMemorySchemaRegistry>,
    Arc<InMemoryPoolStore>,
    Replenisher,
) {
    let registry = Arc::new(InMemorySchemaRegistry::new());
    registry
        .register(
            CohortSchema::new("daily")
                .with_dimension("age", ["young", "old"])
                .with_dimension("mood", ["happy", "sad"])
                .with_placeholder("{{userName}}")
                .with_target_pool_size(2),
        )
        .expect("schema registers");
    let store = Arc::new(InMemoryPoolStore::new());
    let prompts = PromptCatalog::new(CategoryPrompt::new(
        "You write daily insights.",
        json!({ "greeting": "string", "traits": "string", "advice": "string" }),
    ));
    let replenisher = Replenisher::new(
        registry.clone(),
        store.clone(),
        Arc::new(EchoGenerator),
        prompts,
    );
    (registry, store, replenisher)
}

#[test]
fn replenished_pools_serve_personalized_documents() {
    let (registry, store, replenisher) = fixture();
    replenisher
        .run("daily", &ReplenishConfig::default())
        .expect("replenish");

    let engine = ServingEngine::new(registry, store);
    let cohort = Cohort::from_pairs([("age", "young"), ("mood", "happy")]);
    let replacements = HashMap::from([("{{userName}}".to_string(), "Casey".to_string())]);
    let mut rng = StdRng::from_seed([11_u8; 32]);

    let document = engine
        .serve_with("daily", &cohort, &replacements, &mut rng)
        .expect("serve");
    assert_eq!(document["greeting"], "Good day Casey!");
    assert_eq!(document["advice"], "Casey, small steady steps.");
    // The sampled entry really belongs to the requested cohort.
    assert_eq!(document["traits"], "age: young, mood: happy");
}

#[test]
fn pool_templates_keep_tokens_until_serve_time() {
    let (_, store, replenisher) = fixture();
    replenisher
        .run("daily", &ReplenishConfig::default())
        .expect("replenish");

    let cohort = Cohort::from_pairs([("age", "old"), ("mood", "sad")]);
    let entry = store
        .sample("daily", &compute_key(&cohort))
        .expect("sample");
    assert_eq!(entry.template["greeting"], "Good day {{userName}}!");
    assert!((entry.quality - 1.0).abs() < f32::EPSILON);
}

#[test]
fn serving_an_unreplenished_cohort_reports_pool_empty() {
    let (registry, store, _) = fixture();
    let engine = ServingEngine::new(registry, store);
    let cohort = Cohort::from_pairs([("age", "young"), ("mood", "sad")]);
    let mut rng = StdRng::from_seed([12_u8; 32]);

    let err = engine
        .serve_with("daily", &cohort, &HashMap::new(), &mut rng)
        .unwrap_err();
    assert!(matches!(err, PoolError::PoolEmpty { category, .. } if category == "daily"));
}

#[test]
fn coverage_after_a_full_run_is_uniform_at_target() {
    let (registry, store, replenisher) = fixture();
    replenisher
        .run("daily", &ReplenishConfig::default())
        .expect("replenish");

    let counts = store.cohort_counts("daily").expect("counts");
    let coverage = pool_coverage(&counts).expect("coverage");
    assert_eq!(coverage.cohorts, 4);
    assert_eq!(coverage.entries, 8);
    assert_eq!(coverage.min, 2);
    assert_eq!(coverage.max, 2);

    // Every enumerated cohort's key is present in the coverage report.
    let schema = registry.active_schema("daily").expect("schema");
    for cohort in enumerate(&schema) {
        assert!(counts.contains_key(&compute_key(&cohort)));
    }
}
