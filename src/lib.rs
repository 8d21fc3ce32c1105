#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Cohort values and canonical-order enumeration.
pub mod cohort;
/// Replenishment run budgeting configuration.
pub mod config;
/// Centralized constants used across keys, pools, and runs.
pub mod constants;
/// Content generator contract, prompts, and boundary validation.
pub mod generator;
/// Canonical cohort key derivation.
pub mod key;
/// Pool coverage statistics helpers.
pub mod metrics;
/// Pool entry types and append-only pool stores.
pub mod pool;
/// Replenishment run orchestration.
pub mod replenish;
/// Cohort schema types and registries.
pub mod schema;
/// Serve-time bucketing, sampling, and personalization.
pub mod serving;
/// Shared type aliases.
pub mod types;

mod errors;

pub use cohort::{enumerate, Cohort, CohortEnumeration};
pub use config::ReplenishConfig;
pub use errors::PoolError;
#[cfg(feature = "gemini")]
pub use generator::gemini::GeminiGenerator;
pub use generator::{
    validate_template, CategoryPrompt, ContentGenerator, GenerationRequest, PromptCatalog,
};
pub use key::compute_key;
pub use metrics::{pool_coverage, CohortFill, PoolCoverage};
pub use pool::{InMemoryPoolStore, JsonlPoolStore, PoolEntry, PoolStore};
pub use replenish::{Replenisher, RunError, RunSummary};
pub use schema::{CohortSchema, InMemorySchemaRegistry, SchemaRegistry};
pub use serving::{personalize, ServingEngine};
pub use types::{
    CategoryId, CohortKey, DimensionName, DimensionValue, EntryId, PlaceholderToken,
};
