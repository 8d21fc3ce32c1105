use std::collections::HashMap;
use std::sync::RwLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::schema::{DEFAULT_MAX_POOL_SIZE, DEFAULT_TARGET_POOL_SIZE};
use crate::errors::PoolError;
use crate::types::{CategoryId, DimensionName, DimensionValue, PlaceholderToken};

/// Operator-configured description of one content category's cohort space.
///
/// Dimension order is declaration order and defines the canonical enumeration
/// order; value order within a dimension is declaration order as well.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CohortSchema {
    /// Category this schema describes.
    pub category: CategoryId,
    /// Personalization dimensions mapped to their allowed values, in
    /// declaration order.
    pub dimensions: IndexMap<DimensionName, Vec<DimensionValue>>,
    /// Placeholder tokens every generated document must preserve verbatim.
    pub placeholders: Vec<PlaceholderToken>,
    /// Entries the replenisher aims for per cohort.
    pub target_pool_size: usize,
    /// Soft upper bound on entries per cohort (overshoot tolerated).
    pub max_pool_size: usize,
    /// Inactive schemas are rejected by the replenisher.
    pub active: bool,
}

impl CohortSchema {
    /// Create an active schema with default pool bounds and no dimensions.
    pub fn new(category: impl Into<CategoryId>) -> Self {
        Self {
            category: category.into(),
            dimensions: IndexMap::new(),
            placeholders: Vec::new(),
            target_pool_size: DEFAULT_TARGET_POOL_SIZE,
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            active: true,
        }
    }

    /// Append a dimension with its allowed values (declaration order kept).
    pub fn with_dimension<N, V, I>(mut self, name: N, values: I) -> Self
    where
        N: Into<DimensionName>,
        I: IntoIterator<Item = V>,
        V: Into<DimensionValue>,
    {
        self.dimensions
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Declare one placeholder token generated documents must carry.
    pub fn with_placeholder(mut self, token: impl Into<PlaceholderToken>) -> Self {
        self.placeholders.push(token.into());
        self
    }

    /// Override the per-cohort target pool size.
    pub fn with_target_pool_size(mut self, target: usize) -> Self {
        self.target_pool_size = target;
        self
    }

    /// Override the per-cohort soft maximum pool size.
    pub fn with_max_pool_size(mut self, max: usize) -> Self {
        self.max_pool_size = max;
        self
    }

    /// Set the active flag (inactive schemas abort replenishment runs).
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Validate structural invariants and return the schema unchanged.
    ///
    /// A schema with zero placeholders is legal (it degenerates to literal,
    /// non-personalizable content) and only logged.
    pub fn validated(self) -> Result<Self, PoolError> {
        for (name, values) in &self.dimensions {
            if name.is_empty() {
                return Err(PoolError::Configuration(format!(
                    "schema '{}' declares a dimension with an empty name",
                    self.category
                )));
            }
            if values.is_empty() {
                return Err(PoolError::Configuration(format!(
                    "schema '{}' dimension '{name}' has no allowed values",
                    self.category
                )));
            }
        }
        if self.target_pool_size == 0 {
            return Err(PoolError::Configuration(format!(
                "schema '{}' target pool size must be at least 1",
                self.category
            )));
        }
        if self.max_pool_size < self.target_pool_size {
            return Err(PoolError::Configuration(format!(
                "schema '{}' max pool size {} is below target {}",
                self.category, self.max_pool_size, self.target_pool_size
            )));
        }
        if self.placeholders.is_empty() {
            warn!(
                category = %self.category,
                "schema declares no placeholders; pooled content will not personalize"
            );
        }
        Ok(self)
    }

    /// Total number of cohorts this schema implies (product of value counts).
    pub fn cohort_space(&self) -> usize {
        self.dimensions
            .values()
            .map(|values| values.len())
            .product()
    }
}

/// Schema lookup backend.
///
/// Implementations resolve a category to its current schema; the replenisher
/// only ever consumes schemas through [`SchemaRegistry::active_schema`].
pub trait SchemaRegistry: Send + Sync {
    /// Return the schema registered for `category`, active or not.
    fn schema(&self, category: &str) -> Option<CohortSchema>;

    /// Return the schema for `category` only when it exists and is active.
    ///
    /// Missing and inactive schemas are indistinguishable to callers; both
    /// are the single fatal error of a replenishment run.
    fn active_schema(&self, category: &str) -> Result<CohortSchema, PoolError> {
        self.schema(category)
            .filter(|schema| schema.active)
            .ok_or_else(|| PoolError::SchemaNotFound {
                category: category.to_string(),
            })
    }
}

/// Thread-safe in-memory schema registry keyed by category.
#[derive(Default)]
pub struct InMemorySchemaRegistry {
    schemas: RwLock<HashMap<CategoryId, CohortSchema>>,
}

impl InMemorySchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a schema, replacing any previous one for the
    /// same category.
    pub fn register(&self, schema: CohortSchema) -> Result<(), PoolError> {
        let schema = schema.validated()?;
        let mut guard = self.schemas.write().expect("schema registry poisoned");
        guard.insert(schema.category.clone(), schema);
        Ok(())
    }
}

impl SchemaRegistry for InMemorySchemaRegistry {
    fn schema(&self, category: &str) -> Option<CohortSchema> {
        let guard = self.schemas.read().expect("schema registry poisoned");
        guard.get(category).cloned()
    }
}
