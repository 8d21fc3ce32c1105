use std::io;

use thiserror::Error;

use crate::types::{CategoryId, CohortKey};

/// Error type for schema resolution, generation, and pool access failures.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No active schema is registered for the category. Fatal to a run.
    #[error("no active schema for category '{category}'")]
    SchemaNotFound {
        /// Category whose schema lookup failed.
        category: CategoryId,
    },
    /// One generation unit failed. Recovered locally; the run continues.
    #[error("generation failed for category '{category}': {reason}")]
    Generator {
        /// Category the failed unit belonged to.
        category: CategoryId,
        /// Human-readable failure description from the generator.
        reason: String,
    },
    /// A pool store operation failed. Recovered locally on insert.
    #[error("pool store failure: {0}")]
    Store(String),
    /// No entries exist for the cohort. The serving caller owns fallback.
    #[error("pool is empty for category '{category}', cohort '{cohort_key}'")]
    PoolEmpty {
        /// Category of the empty pool.
        category: CategoryId,
        /// Cohort key of the empty pool.
        cohort_key: CohortKey,
    },
    /// Invalid schema or run configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Underlying IO failure from a file-backed store.
    #[error(transparent)]
    Io(#[from] io::Error),
}
