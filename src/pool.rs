use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::cohort::Cohort;
use crate::constants::replenish::FRESH_QUALITY_SCORE;
use crate::errors::PoolError;
use crate::types::{CategoryId, CohortKey, EntryId};

/// One pre-generated template document in a cohort's pool.
///
/// Entries are append-only: they are created by the replenisher, read
/// non-destructively by the serving engine, and never mutated in place.
/// Many entries share one cohort key; identity is the entry's own id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolEntry {
    /// Unique entry id.
    pub id: EntryId,
    /// Category this entry belongs to.
    pub category: CategoryId,
    /// Canonical key of the cohort this entry serves.
    pub cohort_key: CohortKey,
    /// Original attribute map, kept for introspection and debugging.
    pub cohort: Cohort,
    /// Structured document with placeholder tokens left unresolved.
    pub template: Value,
    /// Quality score in `[0, 1]`; freshly generated entries score 1.0.
    pub quality: f32,
    /// Creation timestamp (no eviction policy is attached to it here).
    pub created_at: DateTime<Utc>,
}

impl PoolEntry {
    /// Create a fresh entry with a random id and full quality score.
    pub fn new(
        category: impl Into<CategoryId>,
        cohort_key: impl Into<CohortKey>,
        cohort: Cohort,
        template: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            category: category.into(),
            cohort_key: cohort_key.into(),
            cohort,
            template,
            quality: FRESH_QUALITY_SCORE,
            created_at: Utc::now(),
        }
    }
}

/// Append-only pool backend keyed by `(category, cohort key)`.
///
/// Duplicates are expected and welcome — variety across entries for one
/// cohort is the point of pooling. Counts are eventually consistent;
/// overlapping replenishment runs may overshoot the soft max bound.
pub trait PoolStore: Send + Sync {
    /// Current entry count for one cohort.
    fn size_of(&self, category: &str, cohort_key: &str) -> Result<usize, PoolError>;

    /// Append one entry. Never replaces or deduplicates.
    fn insert(&self, entry: PoolEntry) -> Result<(), PoolError>;

    /// Pick one entry uniformly at random using the supplied randomness.
    ///
    /// Fails with [`PoolError::PoolEmpty`] when the cohort has no entries;
    /// the serving caller owns the fallback policy.
    fn sample_with(
        &self,
        category: &str,
        cohort_key: &str,
        rng: &mut dyn RngCore,
    ) -> Result<PoolEntry, PoolError>;

    /// Per-cohort entry counts for one category, for coverage inspection.
    fn cohort_counts(&self, category: &str) -> Result<HashMap<CohortKey, usize>, PoolError>;

    /// Pick one entry using thread-local randomness.
    fn sample(&self, category: &str, cohort_key: &str) -> Result<PoolEntry, PoolError> {
        self.sample_with(category, cohort_key, &mut rand::rng())
    }
}

type PoolIndex = HashMap<(CategoryId, CohortKey), Vec<PoolEntry>>;

fn sample_from_index(
    index: &PoolIndex,
    category: &str,
    cohort_key: &str,
    rng: &mut dyn RngCore,
) -> Result<PoolEntry, PoolError> {
    index
        .get(&(category.to_string(), cohort_key.to_string()))
        .and_then(|entries| entries.choose(rng))
        .cloned()
        .ok_or_else(|| PoolError::PoolEmpty {
            category: category.to_string(),
            cohort_key: cohort_key.to_string(),
        })
}

fn counts_from_index(index: &PoolIndex, category: &str) -> HashMap<CohortKey, usize> {
    let mut counts = HashMap::new();
    for ((entry_category, cohort_key), entries) in index {
        if entry_category == category {
            counts.insert(cohort_key.clone(), entries.len());
        }
    }
    counts
}

/// Thread-safe in-memory pool store.
///
/// Readers and the appending replenisher only contend on the lock itself;
/// there is no in-place mutation to isolate.
#[derive(Default)]
pub struct InMemoryPoolStore {
    index: RwLock<PoolIndex>,
}

impl InMemoryPoolStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PoolStore for InMemoryPoolStore {
    fn size_of(&self, category: &str, cohort_key: &str) -> Result<usize, PoolError> {
        let index = self
            .index
            .read()
            .map_err(|_| PoolError::Store("pool index lock poisoned".into()))?;
        Ok(index
            .get(&(category.to_string(), cohort_key.to_string()))
            .map_or(0, Vec::len))
    }

    fn insert(&self, entry: PoolEntry) -> Result<(), PoolError> {
        let mut index = self
            .index
            .write()
            .map_err(|_| PoolError::Store("pool index lock poisoned".into()))?;
        index
            .entry((entry.category.clone(), entry.cohort_key.clone()))
            .or_default()
            .push(entry);
        Ok(())
    }

    fn sample_with(
        &self,
        category: &str,
        cohort_key: &str,
        rng: &mut dyn RngCore,
    ) -> Result<PoolEntry, PoolError> {
        let index = self
            .index
            .read()
            .map_err(|_| PoolError::Store("pool index lock poisoned".into()))?;
        sample_from_index(&index, category, cohort_key, rng)
    }

    fn cohort_counts(&self, category: &str) -> Result<HashMap<CohortKey, usize>, PoolError> {
        let index = self
            .index
            .read()
            .map_err(|_| PoolError::Store("pool index lock poisoned".into()))?;
        Ok(counts_from_index(&index, category))
    }
}

/// File-backed pool store: one JSON entry per line, append-only.
///
/// The whole file is replayed into an in-memory index on open, so reads
/// never touch the file afterwards; inserts append a line and update the
/// index under the same lock. Unreadable lines are skipped with a warning
/// rather than failing the open.
pub struct JsonlPoolStore {
    path: PathBuf,
    file: Mutex<File>,
    index: RwLock<PoolIndex>,
}

impl JsonlPoolStore {
    /// Open (or create) the store file at `path` and replay its entries.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PoolError> {
        let path = path.into();
        let mut index: PoolIndex = HashMap::new();
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for (line_no, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<PoolEntry>(&line) {
                    Ok(entry) => {
                        index
                            .entry((entry.category.clone(), entry.cohort_key.clone()))
                            .or_default()
                            .push(entry);
                    }
                    Err(err) => {
                        warn!(
                            path = %path.display(),
                            line = line_no + 1,
                            error = %err,
                            "skipping unreadable pool entry line"
                        );
                    }
                }
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
            index: RwLock::new(index),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PoolStore for JsonlPoolStore {
    fn size_of(&self, category: &str, cohort_key: &str) -> Result<usize, PoolError> {
        let index = self
            .index
            .read()
            .map_err(|_| PoolError::Store("pool index lock poisoned".into()))?;
        Ok(index
            .get(&(category.to_string(), cohort_key.to_string()))
            .map_or(0, Vec::len))
    }

    fn insert(&self, entry: PoolEntry) -> Result<(), PoolError> {
        let line = serde_json::to_string(&entry)
            .map_err(|err| PoolError::Store(format!("failed encoding pool entry: {err}")))?;
        {
            let mut file = self
                .file
                .lock()
                .map_err(|_| PoolError::Store("pool file lock poisoned".into()))?;
            writeln!(file, "{line}")?;
            file.flush()?;
        }
        let mut index = self
            .index
            .write()
            .map_err(|_| PoolError::Store("pool index lock poisoned".into()))?;
        index
            .entry((entry.category.clone(), entry.cohort_key.clone()))
            .or_default()
            .push(entry);
        Ok(())
    }

    fn sample_with(
        &self,
        category: &str,
        cohort_key: &str,
        rng: &mut dyn RngCore,
    ) -> Result<PoolEntry, PoolError> {
        let index = self
            .index
            .read()
            .map_err(|_| PoolError::Store("pool index lock poisoned".into()))?;
        sample_from_index(&index, category, cohort_key, rng)
    }

    fn cohort_counts(&self, category: &str) -> Result<HashMap<CohortKey, usize>, PoolError> {
        let index = self
            .index
            .read()
            .map_err(|_| PoolError::Store("pool index lock poisoned".into()))?;
        Ok(counts_from_index(&index, category))
    }
}
