use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::CohortSchema;
use crate::types::{DimensionName, DimensionValue};

/// One concrete assignment of exactly one value per schema dimension.
///
/// Attribute order is the schema's declaration order when produced by
/// [`enumerate`]; the derived cohort key is order-independent either way.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    /// Dimension-to-value assignments.
    pub attributes: IndexMap<DimensionName, DimensionValue>,
}

impl Cohort {
    /// Create an empty cohort (zero dimensions).
    pub fn new() -> Self {
        Self {
            attributes: IndexMap::new(),
        }
    }

    /// Build a cohort from `(name, value)` pairs, preserving pair order.
    pub fn from_pairs<N, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<DimensionName>,
        V: Into<DimensionValue>,
    {
        Self {
            attributes: pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    /// Render the human-readable description handed to the generator,
    /// for example `period: morning, element: fire`.
    pub fn description(&self) -> String {
        let parts: Vec<String> = self
            .attributes
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect();
        parts.join(", ")
    }
}

impl Default for Cohort {
    fn default() -> Self {
        Self::new()
    }
}

/// Enumerate every cohort a schema implies, in canonical order.
///
/// Ordering is the lexicographic product of the schema's declarations:
/// dimensions in declaration order with the last dimension varying fastest,
/// values in declaration order within each dimension. The returned iterator
/// is exact-size, so callers may `take` a bounded slice of the head — the
/// replenisher's per-run candidate window relies on this.
pub fn enumerate(schema: &CohortSchema) -> CohortEnumeration {
    let dimensions: Vec<(DimensionName, Vec<DimensionValue>)> = schema
        .dimensions
        .iter()
        .map(|(name, values)| (name.clone(), values.clone()))
        .collect();
    let remaining = if dimensions.iter().any(|(_, values)| values.is_empty()) {
        0
    } else {
        dimensions.iter().map(|(_, values)| values.len()).product()
    };
    CohortEnumeration {
        indices: vec![0; dimensions.len()],
        dimensions,
        remaining,
    }
}

/// Deterministic odometer over a schema's cohort space.
pub struct CohortEnumeration {
    dimensions: Vec<(DimensionName, Vec<DimensionValue>)>,
    indices: Vec<usize>,
    remaining: usize,
}

impl Iterator for CohortEnumeration {
    type Item = Cohort;

    fn next(&mut self) -> Option<Cohort> {
        if self.remaining == 0 {
            return None;
        }
        let cohort = Cohort {
            attributes: self
                .dimensions
                .iter()
                .zip(&self.indices)
                .map(|((name, values), idx)| (name.clone(), values[*idx].clone()))
                .collect(),
        };
        self.remaining -= 1;
        // Last dimension ticks fastest, carrying leftwards like an odometer.
        for slot in (0..self.dimensions.len()).rev() {
            self.indices[slot] += 1;
            if self.indices[slot] < self.dimensions[slot].1.len() {
                break;
            }
            self.indices[slot] = 0;
        }
        Some(cohort)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for CohortEnumeration {}
