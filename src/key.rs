use sha2::{Digest, Sha256};

use crate::cohort::Cohort;
use crate::constants::key::{NAME_VALUE_SEPARATOR, PAIR_SEPARATOR};
use crate::types::CohortKey;

/// Derive the canonical key for a cohort's attribute map.
///
/// Canonical form: each attribute rendered as `name:value`, pairs sorted
/// ascending by byte order, joined with `|`, then SHA-256 in lowercase hex.
/// The key is a pure function of the attribute *set* — the order attributes
/// were inserted into the map never changes the result.
pub fn compute_key(cohort: &Cohort) -> CohortKey {
    let mut pairs: Vec<String> = cohort
        .attributes
        .iter()
        .map(|(name, value)| format!("{name}{NAME_VALUE_SEPARATOR}{value}"))
        .collect();
    pairs.sort_unstable();
    let normalized = pairs.join(PAIR_SEPARATOR);
    hex::encode(Sha256::digest(normalized.as_bytes()))
}
