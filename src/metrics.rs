use std::collections::HashMap;

use crate::types::CohortKey;

/// Aggregate fill statistics for one category's cohort pools.
#[derive(Clone, Debug, PartialEq)]
pub struct PoolCoverage {
    /// Total entries across all filled cohorts.
    pub entries: usize,
    /// Number of cohorts with at least one entry.
    pub cohorts: usize,
    /// Smallest per-cohort entry count.
    pub min: usize,
    /// Largest per-cohort entry count.
    pub max: usize,
    /// Mean entries per filled cohort.
    pub mean: f64,
    /// Per-cohort fill, sorted emptiest-first for operator inspection.
    pub per_cohort: Vec<CohortFill>,
}

/// One cohort's share of a category's pool.
#[derive(Clone, Debug, PartialEq)]
pub struct CohortFill {
    /// Cohort key.
    pub cohort_key: CohortKey,
    /// Entry count for this cohort.
    pub count: usize,
    /// Fraction of the category's total entries.
    pub share: f64,
}

/// Compute coverage statistics from per-cohort entry counts, as returned by
/// [`PoolStore::cohort_counts`](crate::pool::PoolStore::cohort_counts).
pub fn pool_coverage(counts: &HashMap<CohortKey, usize>) -> Option<PoolCoverage> {
    if counts.is_empty() {
        return None;
    }
    let entries: usize = counts.values().sum();
    let cohorts = counts.len();
    let min = *counts.values().min().expect("counts non-empty");
    let max = *counts.values().max().expect("counts non-empty");
    let mean = entries as f64 / cohorts as f64;
    let mut per_cohort: Vec<CohortFill> = counts
        .iter()
        .map(|(cohort_key, count)| CohortFill {
            cohort_key: cohort_key.clone(),
            count: *count,
            share: if entries == 0 {
                0.0
            } else {
                *count as f64 / entries as f64
            },
        })
        .collect();
    per_cohort.sort_by(|a, b| {
        a.count
            .cmp(&b.count)
            .then_with(|| a.cohort_key.cmp(&b.cohort_key))
    });
    Some(PoolCoverage {
        entries,
        cohorts,
        min,
        max,
        mean,
        per_cohort,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_reports_balanced_pools() {
        let mut counts = HashMap::new();
        counts.insert("a".to_string(), 3);
        counts.insert("b".to_string(), 3);
        let coverage = pool_coverage(&counts).expect("coverage");
        assert_eq!(coverage.entries, 6);
        assert_eq!(coverage.cohorts, 2);
        assert_eq!(coverage.min, 3);
        assert_eq!(coverage.max, 3);
        assert!((coverage.mean - 3.0).abs() < 1e-9);
        assert!(
            coverage
                .per_cohort
                .iter()
                .all(|fill| (fill.share - 0.5).abs() < 1e-9)
        );
    }

    #[test]
    fn coverage_lists_the_emptiest_cohorts_first() {
        let mut counts = HashMap::new();
        counts.insert("warm".to_string(), 5);
        counts.insert("starved".to_string(), 1);
        counts.insert("cool".to_string(), 2);
        let coverage = pool_coverage(&counts).expect("coverage");
        assert_eq!(coverage.per_cohort[0].cohort_key, "starved");
        assert_eq!(coverage.per_cohort[2].cohort_key, "warm");
        assert_eq!(coverage.min, 1);
        assert_eq!(coverage.max, 5);
    }

    #[test]
    fn coverage_of_nothing_is_none() {
        assert_eq!(pool_coverage(&HashMap::new()), None);
    }
}
