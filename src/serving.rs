//! Serve-time cohort mapping, pool sampling, and placeholder substitution.
//!
//! The serving read path is independent of and concurrent with replenisher
//! writes: it derives the cohort key, samples one pooled template, and
//! substitutes placeholders with the live user's values. On an empty pool
//! the error is surfaced — fallback generation is the caller's policy, not
//! this engine's.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use rand::RngCore;
use serde_json::Value;

use crate::cohort::Cohort;
use crate::constants::serving::{AGE_GROUPS, DAY_PERIODS, ELEMENTS, SEASONS, ZODIAC_ANIMALS};
use crate::errors::PoolError;
use crate::key::compute_key;
use crate::pool::PoolStore;
use crate::schema::SchemaRegistry;
use crate::types::PlaceholderToken;

/// Decade bucket for a birth date as of `today`.
pub fn age_group(birth_date: NaiveDate, today: NaiveDate) -> &'static str {
    let age = today.year() - birth_date.year();
    if age < 20 {
        AGE_GROUPS[0]
    } else if age < 30 {
        AGE_GROUPS[1]
    } else if age < 40 {
        AGE_GROUPS[2]
    } else if age < 50 {
        AGE_GROUPS[3]
    } else {
        AGE_GROUPS[4]
    }
}

/// Twelve-cycle zodiac animal for a birth year.
pub fn zodiac_animal(year: i32) -> &'static str {
    ZODIAC_ANIMALS[year.rem_euclid(12) as usize]
}

/// Five-element bucket derived from a birth year's stem.
pub fn element(year: i32) -> &'static str {
    let stem = (year - 4).rem_euclid(10);
    ELEMENTS[(stem / 2) as usize]
}

/// Season bucket for a calendar month (1-12).
pub fn season(month: u32) -> &'static str {
    match month {
        3..=5 => SEASONS[0],
        6..=8 => SEASONS[1],
        9..=11 => SEASONS[2],
        _ => SEASONS[3],
    }
}

/// Day-period bucket for an hour of day (0-23).
pub fn day_period(hour: u32) -> &'static str {
    if hour < 6 {
        DAY_PERIODS[0]
    } else if hour < 12 {
        DAY_PERIODS[1]
    } else if hour < 18 {
        DAY_PERIODS[2]
    } else if hour < 21 {
        DAY_PERIODS[3]
    } else {
        DAY_PERIODS[4]
    }
}

/// Canonical daily-content cohort for one user: current day period plus the
/// zodiac and element buckets of the birth year.
pub fn daily_cohort(birth_date: NaiveDate, now: DateTime<Utc>) -> Cohort {
    Cohort::from_pairs([
        ("period", day_period(now.hour())),
        ("zodiac", zodiac_animal(birth_date.year())),
        ("element", element(birth_date.year())),
    ])
}

/// Substitute placeholder tokens with user values throughout a document.
///
/// Straightforward text substitution inside every string field (arrays and
/// objects are walked; numbers and booleans are untouched) — not a template
/// language. Tokens keep their delimiters in the replacement map, for
/// example `{{userName}} -> "Casey"`. Unknown tokens are left in place.
pub fn personalize(template: &Value, replacements: &HashMap<PlaceholderToken, String>) -> Value {
    match template {
        Value::String(text) => {
            let mut resolved = text.clone();
            for (token, value) in replacements {
                if resolved.contains(token.as_str()) {
                    resolved = resolved.replace(token.as_str(), value);
                }
            }
            Value::String(resolved)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| personalize(item, replacements))
                .collect(),
        ),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, field)| (name.clone(), personalize(field, replacements)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Read-side engine: cohort key derivation, pool sampling, personalization.
pub struct ServingEngine {
    registry: Arc<dyn SchemaRegistry>,
    store: Arc<dyn PoolStore>,
}

impl ServingEngine {
    /// Wire a serving engine from its read-only collaborators.
    pub fn new(registry: Arc<dyn SchemaRegistry>, store: Arc<dyn PoolStore>) -> Self {
        Self { registry, store }
    }

    /// Serve one personalized document using the supplied randomness.
    ///
    /// The cohort must assign exactly the schema's dimensions to allowed
    /// values; anything else would derive a key no replenisher ever fills.
    /// Serving still reads pools of schemas that have since gone inactive.
    pub fn serve_with(
        &self,
        category: &str,
        cohort: &Cohort,
        replacements: &HashMap<PlaceholderToken, String>,
        rng: &mut dyn RngCore,
    ) -> Result<Value, PoolError> {
        let schema = self
            .registry
            .schema(category)
            .ok_or_else(|| PoolError::SchemaNotFound {
                category: category.to_string(),
            })?;
        for (name, values) in &schema.dimensions {
            match cohort.attributes.get(name) {
                Some(value) if values.contains(value) => {}
                Some(value) => {
                    return Err(PoolError::Configuration(format!(
                        "cohort value '{value}' is not allowed for dimension '{name}'"
                    )));
                }
                None => {
                    return Err(PoolError::Configuration(format!(
                        "cohort is missing dimension '{name}'"
                    )));
                }
            }
        }
        if cohort.attributes.len() != schema.dimensions.len() {
            return Err(PoolError::Configuration(format!(
                "cohort assigns {} dimensions, schema '{category}' declares {}",
                cohort.attributes.len(),
                schema.dimensions.len()
            )));
        }

        let cohort_key = compute_key(cohort);
        let entry = self.store.sample_with(category, &cohort_key, rng)?;
        Ok(personalize(&entry.template, replacements))
    }

    /// Serve one personalized document using thread-local randomness.
    pub fn serve(
        &self,
        category: &str,
        cohort: &Cohort,
        replacements: &HashMap<PlaceholderToken, String>,
    ) -> Result<Value, PoolError> {
        self.serve_with(category, cohort, replacements, &mut rand::rng())
    }
}
