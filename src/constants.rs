/// Constants used by cohort key canonicalization.
pub mod key {
    /// Separator between sorted `name:value` pairs in the canonical form.
    pub const PAIR_SEPARATOR: &str = "|";
    /// Separator between a dimension name and its value within one pair.
    pub const NAME_VALUE_SEPARATOR: &str = ":";
}

/// Constants used by placeholder tokens and substitution.
pub mod placeholder {
    /// Opening delimiter of a placeholder token.
    pub const OPEN: &str = "{{";
    /// Closing delimiter of a placeholder token.
    pub const CLOSE: &str = "}}";
}

/// Constants used by schema defaults and pool bounds.
pub mod schema {
    /// Default target entries per cohort when a schema does not override it.
    pub const DEFAULT_TARGET_POOL_SIZE: usize = 3;
    /// Default soft upper bound on entries per cohort.
    pub const DEFAULT_MAX_POOL_SIZE: usize = 50;
}

/// Constants used by replenishment run budgeting.
pub mod replenish {
    /// Default number of candidate cohorts considered per run.
    pub const DEFAULT_MAX_COHORTS_PER_RUN: usize = 10;
    /// Hard ceiling on candidate cohorts per run, regardless of config.
    pub const MAX_COHORTS_HARD_CAP: usize = 50;
    /// Upper bound on generation units spent on a single deficient cohort.
    pub const DEFAULT_PER_COHORT_BATCH_CAP: usize = 5;
    /// Quality score assigned to freshly generated entries.
    pub const FRESH_QUALITY_SCORE: f32 = 1.0;
}

/// Constants used by the serving-side profile bucketers.
pub mod serving {
    /// Age-group bucket labels in ascending decade order.
    pub const AGE_GROUPS: [&str; 5] = ["teens", "20s", "30s", "40s", "50s+"];
    /// Twelve-year zodiac cycle, indexed by `year % 12`.
    pub const ZODIAC_ANIMALS: [&str; 12] = [
        "monkey", "rooster", "dog", "pig", "rat", "ox", "tiger", "rabbit", "dragon", "snake",
        "horse", "goat",
    ];
    /// Five-element cycle derived from the year stem.
    pub const ELEMENTS: [&str; 5] = ["wood", "fire", "earth", "metal", "water"];
    /// Season bucket labels.
    pub const SEASONS: [&str; 4] = ["spring", "summer", "autumn", "winter"];
    /// Day-period bucket labels in chronological order.
    pub const DAY_PERIODS: [&str; 5] = ["dawn", "morning", "afternoon", "evening", "night"];
}

/// Constants used by the Gemini generator client.
#[cfg(feature = "gemini")]
pub mod gemini {
    /// Base URL for the `generateContent` endpoint family.
    pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
    /// Sampling temperature used for pool generation (high for variety).
    pub const POOL_TEMPERATURE: f32 = 0.8;
    /// Output token ceiling per generated document.
    pub const MAX_OUTPUT_TOKENS: u32 = 8192;
    /// Request timeout in seconds applied to every generator call.
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;
}
