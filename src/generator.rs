//! Content generator contract and generation-side validation.
//!
//! The generator is an external collaborator: latency-bearing,
//! non-deterministic, and occasionally failing. Callers never assume two
//! calls for the same cohort produce the same document — variety across a
//! cohort's pool entries is intentional. Everything a generator returns is
//! validated at this boundary before it may enter a pool.

use std::collections::HashMap;

use serde_json::Value;

use crate::cohort::Cohort;
use crate::errors::PoolError;
use crate::schema::CohortSchema;
use crate::types::CategoryId;

/// Gemini-backed generator client.
#[cfg(feature = "gemini")]
pub mod gemini;

/// One generation unit: everything a generator needs to produce a single
/// placeholder-preserving document for one cohort.
#[derive(Clone, Debug)]
pub struct GenerationRequest<'a> {
    /// Category the document is for.
    pub category: &'a str,
    /// Category instruction text; contains literal placeholder tokens the
    /// generator must leave untouched.
    pub instruction: &'a str,
    /// JSON skeleton the returned document must follow.
    pub response_shape: &'a Value,
    /// The cohort being generated for.
    pub cohort: &'a Cohort,
}

/// Produces one structured, placeholder-preserving document per call.
///
/// Implementations should apply their own timeouts; a failed call is a unit
/// failure the replenisher recovers from, never a run abort.
pub trait ContentGenerator: Send + Sync {
    /// Generate one document for the request's cohort.
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<Value, PoolError>;
}

/// Instruction text and response shape for one category.
#[derive(Clone, Debug)]
pub struct CategoryPrompt {
    /// Instruction handed to the generator verbatim.
    pub instruction: String,
    /// JSON skeleton the generated document must follow.
    pub response_shape: Value,
}

impl CategoryPrompt {
    /// Create a prompt from instruction text and a response shape.
    pub fn new(instruction: impl Into<String>, response_shape: Value) -> Self {
        Self {
            instruction: instruction.into(),
            response_shape,
        }
    }
}

/// Per-category prompt lookup with a mandatory fallback.
///
/// A category without a dedicated prompt falls back rather than failing, so
/// prompt coverage can lag schema rollout without blocking replenishment.
pub struct PromptCatalog {
    prompts: HashMap<CategoryId, CategoryPrompt>,
    fallback: CategoryPrompt,
}

impl PromptCatalog {
    /// Create a catalog that answers every lookup with `fallback` until
    /// dedicated prompts are registered.
    pub fn new(fallback: CategoryPrompt) -> Self {
        Self {
            prompts: HashMap::new(),
            fallback,
        }
    }

    /// Register a dedicated prompt for one category.
    pub fn register(&mut self, category: impl Into<CategoryId>, prompt: CategoryPrompt) {
        self.prompts.insert(category.into(), prompt);
    }

    /// Return the prompt for `category`, or the fallback.
    pub fn lookup(&self, category: &str) -> &CategoryPrompt {
        self.prompts.get(category).unwrap_or(&self.fallback)
    }
}

/// Check that a generated document preserves every placeholder the schema
/// declares, verbatim and unresolved.
///
/// A document that dropped or substituted a token must never enter the pool;
/// the violation is reported as a generator-side unit failure.
pub fn validate_template(schema: &CohortSchema, document: &Value) -> Result<(), PoolError> {
    for token in &schema.placeholders {
        if !value_contains_token(document, token) {
            return Err(PoolError::Generator {
                category: schema.category.clone(),
                reason: format!("generated document lost placeholder '{token}'"),
            });
        }
    }
    Ok(())
}

fn value_contains_token(value: &Value, token: &str) -> bool {
    match value {
        Value::String(text) => text.contains(token),
        Value::Array(items) => items.iter().any(|item| value_contains_token(item, token)),
        Value::Object(fields) => fields
            .values()
            .any(|field| value_contains_token(field, token)),
        _ => false,
    }
}
