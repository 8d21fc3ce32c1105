use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::gemini::{
    DEFAULT_BASE_URL, MAX_OUTPUT_TOKENS, POOL_TEMPERATURE, REQUEST_TIMEOUT_SECS,
};
use crate::errors::PoolError;
use crate::generator::{ContentGenerator, GenerationRequest};

/// Content generator backed by the Gemini `generateContent` API.
///
/// Requests run in JSON mode with a high temperature so repeated calls for
/// one cohort yield varied pool entries. Every call carries a timeout; any
/// transport, status, or parse failure surfaces as a recoverable
/// [`PoolError::Generator`] unit failure.
pub struct GeminiGenerator {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    client: Client,
}

impl GeminiGenerator {
    /// Create a generator for `model` authenticated with `api_key`.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, PoolError> {
        let api_key = api_key.into();
        let model = model.into();
        if api_key.trim().is_empty() {
            return Err(PoolError::Configuration(
                "gemini api key must not be empty".into(),
            ));
        }
        if model.trim().is_empty() {
            return Err(PoolError::Configuration(
                "gemini model must not be empty".into(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|err| PoolError::Configuration(format!("failed building HTTP client: {err}")))?;
        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model,
            temperature: POOL_TEMPERATURE,
            client,
        })
    }

    /// Override the API base URL (local proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn call_api(&self, prompt: String, category: &str) -> Result<String, PoolError> {
        let endpoint = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let payload = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: MAX_OUTPUT_TOKENS,
                response_mime_type: "application/json".to_string(),
            },
        };

        let unit_error = |reason: String| PoolError::Generator {
            category: category.to_string(),
            reason,
        };

        let response = self
            .client
            .post(&endpoint)
            .json(&payload)
            .send()
            .map_err(|err| unit_error(format!("gemini request failed: {err}")))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|err| unit_error(format!("failed reading gemini response body: {err}")))?;
        if !status.is_success() {
            return Err(unit_error(format!("gemini API returned {status}: {body}")));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|err| unit_error(format!("invalid gemini response format: {err}")))?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| unit_error("no candidates in gemini response".to_string()))?;
        Ok(text)
    }
}

impl ContentGenerator for GeminiGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<Value, PoolError> {
        let prompt = build_prompt(request);
        let raw = self.call_api(prompt, request.category)?;
        let trimmed = extract_json(&raw).ok_or_else(|| PoolError::Generator {
            category: request.category.to_string(),
            reason: "gemini reply contained no JSON object".to_string(),
        })?;
        serde_json::from_str(trimmed).map_err(|err| PoolError::Generator {
            category: request.category.to_string(),
            reason: format!("gemini reply was not valid JSON: {err}"),
        })
    }
}

/// Assemble the single user-turn prompt for one generation unit.
fn build_prompt(request: &GenerationRequest<'_>) -> String {
    let shape = serde_json::to_string_pretty(request.response_shape)
        .unwrap_or_else(|_| request.response_shape.to_string());
    format!(
        "{instruction}\n\n\
         Generate one {category} document for a user cohort with the traits below.\n\n\
         Cohort traits: {description}\n\n\
         Rules:\n\
         1. Keep every placeholder token (such as {{{{userName}}}}) exactly as written.\n\
         2. Follow the response schema exactly.\n\
         3. Reply with valid JSON only.\n\n\
         Response schema:\n{shape}",
        instruction = request.instruction,
        category = request.category,
        description = request.cohort.description(),
    )
}

/// Trim a model reply down to its outermost JSON object, if any.
///
/// Models occasionally wrap JSON-mode output in prose or code fences; the
/// span between the first `{` and the last `}` is handed to the parser.
fn extract_json(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}
