//! Itinerary generation through the Gemini API
//!
//! Unlike weather and geocoding, a failure here is returned to the caller:
//! without itinerary text there is nothing to plan.

use crate::TripPlannerError;
use crate::models::{TransportPreference, TripRequest};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};

#[async_trait]
pub trait ItineraryGenerator: Send + Sync {
    /// Turn a prompt into itinerary text
    async fn generate(&self, prompt: &str) -> crate::Result<String>;
}

/// Build the natural-language request sent to the model
#[must_use]
pub fn compose_prompt(request: &TripRequest, budget_usd: f64) -> String {
    let modes = TransportPreference::modes()
        .map(|mode| mode.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Plan a detailed trip from {} to {} starting on {} for {} days. \
         Include travel options ({modes}), \
         accommodation suggestions (within ${budget_usd:.2} total budget in USD), \
         top attractions with estimated costs, and daily itinerary. \
         Preferred transport: {}",
        request.source,
        request.destination,
        request.travel_date.format("%Y-%m-%d"),
        request.duration_days,
        request.transport_preference,
    )
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl GenerateContentResponse {
    fn into_text(self) -> crate::Result<String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(TripPlannerError::generation(format!(
                "prompt was blocked ({reason})"
            )));
        }

        let text = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(TripPlannerError::generation("model returned no text"));
        }
        Ok(text)
    }
}

/// Gemini `generateContent` client; one call per itinerary, no streaming
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tripplanner/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl ItineraryGenerator for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> crate::Result<String> {
        let start_time = Instant::now();
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!("Gemini request URL: {}", url);

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini request failed: {}", e);
                if e.is_timeout() {
                    TripPlannerError::generation("request timed out")
                } else {
                    TripPlannerError::generation(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ApiErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Unknown error").to_string());
            error!("Gemini API returned {}: {}", status, detail);
            return Err(TripPlannerError::generation(format!(
                "HTTP {}: {detail}",
                status.as_u16()
            )));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            TripPlannerError::generation(format!("invalid response body: {e}"))
        })?;
        let text = parsed.into_text()?;

        info!(
            "Generated itinerary ({} chars) in {:.3}s",
            text.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(text)
    }
}
