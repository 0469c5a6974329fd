use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::parse::parse_candidates;
use super::prompt::{candidate_schema, evolution_prompt, ideation_prompt, perspective_prompt};
use super::{Candidate, GenerationError, IdeationGateway};
use crate::business::Metrics;
use crate::state::Config;

/// Google Generative Language `generateContent` client.
pub struct GeminiGateway {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl GeminiGateway {
    pub fn new(cfg: &Config) -> Result<Self> {
        let base = Url::parse(&cfg.gemini_base).with_context(|| format!("invalid GEMINI_BASE {}", cfg.gemini_base))?;
        let endpoint = base
            .join(&format!("v1beta/models/{}:generateContent", cfg.gemini_model))
            .context("building generateContent endpoint")?;
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.gateway_timeout_secs))
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            endpoint,
            api_key: cfg.api_key.clone(),
        })
    }

    async fn generate(&self, prompt: String, schema: Option<Value>) -> Result<String, GenerationError> {
        let key = self.api_key.as_deref().ok_or(GenerationError::MissingApiKey)?;

        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });
        if let Some(schema) = schema {
            body["generationConfig"] = json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
            });
        }

        let resp = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                code: status.as_u16(),
                body: truncate(&text, 512),
            });
        }

        let payload: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(format!("response envelope: {}", e)))?;
        payload.text().ok_or(GenerationError::EmptyResponse)
    }
}

#[derive(Deserialize, Debug, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize, Debug)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize, Debug)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[async_trait]
impl IdeationGateway for GeminiGateway {
    async fn generate_ideas(
        &self,
        market_context: &str,
        treasury: f64,
        risk: f64,
    ) -> Result<Vec<Candidate>, GenerationError> {
        let text = self
            .generate(ideation_prompt(market_context, treasury, risk), Some(candidate_schema()))
            .await?;
        parse_candidates(&text)
    }

    async fn evolve(&self, parent_goal: &str, metrics: &Metrics) -> Result<Vec<Candidate>, GenerationError> {
        let text = self
            .generate(evolution_prompt(parent_goal, metrics), Some(candidate_schema()))
            .await?;
        parse_candidates(&text)
    }

    async fn perspective(&self, role: &str, goal: &str, context: &str) -> Result<String, GenerationError> {
        let text = self.generate(perspective_prompt(role, goal, context), None).await?;
        Ok(text.trim().to_string())
    }
}
