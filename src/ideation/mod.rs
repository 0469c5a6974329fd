//! Ideation gateway: the generative-text collaborator behind the swarm.
//!
//! The orchestrator only sees the [`IdeationGateway`] trait. Every failure
//! mode (transport, quota, malformed payload) surfaces as a
//! [`GenerationError`] so a cycle can log it and carry on.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::business::Metrics;
use crate::state::Config;

mod gemini;
mod offline;
pub mod parse;
pub mod prompt;

pub use gemini::GeminiGateway;
pub use offline::OfflineGateway;

/// A proposed venture, validated but not yet merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub goal: String,
    pub vision: String,
    pub mutation: String,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("gateway returned HTTP {code}: {body}")]
    Status { code: u16, body: String },
    #[error("gateway returned no text")]
    EmptyResponse,
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Transport(err.to_string())
    }
}

#[async_trait]
pub trait IdeationGateway: Send + Sync {
    /// Propose new ventures for the given financial posture.
    async fn generate_ideas(
        &self,
        market_context: &str,
        treasury: f64,
        risk: f64,
    ) -> Result<Vec<Candidate>, GenerationError>;

    /// Propose mutated expansions of an existing venture.
    async fn evolve(&self, parent_goal: &str, metrics: &Metrics) -> Result<Vec<Candidate>, GenerationError>;

    /// One-sentence narration from an agent's point of view.
    async fn perspective(&self, role: &str, goal: &str, context: &str) -> Result<String, GenerationError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatewayKind {
    Gemini,
    Offline,
}

impl GatewayKind {
    pub fn from_env() -> Self {
        match std::env::var("GATEWAY").as_deref() {
            Ok("gemini") => GatewayKind::Gemini,
            Ok("offline") => GatewayKind::Offline,
            _ => {
                if std::env::var("API_KEY").is_ok() {
                    GatewayKind::Gemini
                } else {
                    GatewayKind::Offline
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayKind::Gemini => "gemini",
            GatewayKind::Offline => "offline",
        }
    }

    pub fn build(self, cfg: &Config) -> Result<Box<dyn IdeationGateway>> {
        match self {
            GatewayKind::Gemini => Ok(Box::new(GeminiGateway::new(cfg)?)),
            GatewayKind::Offline => Ok(Box::new(OfflineGateway::new())),
        }
    }
}
