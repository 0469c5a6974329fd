use async_trait::async_trait;
use rand::seq::SliceRandom;

use super::prompt::{budget_label, risk_label};
use super::{Candidate, GenerationError, IdeationGateway};
use crate::business::Metrics;

const IDEAS: &[(&str, &str)] = &[
    ("Invoice Autopilot", "Reconcile SMB invoices end to end without a bookkeeper."),
    ("Churn Oracle", "Predict and rescue at-risk subscribers for SaaS teams."),
    ("Compliance Copilot", "Keep startups audit-ready with continuous policy checks."),
    ("Listing Forge", "Generate and A/B test marketplace listings at scale."),
    ("Support Mesh", "Resolve tier-1 tickets across every channel automatically."),
    ("Grant Finder", "Match researchers to open funding calls and draft applications."),
    ("Menu Pricing Engine", "Tune restaurant prices daily from demand signals."),
    ("Code Review Relay", "Ship reviewed pull requests around the clock."),
];

const NARRATION: &[&str] = &[
    "Rebalancing spend toward the highest-margin funnel.",
    "Cutting infra cost by consolidating idle workers.",
    "Drafting the next pricing experiment for review.",
    "Patching the onboarding flow where users drop off.",
    "Auditing data retention against the latest policy.",
];

/// Canned gateway for running without network access.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGateway;

impl OfflineGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IdeationGateway for OfflineGateway {
    async fn generate_ideas(
        &self,
        _market_context: &str,
        treasury: f64,
        risk: f64,
    ) -> Result<Vec<Candidate>, GenerationError> {
        let mutation = format!("Chosen for {} under {}", budget_label(treasury), risk_label(risk));
        let picks: Vec<Candidate> = IDEAS
            .choose_multiple(&mut rand::thread_rng(), 3)
            .map(|(goal, vision)| Candidate {
                goal: goal.to_string(),
                vision: vision.to_string(),
                mutation: mutation.clone(),
            })
            .collect();
        Ok(picks)
    }

    async fn evolve(&self, parent_goal: &str, metrics: &Metrics) -> Result<Vec<Candidate>, GenerationError> {
        Ok(["Enterprise", "Marketplace"]
            .iter()
            .map(|tier| Candidate {
                goal: format!("{} {}", parent_goal, tier),
                vision: format!("Take {} upmarket as a {} offering.", parent_goal, tier.to_lowercase()),
                mutation: format!("Vertical expansion from {} users", metrics.users),
            })
            .collect())
    }

    async fn perspective(&self, role: &str, _goal: &str, _context: &str) -> Result<String, GenerationError> {
        let line = NARRATION.choose(&mut rand::thread_rng()).copied().unwrap_or("Standing by.");
        Ok(format!("[{}] {}", role, line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_ideas_are_distinct() {
        let gw = OfflineGateway::new();
        let ideas = gw.generate_ideas("ctx", 50_000.0, 0.2).await.unwrap();
        assert_eq!(ideas.len(), 3);
        assert_ne!(ideas[0].goal, ideas[1].goal);
        assert!(ideas[0].mutation.contains("Conservative/Lean"));
    }

    #[tokio::test]
    async fn test_offline_evolve_names_parent() {
        let gw = OfflineGateway::new();
        let out = gw.evolve("Churn Oracle", &Metrics::default()).await.unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|c| c.goal.starts_with("Churn Oracle")));
    }
}
