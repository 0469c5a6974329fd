//! Prompt text and response schema for the generative API.

use serde_json::{json, Value};

use crate::business::Metrics;

pub fn risk_label(risk: f64) -> &'static str {
    if risk > 0.7 {
        "Aggressive/Moonshot"
    } else if risk > 0.3 {
        "Moderate/Scaling"
    } else {
        "Conservative/Lean"
    }
}

pub fn budget_label(treasury: f64) -> &'static str {
    if treasury > 100_000.0 {
        "High Liquidity (Invest heavily)"
    } else if treasury > 20_000.0 {
        "Stable (Moderate investment)"
    } else {
        "Low Capital (Bootstrap/Lean focus)"
    }
}

pub fn ideation_prompt(market_context: &str, treasury: f64, risk: f64) -> String {
    format!(
        "You are an AI Venture Capitalist managing an autonomous swarm.\n\
         CURRENT FINANCIAL PROFILE:\n\
         - Treasury: ${:.2}\n\
         - Risk Tolerance: {:.2} ({})\n\
         - Budget Context: {}\n\
         \n\
         Market Context: {}.\n\
         \n\
         Propose 3 new high-potential autonomous business goals that are strategically aligned with this profile.\n\
         If treasury is low, focus on high-margin, low-overhead software automation.\n\
         If treasury is high and risk is high, propose ambitious, capital-intensive vertical integrations or experimental AI ventures.",
        treasury,
        risk,
        risk_label(risk),
        budget_label(treasury),
        market_context,
    )
}

pub fn evolution_prompt(parent_goal: &str, metrics: &Metrics) -> String {
    let metrics_json = json!({
        "users": metrics.users,
        "revenue": metrics.revenue,
        "cost": metrics.cost,
    });
    format!(
        "Evolution Strategist AI. Parent Goal: {}. Metrics: {}. Generate 2 mutated vertical expansions.",
        parent_goal, metrics_json
    )
}

pub fn perspective_prompt(role: &str, goal: &str, context: &str) -> String {
    format!(
        "Role: {}. Goal: {}. Context: {}. Provide a 1-sentence specific action or insight you are taking now.",
        role, goal, context
    )
}

/// Structured-output schema: array of `{goal, vision, mutation}`.
pub fn candidate_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "goal": { "type": "STRING", "description": "Short, punchy business goal name" },
                "vision": { "type": "STRING", "description": "1-sentence strategic vision" },
                "mutation": { "type": "STRING", "description": "The strategic reason this was chosen based on current capital/risk" }
            },
            "required": ["goal", "vision", "mutation"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_label_bands() {
        assert_eq!(risk_label(0.2), "Conservative/Lean");
        assert_eq!(risk_label(0.3), "Conservative/Lean");
        assert_eq!(risk_label(0.5), "Moderate/Scaling");
        assert_eq!(risk_label(0.7), "Moderate/Scaling");
        assert_eq!(risk_label(0.9), "Aggressive/Moonshot");
    }

    #[test]
    fn test_budget_label_bands() {
        assert_eq!(budget_label(-5.0), "Low Capital (Bootstrap/Lean focus)");
        assert_eq!(budget_label(20_000.0), "Low Capital (Bootstrap/Lean focus)");
        assert_eq!(budget_label(50_000.0), "Stable (Moderate investment)");
        assert_eq!(budget_label(150_000.0), "High Liquidity (Invest heavily)");
    }

    #[test]
    fn test_ideation_prompt_embeds_profile() {
        let p = ideation_prompt("robotics", 50_000.0, 0.2);
        assert!(p.contains("Treasury: $50000.00"));
        assert!(p.contains("Risk Tolerance: 0.20 (Conservative/Lean)"));
        assert!(p.contains("Stable (Moderate investment)"));
        assert!(p.contains("Market Context: robotics."));
    }

    #[test]
    fn test_evolution_prompt_embeds_metrics() {
        let m = Metrics { users: 12, revenue: 3.5, cost: 1.0 };
        let p = evolution_prompt("Parent", &m);
        assert!(p.contains("Parent Goal: Parent."));
        assert!(p.contains("\"users\":12"));
    }

    #[test]
    fn test_schema_requires_all_fields() {
        let schema = candidate_schema();
        let required = schema["items"]["required"].as_array().unwrap();
        assert_eq!(required.len(), 3);
    }
}
