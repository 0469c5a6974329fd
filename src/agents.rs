//! Agent roster shown alongside the business collection.
//!
//! Agents are cosmetic: their status and last message change, nothing else
//! in the simulation reads them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    #[serde(rename = "CEO")]
    Ceo,
    #[serde(rename = "COO")]
    Coo,
    #[serde(rename = "CTO")]
    Cto,
    #[serde(rename = "PM")]
    Pm,
    #[serde(rename = "UXR")]
    Uxr,
    #[serde(rename = "UXD")]
    Uxd,
    Frontend,
    Backend,
    #[serde(rename = "AI")]
    Ai,
    Data,
    Growth,
    Marketing,
    Sales,
    Finance,
    Legal,
    Security,
    #[serde(rename = "QA")]
    Qa,
    DevOps,
    Optimizer,
    Evolution,
}

pub const ROLES: [AgentRole; 20] = [
    AgentRole::Ceo,
    AgentRole::Coo,
    AgentRole::Cto,
    AgentRole::Pm,
    AgentRole::Uxr,
    AgentRole::Uxd,
    AgentRole::Frontend,
    AgentRole::Backend,
    AgentRole::Ai,
    AgentRole::Data,
    AgentRole::Growth,
    AgentRole::Marketing,
    AgentRole::Sales,
    AgentRole::Finance,
    AgentRole::Legal,
    AgentRole::Security,
    AgentRole::Qa,
    AgentRole::DevOps,
    AgentRole::Optimizer,
    AgentRole::Evolution,
];

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Ceo => "CEO",
            AgentRole::Coo => "COO",
            AgentRole::Cto => "CTO",
            AgentRole::Pm => "PM",
            AgentRole::Uxr => "UXR",
            AgentRole::Uxd => "UXD",
            AgentRole::Frontend => "Frontend",
            AgentRole::Backend => "Backend",
            AgentRole::Ai => "AI",
            AgentRole::Data => "Data",
            AgentRole::Growth => "Growth",
            AgentRole::Marketing => "Marketing",
            AgentRole::Sales => "Sales",
            AgentRole::Finance => "Finance",
            AgentRole::Legal => "Legal",
            AgentRole::Security => "Security",
            AgentRole::Qa => "QA",
            AgentRole::DevOps => "DevOps",
            AgentRole::Optimizer => "Optimizer",
            AgentRole::Evolution => "Evolution",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            AgentRole::Ceo => "CEO Agent",
            AgentRole::Coo => "COO Agent",
            AgentRole::Cto => "CTO Agent",
            AgentRole::Pm => "Product Manager Agent",
            AgentRole::Uxr => "UX Research Agent",
            AgentRole::Uxd => "UX Designer Agent",
            AgentRole::Frontend => "Frontend Agent",
            AgentRole::Backend => "Backend Agent",
            AgentRole::Ai => "AI Engineer Agent",
            AgentRole::Data => "Data Agent",
            AgentRole::Growth => "Growth Agent",
            AgentRole::Marketing => "Marketing Agent",
            AgentRole::Sales => "Sales Agent",
            AgentRole::Finance => "Finance Agent",
            AgentRole::Legal => "Legal Agent",
            AgentRole::Security => "Security Agent",
            AgentRole::Qa => "QA Agent",
            AgentRole::DevOps => "DevOps Agent",
            AgentRole::Optimizer => "Optimizer Agent",
            AgentRole::Evolution => "Evolution Agent",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgentRole::Ceo => "Vision & KPI Alignment",
            AgentRole::Coo => "Workflow Automation",
            AgentRole::Cto => "System Architecture",
            AgentRole::Pm => "PRD & Roadmap",
            AgentRole::Uxr => "User Psychology",
            AgentRole::Uxd => "Flow & Wireframes",
            AgentRole::Frontend => "UI Implementation",
            AgentRole::Backend => "API & Business Logic",
            AgentRole::Ai => "Prompt & Model Ops",
            AgentRole::Data => "Schema & Analytics",
            AgentRole::Growth => "Viral & SEO",
            AgentRole::Marketing => "Content Strategy",
            AgentRole::Sales => "Monetization Funnel",
            AgentRole::Finance => "Cost & Pricing",
            AgentRole::Legal => "Compliance",
            AgentRole::Security => "Threat Modeling",
            AgentRole::Qa => "Bug Detection",
            AgentRole::DevOps => "Deploy & Scale",
            AgentRole::Optimizer => "Performance Tuning",
            AgentRole::Evolution => "Self Improvement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Thinking,
    Executing,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub role: AgentRole,
    pub full_name: String,
    pub description: String,
    pub status: AgentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
}

impl Agent {
    pub fn idle(role: AgentRole) -> Self {
        Self {
            role,
            full_name: role.full_name().to_string(),
            description: role.description().to_string(),
            status: AgentStatus::Idle,
            last_message: None,
        }
    }
}

/// Every role, idle, in roster order.
pub fn roster() -> Vec<Agent> {
    ROLES.iter().copied().map(Agent::idle).collect()
}

/// Set `role`'s status; `message` replaces the last message only when given.
pub fn set_status(agents: &mut [Agent], role: AgentRole, status: AgentStatus, message: Option<String>) {
    if let Some(agent) = agents.iter_mut().find(|a| a.role == role) {
        agent.status = status;
        if message.is_some() {
            agent.last_message = message;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_is_complete_and_idle() {
        let agents = roster();
        assert_eq!(agents.len(), 20);
        assert!(agents.iter().all(|a| a.status == AgentStatus::Idle));
        assert_eq!(agents[19].role, AgentRole::Evolution);
        assert_eq!(agents[3].full_name, "Product Manager Agent");
        assert_eq!(agents[3].description, "PRD & Roadmap");
    }

    #[test]
    fn test_set_status_keeps_message_when_none() {
        let mut agents = roster();
        set_status(&mut agents, AgentRole::Cto, AgentStatus::Idle, Some("shipped".into()));
        set_status(&mut agents, AgentRole::Cto, AgentStatus::Thinking, None);
        let cto = agents.iter().find(|a| a.role == AgentRole::Cto).unwrap();
        assert_eq!(cto.status, AgentStatus::Thinking);
        assert_eq!(cto.last_message.as_deref(), Some("shipped"));
    }

    #[test]
    fn test_role_serializes_as_label() {
        assert_eq!(serde_json::to_string(&AgentRole::Qa).unwrap(), "\"QA\"");
        assert_eq!(serde_json::to_string(&AgentRole::DevOps).unwrap(), "\"DevOps\"");
        for role in ROLES {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
    }
}
