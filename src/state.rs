use std::collections::VecDeque;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::agents::{roster, Agent};
use crate::business::BusinessUnit;
use crate::ledger::CapitalLedger;

pub const DEFAULT_MARKET_CONTEXT: &str = "Autonomous AI-driven digital services, high-scale automation";
pub const BOOT_LOGS: [&str; 2] = ["Kernel initialized.", "Waiting for goal command..."];
pub const RESET_LOGS: [&str; 2] = ["Memory Purged.", "Kernel Reinitialized."];

#[derive(Clone, Debug)]
pub struct Config {
    pub tick_secs: u64,
    pub initial_treasury: f64,
    pub initial_risk: f64,
    pub min_active_units: usize,
    pub log_capacity: usize,
    pub net_flow_pass_through: f64,
    pub market_context: String,
    pub api_key: Option<String>,
    pub gemini_base: String,
    pub gemini_model: String,
    pub gateway_timeout_secs: u64,
    /// Delay before agent narration; zero disables it
    pub narration_delay_ms: u64,
    pub evolve_scaling: bool,
    pub max_cycles: Option<u64>,
    pub dashboard_addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            tick_secs: std::env::var("TICK_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(8),
            initial_treasury: std::env::var("INITIAL_TREASURY").ok().and_then(|v| v.parse().ok()).unwrap_or(50_000.0),
            initial_risk: parse_risk(std::env::var("INITIAL_RISK").ok().as_deref()),
            min_active_units: std::env::var("MIN_ACTIVE_UNITS").ok().and_then(|v| v.parse().ok()).unwrap_or(3),
            log_capacity: std::env::var("LOG_CAPACITY").ok().and_then(|v| v.parse().ok()).unwrap_or(100),
            net_flow_pass_through: std::env::var("NET_FLOW_PASS_THROUGH").ok().and_then(|v| v.parse().ok()).unwrap_or(0.1),
            market_context: std::env::var("MARKET_CONTEXT").unwrap_or_else(|_| DEFAULT_MARKET_CONTEXT.to_string()),
            api_key: std::env::var("API_KEY").ok(),
            gemini_base: std::env::var("GEMINI_BASE").unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            gemini_model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-3-flash-preview".to_string()),
            gateway_timeout_secs: std::env::var("GATEWAY_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(30),
            narration_delay_ms: std::env::var("NARRATION_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(2000),
            evolve_scaling: std::env::var("EVOLVE_SCALING").map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes")).unwrap_or(false),
            max_cycles: std::env::var("MAX_CYCLES").ok().and_then(|v| v.parse().ok()),
            dashboard_addr: std::env::var("DASHBOARD_ADDR").unwrap_or_else(|_| "127.0.0.1:8765".to_string()),
        }
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(self.tick_secs.max(1))
    }

    pub fn narration_delay(&self) -> Option<Duration> {
        (self.narration_delay_ms > 0).then(|| Duration::from_millis(self.narration_delay_ms))
    }
}

// Risk must stay in [0, 1]; anything unparseable or non-finite falls back to 0.2.
fn parse_risk(raw: Option<&str>) -> f64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|r| r.is_finite())
        .unwrap_or(0.2)
        .clamp(0.0, 1.0)
}

pub fn now_ts() -> u64 {
    chrono::Utc::now().timestamp() as u64
}

/// Bounded terminal feed; the oldest line is dropped once full.
#[derive(Debug, Clone, PartialEq)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn seeded(capacity: usize, seed: &[&str]) -> Self {
        let mut buf = Self::new(capacity);
        for line in seed {
            buf.push(*line);
        }
        buf
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
        while self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }
}

impl Serialize for LogBuffer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.lines.iter())
    }
}

/// Whole simulation state. Replaced wholesale on every write.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimState {
    pub businesses: Vec<BusinessUnit>,
    pub capital: CapitalLedger,
    pub system_logs: LogBuffer,
    pub active_agents: Vec<Agent>,
    pub is_running: bool,
}

impl SimState {
    fn fresh(cfg: &Config, seed_logs: &[&str]) -> Self {
        Self {
            businesses: Vec::new(),
            capital: CapitalLedger::new(cfg.initial_treasury, cfg.initial_risk),
            system_logs: LogBuffer::seeded(cfg.log_capacity, seed_logs),
            active_agents: roster(),
            is_running: false,
        }
    }

    pub fn boot(cfg: &Config) -> Self {
        Self::fresh(cfg, &BOOT_LOGS)
    }

    pub fn after_reset(cfg: &Config) -> Self {
        Self::fresh(cfg, &RESET_LOGS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_buffer_drops_oldest() {
        let mut buf = LogBuffer::new(3);
        for i in 0..5 {
            buf.push(format!("line {}", i));
        }
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.iter().next(), Some("line 2"));
        assert_eq!(buf.last(), Some("line 4"));
    }

    #[test]
    fn test_log_buffer_serializes_as_array() {
        let buf = LogBuffer::seeded(10, &["a", "b"]);
        assert_eq!(serde_json::to_string(&buf).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_boot_state() {
        let cfg = Config::from_env();
        let state = SimState::boot(&cfg);
        assert!(state.businesses.is_empty());
        assert!(!state.is_running);
        assert_eq!(state.capital.treasury, cfg.initial_treasury);
        assert_eq!(state.system_logs.iter().collect::<Vec<_>>(), BOOT_LOGS.to_vec());
        assert_eq!(state.active_agents.len(), 20);
    }

    #[test]
    fn test_snapshot_keys_are_camel_case() {
        let cfg = Config::from_env();
        let json = serde_json::to_value(SimState::boot(&cfg)).unwrap();
        for key in ["businesses", "capital", "systemLogs", "activeAgents", "isRunning"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert!(json["capital"].get("totalRevenue").is_some());
    }

    #[test]
    fn test_parse_risk_rejects_non_finite() {
        assert_eq!(parse_risk(None), 0.2);
        assert_eq!(parse_risk(Some("nan")), 0.2);
        assert_eq!(parse_risk(Some("inf")), 0.2);
        assert_eq!(parse_risk(Some("-inf")), 0.2);
        assert_eq!(parse_risk(Some("bogus")), 0.2);
        assert_eq!(parse_risk(Some("1.7")), 1.0);
        assert_eq!(parse_risk(Some("-0.4")), 0.0);
        assert_eq!(parse_risk(Some(" 0.55 ")), 0.55);
    }

    #[test]
    fn test_narration_delay_zero_disables() {
        let mut cfg = Config::from_env();
        cfg.narration_delay_ms = 0;
        assert!(cfg.narration_delay().is_none());
        cfg.narration_delay_ms = 5;
        assert_eq!(cfg.narration_delay(), Some(Duration::from_millis(5)));
    }
}
