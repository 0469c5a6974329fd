//! Lifecycle engine: one random-walk step per unit per cycle.
//!
//! ```text
//! ideation ──► building ──(p≈0.4)──► launched ──(margin & users)──► scaling
//!     │            │                     │                            │
//!     └────────────┴──── cost > floor && revenue < cost × ratio ──────┴──► killed
//! ```
//!
//! The termination check runs after the status-specific update and reads the
//! post-update metrics. `Killed` is terminal: such units are copied through
//! untouched and consume no random draws.

use crate::business::{BusinessStatus, BusinessUnit};
use crate::rng::RandomSource;

#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    // === ideation ===
    pub ideation_cost_max: f64,

    // === building ===
    pub building_cost_max: f64,
    /// Draw must exceed this to launch
    pub launch_threshold: f64,

    // === launched ===
    pub launched_user_max: u64,
    pub launched_arpu_max: f64,
    pub launched_cost_max: f64,
    /// Revenue must exceed cost times this to scale
    pub scale_margin: f64,
    pub scale_min_users: u64,

    // === scaling ===
    pub scaling_user_max: u64,
    pub scaling_arpu_max: f64,
    /// Share of cumulative revenue added to cost each step
    pub scaling_cost_ratio: f64,

    // === termination ===
    pub kill_cost_floor: f64,
    pub kill_revenue_ratio: f64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            ideation_cost_max: 5000.0,

            building_cost_max: 2000.0,
            launch_threshold: 0.6,

            launched_user_max: 1000,
            launched_arpu_max: 2.0,
            launched_cost_max: 800.0,
            scale_margin: 2.0,
            scale_min_users: 5000,

            scaling_user_max: 5000,
            scaling_arpu_max: 1.5,
            scaling_cost_ratio: 0.4,

            kill_cost_floor: 20_000.0,
            kill_revenue_ratio: 0.3,
        }
    }
}

/// A status change observed during a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub id: String,
    pub goal: String,
    pub from: BusinessStatus,
    pub to: BusinessStatus,
}

impl Transition {
    pub fn is_termination(&self) -> bool {
        self.to == BusinessStatus::Killed
    }
}

#[derive(Debug, Clone, Default)]
pub struct LifecyclePass {
    pub units: Vec<BusinessUnit>,
    pub transitions: Vec<Transition>,
}

impl LifecyclePass {
    pub fn terminations(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(|t| t.is_termination())
    }

    pub fn entered(&self, status: BusinessStatus) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(move |t| t.to == status)
    }
}

/// Terminal-log line for a killed unit.
pub fn termination_message(goal: &str) -> String {
    format!("UNIT TERMINATED: {} (Negative ROI)", goal)
}

/// Advance a single unit by one step.
pub fn advance(unit: &BusinessUnit, rng: &mut dyn RandomSource, cfg: &LifecycleConfig) -> BusinessUnit {
    let mut metrics = unit.metrics;
    let mut status = unit.status;

    match status {
        BusinessStatus::Ideation => {
            status = BusinessStatus::Building;
            metrics.cost += rng.uniform(cfg.ideation_cost_max);
        }
        BusinessStatus::Building => {
            if rng.next_f64() > cfg.launch_threshold {
                status = BusinessStatus::Launched;
            }
            metrics.cost += rng.uniform(cfg.building_cost_max);
        }
        BusinessStatus::Launched => {
            metrics.users += rng.below(cfg.launched_user_max);
            metrics.revenue += metrics.users as f64 * rng.uniform(cfg.launched_arpu_max);
            metrics.cost += rng.uniform(cfg.launched_cost_max);
            if metrics.revenue > metrics.cost * cfg.scale_margin && metrics.users > cfg.scale_min_users {
                status = BusinessStatus::Scaling;
            }
        }
        BusinessStatus::Scaling => {
            metrics.users += rng.below(cfg.scaling_user_max);
            metrics.revenue += metrics.users as f64 * rng.uniform(cfg.scaling_arpu_max);
            metrics.cost += metrics.revenue * cfg.scaling_cost_ratio;
        }
        BusinessStatus::Killed => return unit.clone(),
    }

    if metrics.cost > cfg.kill_cost_floor && metrics.revenue < metrics.cost * cfg.kill_revenue_ratio {
        status = BusinessStatus::Killed;
    }

    BusinessUnit {
        status,
        metrics,
        ..unit.clone()
    }
}

/// Advance every unit in order, recording status changes.
pub fn advance_all(units: &[BusinessUnit], rng: &mut dyn RandomSource, cfg: &LifecycleConfig) -> LifecyclePass {
    let mut pass = LifecyclePass {
        units: Vec::with_capacity(units.len()),
        transitions: Vec::new(),
    };
    for unit in units {
        let next = advance(unit, rng, cfg);
        if next.status != unit.status {
            pass.transitions.push(Transition {
                id: unit.id.clone(),
                goal: unit.goal.clone(),
                from: unit.status,
                to: next.status,
            });
        }
        pass.units.push(next);
    }
    pass
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::Metrics;
    use crate::rng::{ScriptedRandom, SeededRandom};

    fn unit(status: BusinessStatus, users: u64, revenue: f64, cost: f64) -> BusinessUnit {
        let mut u = BusinessUnit::seed("u1".into(), "Test Venture".into(), "v".into(), "m".into());
        u.status = status;
        u.metrics = Metrics { users, revenue, cost };
        u
    }

    #[test]
    fn test_ideation_always_builds() {
        let cfg = LifecycleConfig::default();
        let mut rng = ScriptedRandom::fixed(0.5);
        let next = advance(&unit(BusinessStatus::Ideation, 0, 0.0, 0.0), &mut rng, &cfg);
        assert_eq!(next.status, BusinessStatus::Building);
        assert_eq!(next.metrics.cost, 2500.0);
    }

    #[test]
    fn test_building_launches_above_threshold() {
        let cfg = LifecycleConfig::default();
        let mut rng = ScriptedRandom::fixed(0.9);
        let next = advance(&unit(BusinessStatus::Building, 0, 0.0, 1000.0), &mut rng, &cfg);
        assert_eq!(next.status, BusinessStatus::Launched);
        assert!((next.metrics.cost - 2800.0).abs() < 1e-9);
    }

    #[test]
    fn test_building_stays_at_or_below_threshold() {
        let cfg = LifecycleConfig::default();
        // 0.6 is not strictly greater than the threshold
        let mut rng = ScriptedRandom::new([0.6, 0.5], 0.0);
        let next = advance(&unit(BusinessStatus::Building, 0, 0.0, 0.0), &mut rng, &cfg);
        assert_eq!(next.status, BusinessStatus::Building);
        assert_eq!(next.metrics.cost, 1000.0);
    }

    #[test]
    fn test_launched_scales_on_margin_and_users() {
        let cfg = LifecycleConfig::default();
        // users +500, revenue += 5500 * 1.0, cost += 400
        let mut rng = ScriptedRandom::new([0.5, 0.5, 0.5], 0.0);
        let next = advance(&unit(BusinessStatus::Launched, 5000, 44_500.0, 9_600.0), &mut rng, &cfg);
        assert_eq!(next.metrics.users, 5500);
        assert_eq!(next.metrics.revenue, 50_000.0);
        assert_eq!(next.metrics.cost, 10_000.0);
        assert_eq!(next.status, BusinessStatus::Scaling);
    }

    #[test]
    fn test_launched_needs_user_floor() {
        let cfg = LifecycleConfig::default();
        let mut rng = ScriptedRandom::fixed(0.0);
        let next = advance(&unit(BusinessStatus::Launched, 4000, 90_000.0, 1_000.0), &mut rng, &cfg);
        assert_eq!(next.status, BusinessStatus::Launched);
    }

    #[test]
    fn test_scaling_cost_tracks_revenue() {
        let cfg = LifecycleConfig::default();
        // users +1000, revenue += 11000 * 0.3
        let mut rng = ScriptedRandom::new([0.2, 0.2], 0.0);
        let next = advance(&unit(BusinessStatus::Scaling, 10_000, 100_000.0, 10_000.0), &mut rng, &cfg);
        assert_eq!(next.metrics.users, 11_000);
        let revenue = 100_000.0 + 11_000.0 * 0.3;
        assert!((next.metrics.revenue - revenue).abs() < 1e-6);
        assert!((next.metrics.cost - (10_000.0 + revenue * 0.4)).abs() < 1e-6);
        assert_eq!(next.status, BusinessStatus::Scaling);
    }

    #[test]
    fn test_kill_overrides_launch() {
        let cfg = LifecycleConfig::default();
        let mut rng = ScriptedRandom::fixed(0.9);
        let next = advance(&unit(BusinessStatus::Building, 0, 1_000.0, 25_000.0), &mut rng, &cfg);
        assert_eq!(next.status, BusinessStatus::Killed);
    }

    #[test]
    fn test_killed_is_frozen_and_draws_nothing() {
        let cfg = LifecycleConfig::default();
        let mut rng = ScriptedRandom::new([0.9, 0.9], 0.9);
        let dead = unit(BusinessStatus::Killed, 10, 5.0, 30_000.0);
        let next = advance(&dead, &mut rng, &cfg);
        assert_eq!(next, dead);
        assert_eq!(rng.remaining(), 2);
    }

    #[test]
    fn test_pass_records_transitions_in_order() {
        let cfg = LifecycleConfig::default();
        let mut rng = ScriptedRandom::fixed(0.9);
        let mut a = unit(BusinessStatus::Ideation, 0, 0.0, 0.0);
        a.id = "a".into();
        let mut b = unit(BusinessStatus::Building, 0, 1_000.0, 25_000.0);
        b.id = "b".into();
        let pass = advance_all(&[a, b], &mut rng, &cfg);
        assert_eq!(pass.units.len(), 2);
        assert_eq!(pass.units[0].id, "a");
        assert_eq!(pass.transitions.len(), 2);
        assert_eq!(pass.terminations().count(), 1);
        assert_eq!(pass.terminations().next().map(|t| t.id.as_str()), Some("b"));
    }

    #[test]
    fn test_metrics_never_decrease_over_random_walk() {
        let cfg = LifecycleConfig::default();
        let mut rng = SeededRandom::new(42);
        let mut units: Vec<BusinessUnit> = (0..8)
            .map(|i| {
                let mut u = unit(BusinessStatus::Ideation, 0, 0.0, 0.0);
                u.id = format!("u{}", i);
                u
            })
            .collect();
        for _ in 0..40 {
            let pass = advance_all(&units, &mut rng, &cfg);
            for (prev, next) in units.iter().zip(pass.units.iter()) {
                assert!(next.metrics.users >= prev.metrics.users);
                assert!(next.metrics.revenue >= prev.metrics.revenue);
                assert!(next.metrics.cost >= prev.metrics.cost);
                if prev.status == BusinessStatus::Killed {
                    assert_eq!(prev, next);
                }
            }
            units = pass.units;
        }
    }
}
