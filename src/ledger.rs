use serde::{Deserialize, Serialize};

use crate::business::BusinessUnit;

/// Aggregate financial view of the swarm.
///
/// Totals are recomputed from the full collection (killed units included)
/// on every cycle, never accumulated. Treasury is the only carried value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalLedger {
    pub treasury: f64,
    pub risk: f64,
    pub total_revenue: f64,
    pub total_cost: f64,
}

impl CapitalLedger {
    pub fn new(treasury: f64, risk: f64) -> Self {
        Self {
            treasury,
            risk: risk.clamp(0.0, 1.0),
            total_revenue: 0.0,
            total_cost: 0.0,
        }
    }

    pub fn net(&self) -> f64 {
        self.total_revenue - self.total_cost
    }

    /// Recompute totals over `units` and pass `pass_through` of the net flow
    /// into treasury. Risk is carried unchanged.
    pub fn recompute(&self, units: &[BusinessUnit], pass_through: f64) -> CapitalLedger {
        let total_revenue: f64 = units.iter().map(|u| u.metrics.revenue).sum();
        let total_cost: f64 = units.iter().map(|u| u.metrics.cost).sum();
        CapitalLedger {
            treasury: self.treasury + (total_revenue - total_cost) * pass_through,
            risk: self.risk,
            total_revenue,
            total_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::{BusinessStatus, Metrics};

    fn unit(id: &str, revenue: f64, cost: f64, status: BusinessStatus) -> BusinessUnit {
        let mut u = BusinessUnit::seed(id.into(), "g".into(), "v".into(), "m".into());
        u.metrics = Metrics { users: 0, revenue, cost };
        u.status = status;
        u
    }

    #[test]
    fn test_recompute_sums_including_killed() {
        let ledger = CapitalLedger::new(50_000.0, 0.2);
        let units = vec![
            unit("a", 1_000.0, 4_000.0, BusinessStatus::Building),
            unit("b", 500.0, 30_000.0, BusinessStatus::Killed),
        ];
        let next = ledger.recompute(&units, 0.1);
        assert_eq!(next.total_revenue, 1_500.0);
        assert_eq!(next.total_cost, 34_000.0);
        assert!((next.treasury - (50_000.0 - 3_250.0)).abs() < 1e-9);
        assert_eq!(next.risk, 0.2);
    }

    #[test]
    fn test_totals_are_not_accumulated() {
        let ledger = CapitalLedger::new(0.0, 0.2);
        let units = vec![unit("a", 100.0, 10.0, BusinessStatus::Launched)];
        let once = ledger.recompute(&units, 0.1);
        let twice = once.recompute(&units, 0.1);
        assert_eq!(twice.total_revenue, 100.0);
        assert_eq!(twice.total_cost, 10.0);
        // treasury is the only carried value
        assert!((twice.treasury - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_treasury_can_go_negative() {
        let ledger = CapitalLedger::new(100.0, 0.5);
        let units = vec![unit("a", 0.0, 10_000.0, BusinessStatus::Building)];
        let next = ledger.recompute(&units, 0.1);
        assert_eq!(next.treasury, -900.0);
    }

    #[test]
    fn test_empty_collection_keeps_treasury() {
        let ledger = CapitalLedger::new(50_000.0, 0.2);
        let next = ledger.recompute(&[], 0.1);
        assert_eq!(next.treasury, 50_000.0);
        assert_eq!(next.net(), 0.0);
    }

    #[test]
    fn test_risk_is_clamped() {
        assert_eq!(CapitalLedger::new(0.0, 1.7).risk, 1.0);
        assert_eq!(CapitalLedger::new(0.0, -0.1).risk, 0.0);
    }
}
