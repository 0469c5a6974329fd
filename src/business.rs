//! Business Unit data model.
//!
//! A unit is created once by the ideation merge and then only ever replaced
//! by an advanced copy. Units are never removed from the collection; a
//! `Killed` unit keeps its last metrics forever.

use rand::Rng;
use serde::{Deserialize, Serialize};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessStatus {
    Ideation,
    Building,
    Launched,
    Scaling,
    Killed,
}

impl BusinessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessStatus::Ideation => "ideation",
            BusinessStatus::Building => "building",
            BusinessStatus::Launched => "launched",
            BusinessStatus::Scaling => "scaling",
            BusinessStatus::Killed => "killed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BusinessStatus::Killed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub users: u64,
    pub revenue: f64,
    pub cost: f64,
}

/// Lineage metadata, fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genome {
    pub generation: u32,
    pub mutation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessUnit {
    pub id: String,
    pub goal: String,
    pub vision: String,
    pub status: BusinessStatus,
    pub metrics: Metrics,
    pub genome: Genome,
}

impl BusinessUnit {
    /// Fresh first-generation unit in `Ideation` with zeroed metrics.
    pub fn seed(id: String, goal: String, vision: String, mutation: String) -> Self {
        Self {
            id,
            goal,
            vision,
            status: BusinessStatus::Ideation,
            metrics: Metrics::default(),
            genome: Genome {
                generation: 0,
                mutation,
                parent_id: None,
            },
        }
    }

    /// Offspring of `parent`, one generation deeper.
    pub fn offspring(parent: &BusinessUnit, id: String, goal: String, vision: String, mutation: String) -> Self {
        Self {
            id,
            goal,
            vision,
            status: BusinessStatus::Ideation,
            metrics: Metrics::default(),
            genome: Genome {
                generation: parent.genome.generation + 1,
                mutation,
                parent_id: Some(parent.id.clone()),
            },
        }
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}

pub fn active_count(units: &[BusinessUnit]) -> usize {
    units.iter().filter(|u| u.is_active()).count()
}

/// Random base-36 identifier that does not collide with any id in `existing`.
pub fn new_unit_id(existing: &[BusinessUnit]) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let id: String = (0..ID_LEN)
            .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect();
        if !existing.iter().any(|u| u.id == id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_starts_in_ideation_with_zero_metrics() {
        let unit = BusinessUnit::seed("a".into(), "goal".into(), "vision".into(), "why".into());
        assert_eq!(unit.status, BusinessStatus::Ideation);
        assert_eq!(unit.metrics, Metrics::default());
        assert_eq!(unit.genome.generation, 0);
        assert!(unit.genome.parent_id.is_none());
    }

    #[test]
    fn test_offspring_links_parent() {
        let mut parent = BusinessUnit::seed("p1".into(), "g".into(), "v".into(), "m".into());
        parent.genome.generation = 2;
        let child = BusinessUnit::offspring(&parent, "c1".into(), "g2".into(), "v2".into(), "m2".into());
        assert_eq!(child.genome.generation, 3);
        assert_eq!(child.genome.parent_id.as_deref(), Some("p1"));
        assert_eq!(child.status, BusinessStatus::Ideation);
    }

    #[test]
    fn test_active_count_skips_killed() {
        let mut a = BusinessUnit::seed("a".into(), "g".into(), "v".into(), "m".into());
        let b = BusinessUnit::seed("b".into(), "g".into(), "v".into(), "m".into());
        a.status = BusinessStatus::Killed;
        assert_eq!(active_count(&[a, b]), 1);
    }

    #[test]
    fn test_new_unit_id_shape_and_uniqueness() {
        let mut units = Vec::new();
        for _ in 0..50 {
            let id = new_unit_id(&units);
            assert_eq!(id.len(), ID_LEN);
            assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
            units.push(BusinessUnit::seed(id, "g".into(), "v".into(), "m".into()));
        }
        let mut ids: Vec<_> = units.iter().map(|u| u.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&BusinessStatus::Scaling).unwrap();
        assert_eq!(json, "\"scaling\"");
    }
}
