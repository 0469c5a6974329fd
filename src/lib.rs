//! Autonomous business swarm simulation.
//!
//! A portfolio of simulated ventures advances through
//! `ideation → building → launched → scaling` (or `killed`) on a fixed timer,
//! while a generative-text gateway proposes new ventures whenever the active
//! count drops below a floor. See [`orchestrator`] for the cycle.

pub mod agents;
pub mod business;
pub mod ideation;
pub mod ledger;
pub mod lifecycle;
pub mod logging;
pub mod orchestrator;
pub mod rng;
pub mod state;
