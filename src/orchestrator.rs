//! Cycle orchestrator: owns the simulation state and drives one step per tick.
//!
//! ```text
//!   timer ──► tick() ──► [gate] ──► ideation? ──► lifecycle ──► merge ──► ledger ──► commit
//!                          │           (await)                                       │
//!                          └── busy: skip                 epoch changed: abandon ◄───┘
//! ```
//!
//! State is an `Arc<SimState>` swapped wholesale on every write, so readers
//! only ever see complete snapshots. At most one cycle runs at a time: a
//! tick that finds the gate held is skipped. `reset()` bumps an epoch under
//! the state lock; a cycle whose epoch no longer matches at commit time is
//! dropped. `pause()` only stops future ticks, so an in-flight cycle still
//! commits but never flips the run flag back on.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use rand::Rng;
use serde_json::json;
use tokio::sync::watch;
use tokio::time::{interval, sleep, MissedTickBehavior};

use crate::agents::{set_status, AgentRole, AgentStatus, ROLES};
use crate::business::{active_count, new_unit_id, BusinessStatus, BusinessUnit};
use crate::ideation::{Candidate, GenerationError, IdeationGateway};
use crate::lifecycle::{advance_all, termination_message, LifecycleConfig};
use crate::logging::{
    log_control, log_cycle_abandoned, log_cycle_skipped, log_cycle_start, log_generation_failure, log_ledger,
    log_narration, log_spawned, log_termination, log_transition, ProfileScope,
};
use crate::rng::RandomSource;
use crate::state::{Config, SimState};

pub const CYCLE_BANNER: &str = "--- NEW CYCLE STARTING ---";
pub const IDEATION_THINKING: &str = "Analyzing financial standing for ideation...";
pub const IDEATION_FAILED: &str = "Evolution Agent failed to generate ideas.";
pub const NARRATION_CONTEXT: &str = "General production environment";
pub const NARRATION_FALLBACK_GOAL: &str = "System Ops";

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Run flag was off at entry.
    NotRunning,
    /// Another cycle still holds the gate.
    InFlight,
    /// A reset happened while the cycle was pending.
    Abandoned,
    Completed(CycleSummary),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleSummary {
    pub cycle: u64,
    pub spawned: usize,
    pub offspring: usize,
    pub terminated: usize,
    pub ideation_failed: bool,
    pub treasury: f64,
}

struct Inner {
    cfg: Config,
    lifecycle: LifecycleConfig,
    gateway: Arc<dyn IdeationGateway>,
    rng: Mutex<Box<dyn RandomSource>>,
    state: RwLock<Arc<SimState>>,
    cycle_gate: tokio::sync::Mutex<()>,
    in_flight: AtomicBool,
    epoch: AtomicU64,
    started: AtomicU64,
    completed: AtomicU64,
}

/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

// Raised while the cycle gate is held; lowered on every exit path.
struct InFlightFlag<'a>(&'a AtomicBool);

impl<'a> InFlightFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InFlightFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// Proposed units waiting to be merged at commit time.
struct Lineage {
    parent: BusinessUnit,
    children: Vec<Candidate>,
}

impl Orchestrator {
    pub fn new(cfg: Config, gateway: Arc<dyn IdeationGateway>, rng: Box<dyn RandomSource>) -> Self {
        let state = SimState::boot(&cfg);
        Self::with_state(cfg, LifecycleConfig::default(), gateway, rng, state)
    }

    pub fn with_state(
        cfg: Config,
        lifecycle: LifecycleConfig,
        gateway: Arc<dyn IdeationGateway>,
        rng: Box<dyn RandomSource>,
        state: SimState,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cfg,
                lifecycle,
                gateway,
                rng: Mutex::new(rng),
                state: RwLock::new(Arc::new(state)),
                cycle_gate: tokio::sync::Mutex::new(()),
                in_flight: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                started: AtomicU64::new(0),
                completed: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.cfg
    }

    /// Read-only view for presentation.
    pub fn snapshot(&self) -> Arc<SimState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_running(&self) -> bool {
        self.snapshot().is_running
    }

    /// Observational only; never touches the cycle gate.
    pub fn is_cycle_in_flight(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    pub fn cycles_completed(&self) -> u64 {
        self.inner.completed.load(Ordering::SeqCst)
    }

    fn epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::SeqCst)
    }

    // Copy-on-write: clone, mutate the copy, swap it in.
    fn replace(&self, f: impl FnOnce(&mut SimState)) {
        let mut guard = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = SimState::clone(&guard);
        f(&mut next);
        *guard = Arc::new(next);
    }

    // As `replace`, but only if no reset happened since `epoch` was read.
    fn replace_in_epoch(&self, epoch: u64, f: impl FnOnce(&mut SimState)) -> bool {
        let mut guard = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
        if self.inner.epoch.load(Ordering::SeqCst) != epoch {
            return false;
        }
        let mut next = SimState::clone(&guard);
        f(&mut next);
        *guard = Arc::new(next);
        true
    }

    // =========================================================================
    // Control
    // =========================================================================

    pub fn start(&self) {
        self.replace(|s| {
            if !s.is_running {
                s.is_running = true;
                s.system_logs.push("System Activated.");
            }
        });
        log_control("start", true);
    }

    /// Stops future ticks. An in-flight cycle still completes.
    pub fn pause(&self) {
        self.replace(|s| {
            if s.is_running {
                s.is_running = false;
                s.system_logs.push("System Paused.");
            }
        });
        log_control("pause", false);
    }

    /// Flip the run flag; returns the new value.
    pub fn toggle(&self) -> bool {
        if self.is_running() {
            self.pause();
            false
        } else {
            self.start();
            true
        }
    }

    /// Back to initial treasury and risk with no units, stopped. Any
    /// in-flight cycle or narration is discarded when it tries to commit.
    pub fn reset(&self) {
        {
            let mut guard = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
            self.inner.epoch.fetch_add(1, Ordering::SeqCst);
            *guard = Arc::new(SimState::after_reset(&self.inner.cfg));
        }
        log_control("reset", false);
    }

    // =========================================================================
    // Cycle
    // =========================================================================

    /// Run one full cycle if the run flag is set and no other cycle is pending.
    pub async fn tick(&self) -> CycleOutcome {
        if !self.is_running() {
            log_cycle_skipped("not_running");
            return CycleOutcome::NotRunning;
        }
        let Ok(_gate) = self.inner.cycle_gate.try_lock() else {
            log_cycle_skipped("in_flight");
            return CycleOutcome::InFlight;
        };
        let _in_flight = InFlightFlag::raise(&self.inner.in_flight);

        let epoch = self.epoch();
        let start = self.snapshot();
        // A pause may have landed between the first check and the gate.
        if !start.is_running {
            log_cycle_skipped("not_running");
            return CycleOutcome::NotRunning;
        }

        let cycle = self.inner.started.fetch_add(1, Ordering::SeqCst) + 1;
        let _profile = ProfileScope::with_context("cycle", &[("cycle", json!(cycle))]);
        log_cycle_start(
            cycle,
            active_count(&start.businesses),
            start.businesses.len(),
            start.capital.treasury,
        );

        let needs_ideas = active_count(&start.businesses) < self.inner.cfg.min_active_units;
        let opened = self.replace_in_epoch(epoch, |s| {
            s.system_logs.push(CYCLE_BANNER);
            if needs_ideas {
                set_status(
                    &mut s.active_agents,
                    AgentRole::Evolution,
                    AgentStatus::Thinking,
                    Some(IDEATION_THINKING.to_string()),
                );
            }
        });
        if !opened {
            return self.abandon(cycle);
        }

        // 1. Ideation
        let ideas: Option<Result<Vec<Candidate>, GenerationError>> = if needs_ideas {
            Some(
                self.inner
                    .gateway
                    .generate_ideas(&self.inner.cfg.market_context, start.capital.treasury, start.capital.risk)
                    .await,
            )
        } else {
            None
        };
        if self.epoch() != epoch {
            return self.abandon(cycle);
        }

        // 2. Lifecycle over the units that existed before this cycle's merge
        let current = self.snapshot();
        let pass = {
            let mut rng = self.inner.rng.lock().unwrap_or_else(PoisonError::into_inner);
            advance_all(&current.businesses, &mut **rng, &self.inner.lifecycle)
        };

        // 3. Lineage evolution for units that just reached scaling
        let mut lineages = Vec::new();
        let mut evolve_failures = Vec::new();
        if self.inner.cfg.evolve_scaling {
            for t in pass.entered(BusinessStatus::Scaling) {
                let Some(parent) = pass.units.iter().find(|u| u.id == t.id) else {
                    continue;
                };
                match self.inner.gateway.evolve(&parent.goal, &parent.metrics).await {
                    Ok(children) => lineages.push(Lineage {
                        parent: parent.clone(),
                        children,
                    }),
                    Err(err) => {
                        log_generation_failure("evolve", &err.to_string());
                        evolve_failures.push(parent.goal.clone());
                    }
                }
            }
            if self.epoch() != epoch {
                return self.abandon(cycle);
            }
        }

        // 4. Merge
        let mut units = pass.units.clone();
        let mut spawned = 0;
        let mut ideation_failed = false;
        match ideas {
            Some(Ok(candidates)) => {
                for c in candidates {
                    let id = new_unit_id(&units);
                    log_spawned(cycle, &id, &c.goal, 0, None);
                    units.push(BusinessUnit::seed(id, c.goal, c.vision, c.mutation));
                    spawned += 1;
                }
            }
            Some(Err(err)) => {
                log_generation_failure("generate_ideas", &err.to_string());
                ideation_failed = true;
            }
            None => {}
        }
        let mut offspring = 0;
        let mut lineage_lines = Vec::new();
        for lineage in lineages {
            let count = lineage.children.len();
            for c in lineage.children {
                let id = new_unit_id(&units);
                let child = BusinessUnit::offspring(&lineage.parent, id, c.goal, c.vision, c.mutation);
                log_spawned(
                    cycle,
                    &child.id,
                    &child.goal,
                    child.genome.generation,
                    child.genome.parent_id.as_deref(),
                );
                units.push(child);
            }
            offspring += count;
            lineage_lines.push(format!(
                "Evolved {} into {} offspring (G-{}).",
                lineage.parent.goal,
                count,
                lineage.parent.genome.generation + 1
            ));
        }

        // 5. Ledger
        let capital = current.capital.recompute(&units, self.inner.cfg.net_flow_pass_through);

        for t in &pass.transitions {
            log_transition(cycle, &t.id, t.from.as_str(), t.to.as_str());
        }
        let terminations: Vec<String> = pass.terminations().map(|t| termination_message(&t.goal)).collect();
        for t in pass.terminations() {
            if let Some(u) = pass.units.iter().find(|u| u.id == t.id) {
                log_termination(cycle, &u.id, &u.goal, u.metrics.revenue, u.metrics.cost);
            }
        }

        let narrator = self.inner.cfg.narration_delay().map(|_| pick_role());
        let terminated = terminations.len();
        let treasury_at_start = start.capital.treasury;

        // 6. Commit
        let committed = self.replace_in_epoch(epoch, move |s| {
            if ideation_failed {
                s.system_logs.push(IDEATION_FAILED);
                set_status(&mut s.active_agents, AgentRole::Evolution, AgentStatus::Idle, None);
            } else if needs_ideas {
                s.system_logs.push(format!(
                    "Spawned {} new business units tailored to treasury: ${:.0}.",
                    spawned, treasury_at_start
                ));
                set_status(&mut s.active_agents, AgentRole::Evolution, AgentStatus::Idle, None);
            }
            for line in terminations {
                s.system_logs.push(line);
            }
            for line in lineage_lines {
                s.system_logs.push(line);
            }
            for goal in evolve_failures {
                s.system_logs.push(format!("Evolution Agent failed to evolve {}.", goal));
            }
            s.businesses = units;
            s.capital = capital;
            if let Some(role) = narrator {
                set_status(&mut s.active_agents, role, AgentStatus::Thinking, None);
            }
        });
        if !committed {
            return self.abandon(cycle);
        }

        log_ledger(cycle, capital.treasury, capital.total_revenue, capital.total_cost, capital.risk);
        self.inner.completed.fetch_add(1, Ordering::SeqCst);

        if let (Some(role), Some(delay)) = (narrator, self.inner.cfg.narration_delay()) {
            let this = self.clone();
            tokio::spawn(async move {
                sleep(delay).await;
                let _ = this.narrate_in_epoch(epoch, role).await;
            });
        }

        CycleOutcome::Completed(CycleSummary {
            cycle,
            spawned,
            offspring,
            terminated,
            ideation_failed,
            treasury: capital.treasury,
        })
    }

    fn abandon(&self, cycle: u64) -> CycleOutcome {
        log_cycle_abandoned(cycle, "reset");
        CycleOutcome::Abandoned
    }

    // =========================================================================
    // Narration
    // =========================================================================

    /// Ask `role` for a one-line perspective on the lead unit and record it.
    pub async fn narrate(&self, role: AgentRole) -> Result<String, GenerationError> {
        self.narrate_in_epoch(self.epoch(), role).await
    }

    async fn narrate_in_epoch(&self, epoch: u64, role: AgentRole) -> Result<String, GenerationError> {
        let goal = self
            .snapshot()
            .businesses
            .first()
            .map(|u| u.goal.clone())
            .unwrap_or_else(|| NARRATION_FALLBACK_GOAL.to_string());

        match self.inner.gateway.perspective(role.as_str(), &goal, NARRATION_CONTEXT).await {
            Ok(text) => {
                log_narration(role.as_str(), &text);
                let message = text.clone();
                self.replace_in_epoch(epoch, |s| {
                    set_status(&mut s.active_agents, role, AgentStatus::Idle, Some(message));
                });
                Ok(text)
            }
            Err(err) => {
                log_generation_failure("perspective", &err.to_string());
                self.replace_in_epoch(epoch, |s| {
                    set_status(&mut s.active_agents, role, AgentStatus::Idle, None);
                });
                Err(err)
            }
        }
    }

    // =========================================================================
    // Timer
    // =========================================================================

    /// Fire `tick()` every period until `shutdown` flips to true. Each tick
    /// runs on its own task; the cycle gate keeps them from overlapping.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.inner.cfg.tick_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; cycles start one period in.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let this = self.clone();
                    tokio::spawn(async move {
                        this.tick().await;
                    });
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}

// Cosmetic pick; kept off the injected source so scripted draws stay aligned.
fn pick_role() -> AgentRole {
    ROLES[rand::thread_rng().gen_range(0..ROLES.len())]
}
