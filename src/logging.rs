//! Structured logging for the swarm runner.
//!
//! Every record is one JSON line: `ts`, `run_id`, `seq`, `lvl`, `component`,
//! `event`, `msg`, optional top-level ids and a `data` object. Info and above
//! go to `events.jsonl`, trace/debug to `trace.jsonl`, under
//! `$LOG_DIR/$RUN_ID/`. Lines are echoed to stdout.
//!
//! This is the operator-facing log. The human-readable terminal feed shown
//! to the dashboard lives in [`crate::state::LogBuffer`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            Ok("fatal") => Level::Fatal,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

// =============================================================================
// Log Domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Cycle,     // Cycle start/finish/skip
    Lifecycle, // Unit status transitions
    Capital,   // Ledger recompute
    Ideation,  // Gateway calls and merges
    Agent,     // Narration
    Control,   // start/pause/reset
    System,    // Startup, shutdown
    Profile,   // Timing
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Cycle => "cycle",
            Domain::Lifecycle => "lifecycle",
            Domain::Capital => "capital",
            Domain::Ideation => "ideation",
            Domain::Agent => "agent",
            Domain::Control => "control",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS: comma-separated list or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    events: Option<Mutex<BufWriter<File>>>,
    trace: Option<Mutex<BufWriter<File>>>,
}

fn open_sink(path: PathBuf) -> Option<Mutex<BufWriter<File>>> {
    match File::create(&path) {
        Ok(file) => Some(Mutex::new(BufWriter::new(file))),
        Err(err) => {
            eprintln!("[log] failed to create {}: {}", path.display(), err);
            None
        }
    }
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let base = std::env::var("LOG_DIR").unwrap_or_else(|_| "out/runs".to_string());
        let mut run_dir = PathBuf::from(base);
        run_dir.push(&run_id);
        if let Err(err) = create_dir_all(&run_dir) {
            eprintln!("[log] failed to create run dir: {}", err);
        }

        let _ = std::fs::write(
            run_dir.join("manifest.json"),
            json!({
                "run_id": run_id,
                "ts": ts_now(),
                "pid": process::id(),
                "log_dir": run_dir.to_string_lossy(),
            })
            .to_string(),
        );

        RunContext {
            events: open_sink(run_dir.join("events.jsonl")),
            trace: open_sink(run_dir.join("trace.jsonl")),
            run_id,
        }
    })
}

pub fn run_id() -> &'static str {
    &ensure_run_context().run_id
}

fn sanitize_fields(mut fields: Map<String, Value>) -> Map<String, Value> {
    let redacted = Value::String("[REDACTED]".to_string());
    for key in ["api_key", "key", "x-goog-api-key", "authorization", "Authorization"] {
        if fields.contains_key(key) {
            fields.insert(key.to_string(), redacted.clone());
        }
    }
    fields
}

fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["cycle", "unit_id", "role", "msg"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

fn write_line(writer: &Option<Mutex<BufWriter<File>>>, line: &str) {
    if let Some(writer) = writer {
        if let Ok(mut w) = writer.lock() {
            let _ = writeln!(w, "{}", line);
            let _ = w.flush();
        }
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Epoch milliseconds
pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    emit_record(level, domain.as_str(), event, fields);
}

fn emit_record(level: Level, component: &str, event: &str, fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    let (mut top, data) = split_fields(sanitize_fields(fields));

    let msg = top.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(ctx.run_id.clone()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    for (k, v) in top {
        entry.insert(k, v);
    }
    entry.insert("data".to_string(), Value::Object(data));

    let line = Value::Object(entry).to_string();
    match level {
        Level::Trace | Level::Debug => write_line(&ctx.trace, &line),
        _ => write_line(&ctx.events, &line),
    }
    println!("{}", line);
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_cycle_start(cycle: u64, active: usize, total: usize, treasury: f64) {
    log(
        Level::Info,
        Domain::Cycle,
        "cycle_start",
        obj(&[
            ("cycle", json!(cycle)),
            ("active_units", json!(active)),
            ("total_units", json!(total)),
            ("treasury", v_num(treasury)),
        ]),
    );
}

pub fn log_cycle_skipped(reason: &str) {
    log(
        Level::Debug,
        Domain::Cycle,
        "cycle_skipped",
        obj(&[("reason", v_str(reason))]),
    );
}

pub fn log_cycle_abandoned(cycle: u64, reason: &str) {
    log(
        Level::Warn,
        Domain::Cycle,
        "cycle_abandoned",
        obj(&[("cycle", json!(cycle)), ("reason", v_str(reason))]),
    );
}

pub fn log_spawned(cycle: u64, unit_id: &str, goal: &str, generation: u32, parent_id: Option<&str>) {
    log(
        Level::Info,
        Domain::Ideation,
        "unit_spawned",
        obj(&[
            ("cycle", json!(cycle)),
            ("unit_id", v_str(unit_id)),
            ("goal", v_str(goal)),
            ("generation", json!(generation)),
            ("parent_id", parent_id.map(v_str).unwrap_or(Value::Null)),
        ]),
    );
}

pub fn log_transition(cycle: u64, unit_id: &str, from: &str, to: &str) {
    log(
        Level::Debug,
        Domain::Lifecycle,
        "transition",
        obj(&[
            ("cycle", json!(cycle)),
            ("unit_id", v_str(unit_id)),
            ("from", v_str(from)),
            ("to", v_str(to)),
        ]),
    );
}

pub fn log_termination(cycle: u64, unit_id: &str, goal: &str, revenue: f64, cost: f64) {
    log(
        Level::Warn,
        Domain::Lifecycle,
        "unit_terminated",
        obj(&[
            ("cycle", json!(cycle)),
            ("unit_id", v_str(unit_id)),
            ("goal", v_str(goal)),
            ("revenue", v_num(revenue)),
            ("cost", v_num(cost)),
        ]),
    );
}

pub fn log_ledger(cycle: u64, treasury: f64, total_revenue: f64, total_cost: f64, risk: f64) {
    log(
        Level::Info,
        Domain::Capital,
        "ledger",
        obj(&[
            ("cycle", json!(cycle)),
            ("treasury", v_num(treasury)),
            ("total_revenue", v_num(total_revenue)),
            ("total_cost", v_num(total_cost)),
            ("net", v_num(total_revenue - total_cost)),
            ("risk", v_num(risk)),
        ]),
    );
}

pub fn log_generation_failure(operation: &str, error: &str) {
    log(
        Level::Error,
        Domain::Ideation,
        "generation_failed",
        obj(&[("operation", v_str(operation)), ("error", v_str(error))]),
    );
}

pub fn log_control(action: &str, is_running: bool) {
    log(
        Level::Info,
        Domain::Control,
        action,
        obj(&[("is_running", json!(is_running))]),
    );
}

pub fn log_narration(role: &str, text: &str) {
    log(
        Level::Debug,
        Domain::Agent,
        "narration",
        obj(&[("role", v_str(role)), ("text", v_str(text))]),
    );
}

/// Session summary on shutdown
pub fn log_session_summary(duration_secs: u64, cycles: u64, units: usize, killed: usize, treasury: f64) {
    log(
        Level::Info,
        Domain::System,
        "session_summary",
        obj(&[
            ("duration_secs", json!(duration_secs)),
            ("cycles", json!(cycles)),
            ("units", json!(units)),
            ("killed", json!(killed)),
            ("treasury", v_num(treasury)),
        ]),
    );
}

// =============================================================================
// Utility Functions
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Profiling Scope
// =============================================================================

/// Emits structured timing on drop.
pub struct ProfileScope {
    label: &'static str,
    context: Map<String, Value>,
    started: Instant,
}

impl ProfileScope {
    pub fn with_context(label: &'static str, fields: &[(&str, Value)]) -> Self {
        Self {
            label,
            context: obj(fields),
            started: Instant::now(),
        }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut fields = std::mem::take(&mut self.context);
        fields.insert("label".to_string(), v_str(self.label));
        fields.insert("elapsed_ms".to_string(), v_num(elapsed_ms));
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}

// =============================================================================
// Tests
// =============================================================================
