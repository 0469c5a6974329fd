use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};

use swarmfx::business::BusinessStatus;
use swarmfx::ideation::{GatewayKind, IdeationGateway};
use swarmfx::logging::{log, log_session_summary, obj, v_str, Domain, Level};
use swarmfx::orchestrator::Orchestrator;
use swarmfx::rng::ThreadRandom;
use swarmfx::state::{now_ts, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let kind = GatewayKind::from_env();
    let gateway: Arc<dyn IdeationGateway> = Arc::from(kind.build(&cfg)?);

    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("gateway", v_str(kind.as_str())),
            ("model", v_str(&cfg.gemini_model)),
            ("tick_secs", json!(cfg.tick_secs)),
            ("max_cycles", json!(cfg.max_cycles)),
        ]),
    );

    let started_at = now_ts();
    let orch = Orchestrator::new(cfg.clone(), gateway, Box::new(ThreadRandom));
    orch.start();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runner = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.run(shutdown_rx).await })
    };

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log(Level::Info, Domain::System, "shutdown", obj(&[("reason", v_str("ctrl_c"))]));
                break;
            }
            _ = sleep(Duration::from_millis(500)) => {
                if let Some(max) = cfg.max_cycles {
                    if orch.cycles_completed() >= max {
                        log(Level::Info, Domain::System, "shutdown", obj(&[("reason", v_str("max_cycles"))]));
                        break;
                    }
                }
            }
        }
    }

    orch.pause();
    let _ = shutdown_tx.send(true);
    runner.await?;

    let snap = orch.snapshot();
    let killed = snap
        .businesses
        .iter()
        .filter(|u| u.status == BusinessStatus::Killed)
        .count();
    log_session_summary(
        now_ts().saturating_sub(started_at),
        orch.cycles_completed(),
        snap.businesses.len(),
        killed,
        snap.capital.treasury,
    );
    Ok(())
}
