//! Dashboard server
//!
//! Runs the swarm loop and serves its state as JSON for a browser dashboard.
//! Run with: cargo run --bin dashboard

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use swarmfx::ideation::{GatewayKind, IdeationGateway};
use swarmfx::logging::{log, obj, run_id, v_str, Domain, Level};
use swarmfx::orchestrator::Orchestrator;
use swarmfx::rng::ThreadRandom;
use swarmfx::state::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let kind = GatewayKind::from_env();
    let gateway: Arc<dyn IdeationGateway> = Arc::from(kind.build(&cfg)?);
    let orch = Orchestrator::new(cfg.clone(), gateway, Box::new(ThreadRandom));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runner = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.run(shutdown_rx).await })
    };

    let listener = TcpListener::bind(&cfg.dashboard_addr).await?;
    log(
        Level::Info,
        Domain::System,
        "dashboard_listening",
        obj(&[("addr", v_str(&cfg.dashboard_addr)), ("gateway", v_str(kind.as_str()))]),
    );
    println!("Swarm dashboard at http://{}", cfg.dashboard_addr);
    println!();
    println!("Endpoints:");
    println!("  GET  /api/state  - Snapshot {{businesses, capital, systemLogs, activeAgents, isRunning}}");
    println!("  GET  /api/health - Health check");
    println!("  POST /api/toggle - Start or pause the swarm");
    println!("  POST /api/reset  - Purge state and stop");
    println!();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, _) = match accepted {
                    Ok(s) => s,
                    Err(_) => continue,
                };
                let orch = orch.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, orch).await;
                });
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    orch.pause();
    let _ = shutdown_tx.send(true);
    runner.await?;
    Ok(())
}

async fn serve(stream: TcpStream, orch: Orchestrator) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    let request = match lines.next_line().await? {
        Some(line) => line,
        None => return Ok(()),
    };

    let (status, content_type, body) = route(&request, &orch);
    let response = format!(
        "HTTP/1.1 {}\r\n\
         Content-Type: {}\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Connection: close\r\n\
         Content-Length: {}\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    );
    write_half.write_all(response.as_bytes()).await?;
    Ok(())
}

fn route(request: &str, orch: &Orchestrator) -> (&'static str, &'static str, String) {
    if request.starts_with("GET /api/state") {
        match serde_json::to_string(&*orch.snapshot()) {
            Ok(body) => ("200 OK", "application/json", body),
            Err(err) => ("500 INTERNAL SERVER ERROR", "text/plain", err.to_string()),
        }
    } else if request.starts_with("GET /api/health") {
        let body = json!({
            "status": "ok",
            "run_id": run_id(),
            "cycles": orch.cycles_completed(),
            "cycle_in_flight": orch.is_cycle_in_flight(),
        });
        ("200 OK", "application/json", body.to_string())
    } else if request.starts_with("POST /api/toggle") {
        let running = orch.toggle();
        ("200 OK", "application/json", json!({ "isRunning": running }).to_string())
    } else if request.starts_with("POST /api/reset") {
        orch.reset();
        ("200 OK", "application/json", json!({ "isRunning": false }).to_string())
    } else {
        ("404 NOT FOUND", "text/plain", "Not Found".to_string())
    }
}
