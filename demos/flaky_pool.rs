//! # Example: flaky_pool
//!
//! Shows how the pool keeps failing runners alive: every failure is reported on the
//! event stream and delays the next restart according to the pool-wide retry depth.
//!
//! ## Flow
//! ```text
//! runner 1 ─ run → Err("flaky #1") → RunnerFailed → BackoffScheduled{50ms, depth 0}
//! runner 2 ─ run → Err("flaky #2") → RunnerFailed → BackoffScheduled{100ms, depth 1}
//! runner 1 ─ run → Ok            → RunnerCompleted (depth relaxes) → restart
//! ...
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example flaky_pool
//! ```

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use runvisor::{
    BackoffPolicy, EventKind, JitterPolicy, Orchestrator, OrchestratorConfig, RunnableError,
    RunnableFn, RunnableRef,
};
use tokio_util::sync::CancellationToken;

static RUNS: AtomicU64 = AtomicU64::new(0);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Two out of three runs fail
    let factory = || async {
        let flaky: RunnableRef<()> =
            RunnableFn::arc(|ctx: CancellationToken, _: ()| async move {
                let n = RUNS.fetch_add(1, Ordering::Relaxed) + 1;
                if n % 3 != 0 {
                    return Err(RunnableError::fail(format!("flaky #{n}")));
                }
                tokio::select! {
                    _ = ctx.cancelled() => {}
                    _ = tokio::time::sleep(Duration::from_millis(20)) => {}
                }
                Ok(())
            });
        Ok::<_, RunnableError>(flaky)
    };

    // 2. Short backoff so the demo moves quickly
    let cfg = OrchestratorConfig {
        backoff: BackoffPolicy {
            first: Duration::from_millis(50),
            max: Duration::from_millis(400),
            factor: 2.0,
            jitter: JitterPolicy::Equal,
        },
        ..OrchestratorConfig::default()
    };
    let pool = Orchestrator::builder(factory, ()).with_config(cfg).build();

    // 3. Watch the event stream while the pool runs
    let mut rx = pool.subscribe();
    let watcher = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move {
            while let Ok(ev) = rx.recv().await {
                match ev.kind {
                    EventKind::RunnerFailed => println!(
                        "[flaky] runner {:?} failed: {}",
                        ev.runner,
                        ev.reason.as_deref().unwrap_or("")
                    ),
                    EventKind::BackoffScheduled => println!(
                        "[flaky] runner {:?} restarts in {:?} (depth {:?}, pool depth now {})",
                        ev.runner,
                        ev.delay().unwrap_or_default(),
                        ev.retries,
                        pool.retries()
                    ),
                    EventKind::Terminated => break,
                    _ => {}
                }
            }
        })
    };

    pool.scale(3).await?;
    tokio::time::sleep(Duration::from_secs(2)).await;
    pool.terminate().await?;
    watcher.await?;

    println!("[flaky] {} runs in total", RUNS.load(Ordering::Relaxed));
    Ok(())
}
