//! # Example: scale
//!
//! Grows a pool of pollers, shrinks it with spec strings and terminates it, with the
//! built-in [`LogWriter`] rendering every pool event through `tracing`.
//!
//! ## Flow
//! ```text
//! scale("max")  → ScaleRequested, RunnerAdded × M, Scaled
//! scale("half") → ScaleRequested, RunnerStopped/RunnerRemoved × (M − H), Scaled
//! terminate()   → TerminateRequested, RunnerRemoved × H, Terminated
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=runvisor=debug cargo run --example scale --features logging
//! ```

use std::{sync::Arc, time::Duration};

use runvisor::{
    LogWriter, Orchestrator, OrchestratorConfig, RunnableError, RunnableFn, RunnableRef, Subscribe,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Install a tracing subscriber so LogWriter output is visible
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "runvisor=info".into()))
        .init();

    // 2. Every slot gets a fresh poller
    let factory = || async {
        let poller: RunnableRef<Duration> =
            RunnableFn::arc(|ctx: CancellationToken, every: Duration| async move {
                loop {
                    tokio::select! {
                        _ = ctx.cancelled() => return Ok(()),
                        _ = tokio::time::sleep(every) => {}
                    }
                }
            });
        Ok::<_, RunnableError>(poller)
    };

    // 3. Pretend the machine has 6 cores
    let cfg = OrchestratorConfig {
        max_parallelism: Some(6),
        ..OrchestratorConfig::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let pool = Orchestrator::builder(factory, Duration::from_millis(100))
        .with_config(cfg)
        .with_subscribers(subs)
        .build();

    // 4. Grow, shrink, drain
    pool.scale("max").await?;
    println!("[scale] max → {} runners", pool.instances());
    tokio::time::sleep(Duration::from_millis(300)).await;

    pool.scale("half").await?;
    println!("[scale] half → {} runners", pool.instances());
    tokio::time::sleep(Duration::from_millis(300)).await;

    pool.terminate().await?;
    println!("[scale] terminated");

    // 5. Let the log worker flush the last events
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
