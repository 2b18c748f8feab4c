//! Bagcraft CLI - craft from the command line.
//!
//! Performs the same two-tier bootstrap the UI shell does: the local
//! fallback registers immediately, the worker-backed proxy takes over
//! once its worker signals ready, and the craft goes through whichever
//! implementation the pointer currently exposes.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use bagcraft::crafter::{
    CrafterPointer, LocalCrafter, RemoteCrafter, RemoteCrafterConfig,
};
use bagcraft::engine::Pickup;
use bagcraft::logging;
use bagcraft::store::StoreConfig;
use bagcraft::worker::{spawn_worker, WorkerConfig};

#[derive(Parser)]
#[command(name = "bagcraft")]
#[command(version = bagcraft::VERSION)]
#[command(about = "Compute Bag of Crafting results", long_about = None)]
struct Args {
    /// The eight pickups to craft (snake_case names, e.g. soul_heart)
    #[arg(num_args = 8, required = true)]
    pickups: Vec<Pickup>,

    /// Directory for the persistent crafting cache
    #[arg(long, default_value = ".bagcraft")]
    data_dir: PathBuf,

    /// Per-request deadline in seconds
    #[arg(long, default_value = "10")]
    timeout_secs: u64,

    /// Skip the background worker and craft in-process only
    #[arg(long)]
    local_only: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _guard = match logging::init_logging(logging::default_log_dir(), logging::default_log_file())
    {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    info!(version = bagcraft::VERSION, "bagcraft starting");

    if let Err(e) = run(args).await {
        error!(error = %e, "craft failed");
        eprintln!("error: {e}");
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let pointer = Arc::new(CrafterPointer::new());

    // Tier one: synchronous fallback, available immediately.
    pointer.update(Arc::new(LocalCrafter::new()));

    // Tier two: worker-backed proxy, registered from its ready callback.
    if !args.local_only {
        let worker_config = WorkerConfig {
            store: StoreConfig {
                root: args.data_dir.clone(),
                ..StoreConfig::default()
            },
            ..WorkerConfig::default()
        };
        let crafter_config = RemoteCrafterConfig {
            request_timeout: Some(Duration::from_secs(args.timeout_secs)),
        };

        let handle = spawn_worker(worker_config);
        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
        let registry = Arc::clone(&pointer);
        RemoteCrafter::connect(handle, crafter_config, move |crafter| {
            registry.update(crafter);
            let _ = ready_tx.send(());
        });

        // Give the worker a moment to boot; fall back silently if it
        // doesn't make it in time.
        if tokio::time::timeout(Duration::from_secs(5), ready_rx)
            .await
            .is_err()
        {
            info!("worker not ready in time, crafting with the fallback");
        }
    }

    let crafter = pointer.get().ok_or("no crafter available")?;
    info!(priority = %crafter.priority(), "crafting");

    let item_id = crafter.craft(args.pickups).await??;
    println!("{item_id}");

    pointer.clear();
    Ok(())
}
