use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{error, info};

/// Application-level shutdown collaborator invoked by the quit key.
pub trait ShutdownHooks: Send + Sync {
    /// Ask whether the user really wants to quit.
    fn confirm_quit(&self) -> bool;

    /// Last resort once a confirmed quit has not finished in time.
    fn force_exit(&self);
}

/// Confirms every request and kills the process when the grace period ends.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessShutdown;

impl ShutdownHooks for ProcessShutdown {
    fn confirm_quit(&self) -> bool {
        true
    }

    fn force_exit(&self) {
        error!("Shutdown did not complete in time, terminating process");
        std::process::exit(1);
    }
}

/// Arm the forced-termination safety net.
pub fn spawn_watchdog(hooks: Arc<dyn ShutdownHooks>, after: Duration) -> JoinHandle<()> {
    info!("Forced exit armed in {:?}", after);
    let deadline = Instant::now() + after;
    tokio::spawn(async move {
        sleep_until(deadline).await;
        hooks.force_exit();
    })
}
