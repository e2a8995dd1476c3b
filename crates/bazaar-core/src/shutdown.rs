//! Process-wide shutdown signal.
//!
//! `Shutdown` only answers "is the process stopping?". It is not
//! threaded into individual database or broker calls: workers check it between
//! units of work so an in-flight claim, publish or handler invocation always
//! runs to completion and is resolved explicitly.

use tokio::sync::watch;
use tracing::info;

/// Sending half. Dropping it without calling [`ShutdownTrigger::trigger`]
/// also counts as a shutdown for every receiver.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Receiving half, cheap to clone into every worker.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Create a connected trigger/receiver pair.
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

impl Shutdown {
    /// Non-blocking check, used between units of work.
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolve once shutdown has been requested. Cancel-safe.
    pub async fn triggered(&mut self) {
        // Err means the trigger was dropped.
        let _ = self.rx.wait_for(|stopping| *stopping).await;
    }
}

/// Wait for Ctrl-C or SIGTERM, then fire the trigger.
pub async fn trigger_on_signal(trigger: ShutdownTrigger) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
    trigger.trigger();
}
