use super::types::{RunSummary, ShutdownReason};
use super::FatigueOrchestrator;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

impl FatigueOrchestrator {
    /// Run the sensing loop until the stream ends, a signal arrives or the
    /// cancellation token fires, then shut down.
    pub async fn run(&mut self) -> Result<RunSummary> {
        // Validated non-zero in `new`
        let fps = self.config.analyzer.fps;
        info!("Fatigue monitor is running at {} fps", fps);

        self.dispatcher.start();
        if !self.dispatcher.connect().await {
            warn!("Backend not reachable at startup, telemetry will be retried");
        }

        let (shutdown_sender, mut shutdown_receiver) = oneshot::channel();
        let signal_tasks = setup_signal_handlers(shutdown_sender);

        let mut ticker = interval(Duration::from_secs_f64(1.0 / f64::from(fps)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut signals_available = true;

        let reason = loop {
            tokio::select! {
                _ = self.cancellation_token.cancelled() => break ShutdownReason::Cancelled,
                received = &mut shutdown_receiver, if signals_available => match received {
                    Ok(reason) => break reason,
                    Err(_) => {
                        warn!("Signal handlers unavailable, stop with cancellation only");
                        signals_available = false;
                        continue;
                    }
                },
                _ = ticker.tick() => {}
            }

            match self.provider.next_frame().await {
                Ok(frame) => {
                    self.process_frame(&frame).await;
                }
                Err(e) if e.is_skippable() => {
                    self.stats.capture_errors += 1;
                    warn!("Skipping frame: {}", e);
                }
                Err(_) => {
                    info!("Landmark stream from {} ended", self.provider.name());
                    break ShutdownReason::StreamEnded;
                }
            }
        };

        for task in signal_tasks {
            task.abort();
        }

        info!("Shutdown initiated: {:?}", reason);
        let exit_code = self.shutdown().await;

        Ok(RunSummary {
            reason,
            stats: self.stats.clone(),
            exit_code,
        })
    }
}

/// Spawn SIGINT/SIGTERM listeners that report the first signal received
fn setup_signal_handlers(shutdown_sender: oneshot::Sender<ShutdownReason>) -> Vec<JoinHandle<()>> {
    let shutdown_sender = Arc::new(Mutex::new(Some(shutdown_sender)));
    let mut tasks = Vec::new();

    // Handle SIGTERM (systemd stop) - Unix only
    #[cfg(unix)]
    {
        let shutdown_sender_sigterm = Arc::clone(&shutdown_sender);
        tasks.push(tokio::spawn(async move {
            let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    error!("Failed to register SIGTERM handler: {}", e);
                    return;
                }
            };
            if sigterm.recv().await.is_some() {
                info!("Received SIGTERM signal");
                if let Some(sender) = shutdown_sender_sigterm.lock().await.take() {
                    let _ = sender.send(ShutdownReason::Signal("SIGTERM".to_string()));
                }
            }
        }));
    }

    // Handle SIGINT (Ctrl+C) - Cross-platform
    let shutdown_sender_sigint = Arc::clone(&shutdown_sender);
    tasks.push(tokio::spawn(async move {
        if let Ok(()) = signal::ctrl_c().await {
            info!("Received SIGINT signal (Ctrl+C)");
            if let Some(sender) = shutdown_sender_sigint.lock().await.take() {
                let _ = sender.send(ShutdownReason::Signal("SIGINT".to_string()));
            }
        }
    }));

    tasks
}
