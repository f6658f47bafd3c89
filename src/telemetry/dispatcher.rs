use super::connection::{ConnectionMonitor, ProbeDecision};
use super::event::{AlertEvent, DataEvent, TelemetryEvent};
use super::queue::BoundedQueue;
use super::stats::{DispatcherStats, DispatcherStatsSnapshot};
use super::transport::TelemetryTransport;
use super::worker;
use crate::config::TelemetryConfig;
use crate::error::TelemetryError;

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// State shared by the enqueue path and the delivery worker
pub(crate) struct DispatcherShared {
    pub(crate) config: TelemetryConfig,
    pub(crate) transport: Arc<dyn TelemetryTransport>,
    pub(crate) connection: ConnectionMonitor,
    pub(crate) data_queue: BoundedQueue<TelemetryEvent>,
    pub(crate) alert_queue: BoundedQueue<TelemetryEvent>,
    pub(crate) wake: Notify,
    pub(crate) stats: DispatcherStats,
    /// Written by the worker, read by the enqueue path to schedule revalidation
    pub(crate) failures_since_probe: AtomicU32,
}

impl DispatcherShared {
    fn queue_for(&self, event: &TelemetryEvent) -> &BoundedQueue<TelemetryEvent> {
        match event {
            TelemetryEvent::Data(_) => &self.data_queue,
            TelemetryEvent::Alert(_) => &self.alert_queue,
        }
    }

    fn needs_revalidation(&self) -> bool {
        let threshold = self.config.revalidate_after_failures;
        threshold > 0 && self.failures_since_probe.load(Ordering::Relaxed) >= threshold
    }

    /// Run one bounded health probe and record its outcome
    async fn probe(&self) -> bool {
        let timeout = self.config.probe_timeout();
        DispatcherStats::bump(&self.stats.probes);

        let outcome = match tokio::time::timeout(timeout, self.transport.health()).await {
            Ok(result) => result,
            Err(_) => Err(TelemetryError::Timeout {
                operation: "health probe",
                after: timeout,
            }),
        };

        let reachable = outcome.is_ok();
        let changed = self.connection.complete_probe(reachable);
        self.failures_since_probe.store(0, Ordering::Relaxed);

        match outcome {
            Ok(()) => {
                if changed {
                    info!("Backend connected: {}", self.transport.endpoint());
                } else {
                    debug!("Backend still reachable: {}", self.transport.endpoint());
                }
            }
            Err(e) => {
                DispatcherStats::bump(&self.stats.probe_failures);
                if changed {
                    warn!("Backend connection lost ({}): {}", self.transport.endpoint(), e);
                } else {
                    warn!("Backend unreachable ({}): {}", self.transport.endpoint(), e);
                }
            }
        }

        reachable
    }
}

/// Non-blocking relay of telemetry events to the backend.
///
/// Submissions never wait on delivery: they run at most one cooldown-gated
/// probe bounded by the probe timeout, then try-push into a bounded queue.
/// A single background worker owns every data and alert post.
pub struct TelemetryDispatcher {
    shared: Arc<DispatcherShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    cancellation_token: CancellationToken,
}

impl TelemetryDispatcher {
    /// Build a dispatcher; the worker is not started yet.
    ///
    /// Fails when the configuration would give a zero-capacity queue or an
    /// out-of-range probe budget.
    pub fn new(
        config: TelemetryConfig,
        transport: Arc<dyn TelemetryTransport>,
    ) -> Result<Self, TelemetryError> {
        config
            .validate()
            .map_err(|e| TelemetryError::InvalidConfig {
                details: e.to_string(),
            })?;

        info!(
            "Creating telemetry dispatcher for {} (queues {}/{}, cooldown {:?})",
            transport.endpoint(),
            config.data_queue_capacity,
            config.alert_queue_capacity,
            config.reconnect_cooldown()
        );

        let shared = DispatcherShared {
            connection: ConnectionMonitor::new(config.reconnect_cooldown()),
            data_queue: BoundedQueue::new("data", config.data_queue_capacity),
            alert_queue: BoundedQueue::new("alert", config.alert_queue_capacity),
            wake: Notify::new(),
            stats: DispatcherStats::default(),
            failures_since_probe: AtomicU32::new(0),
            transport,
            config,
        };

        Ok(Self {
            shared: Arc::new(shared),
            worker: Mutex::new(None),
            cancellation_token: CancellationToken::new(),
        })
    }

    /// Spawn the delivery worker. Must be called inside a tokio runtime.
    pub fn start(&self) {
        if self.cancellation_token.is_cancelled() {
            warn!("Telemetry dispatcher was shut down and cannot be restarted");
            return;
        }

        let mut worker = self.worker.lock();
        if worker.is_some() {
            warn!("Telemetry worker is already running");
            return;
        }

        info!("Starting telemetry worker");
        *worker = Some(tokio::spawn(worker::run(
            Arc::clone(&self.shared),
            self.cancellation_token.clone(),
        )));
    }

    /// Probe now unless connected or cooling down. Returns the resulting state.
    pub async fn connect(&self) -> bool {
        self.ensure_connected().await
    }

    pub async fn enqueue_data(&self, event: DataEvent) -> Result<(), TelemetryError> {
        self.submit(TelemetryEvent::Data(event)).await
    }

    pub async fn enqueue_alert(&self, event: AlertEvent) -> Result<(), TelemetryError> {
        self.submit(TelemetryEvent::Alert(event)).await
    }

    /// Hand an event to its queue.
    ///
    /// Fails with `Disconnected` (queue untouched) or `QueueFull` (event
    /// dropped). Neither is fatal for the caller.
    pub async fn submit(&self, event: TelemetryEvent) -> Result<(), TelemetryError> {
        if !self.ensure_connected().await {
            DispatcherStats::bump(&self.shared.stats.rejected_disconnected);
            debug!("Backend disconnected, not queueing {}", event.description());
            return Err(TelemetryError::Disconnected);
        }

        let queue = self.shared.queue_for(&event);
        let is_data = matches!(event, TelemetryEvent::Data(_));

        match queue.try_push(event) {
            Ok(()) => {
                let counter = if is_data {
                    &self.shared.stats.data_enqueued
                } else {
                    &self.shared.stats.alerts_enqueued
                };
                DispatcherStats::bump(counter);
                self.shared.wake.notify_one();
                Ok(())
            }
            Err(rejected) => {
                DispatcherStats::bump(&self.shared.stats.dropped_full);
                warn!(
                    "{} queue full ({}), dropping {}",
                    queue.name(),
                    queue.capacity(),
                    rejected.description()
                );
                Err(TelemetryError::QueueFull {
                    queue: queue.name(),
                    capacity: queue.capacity(),
                })
            }
        }
    }

    async fn ensure_connected(&self) -> bool {
        match self
            .shared
            .connection
            .begin_probe(self.shared.needs_revalidation())
        {
            ProbeDecision::Connected => true,
            ProbeDecision::CoolingDown { remaining } => {
                debug!("Backend still disconnected, next probe in {:?}", remaining);
                false
            }
            ProbeDecision::Probe => self.shared.probe().await,
        }
    }

    /// Stop the worker and wait for it up to the configured bound.
    ///
    /// Returns false when the worker had to be abandoned. Queued events that
    /// were not delivered are discarded.
    pub async fn shutdown(&self) -> bool {
        self.cancellation_token.cancel();

        let handle = self.worker.lock().take();
        let Some(mut handle) = handle else {
            return true;
        };

        let wait = self.shared.config.shutdown_wait();
        let stopped = match tokio::time::timeout(wait, &mut handle).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!("Telemetry worker ended abnormally: {}", e);
                true
            }
            Err(_) => {
                warn!("Telemetry worker did not stop within {:?}, abandoning it", wait);
                handle.abort();
                false
            }
        };

        let (data, alerts) = self.pending();
        if data + alerts > 0 {
            info!("Discarding {} data and {} alert events on shutdown", data, alerts);
        }

        let stats = self.stats();
        info!(
            "Telemetry dispatcher stopped: delivered {}, dropped {}",
            stats.delivered,
            stats.total_dropped()
        );
        stopped
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connection.is_connected()
    }

    /// Whether a submission now could reach a queue: connected, or the
    /// reconnect cooldown has elapsed. Makes no network call.
    pub fn accepting(&self) -> bool {
        self.shared.connection.probe_allowed()
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Queued (data, alert) events not yet picked up by the worker
    pub fn pending(&self) -> (usize, usize) {
        (self.shared.data_queue.len(), self.shared.alert_queue.len())
    }

    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.shared.stats.snapshot()
    }
}

impl Drop for TelemetryDispatcher {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}
