use super::dispatcher::DispatcherShared;
use super::event::TelemetryEvent;
use super::stats::DispatcherStats;
use crate::error::TelemetryError;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Delivery loop: one data event, then one alert event, per cycle.
///
/// When both queues were empty it parks until a push wakes it, the token is
/// cancelled, or the idle interval passes.
pub(crate) async fn run(shared: Arc<DispatcherShared>, token: CancellationToken) {
    info!("Telemetry worker started");

    loop {
        if token.is_cancelled() {
            break;
        }

        let mut idle = true;

        if let Some(event) = shared.data_queue.try_pop() {
            idle = false;
            deliver(&shared, event).await;
        }

        if let Some(event) = shared.alert_queue.try_pop() {
            idle = false;
            deliver(&shared, event).await;
        }

        if idle {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = shared.wake.notified() => {}
                _ = tokio::time::sleep(shared.config.idle_interval()) => {}
            }
        }
    }

    info!("Telemetry worker stopped");
}

/// At-most-once delivery: failures are logged and the event is gone
async fn deliver(shared: &DispatcherShared, event: TelemetryEvent) {
    let timeout = shared.config.delivery_timeout();

    let result = match tokio::time::timeout(timeout, shared.transport.deliver(&event)).await {
        Ok(result) => result,
        Err(_) => Err(TelemetryError::Timeout {
            operation: "delivery",
            after: timeout,
        }),
    };

    match result {
        Ok(()) => {
            DispatcherStats::bump(&shared.stats.delivered);
            shared.failures_since_probe.store(0, Ordering::Relaxed);
            debug!("Delivered {}", event.description());
        }
        Err(e) => {
            DispatcherStats::bump(&shared.stats.delivery_failures);
            let failures = shared.failures_since_probe.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(
                "Dropping {} after failed delivery ({} in a row): {}",
                event.description(),
                failures,
                e
            );
        }
    }
}
