use crate::alert::{Assessment, Status};
use crate::error::TelemetryError;
use crate::telemetry::{AlertEvent, DataEvent, TelemetryDispatcher};

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// What one call to [`StatusRelay::relay`] handed to the dispatcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayOutcome {
    pub status_changed: bool,
    pub data_enqueued: bool,
    pub alert_enqueued: bool,
    /// Events still waiting for a successful enqueue
    pub pending: usize,
}

/// Turns per-frame assessments into telemetry submissions.
///
/// A data event goes out on every status change and every heartbeat
/// interval; an alert goes out on entering any non-normal status.
///
/// Each event is offered once when it is created. One refused as
/// `Disconnected` stays pending and is offered again only once the
/// dispatcher would run a fresh probe, until it is accepted or a newer
/// status change replaces it. One refused as `QueueFull` was already
/// dropped and is not retried.
pub struct StatusRelay {
    heartbeat: Option<Duration>,
    last_status: Option<Status>,
    last_data_settled: Option<Instant>,
    pending_data: Option<DataEvent>,
    pending_alert: Option<AlertEvent>,
}

impl StatusRelay {
    pub fn new(heartbeat: Option<Duration>) -> Self {
        Self {
            heartbeat,
            last_status: None,
            last_data_settled: None,
            pending_data: None,
            pending_alert: None,
        }
    }

    pub fn last_status(&self) -> Option<Status> {
        self.last_status
    }

    pub fn pending(&self) -> usize {
        usize::from(self.pending_data.is_some()) + usize::from(self.pending_alert.is_some())
    }

    pub async fn relay(
        &mut self,
        assessment: &Assessment,
        dispatcher: &TelemetryDispatcher,
    ) -> RelayOutcome {
        let now = Instant::now();
        let status_changed = self.last_status != Some(assessment.status);

        let mut fresh_data = false;
        let mut fresh_alert = false;
        if status_changed {
            debug!(
                "Status {} -> {}",
                self.last_status.map(|s| s.as_str()).unwrap_or("none"),
                assessment.status
            );
            self.last_status = Some(assessment.status);
            self.pending_data = Some(DataEvent::from_assessment(assessment));
            self.pending_alert = AlertEvent::for_status(assessment.status);
            fresh_data = true;
            fresh_alert = self.pending_alert.is_some();
        } else if self.heartbeat_due(now) {
            fresh_data = self.pending_data.is_none();
            self.pending_data = Some(DataEvent::from_assessment(assessment));
        }

        let mut outcome = RelayOutcome {
            status_changed,
            ..RelayOutcome::default()
        };

        if fresh_alert || (self.pending_alert.is_some() && dispatcher.accepting()) {
            if let Some(alert) = self.pending_alert.clone() {
                let result = dispatcher.enqueue_alert(alert).await;
                outcome.alert_enqueued = result.is_ok();
                Self::settle(&mut self.pending_alert, result, "Alert");
            }
        }

        if fresh_data || (self.pending_data.is_some() && dispatcher.accepting()) {
            if let Some(data) = self.pending_data.clone() {
                let result = dispatcher.enqueue_data(data).await;
                outcome.data_enqueued = result.is_ok();
                if !matches!(result, Err(TelemetryError::Disconnected)) {
                    self.last_data_settled = Some(now);
                }
                Self::settle(&mut self.pending_data, result, "Data event");
            }
        }

        outcome.pending = self.pending();
        outcome
    }

    /// Clear or keep a pending slot after its enqueue attempt
    fn settle<T>(slot: &mut Option<T>, result: Result<(), TelemetryError>, kind: &str) {
        match result {
            Ok(()) => *slot = None,
            Err(TelemetryError::Disconnected) => debug!("{} held until the backend returns", kind),
            Err(e) => {
                debug!("{} not retried: {}", kind, e);
                *slot = None;
            }
        }
    }

    fn heartbeat_due(&self, now: Instant) -> bool {
        match (self.heartbeat, self.last_data_settled) {
            (Some(interval), Some(last)) => now.saturating_duration_since(last) >= interval,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}
