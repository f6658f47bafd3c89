use super::FatigueOrchestrator;
use tracing::{info, warn};

impl FatigueOrchestrator {
    /// Stop the alarm and the telemetry worker.
    ///
    /// Returns the process exit code: 1 when the worker had to be abandoned.
    pub async fn shutdown(&mut self) -> i32 {
        info!("Beginning graceful shutdown");

        self.cancellation_token.cancel();

        self.alarm.stop();
        info!("alarm component stopped");

        let mut exit_code = 0;
        if self.dispatcher.shutdown().await {
            info!("telemetry component stopped");
        } else {
            warn!("telemetry component stop timeout");
            exit_code = 1;
        }

        let telemetry = self.dispatcher.stats();
        info!(
            "Processed {} frames ({} skipped), {} status changes, {} data / {} alert events enqueued, {} delivered",
            self.stats.frames,
            self.stats.capture_errors,
            self.stats.status_changes,
            self.stats.data_enqueued,
            self.stats.alerts_enqueued,
            telemetry.delivered
        );

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        exit_code
    }
}
