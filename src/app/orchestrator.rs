use super::relay::StatusRelay;
use super::types::{FrameOutcome, RunStats};
use crate::alarm::{AlarmDriver, LogAlarmDriver};
use crate::alert;
use crate::analyzer::SignalAnalyzer;
use crate::config::FatigueConfig;
use crate::error::Result;
use crate::landmarks::{LandmarkFrame, LandmarkProvider};
use crate::telemetry::{HttpTransport, TelemetryDispatcher, TelemetryTransport};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Sensing loop coordinator: provider, analyzer, alarm and telemetry
pub struct FatigueOrchestrator {
    pub(super) config: FatigueConfig,
    pub(super) provider: Box<dyn LandmarkProvider>,
    pub(super) analyzer: SignalAnalyzer,
    pub(super) dispatcher: Arc<TelemetryDispatcher>,
    pub(super) alarm: Arc<dyn AlarmDriver>,
    pub(super) relay: StatusRelay,
    pub(super) stats: RunStats,
    pub(super) cancellation_token: CancellationToken,
}

impl FatigueOrchestrator {
    /// Create an orchestrator with explicit collaborators
    pub fn new(
        config: FatigueConfig,
        provider: Box<dyn LandmarkProvider>,
        transport: Arc<dyn TelemetryTransport>,
        alarm: Arc<dyn AlarmDriver>,
    ) -> Result<Self> {
        config.validate()?;

        info!(
            "Creating orchestrator for device {} (provider: {})",
            config.backend.device_id,
            provider.name()
        );

        let analyzer = SignalAnalyzer::new(config.analyzer.clone());
        let dispatcher = Arc::new(TelemetryDispatcher::new(config.telemetry.clone(), transport)?);
        let relay = StatusRelay::new(config.telemetry.heartbeat());

        Ok(Self {
            config,
            provider,
            analyzer,
            dispatcher,
            alarm,
            relay,
            stats: RunStats::default(),
            cancellation_token: CancellationToken::new(),
        })
    }

    /// Create an orchestrator that posts to the configured HTTP backend
    pub fn with_http_backend(
        config: FatigueConfig,
        provider: Box<dyn LandmarkProvider>,
    ) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config.backend)?);
        let alarm = Arc::new(LogAlarmDriver::new(config.alarm.enabled));
        Self::new(config, provider, transport, alarm)
    }

    /// Run one frame through analysis, alarm and telemetry.
    ///
    /// Bounded by at most one probe timeout; never waits on delivery.
    pub async fn process_frame(&mut self, frame: &LandmarkFrame) -> FrameOutcome {
        let analysis = self.analyzer.analyze(frame);
        let assessment = alert::aggregate(&analysis.record);

        self.alarm.update(assessment.status);
        let relay = self.relay.relay(&assessment, &self.dispatcher).await;

        self.stats.frames += 1;
        if relay.status_changed {
            self.stats.status_changes += 1;
            info!(
                "Driver status: {} (severity {})",
                assessment.status, assessment.severity
            );
        }
        if relay.data_enqueued {
            self.stats.data_enqueued += 1;
        }
        if relay.alert_enqueued {
            self.stats.alerts_enqueued += 1;
        }

        debug!(
            "Frame {}: ear {:.3}, mar {:.3}, angle {:.1}, faces {}, status {}",
            self.stats.frames,
            analysis.record.ear,
            analysis.record.mar,
            analysis.record.head_angle,
            analysis.record.faces_detected,
            assessment.status
        );

        FrameOutcome {
            analysis,
            assessment,
            relay,
        }
    }

    /// Token that stops `run` when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    pub fn dispatcher(&self) -> Arc<TelemetryDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }
}
