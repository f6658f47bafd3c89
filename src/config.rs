use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FatigueConfig {
    pub backend: BackendConfig,
    pub analyzer: AnalyzerConfig,
    pub telemetry: TelemetryConfig,
    pub alarm: AlarmConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BackendConfig {
    /// Base URL of the fleet backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Device identifier, sent in the request path only
    #[serde(default = "default_device_id")]
    pub device_id: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// Frames per second pulled from the landmark provider
    #[serde(default = "default_analyzer_fps")]
    pub fps: u32,

    /// EAR below this value counts as a closed-eye frame
    #[serde(default = "default_ear_threshold")]
    pub ear_threshold: f64,

    /// MAR above this value counts as an open-mouth frame
    #[serde(default = "default_mar_threshold")]
    pub mar_threshold: f64,

    /// Absolute head angle (degrees) above which a frame counts as tilted
    #[serde(default = "default_head_tilt_degrees")]
    pub head_tilt_degrees: f64,

    #[serde(default = "default_consec_frames")]
    pub eye_consec_frames: u32,

    #[serde(default = "default_consec_frames")]
    pub mouth_consec_frames: u32,

    #[serde(default = "default_consec_frames")]
    pub head_consec_frames: u32,

    /// Consecutive no-face frames tolerated before all counters reset
    #[serde(default = "default_face_loss_reset_frames")]
    pub face_loss_reset_frames: u32,

    /// Which face drives the counters when several are detected
    #[serde(default)]
    pub face_selection: FaceSelection,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TelemetryConfig {
    #[serde(default = "default_data_queue_capacity")]
    pub data_queue_capacity: usize,

    #[serde(default = "default_alert_queue_capacity")]
    pub alert_queue_capacity: usize,

    /// Health probe budget on the enqueue path (must stay below one second)
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Per-event delivery budget in the background worker
    #[serde(default = "default_delivery_timeout_seconds")]
    pub delivery_timeout_seconds: u64,

    /// Minimum interval between reconnect probes
    #[serde(default = "default_reconnect_cooldown_seconds")]
    pub reconnect_cooldown_seconds: u64,

    /// Longest the worker sleeps without a wake-up when both queues are empty
    #[serde(default = "default_idle_interval_ms")]
    pub idle_interval_ms: u64,

    /// Bounded wait for the worker on shutdown
    #[serde(default = "default_shutdown_wait_ms")]
    pub shutdown_wait_ms: u64,

    /// Consecutive delivery failures that trigger a revalidation probe (0 disables)
    #[serde(default = "default_revalidate_after_failures")]
    pub revalidate_after_failures: u32,

    /// Resend the current status at this interval even without a change (0 disables)
    #[serde(default = "default_heartbeat_seconds")]
    pub heartbeat_seconds: u64,
}

impl TelemetryConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_seconds)
    }

    pub fn reconnect_cooldown(&self) -> Duration {
        Duration::from_secs(self.reconnect_cooldown_seconds)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    pub fn shutdown_wait(&self) -> Duration {
        Duration::from_millis(self.shutdown_wait_ms)
    }

    pub fn heartbeat(&self) -> Option<Duration> {
        (self.heartbeat_seconds > 0).then(|| Duration::from_secs(self.heartbeat_seconds))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AlarmConfig {
    /// Disable to keep the alarm silent (state is still tracked and logged)
    #[serde(default = "default_alarm_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FaceSelection {
    /// Largest landmark bounding box, the face closest to the camera
    #[default]
    Largest,
    /// Highest detector confidence, falling back to the largest box
    MostConfident,
    /// First face in provider order
    First,
}

impl FaceSelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaceSelection::Largest => "largest",
            FaceSelection::MostConfident => "most_confident",
            FaceSelection::First => "first",
        }
    }
}

impl FatigueConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("backend.base_url", default_base_url())?
            .set_default("backend.device_id", default_device_id())?
            .set_default("analyzer.fps", default_analyzer_fps())?
            .set_default("analyzer.ear_threshold", default_ear_threshold())?
            .set_default("analyzer.mar_threshold", default_mar_threshold())?
            .set_default("analyzer.head_tilt_degrees", default_head_tilt_degrees())?
            .set_default("analyzer.eye_consec_frames", default_consec_frames())?
            .set_default("analyzer.mouth_consec_frames", default_consec_frames())?
            .set_default("analyzer.head_consec_frames", default_consec_frames())?
            .set_default(
                "analyzer.face_loss_reset_frames",
                default_face_loss_reset_frames(),
            )?
            .set_default(
                "analyzer.face_selection",
                FaceSelection::default().as_str(),
            )?
            .set_default(
                "telemetry.data_queue_capacity",
                default_data_queue_capacity() as i64,
            )?
            .set_default(
                "telemetry.alert_queue_capacity",
                default_alert_queue_capacity() as i64,
            )?
            .set_default(
                "telemetry.probe_timeout_ms",
                default_probe_timeout_ms() as i64,
            )?
            .set_default(
                "telemetry.delivery_timeout_seconds",
                default_delivery_timeout_seconds() as i64,
            )?
            .set_default(
                "telemetry.reconnect_cooldown_seconds",
                default_reconnect_cooldown_seconds() as i64,
            )?
            .set_default(
                "telemetry.idle_interval_ms",
                default_idle_interval_ms() as i64,
            )?
            .set_default(
                "telemetry.shutdown_wait_ms",
                default_shutdown_wait_ms() as i64,
            )?
            .set_default(
                "telemetry.revalidate_after_failures",
                default_revalidate_after_failures(),
            )?
            .set_default(
                "telemetry.heartbeat_seconds",
                default_heartbeat_seconds() as i64,
            )?
            .set_default("alarm.enabled", default_alarm_enabled())?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // FATIGUE_TELEMETRY__PROBE_TIMEOUT_MS=300 style overrides
            .add_source(
                Environment::with_prefix("FATIGUE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: FatigueConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.backend.base_url.as_str();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Message(format!(
                "Backend base_url must start with http:// or https:// (got '{}')",
                base_url
            )));
        }

        if self.backend.device_id.is_empty() || self.backend.device_id.contains('/') {
            return Err(ConfigError::Message(
                "Backend device_id must be non-empty and must not contain '/'".to_string(),
            ));
        }

        self.analyzer.validate()?;
        self.telemetry.validate()
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 {
            return Err(ConfigError::Message(
                "Analyzer fps must be greater than 0".to_string(),
            ));
        }

        if self.eye_consec_frames == 0
            || self.mouth_consec_frames == 0
            || self.head_consec_frames == 0
        {
            return Err(ConfigError::Message(
                "Consecutive frame minimums must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [
            ("ear_threshold", self.ear_threshold),
            ("mar_threshold", self.mar_threshold),
            ("head_tilt_degrees", self.head_tilt_degrees),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Message(format!(
                    "Analyzer {} must be a finite, non-negative number (got {})",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

impl TelemetryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_queue_capacity == 0 || self.alert_queue_capacity == 0 {
            return Err(ConfigError::Message(
                "Telemetry queue capacities must be greater than 0".to_string(),
            ));
        }

        if self.probe_timeout_ms == 0 || self.probe_timeout_ms >= 1000 {
            return Err(ConfigError::Message(
                "Probe timeout must be between 1 and 999 ms".to_string(),
            ));
        }

        if self.delivery_timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "Delivery timeout must be greater than 0".to_string(),
            ));
        }

        if self.idle_interval_ms == 0 {
            return Err(ConfigError::Message(
                "Worker idle interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for FatigueConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: default_base_url(),
                device_id: default_device_id(),
            },
            analyzer: AnalyzerConfig::default(),
            telemetry: TelemetryConfig::default(),
            alarm: AlarmConfig {
                enabled: default_alarm_enabled(),
            },
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fps: default_analyzer_fps(),
            ear_threshold: default_ear_threshold(),
            mar_threshold: default_mar_threshold(),
            head_tilt_degrees: default_head_tilt_degrees(),
            eye_consec_frames: default_consec_frames(),
            mouth_consec_frames: default_consec_frames(),
            head_consec_frames: default_consec_frames(),
            face_loss_reset_frames: default_face_loss_reset_frames(),
            face_selection: FaceSelection::default(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            data_queue_capacity: default_data_queue_capacity(),
            alert_queue_capacity: default_alert_queue_capacity(),
            probe_timeout_ms: default_probe_timeout_ms(),
            delivery_timeout_seconds: default_delivery_timeout_seconds(),
            reconnect_cooldown_seconds: default_reconnect_cooldown_seconds(),
            idle_interval_ms: default_idle_interval_ms(),
            shutdown_wait_ms: default_shutdown_wait_ms(),
            revalidate_after_failures: default_revalidate_after_failures(),
            heartbeat_seconds: default_heartbeat_seconds(),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_device_id() -> String {
    "device_01".to_string()
}

fn default_analyzer_fps() -> u32 {
    30
}
fn default_ear_threshold() -> f64 {
    0.25
}
fn default_mar_threshold() -> f64 {
    0.70
}
fn default_head_tilt_degrees() -> f64 {
    10.0
}
fn default_consec_frames() -> u32 {
    48
}
fn default_face_loss_reset_frames() -> u32 {
    15
} // Half a second at 30 fps

fn default_data_queue_capacity() -> usize {
    100
}
fn default_alert_queue_capacity() -> usize {
    50
}
fn default_probe_timeout_ms() -> u64 {
    500
}
fn default_delivery_timeout_seconds() -> u64 {
    5
}
fn default_reconnect_cooldown_seconds() -> u64 {
    30
}
fn default_idle_interval_ms() -> u64 {
    250
}
fn default_shutdown_wait_ms() -> u64 {
    2000
}
fn default_revalidate_after_failures() -> u32 {
    3
}
fn default_heartbeat_seconds() -> u64 {
    10
}

fn default_alarm_enabled() -> bool {
    true
}
