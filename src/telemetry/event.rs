use crate::alert::{Assessment, Severity, Status};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/devices/{id}/data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEvent {
    #[serde(rename = "drowsiness_level")]
    pub level: Severity,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl DataEvent {
    pub fn new<S: Into<String>>(level: Severity, status: S) -> Self {
        Self {
            level,
            status: status.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn from_assessment(assessment: &Assessment) -> Self {
        Self::new(assessment.severity, assessment.status.as_str())
    }
}

/// Body of `POST /api/devices/{id}/alert`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub alert_type: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new<S: Into<String>>(alert_type: S, severity: Severity) -> Self {
        Self {
            alert_type: alert_type.into(),
            severity,
            timestamp: Utc::now(),
        }
    }

    /// Alert raised when entering `status`; `None` for `Normal`
    pub fn for_status(status: Status) -> Option<Self> {
        status
            .alert_type()
            .map(|alert_type| Self::new(alert_type, status.severity()))
    }
}

/// Unit of work handed from the sensing path to the delivery worker
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    Data(DataEvent),
    Alert(AlertEvent),
}

impl TelemetryEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            TelemetryEvent::Data(_) => "data",
            TelemetryEvent::Alert(_) => "alert",
        }
    }

    pub fn description(&self) -> String {
        match self {
            TelemetryEvent::Data(event) => {
                format!("data (status={}, level={})", event.status, event.level)
            }
            TelemetryEvent::Alert(event) => {
                format!("alert (type={}, severity={})", event.alert_type, event.severity)
            }
        }
    }
}

impl From<DataEvent> for TelemetryEvent {
    fn from(event: DataEvent) -> Self {
        TelemetryEvent::Data(event)
    }
}

impl From<AlertEvent> for TelemetryEvent {
    fn from(event: AlertEvent) -> Self {
        TelemetryEvent::Alert(event)
    }
}
