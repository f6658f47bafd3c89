use crate::analyzer::ClassificationRecord;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Driver status label, ordered by alert precedence (highest first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Drowsy,
    Yawning,
    HeadTilt,
    Normal,
}

impl Status {
    /// The status that keeps the alarm looping
    pub const CRITICAL: Status = Status::Drowsy;

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Drowsy => "drowsy",
            Status::Yawning => "yawning",
            Status::HeadTilt => "head_tilt",
            Status::Normal => "normal",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "drowsy" => Some(Status::Drowsy),
            "yawning" => Some(Status::Yawning),
            "head_tilt" => Some(Status::HeadTilt),
            "normal" => Some(Status::Normal),
            _ => None,
        }
    }

    pub fn is_critical(&self) -> bool {
        *self == Self::CRITICAL
    }

    /// Alert type reported to the backend when entering this status
    pub fn alert_type(&self) -> Option<&'static str> {
        match self {
            Status::Drowsy => Some("drowsiness_detected"),
            Status::Yawning => Some("yawning_detected"),
            Status::HeadTilt => Some("head_tilt_detected"),
            Status::Normal => None,
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::from_status(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse level shared by `drowsiness_level` and `severity`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Level for a status label: critical is high, any other active status
    /// is medium, normal (or anything unrecognised as active) is low.
    pub fn from_status(status: &str) -> Self {
        match status {
            s if s == Status::CRITICAL.as_str() => Severity::High,
            "normal" | "" => Severity::Low,
            _ => Severity::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status and level derived from one classification record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub status: Status,
    pub severity: Severity,
}

/// Map a record's flags to one status by precedence
pub fn aggregate(record: &ClassificationRecord) -> Assessment {
    let status = if record.drowsy {
        Status::Drowsy
    } else if record.yawning {
        Status::Yawning
    } else if record.head_tilt {
        Status::HeadTilt
    } else {
        Status::Normal
    };

    Assessment {
        status,
        severity: status.severity(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(drowsy: bool, yawning: bool, head_tilt: bool) -> ClassificationRecord {
        ClassificationRecord {
            drowsy,
            yawning,
            head_tilt,
            ..ClassificationRecord::neutral(1, Utc::now())
        }
    }

    #[test]
    fn test_precedence() {
        assert_eq!(aggregate(&record(true, true, true)).status, Status::Drowsy);
        assert_eq!(aggregate(&record(true, false, true)).status, Status::Drowsy);
        assert_eq!(aggregate(&record(false, true, true)).status, Status::Yawning);
        assert_eq!(aggregate(&record(false, false, true)).status, Status::HeadTilt);
        assert_eq!(aggregate(&record(false, false, false)).status, Status::Normal);
    }

    #[test]
    fn test_severity_from_status() {
        assert_eq!(aggregate(&record(true, false, false)).severity, Severity::High);
        assert_eq!(aggregate(&record(false, true, false)).severity, Severity::Medium);
        assert_eq!(aggregate(&record(false, false, true)).severity, Severity::Medium);
        assert_eq!(aggregate(&record(false, false, false)).severity, Severity::Low);
        assert_eq!(Severity::from_status("phone_use"), Severity::Medium);
    }

    #[test]
    fn test_status_text_round_trip() {
        for status in [Status::Drowsy, Status::Yawning, Status::HeadTilt, Status::Normal] {
            assert_eq!(Status::parse(status.as_str()), Some(status));
            assert_eq!(
                serde_json::to_string(&status).unwrap(),
                format!("\"{}\"", status)
            );
        }
        assert_eq!(Status::parse("asleep"), None);
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"high\"");
    }

    #[test]
    fn test_alert_types() {
        assert_eq!(Status::Drowsy.alert_type(), Some("drowsiness_detected"));
        assert_eq!(Status::Normal.alert_type(), None);
        assert!(Status::Drowsy.is_critical());
        assert!(!Status::Yawning.is_critical());
    }
}
