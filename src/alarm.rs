use crate::alert::Status;

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Audible alarm collaborator.
///
/// `update` is called once per frame from the sensing loop and must return
/// immediately; playback runs elsewhere.
pub trait AlarmDriver: Send + Sync {
    fn update(&self, status: Status);

    fn stop(&self);

    fn is_looping(&self) -> bool;
}

/// Alarm driver that tracks playback state and reports it through tracing.
///
/// Loops while the status is critical and plays one chime on entering
/// `Yawning`.
pub struct LogAlarmDriver {
    enabled: bool,
    looping: AtomicBool,
    chimes: AtomicU64,
    last_status: Mutex<Option<Status>>,
}

impl LogAlarmDriver {
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            warn!("Alarm sound disabled by configuration");
        }
        Self {
            enabled,
            looping: AtomicBool::new(false),
            chimes: AtomicU64::new(0),
            last_status: Mutex::new(None),
        }
    }

    pub fn chime_count(&self) -> u64 {
        self.chimes.load(Ordering::Relaxed)
    }

    fn sound(&self, what: &str) {
        if self.enabled {
            info!("Alarm: {}", what);
        } else {
            debug!("Alarm (muted): {}", what);
        }
    }
}

impl AlarmDriver for LogAlarmDriver {
    fn update(&self, status: Status) {
        let previous = self.last_status.lock().replace(status);
        if previous == Some(status) {
            return;
        }

        if status.is_critical() {
            if !self.looping.swap(true, Ordering::AcqRel) {
                self.sound("looped playback started");
            }
        } else if self.looping.swap(false, Ordering::AcqRel) {
            self.sound("looped playback stopped");
        }

        if status == Status::Yawning {
            self.chimes.fetch_add(1, Ordering::Relaxed);
            self.sound("single chime");
        }
    }

    fn stop(&self) {
        if self.looping.swap(false, Ordering::AcqRel) {
            self.sound("looped playback stopped");
        }
        *self.last_status.lock() = None;
    }

    fn is_looping(&self) -> bool {
        self.looping.load(Ordering::Acquire)
    }
}
