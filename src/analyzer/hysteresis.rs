/// Consecutive-frame counter that fires after a sustained violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HysteresisCounter {
    count: u32,
    min_frames: u32,
}

impl HysteresisCounter {
    pub fn new(min_frames: u32) -> Self {
        Self {
            count: 0,
            min_frames,
        }
    }

    /// Advance by one frame and return whether the signal is active.
    ///
    /// A violating frame increments the counter, any other frame resets it.
    pub fn update(&mut self, violating: bool) -> bool {
        if violating {
            self.count = self.count.saturating_add(1);
        } else {
            self.count = 0;
        }
        self.is_active()
    }

    pub fn is_active(&self) -> bool {
        self.count >= self.min_frames
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn min_frames(&self) -> u32 {
        self.min_frames
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

/// The eye, mouth and head counters owned by one analyzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdCounters {
    pub eye: HysteresisCounter,
    pub mouth: HysteresisCounter,
    pub head: HysteresisCounter,
}

impl ThresholdCounters {
    pub fn new(eye_frames: u32, mouth_frames: u32, head_frames: u32) -> Self {
        Self {
            eye: HysteresisCounter::new(eye_frames),
            mouth: HysteresisCounter::new(mouth_frames),
            head: HysteresisCounter::new(head_frames),
        }
    }

    pub fn reset(&mut self) {
        self.eye.reset();
        self.mouth.reset();
        self.head.reset();
    }

    pub fn is_idle(&self) -> bool {
        self.eye.count() == 0 && self.mouth.count() == 0 && self.head.count() == 0
    }
}
