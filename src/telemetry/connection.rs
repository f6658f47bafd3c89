use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionState {
    pub connected: bool,
    pub last_probe: Option<Instant>,
}

/// What the enqueue path should do about connectivity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeDecision {
    /// Treat the backend as reachable, no network call
    Connected,
    /// A probe slot was reserved; run the probe and report it back
    Probe,
    /// Disconnected and inside the cooldown window, no network call
    CoolingDown { remaining: Duration },
}

/// Cooldown-gated connection state.
///
/// State only changes in `complete_probe`. The lock is never held across a
/// network call: `begin_probe` stamps the probe time and releases it.
pub struct ConnectionMonitor {
    state: Mutex<ConnectionState>,
    cooldown: Duration,
}

impl ConnectionMonitor {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: Mutex::new(ConnectionState {
                connected: false,
                last_probe: None,
            }),
            cooldown,
        }
    }

    /// Decide whether to probe now.
    ///
    /// With `revalidate` a connected backend is re-probed once the cooldown
    /// since the last probe has elapsed.
    pub fn begin_probe(&self, revalidate: bool) -> ProbeDecision {
        let mut state = self.state.lock();
        if state.connected && !revalidate {
            return ProbeDecision::Connected;
        }

        let now = Instant::now();
        if let Some(last) = state.last_probe {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.cooldown {
                return if state.connected {
                    ProbeDecision::Connected
                } else {
                    ProbeDecision::CoolingDown {
                        remaining: self.cooldown - elapsed,
                    }
                };
            }
        }

        state.last_probe = Some(now);
        debug!("Probe slot reserved (revalidate: {})", revalidate);
        ProbeDecision::Probe
    }

    /// Record a finished probe. Returns true when the state flipped.
    pub fn complete_probe(&self, reachable: bool) -> bool {
        let mut state = self.state.lock();
        let changed = state.connected != reachable;
        state.connected = reachable;
        changed
    }

    /// True when connected or when `begin_probe` would reserve a probe now
    pub fn probe_allowed(&self) -> bool {
        let state = self.state.lock();
        if state.connected {
            return true;
        }
        match state.last_probe {
            Some(last) => Instant::now().saturating_duration_since(last) >= self.cooldown,
            None => true,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }
}
