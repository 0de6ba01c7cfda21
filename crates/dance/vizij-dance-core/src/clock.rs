//! Time sources. The overlay and the controller's cooldowns read the same
//! clock so tests can drive both deterministically.

use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Monotonic seconds since an arbitrary origin.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Shared, manually advanced clock. Clones observe the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    t: Arc<Mutex<f64>>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            t: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, dt: f64) {
        let mut guard = self.t.lock().unwrap_or_else(|p| p.into_inner());
        *guard += dt;
    }

    pub fn set(&self, t: f64) {
        let mut guard = self.t.lock().unwrap_or_else(|p| p.into_inner());
        *guard = t;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.t.lock().unwrap_or_else(|p| p.into_inner())
    }
}
