//! Periodic scheduling with jitter.
//!
//! Cosmetic per-frame work (tempo variation, status refresh) runs on a fixed
//! interval plus uniform jitter instead of a per-frame coin flip, so the rate
//! is independent of frame rate and reproducible under a seeded RNG.

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleCfg {
    /// Mean seconds between firings.
    pub interval: f64,
    /// Half-width of the uniform jitter added to each interval.
    #[serde(default)]
    pub jitter: f64,
}

#[derive(Clone, Debug)]
pub struct PeriodicSchedule {
    cfg: ScheduleCfg,
    next_due: Option<f64>,
}

impl PeriodicSchedule {
    pub fn new(cfg: ScheduleCfg) -> Self {
        Self {
            cfg,
            next_due: None,
        }
    }

    /// Returns true at most once per call when the deadline has passed. The
    /// first poll only arms the schedule.
    pub fn poll<R: Rng>(&mut self, now: f64, rng: &mut R) -> bool {
        match self.next_due {
            None => {
                self.next_due = Some(now + self.next_interval(rng));
                false
            }
            Some(due) if now >= due => {
                self.next_due = Some(now + self.next_interval(rng));
                true
            }
            Some(_) => false,
        }
    }

    /// Forget the pending deadline; the next poll re-arms.
    pub fn reset(&mut self) {
        self.next_due = None;
    }

    pub fn next_due(&self) -> Option<f64> {
        self.next_due
    }

    fn next_interval<R: Rng>(&self, rng: &mut R) -> f64 {
        let jitter = self.cfg.jitter.abs().min(self.cfg.interval);
        let offset = if jitter > 0.0 {
            rng.random_range(-jitter..=jitter)
        } else {
            0.0
        };
        (self.cfg.interval + offset).max(0.0)
    }
}
