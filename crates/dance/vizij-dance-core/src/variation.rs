//! Naturalistic tempo variation for the active dance handle.

use rand::Rng;

use crate::config::VariationCfg;
use crate::ids::HandleId;
use crate::mixer::Mixer;
use crate::scheduler::PeriodicSchedule;

#[derive(Clone, Debug)]
pub struct VariationInjector {
    schedule: PeriodicSchedule,
    max_offset: f32,
}

impl VariationInjector {
    pub fn new(cfg: &VariationCfg) -> Self {
        Self {
            schedule: PeriodicSchedule::new(cfg.schedule),
            max_offset: cfg.max_offset.abs(),
        }
    }

    /// Perturb the handle's rate around `base_tempo` when the schedule fires.
    ///
    /// Each perturbation is computed from `base_tempo`, never from the
    /// current rate, so repeated variations do not drift. Returns the rate
    /// that was set.
    pub fn tick<R: Rng>(
        &mut self,
        now: f64,
        enabled: bool,
        base_tempo: f32,
        handle: Option<HandleId>,
        mixer: &mut dyn Mixer,
        rng: &mut R,
    ) -> Option<f32> {
        if !enabled {
            self.schedule.reset();
            return None;
        }
        if !self.schedule.poll(now, rng) {
            return None;
        }
        let handle = handle.filter(|h| mixer.is_running(*h))?;
        let offset = if self.max_offset > 0.0 {
            rng.random_range(-self.max_offset..=self.max_offset)
        } else {
            0.0
        };
        let rate = base_tempo * (1.0 + offset);
        mixer.set_rate(handle, rate);
        log::debug!("tempo variation: {rate:.3}x (base {base_tempo}x)");
        Some(rate)
    }

    pub fn reset(&mut self) {
        self.schedule.reset();
    }
}
