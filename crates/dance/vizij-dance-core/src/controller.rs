//! Playback controller: owns the single dance clip handle, sequences style
//! transitions and keeps the dance from ever staying stopped.
//!
//! Transitions run as a small state machine polled once per frame:
//!
//! ```text
//! Idle ──select──▶ Stopping ──transition_delay──▶ Starting ──verify_delay──▶ Playing
//!                     ▲  │ (newer request replaces the pending style)          │
//!                     └──┴────────────────────────select────────────────────────┘
//! ```
//!
//! When nothing is running yet (first selection, or the old handle already
//! stopped) the controller goes straight to `Starting`. The health check runs
//! only in `Idle`/`Playing`, so it can never start a second handle while a
//! transition is in flight.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::catalog::{StyleCatalog, StyleConfig};
use crate::error::DanceError;
use crate::ids::HandleId;
use crate::mixer::{LoopMode, Mixer};
use crate::outputs::{DanceEvent, Recovery};

/// The dance model always plays its first clip.
const BASE_CLIP: usize = 0;

/// Seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackTimings {
    /// Wait between stopping the old handle and starting the new one.
    pub transition_delay: f64,
    /// Wait after starting before confirming the handle runs.
    pub verify_delay: f64,
    /// Minimum quiet time before replaying a stalled handle.
    pub stall_cooldown: f64,
    /// Minimum quiet time before re-selecting the style from scratch.
    pub missing_cooldown: f64,
}

impl Default for PlaybackTimings {
    fn default() -> Self {
        Self {
            transition_delay: 0.05,
            verify_delay: 0.2,
            stall_cooldown: 1.0,
            missing_cooldown: 2.0,
        }
    }
}

/// Committed playback state. Replaced as a whole on every transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub active_clip: Option<HandleId>,
    pub active_style: String,
    /// Clock time of the last style switch.
    pub last_transition: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Stopping {
        /// Most recent request; later requests overwrite it.
        style: String,
        since: f64,
        /// Old handle, released when the new one starts.
        retiring: Option<HandleId>,
    },
    Starting {
        handle: HandleId,
        since: f64,
    },
    Playing,
}

#[derive(Debug)]
pub struct PlaybackController {
    timings: PlaybackTimings,
    catalog: StyleCatalog,
    state: Option<PlaybackState>,
    phase: Phase,
    tempo: f32,
    last_recovery: f64,
    /// A replay was attempted and the handle has not been seen running since.
    replayed: bool,
}

impl PlaybackController {
    pub fn new(timings: PlaybackTimings, catalog: StyleCatalog, tempo: f32) -> Self {
        Self {
            timings,
            catalog,
            state: None,
            phase: Phase::Idle,
            tempo,
            last_recovery: f64::NEG_INFINITY,
            replayed: false,
        }
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    pub fn state(&self) -> Option<&PlaybackState> {
        self.state.as_ref()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Base playback rate: the style tempo, or the slider value if moved since.
    pub fn tempo(&self) -> f32 {
        self.tempo
    }

    pub fn active_style(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.active_style.as_str())
    }

    pub fn active_style_config(&self) -> Option<&StyleConfig> {
        self.active_style().and_then(|id| self.catalog.get(id))
    }

    pub fn active_handle(&self) -> Option<HandleId> {
        self.state.as_ref().and_then(|s| s.active_clip)
    }

    /// Style waiting on an in-flight stop.
    pub fn pending_style(&self) -> Option<&str> {
        match &self.phase {
            Phase::Stopping { style, .. } => Some(style.as_str()),
            _ => None,
        }
    }

    pub fn is_running(&self, mixer: &dyn Mixer) -> bool {
        self.active_handle().is_some_and(|h| mixer.is_running(h))
    }

    /// Request a switch to `id`.
    ///
    /// Fails with `InvalidStyle` for unknown ids, `NotReady` without a mixer
    /// and `MissingAnimation` when the mixer has no clip. On success the old
    /// handle is stopped now and the new one starts after
    /// `transition_delay`, or immediately if nothing was running.
    pub fn select_style(
        &mut self,
        id: &str,
        mixer: Option<&mut dyn Mixer>,
        now: f64,
        events: &mut Vec<DanceEvent>,
    ) -> Result<(), DanceError> {
        let style = self
            .catalog
            .get(id)
            .cloned()
            .ok_or_else(|| DanceError::InvalidStyle(id.to_string()))?;
        let mixer = mixer.ok_or_else(|| DanceError::NotReady("no dance model loaded".into()))?;
        if mixer.clip_count() == 0 {
            return Err(DanceError::MissingAnimation {
                model: "dance model".into(),
            });
        }

        info!("dance style requested: {}", style.id);
        events.push(DanceEvent::StyleRequested {
            style: style.id.clone(),
        });

        if let Phase::Stopping {
            style: pending,
            since,
            ..
        } = &mut self.phase
        {
            *pending = style.id;
            *since = now;
            if let Some(state) = &mut self.state {
                state.last_transition = now;
            }
            return Ok(());
        }

        let previous = match &self.phase {
            Phase::Starting { handle, .. } => Some(*handle),
            _ => self.active_handle(),
        };
        let old_style = self
            .active_style()
            .unwrap_or(style.id.as_str())
            .to_string();

        match previous {
            Some(h) if mixer.is_running(h) => {
                mixer.stop(h);
                mixer.reset(h);
                mixer.set_enabled(h, false);
                self.state = Some(PlaybackState {
                    active_clip: None,
                    active_style: old_style,
                    last_transition: now,
                });
                self.phase = Phase::Stopping {
                    style: style.id,
                    since: now,
                    retiring: Some(h),
                };
                Ok(())
            }
            _ => {
                if let Some(h) = previous {
                    mixer.release(h);
                }
                self.start(&style, mixer, now, events)
            }
        }
    }

    /// Instantiate, configure and play a fresh handle for `style`, then
    /// commit the new state.
    fn start(
        &mut self,
        style: &StyleConfig,
        mixer: &mut dyn Mixer,
        now: f64,
        events: &mut Vec<DanceEvent>,
    ) -> Result<(), DanceError> {
        let handle = mixer.create_handle(BASE_CLIP)?;
        mixer.reset(handle);
        mixer.set_enabled(handle, true);
        mixer.set_loop(handle, LoopMode::Loop);
        mixer.set_rate(handle, style.tempo);
        mixer.set_weight(handle, 1.0);
        mixer.play(handle);

        self.tempo = style.tempo;
        self.replayed = false;
        self.state = Some(PlaybackState {
            active_clip: Some(handle),
            active_style: style.id.clone(),
            last_transition: now,
        });
        self.phase = Phase::Starting { handle, since: now };

        info!(
            "dance style applied: {} ({}), tempo {}x, clip '{}'",
            style.id,
            style.description,
            style.tempo,
            mixer.clip_name(BASE_CLIP).unwrap_or("unnamed")
        );
        events.push(DanceEvent::StyleApplied {
            style: style.id.clone(),
            tempo: style.tempo,
            handle,
        });
        Ok(())
    }

    /// Per-frame step: advance any in-flight transition, otherwise run the
    /// health check.
    pub fn update(&mut self, mixer: &mut dyn Mixer, now: f64, events: &mut Vec<DanceEvent>) {
        match self.phase.clone() {
            Phase::Stopping {
                style,
                since,
                retiring,
            } => {
                if now - since < self.timings.transition_delay {
                    return;
                }
                if let Some(h) = retiring {
                    mixer.release(h);
                }
                let Some(cfg) = self.catalog.get(&style).cloned() else {
                    self.phase = Phase::Idle;
                    return;
                };
                if let Err(err) = self.start(&cfg, mixer, now, events) {
                    warn!("failed to start dance '{}': {err}", cfg.id);
                    events.push(DanceEvent::Error {
                        kind: err.kind().to_string(),
                        message: err.to_string(),
                    });
                    self.phase = Phase::Idle;
                }
            }
            Phase::Starting { handle, since } => {
                if now - since < self.timings.verify_delay {
                    return;
                }
                let retriggered = !mixer.is_running(handle);
                if retriggered {
                    warn!("dance handle {:?} not running after start, retriggering", handle);
                    mixer.reset(handle);
                    mixer.play(handle);
                }
                events.push(DanceEvent::PlaybackVerified {
                    handle,
                    retriggered,
                });
                self.phase = Phase::Playing;
            }
            Phase::Idle | Phase::Playing => self.health_check(mixer, now, events),
        }
    }

    /// Recover a dance that should be running but is not.
    ///
    /// A stopped handle is replayed once `stall_cooldown` has passed since the
    /// last transition. If it still is not running, or there is no handle,
    /// the style is selected again once `missing_cooldown` has passed.
    pub fn health_check(&mut self, mixer: &mut dyn Mixer, now: f64, events: &mut Vec<DanceEvent>) {
        let Some(state) = &self.state else {
            return;
        };
        let style = state.active_style.clone();
        let since_transition = now - state.last_transition;
        let since_recovery = now - self.last_recovery;
        let t = &self.timings;

        match state.active_clip.filter(|h| mixer.contains(*h)) {
            Some(h) if mixer.is_running(h) => {
                self.replayed = false;
            }
            Some(h) if !self.replayed => {
                if since_transition >= t.stall_cooldown && since_recovery >= t.stall_cooldown {
                    warn!("dance '{style}' stopped unexpectedly, replaying");
                    mixer.set_loop(h, LoopMode::Loop);
                    mixer.play(h);
                    self.replayed = true;
                    self.last_recovery = now;
                    events.push(DanceEvent::Stalled {
                        style,
                        recovery: Recovery::Replayed,
                    });
                }
            }
            _ => {
                if since_transition >= t.missing_cooldown && since_recovery >= t.stall_cooldown {
                    self.reapply(style, mixer, now, events);
                }
            }
        }
    }

    fn reapply(&mut self, style: String, mixer: &mut dyn Mixer, now: f64, events: &mut Vec<DanceEvent>) {
        warn!("no running dance for '{style}', applying style again");
        self.last_recovery = now;
        events.push(DanceEvent::Stalled {
            style: style.clone(),
            recovery: Recovery::Reapplied,
        });
        if let Err(err) = self.select_style(&style, Some(mixer), now, events) {
            warn!("re-applying '{style}' failed: {err}");
            events.push(DanceEvent::Error {
                kind: err.kind().to_string(),
                message: err.to_string(),
            });
        }
    }

    /// Change the base rate and apply it to the active handle.
    pub fn set_tempo(&mut self, tempo: f32, mixer: Option<&mut dyn Mixer>) {
        self.tempo = tempo;
        if let (Some(mixer), Some(h)) = (mixer, self.active_handle()) {
            mixer.set_rate(h, tempo);
        }
    }

    /// Stop and tear down every handle and forget the playback state.
    pub fn reset(&mut self, mixer: Option<&mut dyn Mixer>) {
        if let Some(mixer) = mixer {
            if let Some(h) = self.active_handle() {
                mixer.stop(h);
                mixer.reset(h);
                mixer.set_enabled(h, false);
            }
            mixer.stop_all();
            mixer.release_all();
        }
        self.detach();
    }

    /// Forget playback state without touching a mixer (the model is gone).
    pub fn detach(&mut self) {
        self.state = None;
        self.phase = Phase::Idle;
        self.replayed = false;
        self.last_recovery = f64::NEG_INFINITY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdAllocator;

    #[derive(Debug, Clone, Copy)]
    struct StubHandle {
        id: HandleId,
        running: bool,
        enabled: bool,
        rate: f32,
        mode: LoopMode,
    }

    /// Records handle lifecycle without sampling anything.
    #[derive(Default)]
    struct StubMixer {
        clips: usize,
        ids: IdAllocator,
        handles: Vec<StubHandle>,
        created: usize,
    }

    impl StubMixer {
        fn with_clips(clips: usize) -> Self {
            Self {
                clips,
                ..Default::default()
            }
        }

        fn get(&self, h: HandleId) -> Option<&StubHandle> {
            self.handles.iter().find(|s| s.id == h)
        }

        fn get_mut(&mut self, h: HandleId) -> Option<&mut StubHandle> {
            self.handles.iter_mut().find(|s| s.id == h)
        }
    }

    impl Mixer for StubMixer {
        fn clip_count(&self) -> usize {
            self.clips
        }
        fn clip_name(&self, clip: usize) -> Option<&str> {
            (clip < self.clips).then_some("dance")
        }
        fn create_handle(&mut self, clip: usize) -> Result<HandleId, DanceError> {
            if clip >= self.clips {
                return Err(DanceError::MissingAnimation {
                    model: "stub".into(),
                });
            }
            let id = self.ids.alloc_handle();
            self.created += 1;
            self.handles.push(StubHandle {
                id,
                running: false,
                enabled: true,
                rate: 1.0,
                mode: LoopMode::Once,
            });
            Ok(id)
        }
        fn contains(&self, h: HandleId) -> bool {
            self.get(h).is_some()
        }
        fn reset(&mut self, _h: HandleId) {}
        fn set_enabled(&mut self, h: HandleId, enabled: bool) {
            if let Some(s) = self.get_mut(h) {
                s.enabled = enabled;
            }
        }
        fn set_loop(&mut self, h: HandleId, mode: LoopMode) {
            if let Some(s) = self.get_mut(h) {
                s.mode = mode;
            }
        }
        fn set_rate(&mut self, h: HandleId, rate: f32) {
            if let Some(s) = self.get_mut(h) {
                s.rate = rate;
            }
        }
        fn rate(&self, h: HandleId) -> Option<f32> {
            self.get(h).map(|s| s.rate)
        }
        fn set_weight(&mut self, _h: HandleId, _w: f32) {}
        fn play(&mut self, h: HandleId) {
            if let Some(s) = self.get_mut(h) {
                s.running = true;
            }
        }
        fn stop(&mut self, h: HandleId) {
            if let Some(s) = self.get_mut(h) {
                s.running = false;
            }
        }
        fn is_running(&self, h: HandleId) -> bool {
            self.get(h).is_some_and(|s| s.running && s.enabled)
        }
        fn release(&mut self, h: HandleId) {
            self.handles.retain(|s| s.id != h);
        }
        fn stop_all(&mut self) {
            self.handles.iter_mut().for_each(|s| s.running = false);
        }
        fn release_all(&mut self) {
            self.handles.clear();
        }
    }

    fn controller() -> PlaybackController {
        PlaybackController::new(PlaybackTimings::default(), StyleCatalog::default(), 1.0)
    }

    #[test]
    fn first_selection_starts_immediately() {
        let mut c = controller();
        let mut m = StubMixer::with_clips(1);
        let mut ev = Vec::new();
        c.select_style("Samba Rock", Some(&mut m), 0.0, &mut ev).unwrap();

        let h = c.active_handle().unwrap();
        assert!(m.is_running(h));
        assert_eq!(m.rate(h), Some(1.1));
        assert_eq!(m.get(h).map(|s| s.mode), Some(LoopMode::Loop));
        assert_eq!(c.tempo(), 1.1);
        assert!(matches!(c.phase(), Phase::Starting { .. }));
        assert!(ev
            .iter()
            .any(|e| matches!(e, DanceEvent::StyleApplied { style, .. } if style == "Samba Rock")));
    }

    #[test]
    fn switch_waits_for_transition_delay() {
        let mut c = controller();
        let mut m = StubMixer::with_clips(1);
        let mut ev = Vec::new();
        c.select_style("Samba Básico", Some(&mut m), 0.0, &mut ev).unwrap();
        let old = c.active_handle().unwrap();

        c.select_style("Samba Reggae", Some(&mut m), 1.0, &mut ev).unwrap();
        assert!(!m.is_running(old));
        assert_eq!(c.pending_style(), Some("Samba Reggae"));
        assert_eq!(c.active_handle(), None);

        c.update(&mut m, 1.02, &mut ev);
        assert!(matches!(c.phase(), Phase::Stopping { .. }));

        c.update(&mut m, 1.06, &mut ev);
        assert_eq!(c.active_style(), Some("Samba Reggae"));
        assert_eq!(m.handles.len(), 1);
        assert!(!m.contains(old));
    }

    #[test]
    fn newest_request_wins_during_stop() {
        let mut c = controller();
        let mut m = StubMixer::with_clips(1);
        let mut ev = Vec::new();
        c.select_style("Samba Básico", Some(&mut m), 0.0, &mut ev).unwrap();
        c.select_style("Samba Reggae", Some(&mut m), 1.0, &mut ev).unwrap();
        c.select_style("Samba Enredo", Some(&mut m), 1.01, &mut ev).unwrap();
        c.update(&mut m, 1.1, &mut ev);

        assert_eq!(c.active_style(), Some("Samba Enredo"));
        assert_eq!(m.created, 2);
        assert_eq!(m.handles.len(), 1);
    }

    #[test]
    fn health_check_never_double_starts_during_transition() {
        let mut c = controller();
        let mut m = StubMixer::with_clips(1);
        let mut ev = Vec::new();
        c.select_style("Samba Básico", Some(&mut m), 0.0, &mut ev).unwrap();
        c.update(&mut m, 0.3, &mut ev);
        c.select_style("Samba Pagode", Some(&mut m), 5.0, &mut ev).unwrap();
        // well past every cooldown but still inside the stop window
        c.update(&mut m, 5.04, &mut ev);
        assert_eq!(m.created, 1);
        c.update(&mut m, 5.06, &mut ev);
        assert_eq!(m.created, 2);
        assert_eq!(m.handles.len(), 1);
    }

    #[test]
    fn verify_retriggers_a_handle_that_did_not_start() {
        let mut c = controller();
        let mut m = StubMixer::with_clips(1);
        let mut ev = Vec::new();
        c.select_style("Samba Básico", Some(&mut m), 0.0, &mut ev).unwrap();
        let h = c.active_handle().unwrap();
        m.stop(h);
        c.update(&mut m, 0.25, &mut ev);
        assert!(m.is_running(h));
        assert!(ev.contains(&DanceEvent::PlaybackVerified {
            handle: h,
            retriggered: true
        }));
        assert_eq!(c.phase(), &Phase::Playing);
    }

    #[test]
    fn stalled_handle_is_replayed_then_reapplied() {
        let mut c = controller();
        let mut m = StubMixer::with_clips(1);
        let mut ev = Vec::new();
        c.select_style("Samba Básico", Some(&mut m), 0.0, &mut ev).unwrap();
        c.update(&mut m, 0.3, &mut ev);
        let h = c.active_handle().unwrap();

        m.stop(h);
        c.update(&mut m, 0.9, &mut ev);
        assert!(!m.is_running(h));
        c.update(&mut m, 1.0, &mut ev);
        assert!(m.is_running(h));
        assert_eq!(m.created, 1);

        // disabled handles cannot be replayed back to life
        m.set_enabled(h, false);
        c.update(&mut m, 1.5, &mut ev);
        assert!(!c.is_running(&m));
        c.update(&mut m, 2.0, &mut ev);
        assert!(c.is_running(&m));
        assert_eq!(m.created, 2);
        assert!(ev.iter().any(|e| matches!(
            e,
            DanceEvent::Stalled {
                recovery: Recovery::Reapplied,
                ..
            }
        )));
    }

    #[test]
    fn errors_leave_state_untouched() {
        let mut c = controller();
        let mut ev = Vec::new();
        assert_eq!(
            c.select_style("Tango", None, 0.0, &mut ev),
            Err(DanceError::InvalidStyle("Tango".into()))
        );
        assert!(matches!(
            c.select_style("Samba Pagode", None, 0.0, &mut ev),
            Err(DanceError::NotReady(_))
        ));
        let mut empty = StubMixer::with_clips(0);
        assert!(matches!(
            c.select_style("Samba Pagode", Some(&mut empty), 0.0, &mut ev),
            Err(DanceError::MissingAnimation { .. })
        ));
        assert_eq!(empty.created, 0);
        assert!(c.state().is_none());
        assert!(ev.is_empty());
    }

    #[test]
    fn reset_releases_everything() {
        let mut c = controller();
        let mut m = StubMixer::with_clips(1);
        let mut ev = Vec::new();
        c.select_style("Samba Básico", Some(&mut m), 0.0, &mut ev).unwrap();
        c.reset(Some(&mut m));
        assert!(m.handles.is_empty());
        assert!(c.state().is_none());
        assert_eq!(c.phase(), &Phase::Idle);
    }
}
