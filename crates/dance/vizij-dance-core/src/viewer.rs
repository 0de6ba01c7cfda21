//! Viewer facade: one loaded model, its mixer, the dance controller and the
//! per-frame pipeline.
//!
//! Frame order is fixed:
//! 1. controller (transitions, verification, health check)
//! 2. mixer advance (base clip pose)
//! 3. procedural overlay (additive offsets)
//! 4. tempo variation
//! 5. status refresh
//!
//! Calls made between frames (`select_style`, `load_model`, ...) queue their
//! events; the next [`DanceViewer::frame`] reports them first.

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::bones::{find_bone_groups, BoneGroups};
use crate::catalog::{StyleCatalog, StyleConfig};
use crate::clock::{Clock, SystemClock};
use crate::config::{DanceConfig, Sliders};
use crate::controller::PlaybackController;
use crate::error::DanceError;
use crate::ids::{HandleId, IdAllocator};
use crate::mixer::{ClipMixer, LoopMode, Mixer};
use crate::model::ModelSource;
use crate::outputs::{DanceEvent, DanceStatus, Outputs};
use crate::overlay::{apply_overlay, OverlayParams};
use crate::scheduler::PeriodicSchedule;
use crate::skeleton::Skeleton;
use crate::variation::VariationInjector;

#[derive(Debug)]
struct LoadedModel {
    name: String,
    skeleton: Skeleton,
    mixer: ClipMixer,
    groups: BoneGroups,
    dance: bool,
    /// First-clip handle for models without the dance controller.
    idle_handle: Option<HandleId>,
}

pub struct DanceViewer {
    cfg: DanceConfig,
    source: Box<dyn ModelSource + Send + Sync>,
    clock: Box<dyn Clock>,
    ids: IdAllocator,
    model: Option<LoadedModel>,
    controller: PlaybackController,
    variation: VariationInjector,
    status_schedule: PeriodicSchedule,
    rng: StdRng,
    sliders: Sliders,
    /// Style the user last asked for; re-applied after every reload.
    desired_style: String,
    pending: Vec<DanceEvent>,
    outputs: Outputs,
}

impl DanceViewer {
    /// Viewer with the built-in style catalog and the system clock.
    pub fn new(
        cfg: DanceConfig,
        source: impl ModelSource + Send + Sync + 'static,
    ) -> Result<Self, DanceError> {
        Self::with_parts(
            cfg,
            StyleCatalog::default(),
            Box::new(source),
            Box::new(SystemClock::new()),
        )
    }

    pub fn with_parts(
        cfg: DanceConfig,
        catalog: StyleCatalog,
        source: Box<dyn ModelSource + Send + Sync>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, DanceError> {
        cfg.validate()?;
        if !catalog.contains(&cfg.default_style) {
            return Err(DanceError::InvalidConfig(format!(
                "default_style '{}' is not in the style catalog",
                cfg.default_style
            )));
        }
        let rng = match cfg.variation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut sliders = cfg.sliders.clone();
        sliders.tempo = sliders
            .tempo
            .clamp(Sliders::TEMPO_RANGE.0, Sliders::TEMPO_RANGE.1);
        let (lo, hi) = Sliders::INTENSITY_RANGE;
        sliders.hip_intensity = sliders.hip_intensity.clamp(lo, hi);
        sliders.step_intensity = sliders.step_intensity.clamp(lo, hi);
        Ok(Self {
            controller: PlaybackController::new(cfg.timings.clone(), catalog, sliders.tempo),
            variation: VariationInjector::new(&cfg.variation),
            status_schedule: PeriodicSchedule::new(cfg.status.schedule),
            desired_style: cfg.default_style.clone(),
            source,
            clock,
            ids: IdAllocator::new(),
            model: None,
            rng,
            sliders,
            pending: Vec::new(),
            outputs: Outputs::default(),
            cfg,
        })
    }

    /// Swap the time source, e.g. for a [`crate::clock::ManualClock`].
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &DanceConfig {
        &self.cfg
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    // ---------- models ----------

    /// Names the model source can load.
    pub fn model_names(&self) -> Vec<String> {
        self.source.names()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_ref().map(|m| m.name.as_str())
    }

    /// True when the loaded model gets the dance controller and overlay.
    pub fn is_dance_model(&self) -> bool {
        self.model.as_ref().is_some_and(|m| m.dance)
    }

    /// Replace the current model with `name`.
    ///
    /// Dance models start the last requested style right away. Others play
    /// their first clip on loop. A model without clips stays loaded but
    /// static, and the missing animation is reported.
    pub fn load_model(&mut self, name: &str) -> Result<(), DanceError> {
        self.unload();

        let mut model = match self.source.load(name).and_then(|mut m| {
            m.validate()?;
            Ok(m)
        }) {
            Ok(m) => m,
            Err(err) => {
                self.report(&err);
                return Err(err);
            }
        };

        let id = self.ids.alloc_model();
        model.skeleton.model = Some(id);
        let dance = self.cfg.is_dance_model(&model.name);
        let clip_count = model.clips.len();
        let mixer = ClipMixer::new(&model.skeleton, model.clips);
        let groups = if dance {
            find_bone_groups(&model.skeleton, &self.cfg.bone_rules)
        } else {
            BoneGroups::default()
        };

        info!(
            "loaded model '{}' ({} bones, {} clips, dance: {})",
            model.name,
            model.skeleton.len(),
            clip_count,
            dance
        );
        self.pending.push(DanceEvent::ModelLoaded {
            model: model.name.clone(),
            clips: clip_count,
            dance,
        });
        self.model = Some(LoadedModel {
            name: model.name,
            skeleton: model.skeleton,
            mixer,
            groups,
            dance,
            idle_handle: None,
        });

        if clip_count == 0 {
            let err = DanceError::MissingAnimation {
                model: name.to_string(),
            };
            self.report(&err);
            return Ok(());
        }

        if dance {
            let style = self.desired_style.clone();
            if let Err(err) = self.apply_style(&style) {
                self.report(&err);
            }
        } else if let Some(m) = self.model.as_mut() {
            let h = m.mixer.create_handle(0)?;
            m.mixer.set_loop(h, LoopMode::Loop);
            m.mixer.set_rate(h, self.controller.tempo());
            m.mixer.play(h);
            m.idle_handle = Some(h);
        }
        Ok(())
    }

    /// Drop the current model and everything tied to it.
    pub fn unload(&mut self) {
        if let Some(mut m) = self.model.take() {
            self.controller.reset(Some(&mut m.mixer));
            self.variation.reset();
            info!("unloaded model '{}'", m.name);
            self.pending.push(DanceEvent::ModelUnloaded { model: m.name });
        }
    }

    // ---------- styles ----------

    pub fn styles(&self) -> &StyleCatalog {
        self.controller.catalog()
    }

    pub fn style_ids(&self) -> Vec<String> {
        self.styles().ids().map(str::to_string).collect()
    }

    pub fn active_style(&self) -> Option<&StyleConfig> {
        self.controller.active_style_config()
    }

    /// Switch the dance to `id`.
    ///
    /// Unknown ids are rejected and ignored. Without a loaded dance model
    /// the request fails with `NotReady`, and the first dance model is
    /// loaded in the background; the requested style is applied once it is.
    pub fn select_style(&mut self, id: &str) -> Result<(), DanceError> {
        if !self.styles().contains(id) {
            let err = DanceError::InvalidStyle(id.to_string());
            self.report(&err);
            return Err(err);
        }
        self.desired_style = id.to_string();

        if !self.is_dance_model() {
            let err = DanceError::NotReady("no dance model loaded".into());
            self.report(&err);
            self.reload_dance_model();
            return Err(err);
        }
        let result = self.apply_style(id);
        if let Err(err) = &result {
            self.report(err);
        }
        result
    }

    /// Restart the current style (or the default one) on the dance model.
    pub fn play_dance(&mut self) -> Result<(), DanceError> {
        let style = self
            .controller
            .active_style()
            .unwrap_or(self.desired_style.as_str())
            .to_string();
        self.select_style(&style)
    }

    fn apply_style(&mut self, id: &str) -> Result<(), DanceError> {
        let now = self.clock.now();
        let Some(m) = self.model.as_mut().filter(|m| m.dance) else {
            return Err(DanceError::NotReady("no dance model loaded".into()));
        };
        if m.mixer.clip_count() == 0 {
            return Err(DanceError::MissingAnimation {
                model: m.name.clone(),
            });
        }
        self.controller
            .select_style(id, Some(&mut m.mixer), now, &mut self.pending)
    }

    fn reload_dance_model(&mut self) {
        let Some(name) = self.cfg.dance_models.first().cloned() else {
            warn!("no dance model configured to reload");
            return;
        };
        info!("reloading dance model '{name}'");
        // load_model reports its own failures
        let _ = self.load_model(&name);
    }

    /// Tear down all playback and reload the current model from its source.
    pub fn reset(&mut self) -> Result<(), DanceError> {
        let name = match self.model.as_ref() {
            Some(m) => m.name.clone(),
            None => match self.cfg.dance_models.first() {
                Some(n) => n.clone(),
                None => return Err(DanceError::NotReady("no model to reload".into())),
            },
        };
        info!("resetting animations, reloading '{name}'");
        if let Some(m) = self.model.as_mut() {
            self.controller.reset(Some(&mut m.mixer));
        }
        self.load_model(&name)
    }

    // ---------- sliders ----------

    pub fn sliders(&self) -> &Sliders {
        &self.sliders
    }

    /// Set the base playback rate, clamped to [`Sliders::TEMPO_RANGE`].
    pub fn set_tempo(&mut self, tempo: f32) {
        let tempo = tempo.clamp(Sliders::TEMPO_RANGE.0, Sliders::TEMPO_RANGE.1);
        self.sliders.tempo = tempo;
        match self.model.as_mut() {
            Some(m) if m.dance => self.controller.set_tempo(tempo, Some(&mut m.mixer)),
            Some(m) => {
                self.controller.set_tempo(tempo, None);
                if let Some(h) = m.idle_handle {
                    m.mixer.set_rate(h, tempo);
                }
            }
            None => self.controller.set_tempo(tempo, None),
        }
    }

    pub fn tempo(&self) -> f32 {
        self.controller.tempo()
    }

    pub fn set_hip_intensity(&mut self, v: f32) {
        self.sliders.hip_intensity = v.clamp(Sliders::INTENSITY_RANGE.0, Sliders::INTENSITY_RANGE.1);
    }

    pub fn set_step_intensity(&mut self, v: f32) {
        self.sliders.step_intensity =
            v.clamp(Sliders::INTENSITY_RANGE.0, Sliders::INTENSITY_RANGE.1);
    }

    pub fn set_natural_variation(&mut self, on: bool) {
        self.sliders.natural_variation = on;
    }

    /// Stored for display. Dance playback loops regardless.
    pub fn set_loop(&mut self, on: bool) {
        self.sliders.loop_enabled = on;
        if !on {
            info!("loop toggle ignored: dance playback always loops");
        }
        if let (Some(m), Some(h)) = (self.model.as_mut(), self.controller.active_handle()) {
            m.mixer.set_loop(h, LoopMode::Loop);
        }
    }

    /// Stored for display. Style switches always stop then start.
    pub fn set_crossfade(&mut self, on: bool) {
        self.sliders.crossfade = on;
        log::debug!("crossfade toggle set to {on}; style switches do not crossfade");
    }

    // ---------- inspection ----------

    pub fn skeleton(&self) -> Option<&Skeleton> {
        self.model.as_ref().map(|m| &m.skeleton)
    }

    pub fn bone_groups(&self) -> Option<&BoneGroups> {
        self.model.as_ref().map(|m| &m.groups)
    }

    pub fn mixer(&self) -> Option<&ClipMixer> {
        self.model.as_ref().map(|m| &m.mixer)
    }

    /// Direct mixer access for hosts that drive handles themselves.
    pub fn mixer_mut(&mut self) -> Option<&mut ClipMixer> {
        self.model.as_mut().map(|m| &mut m.mixer)
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn is_running(&self) -> bool {
        match self.model.as_ref() {
            Some(m) if m.dance => self.controller.is_running(&m.mixer),
            Some(m) => m.idle_handle.is_some_and(|h| m.mixer.is_running(h)),
            None => false,
        }
    }

    pub fn status(&self) -> DanceStatus {
        let style = self.controller.active_style_config();
        DanceStatus {
            model: self.model_name().map(str::to_string),
            dance_info_visible: self.is_dance_model(),
            style: style.map(|s| s.id.clone()),
            description: style.map(|s| s.description.clone()),
            tempo: self.controller.tempo(),
            running: self.is_running(),
            pending_style: self.controller.pending_style().map(str::to_string),
        }
    }

    // ---------- frame ----------

    /// Step one rendered frame of `dt` seconds.
    pub fn frame(&mut self, dt: f32) -> &Outputs {
        self.outputs.clear();
        self.outputs.events.append(&mut self.pending);
        let now = self.clock.now();

        if let Some(m) = self.model.as_mut() {
            if m.dance {
                self.controller
                    .update(&mut m.mixer, now, &mut self.outputs.events);
            }

            m.mixer.advance(dt, &mut m.skeleton);

            if m.dance {
                if let Some(style) = self.controller.active_style_config() {
                    let params = OverlayParams {
                        time: now,
                        tempo: self.controller.tempo(),
                        hip_intensity: self.sliders.hip_intensity,
                        step_intensity: self.sliders.step_intensity,
                    };
                    apply_overlay(
                        &mut m.skeleton,
                        &m.groups,
                        &style.motion,
                        &params,
                        &self.cfg.overlay,
                        &mut self.outputs.offsets,
                    );
                }

                if let Some(tempo) = self.variation.tick(
                    now,
                    self.sliders.natural_variation,
                    self.controller.tempo(),
                    self.controller.active_handle(),
                    &mut m.mixer,
                    &mut self.rng,
                ) {
                    self.outputs.events.push(DanceEvent::TempoVaried { tempo });
                }
            }
        }

        if self.status_schedule.poll(now, &mut self.rng) {
            let status = self.status();
            self.outputs.events.push(DanceEvent::Status(status));
        }
        &self.outputs
    }

    /// Outputs of the most recent frame.
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    fn report(&mut self, err: &DanceError) {
        warn!("{err}");
        self.pending.push(DanceEvent::Error {
            kind: err.kind().to_string(),
            message: err.to_string(),
        });
    }
}
