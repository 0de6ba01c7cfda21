#![allow(dead_code)]

use vizij_dance_core::{
    parse_model_json, Bone, BoneTransform, DanceConfig, DanceEvent, DanceViewer, ManualClock,
    Model, ModelLibrary, Skeleton, StyleCatalog,
};

pub const SAMBA_JSON: &str = include_str!("../fixtures/samba_dancing.json");

pub fn samba_model() -> Model {
    parse_model_json(SAMBA_JSON).expect("fixture should parse")
}

/// A prop with a looping clip that is not a dance model.
pub fn prop_model() -> Model {
    let mut m = samba_model();
    m.name = "Spinning Top".into();
    m.skeleton = Skeleton::new(vec![Bone::new("Root", None, BoneTransform::IDENTITY)]);
    for clip in &mut m.clips {
        clip.tracks.clear();
    }
    m
}

/// The dance rig without any clip.
pub fn static_samba() -> Model {
    let mut m = samba_model();
    m.clips.clear();
    m
}

pub fn library(models: Vec<Model>) -> ModelLibrary {
    models.into_iter().fold(ModelLibrary::new(), |lib, m| {
        lib.with_model(m).expect("valid model")
    })
}

/// Deterministic config: fixed seed, variation off unless a test enables it.
pub fn quiet_config() -> DanceConfig {
    let mut cfg = DanceConfig::default();
    cfg.variation.seed = Some(7);
    cfg.sliders.natural_variation = false;
    cfg
}

pub fn viewer_with(models: Vec<Model>, cfg: DanceConfig) -> (DanceViewer, ManualClock) {
    let clock = ManualClock::new(0.0);
    let viewer = DanceViewer::with_parts(
        cfg,
        StyleCatalog::default(),
        Box::new(library(models)),
        Box::new(clock.clone()),
    )
    .expect("viewer config");
    (viewer, clock)
}

/// Advance clock and viewer together in `dt` steps for `secs` seconds,
/// collecting every event emitted on the way.
pub fn run_for(viewer: &mut DanceViewer, clock: &ManualClock, secs: f64, dt: f64) -> Vec<DanceEvent> {
    let mut events = Vec::new();
    let steps = (secs / dt).round() as usize;
    for _ in 0..steps {
        clock.advance(dt);
        events.extend(viewer.frame(dt as f32).events.iter().cloned());
    }
    events
}
