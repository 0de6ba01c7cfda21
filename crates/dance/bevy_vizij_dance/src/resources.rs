use bevy::prelude::*;
use std::collections::HashMap;
use vizij_dance_core::{DanceEvent, DanceViewer, ManualClock};

/// The dance core plus the clock it reads. The clock is advanced by Bevy's
/// frame time so controller delays follow the app's `Time`.
#[derive(Resource)]
pub struct VizijDance {
    pub viewer: DanceViewer,
    pub clock: ManualClock,
}

/// Bone name to entity, populated by walking under [`crate::DanceRoot`].
#[derive(Resource, Default)]
pub struct DanceBindingIndex {
    pub map: HashMap<String, Entity>,
}

/// Requests from UI or gameplay code, applied before the dance is stepped.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum DanceCommand {
    LoadModel(String),
    SelectStyle(String),
    PlayDance,
    Reset,
    SetTempo(f32),
    SetHipIntensity(f32),
    SetStepIntensity(f32),
    SetNaturalVariation(bool),
    SetLoop(bool),
    SetCrossfade(bool),
}

/// Core events re-emitted into the ECS every frame.
#[derive(Event, Debug, Clone)]
pub struct DanceNotice(pub DanceEvent);
