//! Bevy adapter for the Vizij dance core.
//!
//! Add [`VizijDancePlugin`], tag a rig's root entity with [`DanceRoot`] and
//! send [`DanceCommand`]s. Each frame the plugin steps the core with Bevy's
//! frame time and writes the resulting bone pose onto entities whose `Name`
//! matches a skeleton bone.

use bevy::prelude::*;
use vizij_dance_core::{DanceConfig, DanceViewer, ManualClock, ModelSource, StyleCatalog};

pub mod components;
pub mod resources;
pub mod systems;

pub use components::{DanceBoneHint, DanceRoot};
pub use resources::{DanceBindingIndex, DanceCommand, DanceNotice, VizijDance};

/// Ordering of the plugin's per-frame work.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum DanceSet {
    Bind,
    Commands,
    Tick,
    Write,
}

/// Owns the configuration and a model source the viewer is built from.
///
/// An invalid configuration is logged and leaves the app without a
/// [`VizijDance`] resource; the command and notice events are still
/// registered.
pub struct VizijDancePlugin<S> {
    pub config: DanceConfig,
    pub source: S,
    pub catalog: StyleCatalog,
    /// Model loaded when the app starts, if any.
    pub initial_model: Option<String>,
}

impl<S> VizijDancePlugin<S> {
    pub fn new(config: DanceConfig, source: S) -> Self {
        Self {
            config,
            source,
            catalog: StyleCatalog::default(),
            initial_model: None,
        }
    }

    pub fn with_initial_model(mut self, name: impl Into<String>) -> Self {
        self.initial_model = Some(name.into());
        self
    }
}

impl<S> Plugin for VizijDancePlugin<S>
where
    S: ModelSource + Clone + Send + Sync + 'static,
{
    fn build(&self, app: &mut App) {
        // Registered even when the viewer fails to build; only `VizijDance`
        // is missing then.
        app.init_resource::<DanceBindingIndex>()
            .add_event::<DanceCommand>()
            .add_event::<DanceNotice>()
            .configure_sets(
                Update,
                (DanceSet::Bind, DanceSet::Commands, DanceSet::Tick).chain(),
            );

        let clock = ManualClock::new(0.0);
        let viewer = match DanceViewer::with_parts(
            self.config.clone(),
            self.catalog.clone(),
            Box::new(self.source.clone()),
            Box::new(clock.clone()),
        ) {
            Ok(v) => v,
            Err(err) => {
                error!("dance plugin disabled: {err}");
                return;
            }
        };
        let mut dance = VizijDance { viewer, clock };
        if let Some(name) = &self.initial_model {
            // failures are reported as events on the first frame
            let _ = dance.viewer.load_model(name);
        }

        app.insert_resource(dance)
            .add_systems(
                Update,
                (
                    systems::build_binding_index_system.in_set(DanceSet::Bind),
                    systems::apply_commands_system.in_set(DanceSet::Commands),
                    systems::tick_dance_system.in_set(DanceSet::Tick),
                ),
            )
            .add_systems(
                PostUpdate,
                systems::write_pose_system
                    .in_set(DanceSet::Write)
                    .before(bevy::transform::TransformSystem::TransformPropagate),
            );
    }
}
