use bevy::prelude::*;

/// Marker component designating the root of a rig whose bones the dance
/// pose is written to. The binding system walks descendants of any entity
/// with this marker.
#[derive(Component)]
pub struct DanceRoot;

/// Optional per-entity override of the bone name used for binding.
/// When present, it is used instead of the entity's `Name`.
#[derive(Component, Debug, Clone)]
pub struct DanceBoneHint {
    pub bone: String,
}
