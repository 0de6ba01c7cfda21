use bevy::prelude::*;
use std::collections::HashMap;

use crate::components::{DanceBoneHint, DanceRoot};
use crate::resources::{DanceBindingIndex, DanceCommand, DanceNotice, VizijDance};

/// Walks descendants under each DanceRoot and maps bone names to entities.
pub fn build_binding_index_system(
    roots: Query<Entity, With<DanceRoot>>,
    children: Query<&Children>,
    names: Query<(&Name, Option<&DanceBoneHint>)>,
    mut index: ResMut<DanceBindingIndex>,
) {
    let mut map: HashMap<String, Entity> = HashMap::new();

    // Depth-first traversal from each root
    fn walk(
        e: Entity,
        map: &mut HashMap<String, Entity>,
        names: &Query<(&Name, Option<&DanceBoneHint>)>,
        children: &Query<&Children>,
    ) {
        if let Ok((name, hint)) = names.get(e) {
            let bone = hint
                .map(|h| h.bone.clone())
                .unwrap_or_else(|| name.as_str().to_string());
            map.insert(bone, e);
        }
        if let Ok(cs) = children.get(e) {
            for &c in cs.iter() {
                walk(c, map, names, children);
            }
        }
    }

    for root in roots.iter() {
        walk(root, &mut map, &names, &children);
    }

    index.map = map;
}

/// Apply queued commands. Failures are already reported by the core as
/// `DanceEvent::Error` and surface as [`DanceNotice`]s next frame.
pub fn apply_commands_system(mut commands: EventReader<DanceCommand>, mut dance: ResMut<VizijDance>) {
    let viewer = &mut dance.viewer;
    for cmd in commands.read() {
        let result = match cmd {
            DanceCommand::LoadModel(name) => viewer.load_model(name),
            DanceCommand::SelectStyle(id) => viewer.select_style(id),
            DanceCommand::PlayDance => viewer.play_dance(),
            DanceCommand::Reset => viewer.reset(),
            DanceCommand::SetTempo(v) => {
                viewer.set_tempo(*v);
                Ok(())
            }
            DanceCommand::SetHipIntensity(v) => {
                viewer.set_hip_intensity(*v);
                Ok(())
            }
            DanceCommand::SetStepIntensity(v) => {
                viewer.set_step_intensity(*v);
                Ok(())
            }
            DanceCommand::SetNaturalVariation(on) => {
                viewer.set_natural_variation(*on);
                Ok(())
            }
            DanceCommand::SetLoop(on) => {
                viewer.set_loop(*on);
                Ok(())
            }
            DanceCommand::SetCrossfade(on) => {
                viewer.set_crossfade(*on);
                Ok(())
            }
        };
        if let Err(err) = result {
            debug!("dance command {cmd:?} failed: {err}");
        }
    }
}

/// Advance the dance clock by the frame time and step the core once.
pub fn tick_dance_system(
    time: Res<Time>,
    mut dance: ResMut<VizijDance>,
    mut notices: EventWriter<DanceNotice>,
) {
    let dt = time.delta_seconds();
    let dance = &mut *dance;
    dance.clock.advance(dt as f64);
    let out = dance.viewer.frame(dt);
    for event in &out.events {
        notices.send(DanceNotice(event.clone()));
    }
}

/// Copy the skeleton's current local pose onto the bound entities.
pub fn write_pose_system(
    dance: Res<VizijDance>,
    index: Res<DanceBindingIndex>,
    mut transforms: Query<&mut Transform>,
) {
    let Some(skeleton) = dance.viewer.skeleton() else {
        return;
    };
    for bone in &skeleton.bones {
        let Some(&entity) = index.map.get(&bone.name) else {
            continue;
        };
        if let Ok(mut tf) = transforms.get_mut(entity) {
            let [x, y, z] = bone.pose.rotation;
            tf.translation = Vec3::from_array(bone.pose.translation);
            tf.rotation = Quat::from_euler(EulerRot::XYZ, x, y, z);
        }
    }
}
