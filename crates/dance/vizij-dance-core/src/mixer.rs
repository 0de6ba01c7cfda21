//! Clip-playback handles and the reference mixer.
//!
//! [`Mixer`] is the surface the playback controller drives: create a handle
//! for a clip, configure it, play/stop it and ask whether it is running.
//! Hosts with their own animation runtime implement it over that runtime;
//! [`ClipMixer`] is the built-in implementation that samples [`Clip`] data
//! directly into a [`Skeleton`].

use serde::{Deserialize, Serialize};

use crate::error::DanceError;
use crate::ids::{BoneId, HandleId, IdAllocator};
use crate::model::Clip;
use crate::skeleton::{BoneTransform, Skeleton};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopMode {
    /// Play once and finish.
    Once,
    /// Play `count` times and finish.
    Repeat { count: u32 },
    /// Repeat forever.
    Loop,
    /// Alternate direction forever.
    PingPong,
}

/// Clip-playback handle operations. Calls naming an unknown handle are
/// ignored (queries report "not running").
pub trait Mixer {
    fn clip_count(&self) -> usize;
    fn clip_name(&self, clip: usize) -> Option<&str>;

    /// Instantiate a fresh, stopped handle for `clip`.
    fn create_handle(&mut self, clip: usize) -> Result<HandleId, DanceError>;
    fn contains(&self, handle: HandleId) -> bool;

    /// Rewind to the start and clear finished/disabled state.
    fn reset(&mut self, handle: HandleId);
    fn set_enabled(&mut self, handle: HandleId, enabled: bool);
    fn set_loop(&mut self, handle: HandleId, mode: LoopMode);
    fn set_rate(&mut self, handle: HandleId, rate: f32);
    fn rate(&self, handle: HandleId) -> Option<f32>;
    fn set_weight(&mut self, handle: HandleId, weight: f32);
    fn play(&mut self, handle: HandleId);
    fn stop(&mut self, handle: HandleId);
    fn is_running(&self, handle: HandleId) -> bool;

    /// Drop a handle and any cached state for it.
    fn release(&mut self, handle: HandleId);
    fn stop_all(&mut self);
    fn release_all(&mut self);
}

#[derive(Debug, Clone)]
struct Action {
    id: HandleId,
    clip: usize,
    time: f32,
    rate: f32,
    weight: f32,
    enabled: bool,
    active: bool,
    finished: bool,
    mode: LoopMode,
}

impl Action {
    fn new(id: HandleId, clip: usize) -> Self {
        Self {
            id,
            clip,
            time: 0.0,
            rate: 1.0,
            weight: 1.0,
            enabled: true,
            active: false,
            finished: false,
            mode: LoopMode::Loop,
        }
    }

    fn running(&self) -> bool {
        self.active && self.enabled && !self.finished
    }
}

/// A clip with its tracks resolved to bone indices.
#[derive(Debug, Clone)]
struct BoundClip {
    clip: Clip,
    /// (bone, track index) for tracks whose bone exists in the skeleton.
    bindings: Vec<(BoneId, usize)>,
}

fn fmod(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

/// Reflect t into [0, span] with ping-pong behavior, where period = 2 * span.
fn ping_pong(t: f32, span: f32) -> f32 {
    if span <= 0.0 {
        return 0.0;
    }
    let m = fmod(t, 2.0 * span);
    if m <= span {
        m
    } else {
        2.0 * span - m
    }
}

#[derive(Debug)]
pub struct ClipMixer {
    ids: IdAllocator,
    clips: Vec<BoundClip>,
    actions: Vec<Action>,
}

impl ClipMixer {
    /// Bind every clip track to a bone of `skeleton` by name. Tracks naming
    /// bones the skeleton lacks are skipped.
    pub fn new(skeleton: &Skeleton, clips: Vec<Clip>) -> Self {
        let clips = clips
            .into_iter()
            .map(|clip| {
                let mut bindings = Vec::with_capacity(clip.tracks.len());
                for (idx, track) in clip.tracks.iter().enumerate() {
                    match skeleton.find(&track.bone) {
                        Some(bone) => bindings.push((bone, idx)),
                        None => log::debug!(
                            "clip '{}': no bone named '{}', track skipped",
                            clip.name,
                            track.bone
                        ),
                    }
                }
                BoundClip { clip, bindings }
            })
            .collect();
        Self {
            ids: IdAllocator::new(),
            clips,
            actions: Vec::new(),
        }
    }

    pub fn handle_count(&self) -> usize {
        self.actions.len()
    }

    pub fn running_count(&self) -> usize {
        self.actions.iter().filter(|a| a.running()).count()
    }

    pub fn loop_mode(&self, handle: HandleId) -> Option<LoopMode> {
        self.action(handle).map(|a| a.mode)
    }

    pub fn weight(&self, handle: HandleId) -> Option<f32> {
        self.action(handle).map(|a| a.weight)
    }

    /// Playback time in seconds. Repeating modes keep it within one period.
    pub fn time(&self, handle: HandleId) -> Option<f32> {
        self.action(handle).map(|a| a.time)
    }

    fn action(&self, handle: HandleId) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == handle)
    }

    fn action_mut(&mut self, handle: HandleId) -> Option<&mut Action> {
        self.actions.iter_mut().find(|a| a.id == handle)
    }

    /// Advance running handles by `dt` and write the blended base pose.
    ///
    /// The skeleton is first restored to its rest pose, so bones no clip
    /// touches do not carry the previous frame's overlay forward.
    pub fn advance(&mut self, dt: f32, skeleton: &mut Skeleton) {
        for a in self.actions.iter_mut().filter(|a| a.running()) {
            let Some(bound) = self.clips.get(a.clip) else {
                continue;
            };
            let duration = bound.clip.duration;
            a.time += dt * a.rate;
            let repeats = match a.mode {
                LoopMode::Once => Some(1),
                LoopMode::Repeat { count } => Some(count.max(1)),
                LoopMode::Loop | LoopMode::PingPong => None,
            };
            match repeats {
                Some(n) => {
                    let limit = duration * n as f32;
                    if a.time >= limit {
                        a.time = limit;
                        a.finished = true;
                    } else if a.time < 0.0 {
                        a.time = 0.0;
                        a.finished = true;
                    }
                }
                // Keep repeating time within one period; an ever-growing f32
                // loses the precision to move by a frame's dt.
                None if a.mode == LoopMode::PingPong => a.time = fmod(a.time, 2.0 * duration),
                None => a.time = fmod(a.time, duration),
            }
        }

        skeleton.reset_pose();

        let mut sums: Vec<Option<(BoneTransform, f32)>> = vec![None; skeleton.len()];
        for a in self.actions.iter().filter(|a| a.running() && a.weight > 0.0) {
            let Some(bound) = self.clips.get(a.clip) else {
                continue;
            };
            let duration = bound.clip.duration;
            let local = match a.mode {
                LoopMode::PingPong => ping_pong(a.time, duration),
                _ => fmod(a.time, duration),
            };
            for &(bone, track_idx) in &bound.bindings {
                let Some(sample) = bound.clip.tracks[track_idx].sample(local) else {
                    continue;
                };
                let Some(slot) = sums.get_mut(bone.index()) else {
                    continue;
                };
                let (acc, w) = slot.get_or_insert((BoneTransform::IDENTITY, 0.0));
                acc.add_offset(
                    sample.translation.map(|v| v * a.weight),
                    sample.rotation.map(|v| v * a.weight),
                );
                *w += a.weight;
            }
        }

        for (bone, slot) in skeleton.bones.iter_mut().zip(sums) {
            let Some((acc, w)) = slot else {
                continue;
            };
            // Under-weighted blends fall back towards the rest pose.
            let rest_w = (1.0 - w).max(0.0);
            let norm = w.max(1.0);
            for i in 0..3 {
                bone.pose.translation[i] = (acc.translation[i] + bone.rest.translation[i] * rest_w) / norm;
                bone.pose.rotation[i] = (acc.rotation[i] + bone.rest.rotation[i] * rest_w) / norm;
            }
        }
    }
}

impl Mixer for ClipMixer {
    fn clip_count(&self) -> usize {
        self.clips.len()
    }

    fn clip_name(&self, clip: usize) -> Option<&str> {
        self.clips.get(clip).map(|c| c.clip.name.as_str())
    }

    fn create_handle(&mut self, clip: usize) -> Result<HandleId, DanceError> {
        if clip >= self.clips.len() {
            return Err(DanceError::NotReady(format!(
                "clip index {clip} out of range ({} clips)",
                self.clips.len()
            )));
        }
        let id = self.ids.alloc_handle();
        self.actions.push(Action::new(id, clip));
        Ok(id)
    }

    fn contains(&self, handle: HandleId) -> bool {
        self.action(handle).is_some()
    }

    fn reset(&mut self, handle: HandleId) {
        if let Some(a) = self.action_mut(handle) {
            a.time = 0.0;
            a.finished = false;
            a.enabled = true;
        }
    }

    fn set_enabled(&mut self, handle: HandleId, enabled: bool) {
        if let Some(a) = self.action_mut(handle) {
            a.enabled = enabled;
        }
    }

    fn set_loop(&mut self, handle: HandleId, mode: LoopMode) {
        if let Some(a) = self.action_mut(handle) {
            a.mode = mode;
        }
    }

    fn set_rate(&mut self, handle: HandleId, rate: f32) {
        if let Some(a) = self.action_mut(handle) {
            a.rate = rate;
        }
    }

    fn rate(&self, handle: HandleId) -> Option<f32> {
        self.action(handle).map(|a| a.rate)
    }

    fn set_weight(&mut self, handle: HandleId, weight: f32) {
        if let Some(a) = self.action_mut(handle) {
            a.weight = weight.max(0.0);
        }
    }

    fn play(&mut self, handle: HandleId) {
        if let Some(a) = self.action_mut(handle) {
            if a.finished {
                a.time = 0.0;
                a.finished = false;
            }
            a.active = true;
        }
    }

    fn stop(&mut self, handle: HandleId) {
        if let Some(a) = self.action_mut(handle) {
            a.active = false;
            a.time = 0.0;
            a.finished = false;
        }
    }

    fn is_running(&self, handle: HandleId) -> bool {
        self.action(handle).is_some_and(Action::running)
    }

    fn release(&mut self, handle: HandleId) {
        self.actions.retain(|a| a.id != handle);
    }

    fn stop_all(&mut self) {
        for a in &mut self.actions {
            a.active = false;
            a.time = 0.0;
            a.finished = false;
        }
    }

    fn release_all(&mut self) {
        self.actions.clear();
    }
}
