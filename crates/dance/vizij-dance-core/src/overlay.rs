//! Procedural overlay: additive per-frame bone offsets driven by a style's
//! motion profile.
//!
//! Offsets are a pure function of `(time, tempo, sliders, profile, groups)`.
//! They are added to whatever pose the base clip wrote this frame; the
//! overlay never assigns a transform outright.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::bones::{BoneGroupKind, BoneGroups};
use crate::catalog::{MotionProfile, Oscillator};
use crate::outputs::BoneOffset;
use crate::skeleton::Skeleton;

/// Fixed scale factors that keep the overlay a subtle perturbation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayCoefficients {
    pub hip_yaw: f32,
    pub shoulder_roll: f32,
    pub spine_roll: f32,
    pub foot_lift: f32,
    pub foot_sway: f32,
    /// Frequency (before tempo) of the lateral foot sway.
    pub foot_sway_frequency: f32,
    pub foot_roll: f32,
    pub foot_roll_frequency: f32,
    pub knee_pitch: f32,
    /// Knee frequency relative to the foot driver.
    pub knee_frequency_ratio: f32,
    /// Knee amplitude relative to the foot driver.
    pub knee_amplitude_ratio: f32,
}

impl Default for OverlayCoefficients {
    fn default() -> Self {
        Self {
            hip_yaw: 0.01,
            shoulder_roll: 0.005,
            spine_roll: 0.003,
            foot_lift: 0.008,
            foot_sway: 0.003,
            foot_sway_frequency: 2.0,
            foot_roll: 0.01,
            foot_roll_frequency: 3.0,
            knee_pitch: 0.005,
            knee_frequency_ratio: 0.7,
            knee_amplitude_ratio: 0.5,
        }
    }
}

impl OverlayCoefficients {
    pub fn is_finite(&self) -> bool {
        [
            self.hip_yaw,
            self.shoulder_roll,
            self.spine_roll,
            self.foot_lift,
            self.foot_sway,
            self.foot_sway_frequency,
            self.foot_roll,
            self.foot_roll_frequency,
            self.knee_pitch,
            self.knee_frequency_ratio,
            self.knee_amplitude_ratio,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Per-frame inputs besides the style profile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlayParams {
    /// Wall-clock seconds.
    pub time: f64,
    pub tempo: f32,
    pub hip_intensity: f32,
    pub step_intensity: f32,
}

#[inline]
fn wave(osc: &Oscillator, t: f64, tempo: f64, extra_phase: f64) -> f64 {
    (t * tempo * osc.frequency as f64 + osc.phase as f64 + extra_phase).sin()
        * osc.amplitude as f64
}

/// Left/right alternation: 0 for even indices, π for odd.
#[inline]
fn parity_phase(index: usize) -> f64 {
    (index % 2) as f64 * PI
}

/// Compute offsets for every bone in `groups`, appending to `out`.
pub fn compute_offsets_into(
    params: &OverlayParams,
    profile: &MotionProfile,
    groups: &BoneGroups,
    k: &OverlayCoefficients,
    out: &mut Vec<BoneOffset>,
) {
    let t = params.time;
    let tempo = params.tempo as f64;
    let hip = params.hip_intensity as f64;
    let step = params.step_intensity as f64;

    // hip: yaw
    if let Some(&bone) = groups.get(BoneGroupKind::Hip).first() {
        let yaw = wave(&profile.hip, t, tempo, 0.0) * hip * k.hip_yaw as f64;
        out.push(BoneOffset {
            bone,
            translation: [0.0; 3],
            rotation: [0.0, yaw as f32, 0.0],
        });
    }

    // shoulders: roll, alternating sides
    let shoulder = wave(&profile.shoulder, t, tempo, 0.0);
    for (i, &bone) in groups.get(BoneGroupKind::Shoulder).iter().enumerate() {
        let roll = shoulder * k.shoulder_roll as f64 * (t + parity_phase(i)).sin();
        out.push(BoneOffset {
            bone,
            translation: [0.0; 3],
            rotation: [0.0, 0.0, roll as f32],
        });
    }

    // spine: body sway roll
    if let Some(&bone) = groups.get(BoneGroupKind::Spine).first() {
        let roll = wave(&profile.body_sway, t, tempo, 0.0) * k.spine_roll as f64;
        out.push(BoneOffset {
            bone,
            translation: [0.0; 3],
            rotation: [0.0, 0.0, roll as f32],
        });
    }

    // feet: lift, lateral sway and roll
    for (i, &bone) in groups.get(BoneGroupKind::Foot).iter().enumerate() {
        let phase = parity_phase(i);
        let lift = wave(&profile.foot, t, tempo, phase) * step * k.foot_lift as f64;
        let sway = (t * tempo * k.foot_sway_frequency as f64 + phase).sin()
            * k.foot_sway as f64
            * step;
        let roll = (t * tempo * k.foot_roll_frequency as f64 + phase).sin()
            * k.foot_roll as f64
            * step;
        out.push(BoneOffset {
            bone,
            translation: [sway as f32, lift as f32, 0.0],
            rotation: [0.0, 0.0, roll as f32],
        });
    }

    // knees: pitch derived from the foot driver
    let knee_osc = Oscillator {
        amplitude: profile.foot.amplitude * k.knee_amplitude_ratio,
        frequency: profile.foot.frequency * k.knee_frequency_ratio,
        phase: 0.0,
    };
    for (i, &bone) in groups.get(BoneGroupKind::Knee).iter().enumerate() {
        let pitch =
            wave(&knee_osc, t, tempo, parity_phase(i)) * k.knee_pitch as f64 * step;
        out.push(BoneOffset {
            bone,
            translation: [0.0; 3],
            rotation: [pitch as f32, 0.0, 0.0],
        });
    }
}

pub fn compute_offsets(
    params: &OverlayParams,
    profile: &MotionProfile,
    groups: &BoneGroups,
    k: &OverlayCoefficients,
) -> Vec<BoneOffset> {
    let mut out = Vec::new();
    compute_offsets_into(params, profile, groups, k, &mut out);
    out
}

/// Add `offsets` onto the skeleton's current pose. Offsets naming bones the
/// skeleton does not have are skipped.
pub fn apply_offsets(skeleton: &mut Skeleton, offsets: &[BoneOffset]) {
    for o in offsets {
        if let Some(b) = skeleton.bone_mut(o.bone) {
            b.pose.add_offset(o.translation, o.rotation);
        }
    }
}

/// Compute and apply in one step. Does nothing when `groups` belong to a
/// different load than `skeleton`. Returns the applied offsets via `out`.
pub fn apply_overlay(
    skeleton: &mut Skeleton,
    groups: &BoneGroups,
    profile: &MotionProfile,
    params: &OverlayParams,
    k: &OverlayCoefficients,
    out: &mut Vec<BoneOffset>,
) {
    if !groups.is_for(skeleton) {
        log::debug!("overlay skipped: bone groups are stale for this skeleton");
        return;
    }
    let start = out.len();
    compute_offsets_into(params, profile, groups, k, out);
    apply_offsets(skeleton, &out[start..]);
}
