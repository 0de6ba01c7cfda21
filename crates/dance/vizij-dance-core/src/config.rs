//! Configuration for the dance core.
//!
//! Every section has working defaults; JSON documents may override any subset.

use serde::{Deserialize, Serialize};

use crate::bones::{default_bone_rules, BoneRule};
use crate::controller::PlaybackTimings;
use crate::error::DanceError;
use crate::overlay::OverlayCoefficients;
use crate::scheduler::ScheduleCfg;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DanceConfig {
    pub timings: PlaybackTimings,
    pub variation: VariationCfg,
    pub status: StatusCfg,
    pub overlay: OverlayCoefficients,
    pub bone_rules: Vec<BoneRule>,
    /// Models that get the dance controller and overlay. Anything else just
    /// plays its first clip.
    pub dance_models: Vec<String>,
    pub default_style: String,
    pub sliders: Sliders,
}

impl Default for DanceConfig {
    fn default() -> Self {
        Self {
            timings: PlaybackTimings::default(),
            variation: VariationCfg::default(),
            status: StatusCfg::default(),
            overlay: OverlayCoefficients::default(),
            bone_rules: default_bone_rules(),
            dance_models: vec!["Samba Dancing".to_string()],
            default_style: "Samba Básico".to_string(),
            sliders: Sliders::default(),
        }
    }
}

impl DanceConfig {
    pub fn from_json_str(s: &str) -> Result<Self, DanceError> {
        let cfg: DanceConfig = serde_json::from_str(s)
            .map_err(|e| DanceError::InvalidConfig(format!("parse error: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), DanceError> {
        let t = &self.timings;
        for (name, v) in [
            ("transition_delay", t.transition_delay),
            ("verify_delay", t.verify_delay),
            ("stall_cooldown", t.stall_cooldown),
            ("missing_cooldown", t.missing_cooldown),
            ("variation.schedule.interval", self.variation.schedule.interval),
            ("status.schedule.interval", self.status.schedule.interval),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(DanceError::InvalidConfig(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }
        if !self.overlay.is_finite() {
            return Err(DanceError::InvalidConfig(
                "overlay coefficients must be finite".into(),
            ));
        }
        let s = &self.sliders;
        if ![s.tempo, s.hip_intensity, s.step_intensity]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(DanceError::InvalidConfig("sliders must be finite".into()));
        }
        if !(0.0..1.0).contains(&self.variation.max_offset) {
            return Err(DanceError::InvalidConfig(
                "variation.max_offset must be in [0, 1)".into(),
            ));
        }
        if self.default_style.is_empty() {
            return Err(DanceError::InvalidConfig(
                "default_style must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn is_dance_model(&self, name: &str) -> bool {
        self.dance_models.iter().any(|m| m == name)
    }
}

/// Naturalistic tempo variation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariationCfg {
    pub schedule: ScheduleCfg,
    /// Maximum fractional deviation from the base tempo (0.05 = ±5%).
    pub max_offset: f32,
    /// Fixed seed for reproducible runs; random when absent.
    pub seed: Option<u64>,
}

impl Default for VariationCfg {
    fn default() -> Self {
        Self {
            schedule: ScheduleCfg {
                interval: 1.6,
                jitter: 0.6,
            },
            max_offset: 0.05,
            seed: None,
        }
    }
}

/// Throttle for status refresh events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusCfg {
    pub schedule: ScheduleCfg,
}

impl Default for StatusCfg {
    fn default() -> Self {
        Self {
            schedule: ScheduleCfg {
                interval: 0.33,
                jitter: 0.1,
            },
        }
    }
}

/// User-facing controls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sliders {
    /// Playback rate; reset to the style tempo on every style commit.
    pub tempo: f32,
    pub hip_intensity: f32,
    pub step_intensity: f32,
    pub natural_variation: bool,
    /// Accepted but inert: dance playback always loops.
    pub loop_enabled: bool,
    /// Accepted but inert.
    pub crossfade: bool,
}

impl Sliders {
    pub const TEMPO_RANGE: (f32, f32) = (0.5, 2.0);
    pub const INTENSITY_RANGE: (f32, f32) = (0.0, 2.0);
}

impl Default for Sliders {
    fn default() -> Self {
        Self {
            tempo: 1.0,
            hip_intensity: 1.0,
            step_intensity: 1.0,
            natural_variation: true,
            loop_enabled: true,
            crossfade: true,
        }
    }
}
