//! Loaded model data (skeleton plus authored clips) and the loading seam.
//!
//! Asset formats are the host's concern. The core only needs a skeleton and
//! zero or more clips, delivered through [`ModelSource`]. [`ModelLibrary`] is
//! an in-memory source fed with [`Model`] values or JSON documents.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::DanceError;
use crate::skeleton::{BoneTransform, Skeleton};

/// A keyed local transform at `time` seconds into the clip.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseKey {
    pub time: f32,
    pub transform: BoneTransform,
}

/// Keys for one bone, addressed by bone name. Bound to a bone index when a
/// mixer is created for the skeleton.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneTrack {
    pub bone: String,
    pub keys: Vec<PoseKey>,
}

impl BoneTrack {
    /// Linear sample at `t` seconds; clamps outside the keyed range.
    pub fn sample(&self, t: f32) -> Option<BoneTransform> {
        let first = self.keys.first()?;
        if t <= first.time {
            return Some(first.transform);
        }
        // keys are validated as non-decreasing in time
        let idx = self.keys.partition_point(|k| k.time <= t);
        if idx >= self.keys.len() {
            return self.keys.last().map(|k| k.transform);
        }
        let a = &self.keys[idx - 1];
        let b = &self.keys[idx];
        let span = b.time - a.time;
        let u = if span > 0.0 { (t - a.time) / span } else { 1.0 };
        Some(a.transform.lerp(&b.transform, u))
    }
}

/// Authored sequence of skeletal poses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub name: String,
    /// Seconds.
    pub duration: f32,
    #[serde(default)]
    pub tracks: Vec<BoneTrack>,
}

impl Clip {
    fn validate(&self) -> Result<(), String> {
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(format!("clip '{}' duration must be > 0", self.name));
        }
        for track in &self.tracks {
            let mut last = -f32::INFINITY;
            for k in &track.keys {
                if !k.time.is_finite() || k.time < 0.0 || k.time > self.duration {
                    return Err(format!(
                        "clip '{}' key time for '{}' must be finite and within [0, {}]",
                        self.name, track.bone, self.duration
                    ));
                }
                if k.time < last {
                    return Err(format!(
                        "clip '{}' key times for '{}' must be non-decreasing",
                        self.name, track.bone
                    ));
                }
                last = k.time;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub skeleton: Skeleton,
    #[serde(default)]
    pub clips: Vec<Clip>,
}

impl Model {
    /// Validate skeleton and clip invariants and reset the live pose to rest.
    pub fn validate(&mut self) -> Result<(), DanceError> {
        self.skeleton.validate().map_err(DanceError::InvalidModel)?;
        for clip in &self.clips {
            clip.validate().map_err(DanceError::InvalidModel)?;
        }
        self.skeleton.reset_pose();
        Ok(())
    }
}

/// Parse a model document (`{ name, skeleton: { bones }, clips }`).
pub fn parse_model_json(s: &str) -> Result<Model, DanceError> {
    let mut model: Model = serde_json::from_str(s)
        .map_err(|e| DanceError::InvalidModel(format!("parse error: {e}")))?;
    model.validate()?;
    Ok(model)
}

/// Host-provided model loading.
pub trait ModelSource {
    /// Produce a fresh copy of the named model. Reloading must not share live
    /// pose state with earlier loads.
    fn load(&mut self, name: &str) -> Result<Model, DanceError>;

    /// Names this source can load, for display.
    fn names(&self) -> Vec<String>;
}

#[derive(Clone, Debug, Default)]
pub struct ModelLibrary {
    models: HashMap<String, Model>,
}

impl ModelLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model under its own name after validation.
    pub fn insert(&mut self, mut model: Model) -> Result<(), DanceError> {
        model.validate()?;
        self.models.insert(model.name.clone(), model);
        Ok(())
    }

    pub fn insert_json(&mut self, s: &str) -> Result<(), DanceError> {
        let model = parse_model_json(s)?;
        self.models.insert(model.name.clone(), model);
        Ok(())
    }

    pub fn with_model(mut self, model: Model) -> Result<Self, DanceError> {
        self.insert(model)?;
        Ok(self)
    }
}

impl ModelSource for ModelLibrary {
    fn load(&mut self, name: &str) -> Result<Model, DanceError> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| DanceError::UnknownModel(name.to_string()))
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(time: f32, x: f32) -> PoseKey {
        PoseKey {
            time,
            transform: BoneTransform {
                translation: [x, 0.0, 0.0],
                rotation: [0.0; 3],
            },
        }
    }

    #[test]
    fn sample_interpolates_and_clamps() {
        let track = BoneTrack {
            bone: "Hips".into(),
            keys: vec![key(0.0, 0.0), key(1.0, 2.0)],
        };
        assert_eq!(track.sample(-1.0).map(|t| t.translation[0]), Some(0.0));
        assert_eq!(track.sample(0.5).map(|t| t.translation[0]), Some(1.0));
        assert_eq!(track.sample(3.0).map(|t| t.translation[0]), Some(2.0));
    }

    #[test]
    fn empty_track_samples_nothing() {
        let track = BoneTrack {
            bone: "Hips".into(),
            keys: vec![],
        };
        assert!(track.sample(0.0).is_none());
    }

    #[test]
    fn rejects_keys_past_duration() {
        let doc = r#"{
            "name": "bad",
            "skeleton": { "bones": [ { "name": "Hips" } ] },
            "clips": [ { "name": "c", "duration": 1.0,
                "tracks": [ { "bone": "Hips", "keys": [
                    { "time": 2.0, "transform": {} } ] } ] } ]
        }"#;
        assert!(matches!(
            parse_model_json(doc),
            Err(DanceError::InvalidModel(_))
        ));
    }
}
