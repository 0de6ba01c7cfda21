//! Skeleton data: bones, local transforms and the live pose.
//!
//! Rotations are Euler XYZ angles in radians so overlay offsets can be added
//! per axis (yaw = y, roll = z, pitch = x).

use serde::{Deserialize, Serialize};

use crate::ids::{BoneId, ModelId};

/// Local transform of one bone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoneTransform {
    #[serde(default)]
    pub translation: [f32; 3],
    /// Euler XYZ radians.
    #[serde(default)]
    pub rotation: [f32; 3],
}

impl BoneTransform {
    pub const IDENTITY: BoneTransform = BoneTransform {
        translation: [0.0; 3],
        rotation: [0.0; 3],
    };

    /// Component-wise `self + offset` on both translation and rotation.
    #[inline]
    pub fn add_offset(&mut self, translation: [f32; 3], rotation: [f32; 3]) {
        for i in 0..3 {
            self.translation[i] += translation[i];
            self.rotation[i] += rotation[i];
        }
    }

    /// Linear blend towards `other` by `u` in [0,1].
    pub fn lerp(&self, other: &BoneTransform, u: f32) -> BoneTransform {
        let mut out = *self;
        for i in 0..3 {
            out.translation[i] += (other.translation[i] - self.translation[i]) * u;
            out.rotation[i] += (other.rotation[i] - self.rotation[i]) * u;
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    #[serde(default)]
    pub parent: Option<u32>,
    /// Bind pose; the mixer restores it before writing clip samples.
    #[serde(default)]
    pub rest: BoneTransform,
    /// Current pose (base clip output plus overlay). Not serialized.
    #[serde(skip)]
    pub pose: BoneTransform,
}

impl Bone {
    pub fn new(name: impl Into<String>, parent: Option<u32>, rest: BoneTransform) -> Self {
        Self {
            name: name.into(),
            parent,
            rest,
            pose: rest,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    /// Stamped by the viewer on load; `None` for skeletons not owned by a loaded model.
    #[serde(skip)]
    pub model: Option<ModelId>,
    pub bones: Vec<Bone>,
}

impl Skeleton {
    pub fn new(bones: Vec<Bone>) -> Self {
        Self { model: None, bones }
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.index())
    }

    pub fn bone_mut(&mut self, id: BoneId) -> Option<&mut Bone> {
        self.bones.get_mut(id.index())
    }

    pub fn find(&self, name: &str) -> Option<BoneId> {
        self.bones
            .iter()
            .position(|b| b.name == name)
            .map(|i| BoneId(i as u32))
    }

    pub fn iter(&self) -> impl Iterator<Item = (BoneId, &Bone)> {
        self.bones
            .iter()
            .enumerate()
            .map(|(i, b)| (BoneId(i as u32), b))
    }

    /// Copy every bone's rest transform into its pose.
    pub fn reset_pose(&mut self) {
        for b in &mut self.bones {
            b.pose = b.rest;
        }
    }

    /// Current poses in bone order.
    pub fn poses(&self) -> Vec<BoneTransform> {
        self.bones.iter().map(|b| b.pose).collect()
    }

    /// Parent indices must point at existing, earlier-declared bones.
    pub(crate) fn validate(&self) -> Result<(), String> {
        for (i, b) in self.bones.iter().enumerate() {
            if let Some(p) = b.parent {
                if p as usize >= i {
                    return Err(format!(
                        "bone '{}' parent index {p} must reference an earlier bone",
                        b.name
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_offset_is_componentwise() {
        let mut t = BoneTransform {
            translation: [1.0, 2.0, 3.0],
            rotation: [0.5, 0.25, 0.0],
        };
        t.add_offset([0.5, 0.0, -1.0], [0.0, 0.25, 0.0]);
        assert_eq!(t.translation, [1.5, 2.0, 2.0]);
        assert_eq!(t.rotation, [0.5, 0.5, 0.0]);
    }

    #[test]
    fn forward_parent_reference_is_rejected() {
        let sk = Skeleton::new(vec![
            Bone::new("Hips", Some(1), BoneTransform::IDENTITY),
            Bone::new("Spine", None, BoneTransform::IDENTITY),
        ]);
        assert!(sk.validate().is_err());
    }
}
