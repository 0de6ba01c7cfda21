//! Skeleton query: classify bones into named groups by name fragments.
//!
//! Matching is a case-insensitive substring test driven by [`BoneRule`]s, so
//! supporting a new rig naming convention is a config change.

use serde::{Deserialize, Serialize};

use crate::ids::{BoneId, ModelId};
use crate::skeleton::Skeleton;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoneGroupKind {
    Hip,
    Shoulder,
    Spine,
    Foot,
    Knee,
}

impl BoneGroupKind {
    pub const ALL: [BoneGroupKind; 5] = [
        BoneGroupKind::Hip,
        BoneGroupKind::Shoulder,
        BoneGroupKind::Spine,
        BoneGroupKind::Foot,
        BoneGroupKind::Knee,
    ];
}

/// How many matches a group keeps.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// First matching bone in skeleton order.
    First,
    /// Every matching bone in skeleton order.
    All,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneRule {
    pub group: BoneGroupKind,
    pub fragments: Vec<String>,
    pub select: Selection,
}

impl BoneRule {
    pub fn new(group: BoneGroupKind, fragments: &[&str], select: Selection) -> Self {
        Self {
            group,
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            select,
        }
    }
}

/// Rules for common humanoid rigs (Mixamo-style names and friends).
pub fn default_bone_rules() -> Vec<BoneRule> {
    vec![
        BoneRule::new(BoneGroupKind::Hip, &["hip", "pelvis"], Selection::First),
        BoneRule::new(
            BoneGroupKind::Shoulder,
            &["shoulder", "clavicle"],
            Selection::All,
        ),
        BoneRule::new(BoneGroupKind::Spine, &["spine", "chest"], Selection::First),
        BoneRule::new(
            BoneGroupKind::Foot,
            &["foot", "toe", "ankle"],
            Selection::All,
        ),
        BoneRule::new(BoneGroupKind::Knee, &["knee", "leg"], Selection::All),
    ]
}

/// Discovered bone groups for one loaded model.
///
/// Holds bone indices, not bones. The ids are only meaningful for the
/// skeleton stamped with the same [`ModelId`]; see [`BoneGroups::is_for`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoneGroups {
    pub model: Option<ModelId>,
    groups: Vec<(BoneGroupKind, Vec<BoneId>)>,
}

impl BoneGroups {
    /// Bones in `kind`, empty when the rig has none.
    pub fn get(&self, kind: BoneGroupKind) -> &[BoneId] {
        self.groups
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, ids)| ids.as_slice())
            .unwrap_or(&[])
    }

    /// True when these groups were computed for `skeleton`'s current load.
    pub fn is_for(&self, skeleton: &Skeleton) -> bool {
        self.model.is_some() && self.model == skeleton.model
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|(_, ids)| ids.is_empty())
    }

    fn push(&mut self, kind: BoneGroupKind, id: BoneId) {
        match self.groups.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, ids)) => ids.push(id),
            None => self.groups.push((kind, vec![id])),
        }
    }
}

/// Scan every bone once and classify it against `rules`.
///
/// A bone may land in several groups. A rule with `Selection::First` keeps
/// only its earliest match; later rules for the same group add to it.
pub fn find_bone_groups(skeleton: &Skeleton, rules: &[BoneRule]) -> BoneGroups {
    let rules: Vec<(BoneGroupKind, Selection, Vec<String>)> = rules
        .iter()
        .map(|r| {
            (
                r.group,
                r.select,
                r.fragments.iter().map(|f| f.to_lowercase()).collect(),
            )
        })
        .collect();
    let mut taken = vec![false; rules.len()];
    let mut out = BoneGroups {
        model: skeleton.model,
        groups: Vec::new(),
    };

    for (id, bone) in skeleton.iter() {
        let name = bone.name.to_lowercase();
        for (i, (group, select, fragments)) in rules.iter().enumerate() {
            if *select == Selection::First && taken[i] {
                continue;
            }
            if fragments.iter().any(|f| !f.is_empty() && name.contains(f.as_str())) {
                out.push(*group, id);
                taken[i] = true;
            }
        }
    }

    for kind in BoneGroupKind::ALL {
        log::debug!("bone group {:?}: {} bone(s)", kind, out.get(kind).len());
    }
    out
}
