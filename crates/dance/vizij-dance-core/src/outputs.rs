//! Output contracts from the dance core.
//!
//! Each frame yields the additive bone offsets that were applied on top of
//! the base clip pose plus a list of semantic events. Adapters read the pose
//! from the skeleton and forward events to logs or UI.

use serde::{Deserialize, Serialize};

use crate::ids::{BoneId, HandleId};

/// Additive offset applied to one bone this frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneOffset {
    pub bone: BoneId,
    pub translation: [f32; 3],
    /// Euler XYZ radians.
    pub rotation: [f32; 3],
}

/// How the health check recovered a stopped dance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recovery {
    /// Handle existed but was not running; play was re-triggered on it.
    Replayed,
    /// No usable handle; the current style was selected again.
    Reapplied,
}

/// Snapshot for the info panel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DanceStatus {
    pub model: Option<String>,
    /// Whether the dance info panel applies to the loaded model.
    pub dance_info_visible: bool,
    pub style: Option<String>,
    pub description: Option<String>,
    pub tempo: f32,
    pub running: bool,
    /// Style waiting for an in-flight transition to commit.
    pub pending_style: Option<String>,
}

/// Discrete semantic signals emitted while stepping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DanceEvent {
    ModelLoaded {
        model: String,
        clips: usize,
        dance: bool,
    },
    ModelUnloaded {
        model: String,
    },
    StyleRequested {
        style: String,
    },
    StyleApplied {
        style: String,
        tempo: f32,
        handle: HandleId,
    },
    /// Post-start check ran; `retriggered` when the handle had to be played again.
    PlaybackVerified {
        handle: HandleId,
        retriggered: bool,
    },
    Stalled {
        style: String,
        recovery: Recovery,
    },
    TempoVaried {
        tempo: f32,
    },
    Status(DanceStatus),
    Error {
        kind: String,
        message: String,
    },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub offsets: Vec<BoneOffset>,
    #[serde(default)]
    pub events: Vec<DanceEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.offsets.clear();
        self.events.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty() && self.events.is_empty()
    }
}
