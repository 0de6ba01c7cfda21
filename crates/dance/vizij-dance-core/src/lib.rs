//! Vizij Dance Core (engine-agnostic)
//!
//! Procedural dance overlay for skinned characters: a catalog of samba
//! styles, bone-group discovery by name, a playback controller that keeps
//! exactly one looping base clip alive through style switches and stalls,
//! additive sinusoidal bone offsets and small tempo variation.
//!
//! [`DanceViewer`] runs the whole pipeline once per frame. Engine adapters
//! copy the skeleton pose out afterwards.

pub mod bones;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod ids;
pub mod mixer;
pub mod model;
pub mod outputs;
pub mod overlay;
pub mod scheduler;
pub mod skeleton;
pub mod variation;
pub mod viewer;

// Re-exports for consumers (adapters)
pub use bones::{default_bone_rules, find_bone_groups, BoneGroupKind, BoneGroups, BoneRule, Selection};
pub use catalog::{MotionProfile, Oscillator, StyleCatalog, StyleConfig};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DanceConfig, Sliders, StatusCfg, VariationCfg};
pub use controller::{Phase, PlaybackController, PlaybackState, PlaybackTimings};
pub use error::DanceError;
pub use ids::{BoneId, HandleId, ModelId};
pub use mixer::{ClipMixer, LoopMode, Mixer};
pub use model::{parse_model_json, BoneTrack, Clip, Model, ModelLibrary, ModelSource, PoseKey};
pub use outputs::{BoneOffset, DanceEvent, DanceStatus, Outputs, Recovery};
pub use overlay::{apply_offsets, apply_overlay, compute_offsets, OverlayCoefficients, OverlayParams};
pub use scheduler::{PeriodicSchedule, ScheduleCfg};
pub use skeleton::{Bone, BoneTransform, Skeleton};
pub use variation::VariationInjector;
pub use viewer::DanceViewer;
