//! Error taxonomy for the dance core.
//!
//! None of these are fatal to the frame loop: the viewer reports them as
//! [`crate::outputs::DanceEvent::Error`] and recovers locally. Stalled
//! playback is detected by the controller's health check and never appears
//! here (see [`crate::outputs::DanceEvent::Stalled`]).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DanceError {
    /// The loaded model carries no clip that could drive playback.
    #[error("model '{model}' has no usable animation clip")]
    MissingAnimation { model: String },
    /// Requested style is not in the catalog; the request is ignored.
    #[error("unknown dance style '{0}'")]
    InvalidStyle(String),
    /// Style change requested before a dance model and its mixer exist.
    #[error("playback not ready: {0}")]
    NotReady(String),
    #[error("unknown model '{0}'")]
    UnknownModel(String),
    #[error("invalid model data: {0}")]
    InvalidModel(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DanceError {
    /// Short stable tag used in events and log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            DanceError::MissingAnimation { .. } => "missing_animation",
            DanceError::InvalidStyle(_) => "invalid_style",
            DanceError::NotReady(_) => "not_ready",
            DanceError::UnknownModel(_) => "unknown_model",
            DanceError::InvalidModel(_) => "invalid_model",
            DanceError::InvalidConfig(_) => "invalid_config",
        }
    }
}
