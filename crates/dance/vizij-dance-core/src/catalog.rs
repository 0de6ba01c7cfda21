//! Style catalog: static table of dance styles and their motion parameters.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::DanceError;

/// One sinusoidal driver: `sin(t * tempo * frequency + phase) * amplitude`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Oscillator {
    pub amplitude: f32,
    pub frequency: f32,
    pub phase: f32,
}

impl Oscillator {
    pub const fn new(amplitude: f32, frequency: f32, phase: f32) -> Self {
        Self {
            amplitude,
            frequency,
            phase,
        }
    }
}

/// Per-region drivers. Knee motion is derived from `foot`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionProfile {
    pub hip: Oscillator,
    pub shoulder: Oscillator,
    pub foot: Oscillator,
    pub body_sway: Oscillator,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    pub id: String,
    pub description: String,
    /// Playback rate multiplier applied to the base clip.
    pub tempo: f32,
    pub motion: MotionProfile,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleCatalog {
    styles: Vec<StyleConfig>,
}

fn style(id: &str, description: &str, tempo: f32, motion: MotionProfile) -> StyleConfig {
    StyleConfig {
        id: id.to_string(),
        description: description.to_string(),
        tempo,
        motion,
    }
}

impl Default for StyleCatalog {
    fn default() -> Self {
        Self {
            styles: vec![
                style(
                    "Samba Básico",
                    "Basic Brazilian samba steps",
                    1.0,
                    MotionProfile {
                        hip: Oscillator::new(0.3, 2.0, 0.0),
                        shoulder: Oscillator::new(0.2, 1.5, PI / 4.0),
                        foot: Oscillator::new(0.4, 4.0, 0.0),
                        body_sway: Oscillator::new(0.1, 1.0, PI / 2.0),
                    },
                ),
                style(
                    "Samba Reggae",
                    "Samba with a reggae groove",
                    0.8,
                    MotionProfile {
                        hip: Oscillator::new(0.5, 1.5, PI / 3.0),
                        shoulder: Oscillator::new(0.3, 1.2, PI / 6.0),
                        foot: Oscillator::new(0.2, 3.0, PI / 2.0),
                        body_sway: Oscillator::new(0.2, 0.8, 0.0),
                    },
                ),
                style(
                    "Samba Enredo",
                    "Carnival samba with elaborate steps",
                    1.2,
                    MotionProfile {
                        hip: Oscillator::new(0.4, 3.0, PI / 4.0),
                        shoulder: Oscillator::new(0.4, 2.5, PI / 8.0),
                        foot: Oscillator::new(0.6, 5.0, 0.0),
                        body_sway: Oscillator::new(0.15, 1.5, PI / 3.0),
                    },
                ),
                style(
                    "Samba Rock",
                    "Samba and rock fusion",
                    1.1,
                    MotionProfile {
                        hip: Oscillator::new(0.6, 2.5, PI / 6.0),
                        shoulder: Oscillator::new(0.5, 2.0, PI / 4.0),
                        foot: Oscillator::new(0.5, 4.5, PI / 3.0),
                        body_sway: Oscillator::new(0.2, 1.2, PI / 2.0),
                    },
                ),
                style(
                    "Samba Pagode",
                    "Softer, sensual samba",
                    0.9,
                    MotionProfile {
                        hip: Oscillator::new(0.2, 1.8, PI / 5.0),
                        shoulder: Oscillator::new(0.15, 1.3, PI / 7.0),
                        foot: Oscillator::new(0.3, 3.5, PI / 4.0),
                        body_sway: Oscillator::new(0.08, 0.9, PI / 6.0),
                    },
                ),
            ],
        }
    }
}

impl StyleCatalog {
    /// Build a catalog from explicit entries, validating every style.
    pub fn new(styles: Vec<StyleConfig>) -> Result<Self, DanceError> {
        let catalog = Self { styles };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse a JSON array of styles.
    pub fn from_json_str(s: &str) -> Result<Self, DanceError> {
        let styles: Vec<StyleConfig> = serde_json::from_str(s)
            .map_err(|e| DanceError::InvalidConfig(format!("style catalog: {e}")))?;
        Self::new(styles)
    }

    pub fn get(&self, id: &str) -> Option<&StyleConfig> {
        self.styles.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Style identifiers in display order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.styles.iter().map(|s| s.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleConfig> {
        self.styles.iter()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    fn validate(&self) -> Result<(), DanceError> {
        if self.styles.is_empty() {
            return Err(DanceError::InvalidConfig(
                "style catalog must not be empty".into(),
            ));
        }
        for (i, s) in self.styles.iter().enumerate() {
            if self.styles[..i].iter().any(|o| o.id == s.id) {
                return Err(DanceError::InvalidConfig(format!(
                    "duplicate style id '{}'",
                    s.id
                )));
            }
            if !(s.tempo.is_finite() && s.tempo > 0.0) {
                return Err(DanceError::InvalidConfig(format!(
                    "style '{}' tempo must be positive",
                    s.id
                )));
            }
            let m = &s.motion;
            for (region, osc) in [
                ("hip", &m.hip),
                ("shoulder", &m.shoulder),
                ("foot", &m.foot),
                ("body_sway", &m.body_sway),
            ] {
                let ok = osc.amplitude.is_finite()
                    && osc.amplitude >= 0.0
                    && osc.frequency.is_finite()
                    && osc.frequency > 0.0
                    && (0.0..2.0 * PI).contains(&osc.phase);
                if !ok {
                    return Err(DanceError::InvalidConfig(format!(
                        "style '{}' {region} driver out of range",
                        s.id
                    )));
                }
            }
        }
        Ok(())
    }
}
