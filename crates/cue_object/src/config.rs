//! Cue configuration
//!
//! Authored cue settings, loaded from TOML. Every field has a default, so a
//! cue file only lists what it changes:
//!
//! ```toml
//! loop_duration = 2.0
//! loop_count = 3
//! return_policy = "use_fixed_duration"
//! return_duration = 0.8
//!
//! [position]
//! offset = { x = 0.0, y = 0.25, z = 0.0 }
//! curve = "ease_in_out"
//!
//! [[surfaces]]
//! emission_color = { r = 1.0, g = 0.8, b = 0.2 }
//!
//! [audio]
//! cue_clip = "tick"
//! stop_clip = "chime"
//! ```

use crate::error::{CueError, Result};
use cue_animation::Curve;
use cue_core::{Color, Vec3};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How long the return to rest takes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnPolicy {
    /// Mirror the displacement accumulated in the interrupted leg
    #[default]
    UseRemainingCueTime,
    /// Always take `return_duration` seconds
    UseFixedDuration,
}

/// Offset added to one transform channel at the peak of the loop
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformCue {
    pub offset: Vec3,
    pub curve: Curve,
}

/// Peak colors for one surface; `None` leaves the channel untouched
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceCue {
    pub base_color: Option<Color>,
    pub emission_color: Option<Color>,
}

/// Sound settings
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Played at every leg (or mid-leg with `play_halfway`), never on the
    /// final arrival at rest
    pub cue_clip: Option<String>,
    /// Played once the object is back at rest
    pub stop_clip: Option<String>,
    /// Play the cue clip halfway through each leg instead of at its end
    pub play_halfway: bool,
}

/// Complete cue definition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueConfig {
    /// Start automatically `start_delay` seconds after the cue is enabled
    pub auto_start: bool,
    pub start_delay: f32,

    /// Seconds for a full loop: rest to peak and back
    pub loop_duration: f32,
    /// Round trips: `-1` loops forever, `0` does not loop
    pub loop_count: i32,
    /// Seconds to ease back to rest when restarted mid-return
    pub graceful_duration: f32,
    pub return_policy: ReturnPolicy,
    /// Seconds used by [`ReturnPolicy::UseFixedDuration`]
    pub return_duration: f32,
    /// Curve for every return to rest
    pub return_curve: Curve,

    pub position: TransformCue,
    /// Euler angles in degrees
    pub rotation: TransformCue,
    pub scale: TransformCue,

    pub color_curve: Curve,
    pub emission_curve: Curve,
    /// Emission assigned to every surface before the rest state is captured
    pub base_emission: Option<Color>,
    /// Per-surface peak colors, by surface index
    pub surfaces: Vec<SurfaceCue>,

    pub audio: AudioConfig,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            auto_start: false,
            start_delay: 5.0,
            loop_duration: 2.5,
            loop_count: -1,
            graceful_duration: 0.5,
            return_policy: ReturnPolicy::UseRemainingCueTime,
            return_duration: 1.0,
            // Stopping at 0.99 avoids emission flicker on arrival
            return_curve: Curve::linear(0.0, 0.99),
            position: TransformCue::default(),
            rotation: TransformCue::default(),
            scale: TransformCue::default(),
            color_curve: Curve::linear(0.05, 1.0),
            emission_curve: Curve::linear(0.05, 0.35),
            base_emission: None,
            surfaces: Vec::new(),
            audio: AudioConfig::default(),
        }
    }
}

impl CueConfig {
    /// Parse and validate a TOML cue definition
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: CueConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML cue file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Check the invariants the cue state machine relies on
    pub fn validate(&self) -> Result<()> {
        positive("loop_duration", self.loop_duration)?;
        positive("graceful_duration", self.graceful_duration)?;
        positive("return_duration", self.return_duration)?;

        if !self.start_delay.is_finite() || self.start_delay < 0.0 {
            return Err(CueError::invalid(
                "start_delay",
                format!("must be zero or more, got {}", self.start_delay),
            ));
        }

        if self.loop_count < -1 || self.loop_count > i32::MAX / 2 {
            return Err(CueError::invalid(
                "loop_count",
                format!("must be -1, 0 or a positive count, got {}", self.loop_count),
            ));
        }

        let curves = [
            ("return_curve", &self.return_curve),
            ("position.curve", &self.position.curve),
            ("rotation.curve", &self.rotation.curve),
            ("scale.curve", &self.scale.curve),
            ("color_curve", &self.color_curve),
            ("emission_curve", &self.emission_curve),
        ];
        for (field, curve) in curves {
            if !curve.is_well_formed() {
                return Err(CueError::invalid(
                    field,
                    "needs at least one finite key, sorted by time",
                ));
            }
        }

        Ok(())
    }

    /// True when surfaces need emission-capable rendering
    pub fn animates_emission(&self) -> bool {
        self.base_emission.is_some() || self.surfaces.iter().any(|s| s.emission_color.is_some())
    }
}

fn positive(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CueError::invalid(
            field,
            format!("must be greater than 0, got {}", value),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cue_animation::{CurveKey, Easing};

    #[test]
    fn test_defaults_are_valid() {
        let config = CueConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.loop_count, -1);
        assert_eq!(config.loop_duration, 2.5);
        assert!((config.return_curve.evaluate(1.0) - 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_parse_partial_file() {
        let config = CueConfig::from_toml_str(
            r#"
            loop_duration = 2.0
            loop_count = 3
            return_policy = "use_fixed_duration"
            return_duration = 0.8

            [position]
            offset = { x = 0.0, y = 0.25, z = 0.0 }
            curve = "ease_in_out"

            [[surfaces]]
            emission_color = { r = 1.0, g = 0.8, b = 0.2 }

            [[surfaces]]

            [audio]
            cue_clip = "tick"
            play_halfway = true
            "#,
        )
        .unwrap();

        assert_eq!(config.loop_count, 3);
        assert_eq!(config.return_policy, ReturnPolicy::UseFixedDuration);
        assert_eq!(config.position.offset, Vec3::new(0.0, 0.25, 0.0));
        assert_eq!(config.position.curve, Curve::Easing(Easing::EaseInOut));
        assert_eq!(config.rotation.offset, Vec3::ZERO);
        assert_eq!(config.surfaces.len(), 2);
        assert_eq!(
            config.surfaces[0].emission_color,
            Some(Color::rgb(1.0, 0.8, 0.2))
        );
        assert_eq!(config.surfaces[1], SurfaceCue::default());
        assert!(config.animates_emission());
        assert_eq!(config.audio.cue_clip.as_deref(), Some("tick"));
        assert!(config.audio.play_halfway);
        assert_eq!(config.graceful_duration, 0.5);
    }

    #[test]
    fn test_rejects_non_positive_durations() {
        let err = CueConfig::from_toml_str("loop_duration = 0.0").unwrap_err();
        assert!(matches!(
            err,
            CueError::InvalidConfig {
                field: "loop_duration",
                ..
            }
        ));

        let config = CueConfig {
            graceful_duration: -0.5,
            ..CueConfig::default()
        };
        assert!(config.validate().is_err());

        let config = CueConfig {
            return_duration: f32::NAN,
            ..CueConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_loop_count() {
        let err = CueConfig::from_toml_str("loop_count = -2").unwrap_err();
        assert!(err.to_string().contains("loop_count"));
    }

    #[test]
    fn test_rejects_unsorted_curve() {
        let config = CueConfig {
            emission_curve: Curve::Keys(vec![CurveKey::new(1.0, 1.0), CurveKey::new(0.0, 0.0)]),
            ..CueConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("emission_curve"));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = CueConfig::from_toml_str("loop_count = \"many\"").unwrap_err();
        assert!(matches!(err, CueError::Parse(_)));
    }
}
