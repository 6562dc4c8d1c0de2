//! In-memory scene object
//!
//! A plain transform and material store implementing [`CueObject`], used by
//! the headless simulator and by tests.

use crate::targets::CueObject;
use cue_animation::{AnimValue, PropertyAccess, PropertyKey};
use cue_core::{Color, Vec3};
use serde::{Deserialize, Serialize};

/// A renderable surface
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Surface {
    pub base_color: Color,
    pub emission_color: Color,
    pub emission_enabled: bool,
}

impl Surface {
    pub fn new(base_color: Color, emission_color: Color) -> Self {
        Self {
            base_color,
            emission_color,
            emission_enabled: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneObject {
    pub local_position: Vec3,
    /// Euler angles in degrees
    pub local_rotation: Vec3,
    pub local_scale: Vec3,
    pub surfaces: Vec<Surface>,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            local_position: Vec3::ZERO,
            local_rotation: Vec3::ZERO,
            local_scale: Vec3::ONE,
            surfaces: Vec::new(),
        }
    }
}

impl SceneObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.local_position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.local_rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.local_scale = scale;
        self
    }

    pub fn with_surface(mut self, surface: Surface) -> Self {
        self.surfaces.push(surface);
        self
    }
}

impl PropertyAccess for SceneObject {
    fn read(&self, key: PropertyKey) -> Option<AnimValue> {
        match key {
            PropertyKey::LocalPosition => Some(self.local_position.into()),
            PropertyKey::LocalRotation => Some(self.local_rotation.into()),
            PropertyKey::LocalScale => Some(self.local_scale.into()),
            PropertyKey::BaseColor(i) => self.surfaces.get(i).map(|s| s.base_color.into()),
            PropertyKey::EmissionColor(i) => {
                self.surfaces.get(i).map(|s| s.emission_color.into())
            }
        }
    }

    fn write(&mut self, key: PropertyKey, value: AnimValue) {
        match (key, value) {
            (PropertyKey::LocalPosition, AnimValue::Vec3(v)) => self.local_position = v,
            (PropertyKey::LocalRotation, AnimValue::Vec3(v)) => self.local_rotation = v,
            (PropertyKey::LocalScale, AnimValue::Vec3(v)) => self.local_scale = v,
            (PropertyKey::BaseColor(i), AnimValue::Color(c)) => {
                if let Some(surface) = self.surfaces.get_mut(i) {
                    surface.base_color = c;
                }
            }
            (PropertyKey::EmissionColor(i), AnimValue::Color(c)) => {
                if let Some(surface) = self.surfaces.get_mut(i) {
                    surface.emission_color = c;
                }
            }
            (key, value) => {
                tracing::warn!("Ignoring {:?} written to {}", value, key);
            }
        }
    }
}

impl CueObject for SceneObject {
    fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    fn enable_emission(&mut self, surface: usize) {
        if let Some(surface) = self.surfaces.get_mut(surface) {
            surface.emission_enabled = true;
        }
    }
}
