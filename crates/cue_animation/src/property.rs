//! Animatable scene-object properties
//!
//! Tweens address a property through a [`PropertyKey`] and read or write it
//! through [`PropertyAccess`], so the engine never owns transform or material
//! storage.

use cue_core::{Color, Interpolate, Vec3};
use std::fmt;

/// Identifies one animatable channel on a scene object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    LocalPosition,
    /// Euler angles in degrees
    LocalRotation,
    LocalScale,
    /// Base color of the surface at this index
    BaseColor(usize),
    /// Emission color of the surface at this index
    EmissionColor(usize),
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::LocalPosition => write!(f, "local_position"),
            PropertyKey::LocalRotation => write!(f, "local_rotation"),
            PropertyKey::LocalScale => write!(f, "local_scale"),
            PropertyKey::BaseColor(i) => write!(f, "surface[{}].base_color", i),
            PropertyKey::EmissionColor(i) => write!(f, "surface[{}].emission_color", i),
        }
    }
}

/// A property value
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnimValue {
    Vec3(Vec3),
    Color(Color),
}

impl AnimValue {
    /// Interpolate toward `other`; mismatched kinds jump to `other`
    pub fn lerp(&self, other: &AnimValue, t: f32) -> AnimValue {
        match (self, other) {
            (AnimValue::Vec3(a), AnimValue::Vec3(b)) => AnimValue::Vec3(a.lerp(b, t)),
            (AnimValue::Color(a), AnimValue::Color(b)) => AnimValue::Color(a.lerp(b, t)),
            _ => *other,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            AnimValue::Vec3(v) => Some(*v),
            AnimValue::Color(_) => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            AnimValue::Color(c) => Some(*c),
            AnimValue::Vec3(_) => None,
        }
    }
}

impl From<Vec3> for AnimValue {
    fn from(v: Vec3) -> Self {
        AnimValue::Vec3(v)
    }
}

impl From<Color> for AnimValue {
    fn from(c: Color) -> Self {
        AnimValue::Color(c)
    }
}

/// Read/write access to the properties of a scene object
///
/// Implemented by the host for its transform and material storage.
pub trait PropertyAccess {
    /// Current value, or `None` if the object has no such property
    fn read(&self, key: PropertyKey) -> Option<AnimValue>;

    /// Assign a value; writes to missing properties are ignored
    fn write(&mut self, key: PropertyKey, value: AnimValue);
}
