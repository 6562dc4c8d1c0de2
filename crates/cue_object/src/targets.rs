//! Rest state and animatable targets
//!
//! [`RestState`] is captured once, before any cue runs, and every return
//! resolves back to it. [`PropertyTargetSet`] pairs each tracked property with
//! its rest value, its peak value and its curve.

use crate::config::CueConfig;
use cue_animation::{AnimValue, Curve, PropertyAccess, PropertyKey};
use cue_core::{Color, Vec3};

/// A scene object a cue can drive
///
/// Surfaces are addressed by index, from `0` to `surface_count() - 1`.
pub trait CueObject: PropertyAccess {
    /// Number of renderable surfaces with base and emission colors
    fn surface_count(&self) -> usize;

    /// Switch a surface to emission-capable rendering
    ///
    /// Called once per surface during setup, never per frame.
    fn enable_emission(&mut self, _surface: usize) {}
}

/// Rest colors of one surface
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceRest {
    pub base_color: Color,
    pub emission_color: Color,
}

/// Original, pre-cue values of every tracked property
#[derive(Clone, Debug, PartialEq)]
pub struct RestState {
    pub local_position: Vec3,
    /// Euler angles in degrees
    pub local_rotation: Vec3,
    pub local_scale: Vec3,
    pub surfaces: Vec<SurfaceRest>,
}

impl RestState {
    /// Read the current values of `object`
    pub fn capture<T: CueObject + ?Sized>(object: &T) -> Self {
        let vec3 = |key, fallback| {
            object
                .read(key)
                .and_then(|v| v.as_vec3())
                .unwrap_or(fallback)
        };
        let color = |key| {
            object
                .read(key)
                .and_then(|v| v.as_color())
                .unwrap_or_default()
        };

        Self {
            local_position: vec3(PropertyKey::LocalPosition, Vec3::ZERO),
            local_rotation: vec3(PropertyKey::LocalRotation, Vec3::ZERO),
            local_scale: vec3(PropertyKey::LocalScale, Vec3::ONE),
            surfaces: (0..object.surface_count())
                .map(|i| SurfaceRest {
                    base_color: color(PropertyKey::BaseColor(i)),
                    emission_color: color(PropertyKey::EmissionColor(i)),
                })
                .collect(),
        }
    }

    /// Rest value of a property
    pub fn value(&self, key: PropertyKey) -> Option<AnimValue> {
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
}

/// One animatable property of a cue
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyTarget {
    /// A transform channel moved by an offset
    Offset3 {
        key: PropertyKey,
        original: Vec3,
        desired: Vec3,
        curve: Curve,
    },
    /// A surface color channel
    ColorChannel {
        key: PropertyKey,
        original: Color,
        desired: Color,
        curve: Curve,
    },
}

impl PropertyTarget {
    pub fn key(&self) -> PropertyKey {
        match self {
            PropertyTarget::Offset3 { key, .. } | PropertyTarget::ColorChannel { key, .. } => *key,
        }
    }

    /// Rest value
    pub fn original(&self) -> AnimValue {
        match self {
            PropertyTarget::Offset3 { original, .. } => (*original).into(),
            PropertyTarget::ColorChannel { original, .. } => (*original).into(),
        }
    }

    /// Value at the peak of the loop
    pub fn desired(&self) -> AnimValue {
        match self {
            PropertyTarget::Offset3 { desired, .. } => (*desired).into(),
            PropertyTarget::ColorChannel { desired, .. } => (*desired).into(),
        }
    }

    pub fn curve(&self) -> &Curve {
        match self {
            PropertyTarget::Offset3 { curve, .. } | PropertyTarget::ColorChannel { curve, .. } => {
                curve
            }
        }
    }

    /// False when the peak equals the rest value; inactive targets are never
    /// tweened
    pub fn is_active(&self) -> bool {
        self.original() != self.desired()
    }
}

/// Every property a cue tracks, active or not
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyTargetSet {
    targets: Vec<PropertyTarget>,
}

impl PropertyTargetSet {
    /// Derive targets from the authored offsets and colors
    ///
    /// Surfaces without a [`SurfaceCue`](crate::SurfaceCue) entry are tracked
    /// with their rest colors as peak, so they only take part in restoration.
    pub fn build(config: &CueConfig, rest: &RestState) -> Self {
        let mut targets = vec![
            PropertyTarget::Offset3 {
                key: PropertyKey::LocalPosition,
                original: rest.local_position,
                desired: rest.local_position + config.position.offset,
                curve: config.position.curve.clone(),
            },
            PropertyTarget::Offset3 {
                key: PropertyKey::LocalRotation,
                original: rest.local_rotation,
                desired: rest.local_rotation + config.rotation.offset,
                curve: config.rotation.curve.clone(),
            },
            PropertyTarget::Offset3 {
                key: PropertyKey::LocalScale,
                original: rest.local_scale,
                desired: rest.local_scale + config.scale.offset,
                curve: config.scale.curve.clone(),
            },
        ];

        for (i, surface) in rest.surfaces.iter().enumerate() {
            let cue = config.surfaces.get(i);
            targets.push(PropertyTarget::ColorChannel {
                key: PropertyKey::BaseColor(i),
                original: surface.base_color,
                desired: cue
                    .and_then(|c| c.base_color)
                    .unwrap_or(surface.base_color),
                curve: config.color_curve.clone(),
            });
            targets.push(PropertyTarget::ColorChannel {
                key: PropertyKey::EmissionColor(i),
                original: surface.emission_color,
                desired: cue
                    .and_then(|c| c.emission_color)
                    .unwrap_or(surface.emission_color),
                curve: config.emission_curve.clone(),
            });
        }

        if config.surfaces.len() > rest.surfaces.len() {
            tracing::warn!(
                "Cue config lists {} surfaces but the object has {}; extra entries ignored",
                config.surfaces.len(),
                rest.surfaces.len()
            );
        }

        Self { targets }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyTarget> {
        self.targets.iter()
    }

    /// Targets with a visual delta
    pub fn active(&self) -> impl Iterator<Item = &PropertyTarget> {
        self.targets.iter().filter(|t| t.is_active())
    }

    pub fn get(&self, key: PropertyKey) -> Option<&PropertyTarget> {
        self.targets.iter().find(|t| t.key() == key)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Force every tracked property to its exact rest value
    pub fn restore<T: PropertyAccess + ?Sized>(&self, object: &mut T) {
        for target in &self.targets {
            object.write(target.key(), target.original());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SurfaceCue, TransformCue};
    use crate::scene::{SceneObject, Surface};

    fn object() -> SceneObject {
        SceneObject::new()
            .with_position(Vec3::new(1.0, 2.0, 3.0))
            .with_surface(Surface::new(Color::GRAY, Color::BLACK))
            .with_surface(Surface::new(Color::WHITE, Color::BLACK))
    }

    #[test]
    fn test_capture_rest_state() {
        let rest = RestState::capture(&object());
        assert_eq!(rest.local_position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(rest.local_scale, Vec3::ONE);
        assert_eq!(rest.surfaces.len(), 2);
        assert_eq!(rest.surfaces[0].base_color, Color::GRAY);
        assert_eq!(
            rest.value(PropertyKey::EmissionColor(1)),
            Some(AnimValue::Color(Color::BLACK))
        );
        assert_eq!(rest.value(PropertyKey::BaseColor(5)), None);
    }

    #[test]
    fn test_zero_delta_targets_are_inactive() {
        let config = CueConfig {
            position: TransformCue {
                offset: Vec3::new(0.0, 0.5, 0.0),
                curve: Curve::default(),
            },
            surfaces: vec![SurfaceCue {
                base_color: None,
                emission_color: Some(Color::YELLOW),
            }],
            ..CueConfig::default()
        };
        let rest = RestState::capture(&object());
        let targets = PropertyTargetSet::build(&config, &rest);

        // 3 transform channels + 2 channels per surface
        assert_eq!(targets.len(), 7);

        let active: Vec<PropertyKey> = targets.active().map(|t| t.key()).collect();
        assert_eq!(
            active,
            vec![PropertyKey::LocalPosition, PropertyKey::EmissionColor(0)]
        );

        let position = targets.get(PropertyKey::LocalPosition).unwrap();
        assert_eq!(
            position.desired(),
            AnimValue::Vec3(Vec3::new(1.0, 2.5, 3.0))
        );
    }

    #[test]
    fn test_desired_equal_to_rest_is_inactive() {
        let config = CueConfig {
            surfaces: vec![SurfaceCue {
                base_color: Some(Color::GRAY),
                emission_color: None,
            }],
            ..CueConfig::default()
        };
        let rest = RestState::capture(&object());
        let targets = PropertyTargetSet::build(&config, &rest);
        assert_eq!(targets.active().count(), 0);
    }

    #[test]
    fn test_restore_writes_exact_rest_values() {
        let rest = RestState::capture(&object());
        let targets = PropertyTargetSet::build(&CueConfig::default(), &rest);

        let mut moved = object();
        moved.local_position = Vec3::new(1.1, 2.2, 3.3);
        moved.surfaces[1].emission_color = Color::rgb(0.3, 0.3, 0.3);

        targets.restore(&mut moved);
        assert_eq!(moved, object());
    }
}
