//! Cue Core Types
//!
//! Foundational value types shared by the cue crates:
//!
//! - **Vec3**: local position, euler rotation (degrees) and scale
//! - **Color**: linear RGBA surface colors, including HDR emission
//! - **Interpolate**: linear interpolation for every animatable value

pub mod color;
pub mod math;
pub mod values;

pub use color::Color;
pub use math::Vec3;
pub use values::Interpolate;
