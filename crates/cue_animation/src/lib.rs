//! Cue Animation System
//!
//! Easing curves and sequenced tweens for scene-object properties.
//!
//! # Features
//!
//! - **Easing**: named easing functions
//! - **Curves**: authored keyframe curves mapping normalized time to progress
//! - **Properties**: a closed set of transform and surface-color channels
//! - **TweenEngine**: the sequencing contract consumed by cue drivers
//! - **Sequencer**: a frame-stepped reference engine with yoyo loops and
//!   replace/append hook lists

pub mod curve;
pub mod easing;
pub mod engine;
pub mod property;
pub mod sequencer;

pub use curve::{Curve, CurveKey};
pub use easing::Easing;
pub use engine::{Advance, Fired, LoopType, SequenceId, Tween, TweenEngine};
pub use property::{AnimValue, PropertyAccess, PropertyKey};
pub use sequencer::Sequencer;
