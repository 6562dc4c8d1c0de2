//! Tween engine contract
//!
//! A tween engine groups property tweens into sequences that share a
//! zero-based timeline, repeats them, and reports hooks back to its driver.
//!
//! Hooks are plain values of the driver's choosing (`H`). Instead of invoking
//! closures, [`TweenEngine::advance`] returns the hooks that fired, in
//! registration order, and stops advancing at the first hook boundary so the
//! driver can react (replace hooks, kill sequences, build new ones) before any
//! further time elapses.

use crate::curve::Curve;
use crate::property::{AnimValue, PropertyAccess, PropertyKey};
use slotmap::new_key_type;

new_key_type! {
    /// Handle to a sequence registered with a tween engine
    pub struct SequenceId;
}

/// How a sequence repeats
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopType {
    /// Every repetition plays forward
    #[default]
    Restart,
    /// Repetitions alternate forward and backward
    Yoyo,
}

/// A single property tween inside a sequence
///
/// The start value is captured from the target the first time the tween is
/// evaluated, so a tween always departs from the property's in-flight value.
#[derive(Clone, Debug, PartialEq)]
pub struct Tween {
    pub key: PropertyKey,
    pub to: AnimValue,
    /// Duration in seconds
    pub duration: f32,
    pub curve: Curve,
}

impl Tween {
    pub fn new(key: PropertyKey, to: impl Into<AnimValue>, duration: f32, curve: Curve) -> Self {
        Self {
            key,
            to: to.into(),
            duration,
            curve,
        }
    }
}

/// A hook fired by a sequence
#[derive(Clone, Debug, PartialEq)]
pub struct Fired<H> {
    pub sequence: SequenceId,
    pub hook: H,
}

/// Result of one [`TweenEngine::advance`] call
#[derive(Clone, Debug, PartialEq)]
pub struct Advance<H> {
    /// Seconds actually advanced (less than requested when hooks fired)
    pub elapsed: f32,
    /// Hooks fired at the end of the advanced interval, in registration order
    pub fired: Vec<Fired<H>>,
}

impl<H> Advance<H> {
    pub fn idle(elapsed: f32) -> Self {
        Self {
            elapsed,
            fired: Vec::new(),
        }
    }
}

/// Sequenced tween engine
///
/// Operations on killed or unknown sequences are ignored.
pub trait TweenEngine<H: Clone> {
    /// Create an empty sequence; it starts playing on the next advance
    fn create_sequence(&mut self) -> SequenceId;

    /// Insert a tween starting `at` seconds into the sequence
    fn insert(&mut self, seq: SequenceId, at: f32, tween: Tween);

    /// Extend the sequence with an empty interval ending at `at + duration`
    fn insert_interval(&mut self, seq: SequenceId, at: f32, duration: f32);

    /// Insert a hook fired whenever playback crosses `at`
    fn insert_callback(&mut self, seq: SequenceId, at: f32, hook: H);

    /// Repeat count in one-way legs; `-1` repeats forever, `0` completes
    /// without playing
    fn set_loops(&mut self, seq: SequenceId, loops: i32, loop_type: LoopType);

    /// Replace the hooks fired after every completed leg
    fn set_step_hooks(&mut self, seq: SequenceId, hooks: Vec<H>);

    /// Append a hook fired after every completed leg
    fn add_step_hook(&mut self, seq: SequenceId, hook: H);

    /// Replace the hooks fired once all loops complete
    fn set_complete_hooks(&mut self, seq: SequenceId, hooks: Vec<H>);

    /// Append a hook fired once all loops complete
    fn add_complete_hook(&mut self, seq: SequenceId, hook: H);

    /// True while the sequence exists and has not completed
    fn is_active(&self, seq: SequenceId) -> bool;

    /// Number of legs completed so far
    fn completed_loops(&self, seq: SequenceId) -> u32;

    /// Elapsed seconds within the current leg
    fn position(&self, seq: SequenceId) -> f32;

    /// Remove the sequence; no further hooks fire for it
    ///
    /// Properties keep their last evaluated values. Returns false if the
    /// sequence was already gone.
    fn kill(&mut self, seq: SequenceId) -> bool;

    /// Advance all playing sequences by up to `dt` seconds, writing evaluated
    /// property values to `target`
    fn advance(&mut self, dt: f32, target: &mut dyn PropertyAccess) -> Advance<H>;
}
