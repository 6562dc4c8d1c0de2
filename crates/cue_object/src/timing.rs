//! Cue timing arithmetic
//!
//! Cues count loops as round trips (rest to peak and back), while the tween
//! engine counts one-way legs. These helpers convert between the two and size
//! the return to rest after an interruption.

use crate::config::CueConfig;

/// Loop timing for one cue
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CueTiming {
    /// Seconds for a full round trip
    pub loop_duration: f32,
    /// Round trips: `-1` forever, `0` none
    pub loop_count: i32,
}

impl CueTiming {
    pub fn new(loop_duration: f32, loop_count: i32) -> Self {
        Self {
            loop_duration,
            loop_count,
        }
    }

    pub fn from_config(config: &CueConfig) -> Self {
        Self::new(config.loop_duration, config.loop_count)
    }

    /// Seconds for one leg
    pub fn half_loop_duration(&self) -> f32 {
        self.loop_duration / 2.0
    }

    /// Repeat count handed to the tween engine, in one-way legs
    ///
    /// `-1` and `0` pass through unchanged.
    pub fn engine_loop_count(&self) -> i32 {
        if self.loop_count >= 1 {
            self.loop_count.saturating_mul(2)
        } else {
            self.loop_count
        }
    }

    pub fn is_infinite(&self) -> bool {
        self.loop_count < 0
    }

    /// Seconds needed to return to rest from the current leg
    pub fn remaining_return_duration(&self, completed_legs: u32, elapsed_in_leg: f32) -> f32 {
        remaining_return_duration(completed_legs, elapsed_in_leg, self.half_loop_duration())
    }
}

/// Seconds needed to return to rest from the leg in flight
///
/// After an odd number of completed legs the object is travelling peak to
/// rest and only the rest of that leg remains. After an even number it is
/// travelling rest to peak, and returning takes as long as it has been out.
pub fn remaining_return_duration(
    completed_legs: u32,
    elapsed_in_leg: f32,
    half_loop_duration: f32,
) -> f32 {
    let remaining = if completed_legs % 2 != 0 {
        half_loop_duration - elapsed_in_leg
    } else {
        elapsed_in_leg
    };
    remaining.max(0.0)
}
