//! Audio cue scheduling
//!
//! The cue clip marks every leg of the loop, either when the leg completes or
//! halfway through it. The stop clip plays once the object is back at rest.
//! Audio never blocks the visual cue: missing clips and playback failures are
//! logged and skipped.

use crate::config::AudioConfig;
use crate::error::AudioError;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;

/// Fire-and-forget clip playback provided by the host
pub trait AudioOutput {
    /// Play a clip on the earliest available channel
    fn play(&mut self, clip: &str) -> Result<(), AudioError>;
}

/// When the cue and stop clips play
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioCues {
    pub cue_clip: Option<String>,
    pub stop_clip: Option<String>,
    pub play_halfway: bool,
}

impl AudioCues {
    pub fn from_config(config: &AudioConfig) -> Self {
        Self {
            cue_clip: config.cue_clip.clone(),
            stop_clip: config.stop_clip.clone(),
            play_halfway: config.play_halfway,
        }
    }

    /// Step mode also marks the very first leg when the cue starts
    pub fn plays_on_start(&self) -> bool {
        !self.play_halfway
    }

    /// Offset of the mid-leg callback, in halfway mode
    pub fn halfway_offset(&self, half_loop_duration: f32) -> Option<f32> {
        self.play_halfway.then_some(half_loop_duration / 2.0)
    }

    /// True once `completed_legs` legs leave only the final one to play
    ///
    /// Infinite cues have no final leg.
    pub fn is_final_leg(completed_legs: u32, engine_loop_count: i32) -> bool {
        engine_loop_count >= 1 && completed_legs as i64 == engine_loop_count as i64 - 1
    }

    pub fn play_cue(&self, output: Option<&mut dyn AudioOutput>) {
        play(self.cue_clip.as_deref(), output);
    }

    pub fn play_stop(&self, output: Option<&mut dyn AudioOutput>) {
        play(self.stop_clip.as_deref(), output);
    }
}

fn play(clip: Option<&str>, output: Option<&mut dyn AudioOutput>) {
    let Some(clip) = clip else {
        return;
    };
    let Some(output) = output else {
        warn!("No audio output available, skipping clip '{}'", clip);
        return;
    };
    if let Err(e) = output.play(clip) {
        warn!("Skipping clip '{}': {}", clip, e);
    }
}

/// An [`AudioOutput`] that records played clips
///
/// Clones share the same log. Used by the headless simulator and tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingOutput {
    played: Rc<RefCell<Vec<String>>>,
    /// When set, clips outside this list fail with [`AudioError::ClipNotFound`]
    known: Option<Vec<String>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept the given clips
    pub fn with_clips<I, S>(clips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            played: Rc::default(),
            known: Some(clips.into_iter().map(Into::into).collect()),
        }
    }

    /// Clips played so far, oldest first
    pub fn played(&self) -> Vec<String> {
        self.played.borrow().clone()
    }
}

impl AudioOutput for RecordingOutput {
    fn play(&mut self, clip: &str) -> Result<(), AudioError> {
        if let Some(known) = &self.known {
            if !known.iter().any(|k| k == clip) {
                return Err(AudioError::ClipNotFound(clip.to_string()));
            }
        }
        tracing::debug!("Playing clip '{}'", clip);
        self.played.borrow_mut().push(clip.to_string());
        Ok(())
    }
}
