//! Cue run state
//!
//! One explicit state plus the sequence handles that belong to it. Every
//! transition kills whatever the previous state was driving, so at most one
//! sequence ever animates the tracked properties.

use cue_animation::{SequenceId, TweenEngine};
use std::fmt;
use tracing::debug;

/// Phase of an object cue
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CueState {
    /// At rest, nothing playing
    #[default]
    Idle,
    /// Looping between rest and peak
    Cueing,
    /// Easing back to rest after a stop
    ReturnTransition,
    /// Easing back toward rest before a restarted cue
    GracefulTransition,
}

impl fmt::Display for CueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CueState::Idle => "idle",
            CueState::Cueing => "cueing",
            CueState::ReturnTransition => "return",
            CueState::GracefulTransition => "graceful",
        };
        f.write_str(name)
    }
}

/// Hooks a cue registers with its tween engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CueHook {
    /// Play the cue clip
    CueSound,
    /// Silence the step clip before the final leg
    FinalLegCheck,
    /// Every loop played out
    LoopsExhausted,
    /// Graceful transition finished, start a fresh loop
    GracefulComplete,
    /// Play the stop clip
    StopSound,
    /// Force every property to its exact rest value
    RestoreRest,
    /// Return finished
    NotifyStopped,
}

/// Lifecycle notifications delivered to listeners
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CueNotification {
    Started,
    Stopped,
}

/// Transient state of one activation
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CueRunState {
    state: CueState,
    cue: Option<SequenceId>,
    ret: Option<SequenceId>,
    graceful: Option<SequenceId>,
    /// Seconds computed for the last return under
    /// [`ReturnPolicy::UseRemainingCueTime`](crate::ReturnPolicy)
    remaining: f32,
}

impl CueRunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CueState {
        self.state
    }

    pub fn cue_sequence(&self) -> Option<SequenceId> {
        self.cue
    }

    pub fn return_sequence(&self) -> Option<SequenceId> {
        self.ret
    }

    pub fn graceful_sequence(&self) -> Option<SequenceId> {
        self.graceful
    }

    pub fn remaining_return_duration(&self) -> f32 {
        self.remaining
    }

    /// True if `seq` is the sequence driving the current state
    pub fn owns(&self, seq: SequenceId) -> bool {
        [self.cue, self.ret, self.graceful].contains(&Some(seq))
    }

    pub fn enter_cueing<E>(&mut self, engine: &mut E, seq: SequenceId)
    where
        E: TweenEngine<CueHook> + ?Sized,
    {
        self.kill_all(engine);
        self.cue = Some(seq);
        self.remaining = 0.0;
        self.transition(CueState::Cueing);
    }

    pub fn enter_return<E>(&mut self, engine: &mut E, seq: SequenceId, remaining: f32)
    where
        E: TweenEngine<CueHook> + ?Sized,
    {
        self.kill_all(engine);
        self.ret = Some(seq);
        self.remaining = remaining;
        self.transition(CueState::ReturnTransition);
    }

    pub fn enter_graceful<E>(&mut self, engine: &mut E, seq: SequenceId)
    where
        E: TweenEngine<CueHook> + ?Sized,
    {
        self.kill_all(engine);
        self.graceful = Some(seq);
        self.transition(CueState::GracefulTransition);
    }

    /// Kill every live sequence without firing its hooks
    pub fn enter_idle<E>(&mut self, engine: &mut E)
    where
        E: TweenEngine<CueHook> + ?Sized,
    {
        self.kill_all(engine);
        self.transition(CueState::Idle);
    }

    fn kill_all<E>(&mut self, engine: &mut E)
    where
        E: TweenEngine<CueHook> + ?Sized,
    {
        for seq in [self.cue.take(), self.ret.take(), self.graceful.take()]
            .into_iter()
            .flatten()
        {
            engine.kill(seq);
        }
    }

    fn transition(&mut self, next: CueState) {
        if self.state != next {
            debug!("Cue state: {} -> {}", self.state, next);
        }
        self.state = next;
    }
}
