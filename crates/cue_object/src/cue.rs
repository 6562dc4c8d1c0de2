//! Object cue state machine
//!
//! [`ObjectCue`] loops a scene object between its rest state and the peak of
//! the cue, and guarantees the object lands exactly back at rest whenever the
//! cue stops.
//!
//! # Lifecycle
//!
//! ```text
//! Idle --start--> Cueing --stop / loops exhausted--> ReturnTransition --> Idle
//!                   ^                                      |
//!                   +------ GracefulTransition <--start----+
//! ```
//!
//! The host drives everything through [`ObjectCue::update`]. Requests that
//! make no sense in the current state are logged and ignored.

use crate::audio::{AudioCues, AudioOutput};
use crate::config::{CueConfig, ReturnPolicy};
use crate::error::Result;
use crate::state::{CueHook, CueNotification, CueRunState, CueState};
use crate::targets::{CueObject, PropertyTargetSet, RestState};
use crate::timing::CueTiming;
use cue_animation::{Fired, LoopType, PropertyAccess, PropertyKey, Tween, TweenEngine};
use tracing::{debug, info, warn};

/// Consecutive dispatch rounds allowed to fire hooks without advancing time
const MAX_STALLED_ROUNDS: usize = 1024;

type Listener = Box<dyn FnMut(CueNotification)>;

/// A cue bound to one scene object and one tween engine
pub struct ObjectCue<E, T> {
    config: CueConfig,
    timing: CueTiming,
    audio_cues: AudioCues,
    rest: RestState,
    targets: PropertyTargetSet,

    engine: E,
    object: T,
    audio: Option<Box<dyn AudioOutput>>,

    run: CueRunState,
    enabled: bool,
    prevent_starting: bool,
    /// Seconds left before an automatic start
    auto_start_in: Option<f32>,
    listeners: Vec<Listener>,
}

impl<E, T> ObjectCue<E, T>
where
    E: TweenEngine<CueHook>,
    T: CueObject,
{
    /// Validate `config`, prepare the object's surfaces and capture its rest
    /// state
    ///
    /// The cue starts disabled; call [`enable`](Self::enable) once the host
    /// is ready to drive it.
    pub fn new(config: CueConfig, engine: E, mut object: T) -> Result<Self> {
        config.validate()?;

        let surface_count = object.surface_count();
        if let Some(emission) = config.base_emission {
            for i in 0..surface_count {
                object.write(PropertyKey::EmissionColor(i), emission.into());
            }
        }
        if config.animates_emission() {
            for i in 0..surface_count {
                object.enable_emission(i);
            }
        }

        let rest = RestState::capture(&object);
        let targets = PropertyTargetSet::build(&config, &rest);
        debug!(
            "Cue ready: {} tracked properties, {} active",
            targets.len(),
            targets.active().count()
        );

        Ok(Self {
            timing: CueTiming::from_config(&config),
            audio_cues: AudioCues::from_config(&config.audio),
            config,
            rest,
            targets,
            engine,
            object,
            audio: None,
            run: CueRunState::new(),
            enabled: false,
            prevent_starting: false,
            auto_start_in: None,
            listeners: Vec::new(),
        })
    }

    /// Attach the audio output used for cue and stop clips
    pub fn with_audio(mut self, output: impl AudioOutput + 'static) -> Self {
        self.set_audio(output);
        self
    }

    pub fn set_audio(&mut self, output: impl AudioOutput + 'static) {
        self.audio = Some(Box::new(output));
    }

    /// Register a lifecycle listener; listeners are called in registration
    /// order
    pub fn on_notification(&mut self, listener: impl FnMut(CueNotification) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Make the cue runnable, arming the auto-start countdown if configured
    pub fn enable(&mut self) {
        self.enabled = true;
        if self.config.auto_start {
            debug!("Cue auto-start in {:.3}s", self.config.start_delay);
            self.auto_start_in = Some(self.config.start_delay);
        }
    }

    /// Tear down and stop accepting requests
    pub fn disable(&mut self) {
        self.teardown();
        self.enabled = false;
    }

    /// Cancel every live sequence and the auto-start countdown
    ///
    /// No hooks fire and no notification is sent; properties keep their last
    /// evaluated values.
    pub fn teardown(&mut self) {
        self.auto_start_in = None;
        if self.run.state() != CueState::Idle {
            debug!("Cue teardown while {}", self.run.state());
        }
        self.run.enter_idle(&mut self.engine);
    }

    /// Start the cue, or hand off gracefully if it is returning to rest
    pub fn start(&mut self) {
        if !self.enabled {
            debug!("Cue start ignored: cue is disabled");
            return;
        }
        match self.run.state() {
            CueState::Cueing => {
                debug!("Cue start ignored: already cueing");
                return;
            }
            CueState::GracefulTransition => {
                debug!("Cue start ignored: restart already pending");
                return;
            }
            CueState::Idle | CueState::ReturnTransition => {}
        }

        info!("Cue started");
        self.notify(CueNotification::Started);

        if self.run.state() == CueState::ReturnTransition {
            self.start_graceful_transition();
        } else {
            if self.audio_cues.plays_on_start() {
                self.audio_cues.play_cue(output(&mut self.audio));
            }
            self.create_cue_loop();
        }
    }

    /// Return to rest from the loop in flight
    pub fn stop(&mut self) {
        if !self.enabled {
            debug!("Cue stop ignored: cue is disabled");
            return;
        }
        let cue = match (self.run.state(), self.run.cue_sequence()) {
            (CueState::Cueing, Some(cue)) => cue,
            (CueState::ReturnTransition, _) => {
                debug!("Cue stop ignored: already returning");
                return;
            }
            (state, _) => {
                debug!("Cue stop ignored: nothing is cueing ({})", state);
                return;
            }
        };

        let remaining = self.timing.remaining_return_duration(
            self.engine.completed_loops(cue),
            self.engine.position(cue),
        );
        let duration = match self.config.return_policy {
            ReturnPolicy::UseRemainingCueTime => remaining,
            ReturnPolicy::UseFixedDuration => self.config.return_duration,
        };
        info!("Cue stopping, returning to rest over {:.3}s", duration);

        let seq = self.engine.create_sequence();
        self.engine.insert_interval(seq, 0.0, duration);
        for target in self.targets.active() {
            self.engine.insert(
                seq,
                0.0,
                Tween::new(
                    target.key(),
                    target.original(),
                    duration,
                    self.config.return_curve.clone(),
                ),
            );
        }
        self.engine.add_complete_hook(seq, CueHook::StopSound);
        self.engine.add_complete_hook(seq, CueHook::RestoreRest);
        self.engine.add_complete_hook(seq, CueHook::NotifyStopped);
        self.run.enter_return(&mut self.engine, seq, remaining);
    }

    /// `true` starts, `false` stops
    pub fn toggle(&mut self, on: bool) {
        if on {
            self.start();
        } else {
            self.stop();
        }
    }

    /// Block new loops from being built; stopping is unaffected
    pub fn set_prevent_starting(&mut self, prevent: bool) {
        self.prevent_starting = prevent;
    }

    /// Advance the cue by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if let Some(countdown) = self.auto_start_in.as_mut() {
            *countdown -= dt;
            if *countdown <= 0.0 {
                self.auto_start_in = None;
                self.start();
            }
        }

        let mut left = dt;
        let mut stalled = 0;
        loop {
            let advance = self.engine.advance(left, &mut self.object);
            let progressed = advance.elapsed > 0.0;
            left = (left - advance.elapsed).max(0.0);

            if advance.fired.is_empty() {
                if left <= 0.0 || !progressed {
                    return;
                }
                continue;
            }

            if progressed {
                stalled = 0;
            } else {
                stalled += 1;
                if stalled > MAX_STALLED_ROUNDS {
                    warn!(
                        "Cue update stalled for {} rounds, dropping {:.3}s",
                        MAX_STALLED_ROUNDS, left
                    );
                    return;
                }
            }

            for fired in advance.fired {
                self.dispatch(fired);
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn state(&self) -> CueState {
        self.run.state()
    }

    /// True while the cue loop itself is running
    ///
    /// Returns and graceful hand-offs are not the cue; a host that starts
    /// whenever this is false gets the graceful hand-off during a return.
    pub fn is_cue_active(&self) -> bool {
        self.run.state() == CueState::Cueing
    }

    /// True while any sequence is driving the object
    pub fn is_animating(&self) -> bool {
        self.run.state() != CueState::Idle
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_prevent_starting(&self) -> bool {
        self.prevent_starting
    }

    pub fn config(&self) -> &CueConfig {
        &self.config
    }

    pub fn timing(&self) -> CueTiming {
        self.timing
    }

    pub fn rest_state(&self) -> &RestState {
        &self.rest
    }

    pub fn targets(&self) -> &PropertyTargetSet {
        &self.targets
    }

    pub fn run_state(&self) -> &CueRunState {
        &self.run
    }

    /// Seconds computed for the most recent return from the loop in flight
    pub fn remaining_return_duration(&self) -> f32 {
        self.run.remaining_return_duration()
    }

    pub fn object(&self) -> &T {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut T {
        &mut self.object
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    // =========================================================================
    // Sequence construction
    // =========================================================================

    fn create_cue_loop(&mut self) {
        if self.prevent_starting {
            debug!("Cue loop not created: starting is prevented");
            self.targets.restore(&mut self.object);
            self.run.enter_idle(&mut self.engine);
            return;
        }

        let half = self.timing.half_loop_duration();
        let seq = self.engine.create_sequence();
        self.engine.insert_interval(seq, 0.0, half);
        for target in self.targets.active() {
            self.engine.insert(
                seq,
                0.0,
                Tween::new(target.key(), target.desired(), half, target.curve().clone()),
            );
        }

        match self.audio_cues.halfway_offset(half) {
            Some(at) => self.engine.insert_callback(seq, at, CueHook::CueSound),
            None => self.engine.set_step_hooks(seq, vec![CueHook::CueSound]),
        }
        self.engine
            .set_loops(seq, self.timing.engine_loop_count(), LoopType::Yoyo);
        self.engine.add_step_hook(seq, CueHook::FinalLegCheck);
        self.engine.add_complete_hook(seq, CueHook::LoopsExhausted);

        self.run.enter_cueing(&mut self.engine, seq);
    }

    fn start_graceful_transition(&mut self) {
        let duration = self.config.graceful_duration;
        let seq = self.engine.create_sequence();
        self.engine.insert_interval(seq, 0.0, duration);
        for target in self.targets.active() {
            self.engine.insert(
                seq,
                0.0,
                Tween::new(
                    target.key(),
                    target.original(),
                    duration,
                    self.config.return_curve.clone(),
                ),
            );
        }
        self.engine.add_complete_hook(seq, CueHook::GracefulComplete);
        self.run.enter_graceful(&mut self.engine, seq);
    }

    fn dispatch(&mut self, fired: Fired<CueHook>) {
        if !self.run.owns(fired.sequence) {
            debug!("Dropping {:?} from a retired sequence", fired.hook);
            return;
        }

        match fired.hook {
            CueHook::CueSound => self.audio_cues.play_cue(output(&mut self.audio)),
            CueHook::FinalLegCheck => {
                let completed = self.engine.completed_loops(fired.sequence);
                if AudioCues::is_final_leg(completed, self.timing.engine_loop_count()) {
                    debug!("Final leg, silencing step cue");
                    self.engine.set_step_hooks(fired.sequence, Vec::new());
                }
            }
            CueHook::LoopsExhausted => {
                debug!("Cue loops exhausted");
                self.stop();
            }
            CueHook::GracefulComplete => self.create_cue_loop(),
            CueHook::StopSound => self.audio_cues.play_stop(output(&mut self.audio)),
            CueHook::RestoreRest => self.targets.restore(&mut self.object),
            CueHook::NotifyStopped => {
                self.run.enter_idle(&mut self.engine);
                info!("Cue stopped");
                self.notify(CueNotification::Stopped);
            }
        }
    }

    fn notify(&mut self, notification: CueNotification) {
        for listener in &mut self.listeners {
            listener(notification);
        }
    }
}

/// Reborrow the attached output with a lifetime tied to `audio`
fn output(audio: &mut Option<Box<dyn AudioOutput>>) -> Option<&mut dyn AudioOutput> {
    audio.as_deref_mut().map(|o| o as &mut dyn AudioOutput)
}
