//! Frame-stepped sequence engine
//!
//! The reference [`TweenEngine`]: sequences live in a slotmap arena and are
//! stepped by the host each frame through [`Sequencer::advance`].
//!
//! Each repetition of a sequence is one leg. With [`LoopType::Yoyo`] odd legs
//! play backward, so leg `k` evaluates its tweens at `duration - position`.
//! Time only advances up to the next hook boundary (a timed callback or the
//! end of a leg); the fired hooks are handed back to the driver before any
//! more time passes.

use crate::engine::{Advance, Fired, LoopType, SequenceId, Tween, TweenEngine};
use crate::property::{AnimValue, PropertyAccess};
use slotmap::SlotMap;
use smallvec::SmallVec;

/// Upper bound on hook-free boundaries crossed in a single advance
///
/// Only reachable by zero-length sequences that repeat forever.
const MAX_BOUNDARIES_PER_ADVANCE: usize = 4096;

type HookList<H> = SmallVec<[H; 4]>;

#[derive(Clone, Debug)]
struct TrackedTween {
    at: f32,
    tween: Tween,
    /// Captured on first evaluation
    from: Option<AnimValue>,
}

#[derive(Clone, Debug)]
struct Sequence<H> {
    tweens: Vec<TrackedTween>,
    callbacks: Vec<(f32, H)>,
    /// End of the latest empty interval
    span: f32,
    loops: i32,
    loop_type: LoopType,
    step_hooks: HookList<H>,
    complete_hooks: HookList<H>,
    /// Elapsed seconds within the current leg
    position: f32,
    completed_loops: u32,
    /// Callbacks still due in the current leg as (leg-local time, index),
    /// latest first so the next one is at the end
    due_callbacks: Vec<(f32, usize)>,
    leg_started: bool,
    complete: bool,
}

impl<H: Clone> Sequence<H> {
    fn new() -> Self {
        Self {
            tweens: Vec::new(),
            callbacks: Vec::new(),
            span: 0.0,
            loops: 1,
            loop_type: LoopType::Restart,
            step_hooks: SmallVec::new(),
            complete_hooks: SmallVec::new(),
            position: 0.0,
            completed_loops: 0,
            due_callbacks: Vec::new(),
            leg_started: false,
            complete: false,
        }
    }

    /// Length of one leg
    fn duration(&self) -> f32 {
        let tween_ends = self
            .tweens
            .iter()
            .map(|t| t.at + t.tween.duration.max(0.0));
        let callback_times = self.callbacks.iter().map(|(at, _)| *at);
        tween_ends
            .chain(callback_times)
            .fold(self.span, f32::max)
    }

    fn is_backward(&self) -> bool {
        self.loop_type == LoopType::Yoyo && self.completed_loops % 2 == 1
    }

    fn begin_leg(&mut self) {
        let duration = self.duration();
        let backward = self.is_backward();

        let mut due: Vec<(f32, usize)> = self
            .callbacks
            .iter()
            .enumerate()
            .map(|(index, (at, _))| {
                let at = at.clamp(0.0, duration);
                let local = if backward { duration - at } else { at };
                (local, index)
            })
            .collect();
        due.sort_by(|a, b| b.0.total_cmp(&a.0).then(b.1.cmp(&a.1)));

        self.due_callbacks = due;
        self.position = 0.0;
        self.leg_started = true;
    }

    /// Leg-local time of the next hook boundary
    fn next_boundary(&self) -> f32 {
        let end = self.duration();
        match self.due_callbacks.last() {
            Some((at, _)) => at.min(end),
            None => end,
        }
    }

    /// Seconds until the next hook boundary
    fn time_to_boundary(&self) -> f32 {
        if self.loops == 0 || !self.leg_started {
            return 0.0;
        }
        (self.next_boundary() - self.position).max(0.0)
    }

    /// Evaluate every tween at the current position and write the results
    fn apply(&mut self, target: &mut dyn PropertyAccess) {
        let time = if self.is_backward() {
            self.duration() - self.position
        } else {
            self.position
        };

        for tracked in &mut self.tweens {
            let from = match tracked.from {
                Some(value) => value,
                None => match target.read(tracked.tween.key) {
                    Some(value) => {
                        tracked.from = Some(value);
                        value
                    }
                    None => continue,
                },
            };

            let local = if tracked.tween.duration <= 0.0 {
                if time >= tracked.at {
                    1.0
                } else {
                    0.0
                }
            } else {
                ((time - tracked.at) / tracked.tween.duration).clamp(0.0, 1.0)
            };

            let eased = tracked.tween.curve.evaluate(local);
            target.write(tracked.tween.key, from.lerp(&tracked.tween.to, eased));
        }
    }

    /// Advance by `dt`, which must not exceed [`Self::time_to_boundary`]
    /// except to land exactly on the boundary
    fn step(&mut self, dt: f32, target: &mut dyn PropertyAccess) -> HookList<H> {
        let mut fired = HookList::new();

        if self.loops == 0 {
            self.complete = true;
            self.position = 0.0;
            fired.extend(self.complete_hooks.iter().cloned());
            return fired;
        }

        if !self.leg_started {
            self.begin_leg();
        }

        let duration = self.duration();
        let boundary = self.next_boundary();
        self.position = if self.position + dt >= boundary {
            boundary
        } else {
            self.position + dt
        };

        while let Some(&(at, index)) = self.due_callbacks.last() {
            if at > self.position {
                break;
            }
            self.due_callbacks.pop();
            fired.push(self.callbacks[index].1.clone());
        }

        self.apply(target);

        if self.position >= duration {
            self.completed_loops += 1;
            fired.extend(self.step_hooks.iter().cloned());

            if self.loops > 0 && self.completed_loops >= self.loops as u32 {
                self.complete = true;
                self.position = 0.0;
                fired.extend(self.complete_hooks.iter().cloned());
            } else {
                self.begin_leg();
            }
        }

        fired
    }
}

/// Reference tween engine
///
/// Sequences are stepped in the order they were created.
pub struct Sequencer<H> {
    sequences: SlotMap<SequenceId, Sequence<H>>,
    order: Vec<SequenceId>,
}

impl<H: Clone> Sequencer<H> {
    pub fn new() -> Self {
        Self {
            sequences: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    /// Number of registered sequences, completed ones included
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Length of one leg of a sequence
    pub fn duration(&self, seq: SequenceId) -> Option<f32> {
        self.sequences.get(seq).map(|s| s.duration())
    }
}

impl<H: Clone> Default for Sequencer<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Clone> TweenEngine<H> for Sequencer<H> {
    fn create_sequence(&mut self) -> SequenceId {
        let id = self.sequences.insert(Sequence::new());
        self.order.push(id);
        id
    }

    fn insert(&mut self, seq: SequenceId, at: f32, tween: Tween) {
        if let Some(sequence) = self.sequences.get_mut(seq) {
            sequence.tweens.push(TrackedTween {
                at: at.max(0.0),
                tween,
                from: None,
            });
        }
    }

    fn insert_interval(&mut self, seq: SequenceId, at: f32, duration: f32) {
        if let Some(sequence) = self.sequences.get_mut(seq) {
            let end = at.max(0.0) + duration.max(0.0);
            sequence.span = sequence.span.max(end);
        }
    }

    fn insert_callback(&mut self, seq: SequenceId, at: f32, hook: H) {
        if let Some(sequence) = self.sequences.get_mut(seq) {
            sequence.callbacks.push((at.max(0.0), hook));
        }
    }

    fn set_loops(&mut self, seq: SequenceId, loops: i32, loop_type: LoopType) {
        if let Some(sequence) = self.sequences.get_mut(seq) {
            sequence.loops = loops.max(-1);
            sequence.loop_type = loop_type;
        }
    }

    fn set_step_hooks(&mut self, seq: SequenceId, hooks: Vec<H>) {
        if let Some(sequence) = self.sequences.get_mut(seq) {
            sequence.step_hooks = hooks.into_iter().collect();
        }
    }

    fn add_step_hook(&mut self, seq: SequenceId, hook: H) {
        if let Some(sequence) = self.sequences.get_mut(seq) {
            sequence.step_hooks.push(hook);
        }
    }

    fn set_complete_hooks(&mut self, seq: SequenceId, hooks: Vec<H>) {
        if let Some(sequence) = self.sequences.get_mut(seq) {
            sequence.complete_hooks = hooks.into_iter().collect();
        }
    }

    fn add_complete_hook(&mut self, seq: SequenceId, hook: H) {
        if let Some(sequence) = self.sequences.get_mut(seq) {
            sequence.complete_hooks.push(hook);
        }
    }

    fn is_active(&self, seq: SequenceId) -> bool {
        self.sequences
            .get(seq)
            .map(|s| !s.complete)
            .unwrap_or(false)
    }

    fn completed_loops(&self, seq: SequenceId) -> u32 {
        self.sequences
            .get(seq)
            .map(|s| s.completed_loops)
            .unwrap_or(0)
    }

    fn position(&self, seq: SequenceId) -> f32 {
        self.sequences.get(seq).map(|s| s.position).unwrap_or(0.0)
    }

    fn kill(&mut self, seq: SequenceId) -> bool {
        self.order.retain(|id| *id != seq);
        self.sequences.remove(seq).is_some()
    }

    fn advance(&mut self, dt: f32, target: &mut dyn PropertyAccess) -> Advance<H> {
        let dt = dt.max(0.0);
        let mut elapsed = 0.0;
        let mut fired = Vec::new();

        for _ in 0..MAX_BOUNDARIES_PER_ADVANCE {
            let next = self
                .order
                .iter()
                .filter_map(|id| self.sequences.get(*id))
                .filter(|s| !s.complete)
                .map(|s| s.time_to_boundary())
                .fold(f32::INFINITY, f32::min);

            if next == f32::INFINITY {
                return Advance::idle(dt);
            }

            let remaining = (dt - elapsed).max(0.0);
            let step = next.min(remaining);

            for id in &self.order {
                let Some(sequence) = self.sequences.get_mut(*id) else {
                    continue;
                };
                if sequence.complete {
                    continue;
                }
                for hook in sequence.step(step, target) {
                    fired.push(Fired {
                        sequence: *id,
                        hook,
                    });
                }
            }

            elapsed += step;
            if !fired.is_empty() || elapsed >= dt {
                return Advance { elapsed, fired };
            }
        }

        tracing::warn!(
            "Sequencer: {} hook-free boundaries in one advance, yielding",
            MAX_BOUNDARIES_PER_ADVANCE
        );
        Advance { elapsed, fired }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Curve;
    use crate::property::PropertyKey;
    use cue_core::{Color, Vec3};
    use std::collections::HashMap;

    #[derive(Default)]
    struct Props(HashMap<PropertyKey, AnimValue>);

    impl Props {
        fn with(mut self, key: PropertyKey, value: impl Into<AnimValue>) -> Self {
            self.0.insert(key, value.into());
            self
        }

        fn vec3(&self, key: PropertyKey) -> Vec3 {
            self.0[&key].as_vec3().unwrap()
        }
    }

    impl PropertyAccess for Props {
        fn read(&self, key: PropertyKey) -> Option<AnimValue> {
            self.0.get(&key).copied()
        }

        fn write(&mut self, key: PropertyKey, value: AnimValue) {
            if let Some(slot) = self.0.get_mut(&key) {
                *slot = value;
            }
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Hook {
        Step,
        Done,
        Mid,
        Extra,
    }

    fn hooks(advance: &Advance<Hook>) -> Vec<Hook> {
        advance.fired.iter().map(|f| f.hook.clone()).collect()
    }

    fn move_x(seq: SequenceId, engine: &mut Sequencer<Hook>, duration: f32) {
        engine.insert(
            seq,
            0.0,
            Tween::new(
                PropertyKey::LocalPosition,
                Vec3::new(1.0, 0.0, 0.0),
                duration,
                Curve::default(),
            ),
        );
    }

    #[test]
    fn test_yoyo_legs_alternate_direction() {
        let mut engine = Sequencer::new();
        let mut props = Props::default().with(PropertyKey::LocalPosition, Vec3::ZERO);

        let seq = engine.create_sequence();
        move_x(seq, &mut engine, 1.0);
        engine.set_loops(seq, 4, LoopType::Yoyo);
        engine.add_step_hook(seq, Hook::Step);

        engine.advance(0.5, &mut props);
        assert!((props.vec3(PropertyKey::LocalPosition).x - 0.5).abs() < 1e-5);

        let step = engine.advance(0.5, &mut props);
        assert_eq!(hooks(&step), vec![Hook::Step]);
        assert_eq!(engine.completed_loops(seq), 1);
        assert_eq!(props.vec3(PropertyKey::LocalPosition).x, 1.0);

        engine.advance(0.25, &mut props);
        assert!((props.vec3(PropertyKey::LocalPosition).x - 0.75).abs() < 1e-5);
        assert!((engine.position(seq) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_advance_stops_at_hook_boundary() {
        let mut engine = Sequencer::new();
        let mut props = Props::default().with(PropertyKey::LocalPosition, Vec3::ZERO);

        let seq = engine.create_sequence();
        move_x(seq, &mut engine, 1.0);
        engine.set_loops(seq, -1, LoopType::Yoyo);
        engine.add_step_hook(seq, Hook::Step);

        let result = engine.advance(1.7, &mut props);
        assert_eq!(result.elapsed, 1.0);
        assert_eq!(hooks(&result), vec![Hook::Step]);

        let rest = engine.advance(0.7, &mut props);
        assert!(rest.fired.is_empty());
        assert!((rest.elapsed - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_replace_and_append_hooks() {
        let mut engine = Sequencer::new();
        let mut props = Props::default().with(PropertyKey::LocalPosition, Vec3::ZERO);

        let seq = engine.create_sequence();
        move_x(seq, &mut engine, 1.0);
        engine.set_loops(seq, 3, LoopType::Yoyo);
        engine.set_step_hooks(seq, vec![Hook::Step]);
        engine.add_step_hook(seq, Hook::Extra);

        let first = engine.advance(1.0, &mut props);
        assert_eq!(hooks(&first), vec![Hook::Step, Hook::Extra]);

        engine.set_step_hooks(seq, Vec::new());
        let second = engine.advance(1.0, &mut props);
        assert!(second.fired.is_empty());
        assert_eq!(engine.completed_loops(seq), 2);
    }

    #[test]
    fn test_completion_fires_step_then_complete_hooks() {
        let mut engine = Sequencer::new();
        let mut props = Props::default().with(PropertyKey::LocalPosition, Vec3::ZERO);

        let seq = engine.create_sequence();
        move_x(seq, &mut engine, 0.5);
        engine.set_loops(seq, 2, LoopType::Yoyo);
        engine.add_step_hook(seq, Hook::Step);
        engine.add_complete_hook(seq, Hook::Done);

        engine.advance(0.5, &mut props);
        let last = engine.advance(0.5, &mut props);

        assert_eq!(hooks(&last), vec![Hook::Step, Hook::Done]);
        assert!(!engine.is_active(seq));
        assert_eq!(engine.completed_loops(seq), 2);
        assert_eq!(engine.position(seq), 0.0);
        assert_eq!(props.vec3(PropertyKey::LocalPosition), Vec3::ZERO);
    }

    #[test]
    fn test_infinite_loops_never_complete() {
        let mut engine = Sequencer::new();
        let mut props = Props::default().with(PropertyKey::LocalPosition, Vec3::ZERO);

        let seq = engine.create_sequence();
        move_x(seq, &mut engine, 0.1);
        engine.set_loops(seq, -1, LoopType::Yoyo);
        engine.add_complete_hook(seq, Hook::Done);

        for _ in 0..10_000 {
            let result = engine.advance(1.0 / 60.0, &mut props);
            assert!(!result.fired.iter().any(|f| f.hook == Hook::Done));
        }
        assert!(engine.is_active(seq));
        assert!(engine.completed_loops(seq) > 1000);
    }

    #[test]
    fn test_zero_loops_complete_without_playing() {
        let mut engine = Sequencer::new();
        let mut props = Props::default().with(PropertyKey::LocalPosition, Vec3::ZERO);

        let seq = engine.create_sequence();
        move_x(seq, &mut engine, 1.0);
        engine.set_loops(seq, 0, LoopType::Yoyo);
        engine.add_complete_hook(seq, Hook::Done);

        let result = engine.advance(0.016, &mut props);
        assert_eq!(result.elapsed, 0.0);
        assert_eq!(hooks(&result), vec![Hook::Done]);
        assert_eq!(engine.completed_loops(seq), 0);
        assert_eq!(props.vec3(PropertyKey::LocalPosition), Vec3::ZERO);
    }

    #[test]
    fn test_kill_leaves_last_value_and_silences_hooks() {
        let mut engine = Sequencer::new();
        let mut props = Props::default().with(PropertyKey::LocalPosition, Vec3::ZERO);

        let seq = engine.create_sequence();
        move_x(seq, &mut engine, 1.0);
        engine.add_complete_hook(seq, Hook::Done);

        engine.advance(0.4, &mut props);
        assert!(engine.kill(seq));
        assert!(!engine.kill(seq));

        let result = engine.advance(2.0, &mut props);
        assert!(result.fired.is_empty());
        assert!((props.vec3(PropertyKey::LocalPosition).x - 0.4).abs() < 1e-5);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_callback_fires_once_per_leg() {
        let mut engine = Sequencer::new();
        let mut props = Props::default().with(PropertyKey::LocalPosition, Vec3::ZERO);

        let seq = engine.create_sequence();
        move_x(seq, &mut engine, 1.0);
        engine.insert_callback(seq, 0.25, Hook::Mid);
        engine.set_loops(seq, 4, LoopType::Yoyo);

        let mut mids = 0;
        let mut clock = 0.0;
        let mut mid_times = Vec::new();
        for _ in 0..400 {
            let result = engine.advance(0.01, &mut props);
            clock += result.elapsed;
            for fired in &result.fired {
                if fired.hook == Hook::Mid {
                    mids += 1;
                    mid_times.push(clock);
                }
            }
        }

        assert_eq!(mids, 4);
        // Backward legs cross the callback at 0.75 into the leg
        assert!((mid_times[0] - 0.25).abs() < 1e-3);
        assert!((mid_times[1] - 1.75).abs() < 1e-3);
    }

    #[test]
    fn test_tween_departs_from_in_flight_value() {
        let mut engine: Sequencer<Hook> = Sequencer::new();
        let mut props =
            Props::default().with(PropertyKey::BaseColor(0), Color::rgb(0.5, 0.5, 0.5));

        let seq = engine.create_sequence();
        engine.insert(
            seq,
            0.0,
            Tween::new(PropertyKey::BaseColor(0), Color::WHITE, 1.0, Curve::default()),
        );

        engine.advance(0.5, &mut props);
        let color = props.0[&PropertyKey::BaseColor(0)].as_color().unwrap();
        assert!((color.r - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_hooks_fire_in_registration_order() {
        let mut engine = Sequencer::new();
        let mut props = Props::default().with(PropertyKey::LocalPosition, Vec3::ZERO);

        let first = engine.create_sequence();
        move_x(first, &mut engine, 1.0);
        engine.add_complete_hook(first, Hook::Done);

        let second = engine.create_sequence();
        engine.insert_callback(second, 1.0, Hook::Mid);

        let result = engine.advance(1.0, &mut props);
        let order: Vec<SequenceId> = result.fired.iter().map(|f| f.sequence).collect();
        assert_eq!(order, vec![first, second]);
    }

    #[test]
    fn test_duration_follows_longest_tween() {
        let mut engine: Sequencer<Hook> = Sequencer::new();
        let seq = engine.create_sequence();
        move_x(seq, &mut engine, 1.25);
        engine.insert_interval(seq, 0.0, 0.5);

        assert_eq!(engine.duration(seq), Some(1.25));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_interval_extends_empty_sequence() {
        let mut engine = Sequencer::new();
        let mut props = Props::default();

        let seq = engine.create_sequence();
        engine.insert_interval(seq, 0.0, 0.5);
        engine.set_loops(seq, 2, LoopType::Yoyo);
        engine.add_step_hook(seq, Hook::Step);
        assert_eq!(engine.duration(seq), Some(0.5));

        let first = engine.advance(0.4, &mut props);
        assert!(first.fired.is_empty());

        let second = engine.advance(0.4, &mut props);
        assert_eq!(hooks(&second), vec![Hook::Step]);
        assert!((second.elapsed - 0.1).abs() < 1e-6);
    }
}
