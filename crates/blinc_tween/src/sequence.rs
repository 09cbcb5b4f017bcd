//! Sequences
//!
//! A sequence owns tweens and callbacks placed at fixed offsets on its own
//! timeline. Whenever the sequence moves between two local positions it
//! sweeps its entries in offset order (descending when moving backwards),
//! driving each overlapped child to its own local time. A move that crosses
//! several loop boundaries in one tick is replayed one cycle at a time so
//! every child and callback sees a continuous sweep.

use crate::easing::Ease;
use crate::resolve::orient;
use crate::scheduler::TweenScheduler;
use crate::state::UpdateMode;
use crate::tween::{LoopType, Tween, TweenCallback, TweenId, INFINITE_LOOPS};

/// What sits at an offset on a sequence timeline
#[derive(Clone)]
pub(crate) enum SequencedKind {
    Tween(TweenId),
    Callback(TweenCallback),
}

#[derive(Clone)]
pub(crate) struct Sequenced {
    pub kind: SequencedKind,
    pub start: f32,
    pub end: f32,
}

impl Sequenced {
    pub fn tween_id(&self) -> Option<TweenId> {
        match self.kind {
            SequencedKind::Tween(id) => Some(id),
            SequencedKind::Callback(_) => None,
        }
    }
}

#[derive(Default)]
pub(crate) struct SequenceState {
    pub entries: Vec<Sequenced>,
    /// Offset of the most recent tween insertion, used by `join`
    pub last_insert_time: f32,
}

impl SequenceState {
    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_insert_time = 0.0;
    }

    /// Push every entry later by `by` seconds
    pub fn shift(&mut self, by: f32) {
        for entry in &mut self.entries {
            entry.start += by;
            entry.end += by;
        }
    }

    /// Stable sort by start offset, so equal offsets keep insertion order
    pub fn sort_entries(&mut self) {
        self.entries.sort_by(|a, b| a.start.total_cmp(&b.start));
    }

    pub fn child_ids(&self) -> impl Iterator<Item = TweenId> + '_ {
        self.entries.iter().filter_map(Sequenced::tween_id)
    }
}

/// Inputs to [`TweenScheduler::apply_sequence`]
#[derive(Clone, Copy, Debug)]
pub(crate) struct SequenceMove {
    pub prev_position: f32,
    pub prev_loops: i32,
    pub steps: i32,
    pub inverse: bool,
    pub mode: UpdateMode,
}

/// One sweep over a sequence's entries
#[derive(Clone, Copy, Debug)]
struct Cycle {
    from: f32,
    to: f32,
    mode: UpdateMode,
    use_inverse: bool,
    prev_inverse: bool,
    multi_cycle: bool,
}

/// Goto-only backward sweep that returns every child to its start
fn rewind_cycle(duration: f32) -> Cycle {
    Cycle {
        from: duration,
        to: 0.0,
        mode: UpdateMode::Goto,
        use_inverse: false,
        prev_inverse: false,
        multi_cycle: false,
    }
}

fn clamp_nested_loops(tween: &mut Tween) {
    if tween.loops == INFINITE_LOOPS {
        tracing::warn!("Infinite loops are not allowed inside a sequence, using a single loop");
        tween.loops = 1;
    }
}

// ============================================================================
// Construction
// ============================================================================

impl TweenScheduler {
    fn can_insert(&self, sequence: TweenId, child: Option<TweenId>) -> bool {
        let Some(seq) = self.registry.tweens.get(sequence) else {
            tracing::warn!("Cannot insert into a sequence that no longer exists");
            return false;
        };
        if !seq.active || !seq.is_sequence() {
            tracing::warn!("Cannot insert into a killed tween or a non-sequence");
            return false;
        }
        if seq.creation_locked {
            tracing::warn!("Sequence already started or nested, insertion ignored");
            return false;
        }
        let Some(child) = child else {
            return true;
        };
        if child == sequence {
            tracing::warn!("A sequence cannot contain itself");
            return false;
        }
        match self.registry.tweens.get(child) {
            Some(tween) if tween.active && tween.parent.is_none() => true,
            Some(tween) if tween.parent.is_some() => {
                tracing::warn!("Tween already belongs to a sequence, insertion ignored");
                false
            }
            _ => {
                tracing::warn!("Cannot insert a killed tween into a sequence");
                false
            }
        }
    }

    /// Nest `child` at offset `at`. The child's delay is folded into its offset.
    pub(crate) fn sequence_insert(&mut self, sequence: TweenId, at: f32, child: TweenId) -> bool {
        if !self.can_insert(sequence, Some(child)) {
            return false;
        }
        self.registry.unregister(child);

        let Some(tween) = self.registry.tweens.get_mut(child) else {
            return false;
        };
        clamp_nested_loops(tween);
        let start = at + tween.delay;
        tween.parent = Some(sequence);
        tween.creation_locked = true;
        tween.auto_kill = false;
        tween.speed_based = false;
        tween.is_playing = false;
        tween.set_delay(0.0);
        let end = start + tween.duration * tween.loops as f32;

        let Some(seq) = self.registry.tweens.get_mut(sequence) else {
            return false;
        };
        if end > seq.duration {
            seq.duration = end;
        }
        if let Some(state) = seq.sequence_mut() {
            state.last_insert_time = start;
            state.entries.push(Sequenced {
                kind: SequencedKind::Tween(child),
                start,
                end,
            });
        }
        true
    }

    pub(crate) fn sequence_append(&mut self, sequence: TweenId, child: TweenId) -> bool {
        let at = self.registry.tweens.get(sequence).map_or(0.0, |seq| seq.duration);
        self.sequence_insert(sequence, at, child)
    }

    pub(crate) fn sequence_join(&mut self, sequence: TweenId, child: TweenId) -> bool {
        let at = self
            .registry
            .tweens
            .get(sequence)
            .and_then(Tween::sequence)
            .map_or(0.0, |state| state.last_insert_time);
        self.sequence_insert(sequence, at, child)
    }

    /// Nest `child` at offset 0, pushing everything else later by its full span
    pub(crate) fn sequence_prepend(&mut self, sequence: TweenId, child: TweenId) -> bool {
        if !self.can_insert(sequence, Some(child)) {
            return false;
        }
        let Some(tween) = self.registry.tweens.get_mut(child) else {
            return false;
        };
        clamp_nested_loops(tween);
        let span = tween.delay + tween.duration * tween.loops as f32;
        self.shift_sequence(sequence, span);
        self.sequence_insert(sequence, 0.0, child)
    }

    pub(crate) fn sequence_append_interval(&mut self, sequence: TweenId, interval: f32) -> bool {
        if !self.can_insert(sequence, None) {
            return false;
        }
        let Some(seq) = self.registry.tweens.get_mut(sequence) else {
            return false;
        };
        let start = seq.duration;
        seq.duration += interval.max(0.0);
        if let Some(state) = seq.sequence_mut() {
            state.last_insert_time = start;
        }
        true
    }

    pub(crate) fn sequence_prepend_interval(&mut self, sequence: TweenId, interval: f32) -> bool {
        if !self.can_insert(sequence, None) {
            return false;
        }
        self.shift_sequence(sequence, interval.max(0.0));
        true
    }

    /// Place a callback at offset `at`; it fires with the sequence's id
    pub(crate) fn sequence_insert_callback(&mut self, sequence: TweenId, at: f32, callback: TweenCallback) -> bool {
        if !self.can_insert(sequence, None) {
            return false;
        }
        let Some(seq) = self.registry.tweens.get_mut(sequence) else {
            return false;
        };
        let at = at.max(0.0);
        if at > seq.duration {
            seq.duration = at;
        }
        if let Some(state) = seq.sequence_mut() {
            state.entries.push(Sequenced {
                kind: SequencedKind::Callback(callback),
                start: at,
                end: at,
            });
        }
        true
    }

    fn shift_sequence(&mut self, sequence: TweenId, by: f32) {
        if let Some(seq) = self.registry.tweens.get_mut(sequence) {
            seq.duration += by;
            if let Some(state) = seq.sequence_mut() {
                state.shift(by);
            }
        }
    }
}

// ============================================================================
// Playback
// ============================================================================

impl TweenScheduler {
    /// Sweep a sequence's children after its own position was resolved.
    /// Returns whether the sequence must be killed.
    pub(crate) fn apply_sequence(&mut self, id: TweenId, step: SequenceMove) -> bool {
        let Some(seq) = self.registry.tweens.get(id) else {
            return true;
        };
        let duration = seq.duration;
        let backwards = seq.is_backwards;
        let loop_type = seq.loop_type;
        let (mut prev_position, new_position) = if matches!(seq.ease, Ease::Linear) {
            (step.prev_position, seq.position)
        } else {
            let remap = |p: f32| duration * seq.ease.evaluate(p, duration, seq.overshoot, seq.period);
            (remap(step.prev_position), remap(seq.position))
        };
        let mut prev_inverse = orient(loop_type, prev_position, duration, step.prev_loops, backwards).inverse;

        let mut steps = step.steps;
        let mut to = 0.0;
        if steps > 0 {
            if step.mode == UpdateMode::Update {
                let completed_before = seq.completed_loops;
                let position_before = seq.position;
                let mut from = prev_position;
                for cycle in 0..steps {
                    if cycle == 0 {
                        if prev_inverse && !backwards {
                            from = duration - from;
                        }
                    } else if loop_type == LoopType::Yoyo {
                        from = to;
                    } else {
                        // Restarting loops replay every pass from the start edge
                        if to > 0.0 && self.internal_cycle(id, rewind_cycle(duration)) {
                            return true;
                        }
                        from = duration - to;
                    }
                    to = if prev_inverse { 0.0 } else { duration };
                    // Each replayed pass keeps its own yoyo parity
                    let halted = self.internal_cycle(
                        id,
                        Cycle {
                            from,
                            to,
                            mode: step.mode,
                            use_inverse: prev_inverse != backwards,
                            prev_inverse,
                            multi_cycle: true,
                        },
                    );
                    if halted {
                        return true;
                    }
                    if loop_type == LoopType::Yoyo {
                        prev_inverse = !prev_inverse;
                    }
                }
                // A callback moved the sequence; its own goto already applied everything
                let Some(seq) = self.registry.tweens.get(id) else {
                    return true;
                };
                if completed_before != seq.completed_loops || (position_before - seq.position).abs() > f32::EPSILON {
                    return !seq.active;
                }
            } else {
                if loop_type == LoopType::Yoyo && steps % 2 != 0 {
                    prev_inverse = !prev_inverse;
                    prev_position = duration - prev_position;
                }
                steps = 0;
            }
        }

        let Some((is_complete, position)) = self.registry.tweens.get(id).map(|seq| (seq.is_complete, seq.position)) else {
            return true;
        };
        // The replay above already swept up to the final edge
        if steps > 0 && (is_complete || position >= duration) {
            return false;
        }
        // Leaving a loop seam forward starts a fresh pass
        let at_seam = steps == 0
            && !backwards
            && step.prev_loops > 0
            && step.prev_position >= duration
            && position < duration;
        if at_seam {
            prev_inverse = step.inverse;
            to = duration;
        }
        let from = if steps > 0 || at_seam {
            if loop_type != LoopType::Yoyo && to > 0.0 && self.internal_cycle(id, rewind_cycle(duration)) {
                return true;
            }
            if step.inverse {
                duration
            } else {
                0.0
            }
        } else if step.inverse {
            duration - prev_position
        } else {
            prev_position
        };
        let to = if step.inverse {
            duration - new_position
        } else {
            new_position
        };
        self.internal_cycle(
            id,
            Cycle {
                from,
                to,
                mode: step.mode,
                use_inverse: step.inverse,
                prev_inverse,
                multi_cycle: false,
            },
        )
    }

    /// Sweep entries between `cycle.from` and `cycle.to`. Returns true to halt
    /// and kill the sequence.
    fn internal_cycle(&mut self, id: TweenId, cycle: Cycle) -> bool {
        let Some(seq) = self.registry.tweens.get(id) else {
            return true;
        };
        let was_playing = seq.is_playing;
        let duration = seq.duration;
        let count = seq.sequence().map_or(0, |state| state.entries.len());
        let sweep_backwards = cycle.to < cycle.from;

        for n in 0..count {
            let index = if sweep_backwards { count - 1 - n } else { n };
            let Some(seq) = self.registry.tweens.get(id) else {
                return true;
            };
            if !seq.active {
                return true;
            }
            if !seq.is_playing && was_playing {
                // Paused by a callback
                return false;
            }
            let seq_backwards = seq.is_backwards;
            let Some(entry) = seq.sequence().and_then(|state| state.entries.get(index)).cloned() else {
                continue;
            };

            if sweep_backwards {
                if entry.end < cycle.to || entry.start > cycle.from {
                    continue;
                }
                match entry.kind {
                    SequencedKind::Callback(callback) => {
                        // A sweep starting on an offset already fired it, unless it starts on the loop edge
                        let crossed = entry.start < cycle.from || cycle.from >= duration;
                        if cycle.mode == UpdateMode::Update && cycle.prev_inverse && crossed {
                            callback(self, id);
                        }
                    }
                    SequencedKind::Tween(child) => {
                        let Some(tween) = self.registry.tweens.get_mut(child) else {
                            return true;
                        };
                        // Never started, nothing to undo
                        if !tween.startup_done {
                            continue;
                        }
                        tween.is_backwards = true;
                        let local = (cycle.to - entry.start).max(0.0);
                        if self.goto_tween(child, local, false, cycle.mode) {
                            return true;
                        }
                        if cycle.multi_cycle {
                            self.snap_nested_sequence(id, child, &cycle, true);
                        }
                    }
                }
            } else {
                if entry.start > cycle.to
                    || (entry.start > 0.0 && entry.end <= cycle.from)
                    || (entry.start <= 0.0 && entry.end < cycle.from)
                {
                    continue;
                }
                match entry.kind {
                    SequencedKind::Callback(callback) => {
                        let fire = (!seq_backwards && !cycle.use_inverse && !cycle.prev_inverse)
                            || (seq_backwards && cycle.use_inverse && !cycle.prev_inverse);
                        if cycle.mode == UpdateMode::Update && fire {
                            callback(self, id);
                        }
                    }
                    SequencedKind::Tween(child) => {
                        let mut local = (cycle.to - entry.start).max(0.0);
                        if cycle.to >= entry.end {
                            // Make sure a child swept past entirely lands on its end
                            if !self.startup(child) {
                                return true;
                            }
                            let full = self.registry.tweens.get(child).map_or(0.0, |t| t.full_duration);
                            if local < full {
                                local = full;
                            }
                        }
                        if let Some(tween) = self.registry.tweens.get_mut(child) {
                            tween.is_backwards = false;
                        }
                        if self.goto_tween(child, local, false, cycle.mode) {
                            return true;
                        }
                        if cycle.multi_cycle {
                            self.snap_nested_sequence(id, child, &cycle, false);
                        }
                    }
                }
            }
        }
        false
    }

    /// After a replayed cycle, park a nested sequence exactly on one of its
    /// edges so the next sweep starts clean
    fn snap_nested_sequence(&mut self, parent: TweenId, child: TweenId, cycle: &Cycle, sweep_backwards: bool) {
        let Some(seq) = self.registry.tweens.get(parent) else {
            return;
        };
        let (position, completed, loops, backwards) = (seq.position, seq.completed_loops, seq.loops, seq.is_backwards);
        let Some(tween) = self.registry.tweens.get_mut(child) else {
            return;
        };
        if !tween.is_sequence() {
            return;
        }
        if position <= 0.0 && completed == 0 {
            tween.position = 0.0;
            return;
        }
        let moving_on = if sweep_backwards { backwards } else { !backwards };
        let mut to_zero = completed == 0 || (moving_on && (completed < loops || loops == INFINITE_LOOPS));
        if tween.is_backwards {
            to_zero = !to_zero;
        }
        if cycle.use_inverse {
            to_zero = !to_zero;
        }
        if backwards && !cycle.use_inverse && !cycle.prev_inverse {
            to_zero = !to_zero;
        }
        tween.position = if to_zero { 0.0 } else { tween.duration };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::values::Binding;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn scheduler() -> TweenScheduler {
        TweenScheduler::new(SchedulerConfig::testing())
    }

    fn float_tween(scheduler: &mut TweenScheduler, duration: f32) -> (TweenId, Rc<RefCell<f32>>) {
        let target = Rc::new(RefCell::new(0.0f32));
        let id = scheduler.to(Binding::weak(&target), 1.0, duration).build().unwrap();
        (id, target)
    }

    fn entries(scheduler: &TweenScheduler, id: TweenId) -> Vec<(f32, f32)> {
        scheduler.registry.tweens[id]
            .sequence()
            .unwrap()
            .entries
            .iter()
            .map(|entry| (entry.start, entry.end))
            .collect()
    }

    #[test]
    fn test_append_join_and_intervals() {
        let mut scheduler = scheduler();
        let (a, _ta) = float_tween(&mut scheduler, 1.0);
        let (b, _tb) = float_tween(&mut scheduler, 0.5);
        let (c, _tc) = float_tween(&mut scheduler, 2.0);
        let seq = scheduler
            .sequence()
            .append(a)
            .append_interval(0.25)
            .append(b)
            .join(c)
            .build()
            .unwrap();

        assert_eq!(entries(&scheduler, seq), vec![(0.0, 1.0), (1.25, 1.75), (1.25, 3.25)]);
        assert_eq!(scheduler.duration(seq, false), Some(3.25));
        // Nested tweens leave the top-level registry
        assert_eq!(scheduler.counts().registered, 1);
    }

    #[test]
    fn test_prepend_shifts_by_full_span() {
        let mut scheduler = scheduler();
        let (a, _ta) = float_tween(&mut scheduler, 1.0);
        let target = Rc::new(RefCell::new(0.0f32));
        let b = scheduler
            .to(Binding::weak(&target), 1.0, 0.5)
            .loops(2)
            .delay(0.5)
            .build()
            .unwrap();
        let seq = scheduler
            .sequence()
            .append(a)
            .append_callback(|_, _| {})
            .prepend(b)
            .prepend_interval(1.0)
            .build()
            .unwrap();

        // b spans delay 0.5 + 2 * 0.5, everything else moved by that, then by 1.0
        assert_eq!(entries(&scheduler, seq), vec![(2.5, 3.5), (3.5, 3.5), (1.5, 2.5)]);
        assert_eq!(scheduler.duration(seq, false), Some(3.5));
    }

    #[test]
    fn test_insert_rejects_invalid_children() {
        let mut scheduler = scheduler();
        let (a, _ta) = float_tween(&mut scheduler, 1.0);
        let first = scheduler.sequence().append(a).build().unwrap();
        // Already nested
        let second = scheduler.sequence().append(a).append_interval(1.0).build().unwrap();
        assert_eq!(scheduler.registry.tweens[a].parent, Some(first));
        assert!(entries(&scheduler, second).is_empty());
        // Self insertion
        assert!(!scheduler.sequence_append(second, second));
    }

    #[test]
    fn test_infinite_child_clamped() {
        let mut scheduler = scheduler();
        let target = Rc::new(RefCell::new(0.0f32));
        let a = scheduler
            .to(Binding::weak(&target), 1.0, 1.0)
            .loops(INFINITE_LOOPS)
            .build()
            .unwrap();
        let seq = scheduler.sequence().append(a).build().unwrap();
        assert_eq!(scheduler.registry.tweens[a].loops, 1);
        assert_eq!(scheduler.duration(seq, false), Some(1.0));
    }

    #[test]
    fn test_children_follow_sequence_time() {
        let mut scheduler = scheduler();
        let (a, ta) = float_tween(&mut scheduler, 1.0);
        let (b, tb) = float_tween(&mut scheduler, 1.0);
        scheduler.sequence().append(a).append(b).build().unwrap();

        scheduler.tick(0.5, 0.5);
        assert!((*ta.borrow() - 0.5).abs() < 1e-5);
        assert_eq!(*tb.borrow(), 0.0);

        scheduler.tick(1.0, 1.0);
        assert!((*ta.borrow() - 1.0).abs() < 1e-5);
        assert!((*tb.borrow() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_callback_fires_once_per_loop() {
        let mut scheduler = scheduler();
        let hits = Rc::new(Cell::new(0));
        let (a, _target) = float_tween(&mut scheduler, 1.0);
        let counter = Rc::clone(&hits);
        scheduler
            .sequence()
            .append(a)
            .insert_callback(0.5, move |_, _| counter.set(counter.get() + 1))
            .loops(3)
            .build()
            .unwrap();

        // Crosses the callback three times in one tick
        scheduler.tick(5.0, 5.0);
        assert_eq!(hits.get(), 3);
    }

    #[test]
    fn test_yoyo_callback_fires_once_per_pass() {
        let mut scheduler = scheduler();
        let hits = Rc::new(Cell::new(0));
        let (a, _target) = float_tween(&mut scheduler, 1.0);
        let counter = Rc::clone(&hits);
        scheduler
            .sequence()
            .append(a)
            .insert_callback(0.5, move |_, _| counter.set(counter.get() + 1))
            .loops(2)
            .loop_type(LoopType::Yoyo)
            .build()
            .unwrap();

        // Forward pass then mirrored pass, both inside one tick
        scheduler.tick(5.0, 5.0);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_backward_sweep_leaving_offset_does_not_refire() {
        let mut scheduler = scheduler();
        let hits = Rc::new(Cell::new(0));
        let (a, _target) = float_tween(&mut scheduler, 1.0);
        let counter = Rc::clone(&hits);
        let seq = scheduler
            .sequence()
            .append(a)
            .insert_callback(0.5, move |_, _| counter.set(counter.get() + 1))
            .auto_kill(false)
            .build()
            .unwrap();

        scheduler.tick(2.0, 2.0);
        assert_eq!(hits.get(), 1);

        scheduler.play_backwards(seq);
        // Lands on the offset, then leaves it
        scheduler.tick(0.25, 0.25);
        scheduler.tick(0.25, 0.25);
        assert_eq!(hits.get(), 2);
        scheduler.tick(0.25, 0.25);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_child_startup_failure_halts_sweep() {
        let mut scheduler = scheduler();
        let hits = Rc::new(Cell::new(0));
        let (a, ta) = float_tween(&mut scheduler, 1.0);
        let (b, tb) = float_tween(&mut scheduler, 1.0);
        let counter = Rc::clone(&hits);
        let seq = scheduler
            .sequence()
            .append(a)
            .append(b)
            .append_callback(move |_, _| counter.set(counter.get() + 1))
            .build()
            .unwrap();
        drop(tb);

        // Jumps past b without ever starting it
        scheduler.tick(3.0, 3.0);
        assert!((*ta.borrow() - 1.0).abs() < 1e-5);
        assert_eq!(hits.get(), 0);
        assert!(!scheduler.is_active(seq));
        assert!(!scheduler.is_active(b));
    }

    #[test]
    fn test_yoyo_sequence_plays_children_back() {
        let mut scheduler = scheduler();
        let (a, ta) = float_tween(&mut scheduler, 1.0);
        scheduler
            .sequence()
            .append(a)
            .loops(2)
            .loop_type(LoopType::Yoyo)
            .build()
            .unwrap();

        scheduler.tick(0.75, 0.75);
        assert!((*ta.borrow() - 0.75).abs() < 1e-5);
        scheduler.tick(0.5, 0.5);
        // 1.25s in: second half runs backwards, 0.25s from the end
        assert!((*ta.borrow() - 0.75).abs() < 1e-5);
        scheduler.tick(1.0, 1.0);
        assert!(ta.borrow().abs() < 1e-5);
    }

    #[test]
    fn test_empty_sequence_is_killed() {
        let mut scheduler = scheduler();
        let seq = scheduler.sequence().build().unwrap();
        scheduler.tick(0.1, 0.1);
        assert!(!scheduler.is_active(seq));
    }

    #[test]
    fn test_lost_child_kills_sequence() {
        let mut scheduler = scheduler();
        let (a, ta) = float_tween(&mut scheduler, 1.0);
        let seq = scheduler.sequence().append(a).build().unwrap();
        drop(ta);
        scheduler.tick(0.1, 0.1);
        assert!(!scheduler.is_active(seq));
        assert!(!scheduler.is_active(a));
        assert_eq!(scheduler.counts().active_leaves, 0);
    }
}
