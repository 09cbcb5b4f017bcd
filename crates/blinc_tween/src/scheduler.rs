//! Tween scheduler
//!
//! Owns every tween and advances them once per host step. Creation goes
//! through [`TweenScheduler::to`] / [`TweenScheduler::sequence`]; control
//! goes through the filtered operations, each of which takes a
//! [`TweenFilter`] (a handle converts into one) and returns how many tweens
//! it affected.
//!
//! Everything that can fire callbacks runs inside an update scope. Kills
//! requested inside a scope (including from callbacks) are queued and
//! applied when the outermost scope closes, followed by a single compaction
//! of the active array.
//!
//! ```ignore
//! let mut scheduler = TweenScheduler::new(SchedulerConfig::standard());
//! let x = Rc::new(RefCell::new(0.0f32));
//! scheduler.to(Binding::weak(&x), 100.0, 0.5).tag("intro").build()?;
//!
//! // Once per frame
//! scheduler.tick(dt, dt);
//! ```

use crate::builder::{SequenceBuilder, TweenBuilder};
use crate::config::SchedulerConfig;
use crate::error::{Result, TweenError};
use crate::leaf::LeafCore;
use crate::pool::{Registry, TweenCounts};
use crate::resolve::advance;
use crate::sequence::SequenceState;
use crate::state::UpdateMode;
use crate::tween::{CallbackKind, PoolKey, Tween, TweenId, TweenKind, INFINITE_LOOPS};
use crate::values::{Binding, Codec, Lerp, LerpOptions, Tweenable};
use smallvec::SmallVec;

/// Scaled deltas smaller than this don't move a tween
const TIME_EPSILON: f32 = 1e-6;

/// Selects the tweens a control operation applies to
///
/// Only top-level tweens can be selected. Tweens nested in a sequence are
/// driven by it and ignore control requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TweenFilter<'a> {
    /// Every top-level tween
    All,
    /// Top-level tweens carrying this tag
    Tag(&'a str),
    /// A single tween
    Tween(TweenId),
}

impl From<TweenId> for TweenFilter<'_> {
    fn from(id: TweenId) -> Self {
        TweenFilter::Tween(id)
    }
}

impl TweenFilter<'_> {
    fn matches(&self, tween: &Tween) -> bool {
        match self {
            TweenFilter::All => true,
            TweenFilter::Tag(tag) => tween.has_tag(tag),
            TweenFilter::Tween(_) => false,
        }
    }
}

/// Point a pooled leaf payload at a new target, replacing it if the pooled
/// payload was built for a different codec
fn bind_leaf<C: Codec>(kind: &mut TweenKind, binding: Binding<C::Value>, end: C::Value, options: C::Options) {
    if let TweenKind::Leaf(driver) = kind {
        if let Some(core) = driver.as_any_mut().downcast_mut::<LeafCore<C>>() {
            core.rebind(binding, end, options);
            return;
        }
    }
    *kind = TweenKind::Leaf(Box::new(LeafCore::<C>::new(binding, end, options)));
}

/// Drives every tween from the host clock
pub struct TweenScheduler {
    pub(crate) registry: Registry,
    pub(crate) config: SchedulerConfig,
    time_scale: f32,
    update_depth: u32,
}

impl Default for TweenScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl TweenScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            registry: Registry::new(config.max_leaves, config.max_sequences),
            time_scale: config.time_scale.max(0.0),
            config,
            update_depth: 0,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Global multiplier applied to every non-independent delta
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = time_scale.max(0.0);
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Tween a value to `end` over `duration` seconds, interpolating linearly
    pub fn to<T: Tweenable>(&mut self, binding: Binding<T>, end: T, duration: f32) -> TweenBuilder<'_> {
        self.to_with::<Lerp<T>>(LerpOptions::default(), binding, end, duration)
    }

    /// Tween a value with an explicit codec and codec options
    ///
    /// Creation fails with [`TweenError::Configuration`] if the codec rejects
    /// the end value or the duration is not finite. The candidate tween goes
    /// straight back to its pool in that case.
    pub fn to_with<C: Codec>(
        &mut self,
        options: C::Options,
        binding: Binding<C::Value>,
        end: C::Value,
        duration: f32,
    ) -> TweenBuilder<'_> {
        let result = self.spawn_leaf::<C>(options, binding, end, duration);
        TweenBuilder::new(self, result)
    }

    fn spawn_leaf<C: Codec>(
        &mut self,
        options: C::Options,
        binding: Binding<C::Value>,
        end: C::Value,
        duration: f32,
    ) -> Result<TweenId> {
        let key = PoolKey::Leaf(C::ID);
        let mut tween = match self.registry.take_pooled(key) {
            Some(tween) => tween,
            None => {
                let instance = self.registry.next_instance(key);
                Tween::new(instance, TweenKind::Leaf(Box::new(LeafCore::<C>::unbound())), &self.config)
            }
        };

        let checked = if duration.is_finite() {
            C::validate(&options, &end)
        } else {
            Err(TweenError::configuration(format!("duration {} is not finite", duration)))
        };
        if let Err(err) = checked {
            tracing::warn!("Tween creation rejected: {}", err);
            self.registry.release(tween, &self.config);
            return Err(err);
        }

        bind_leaf::<C>(&mut tween.kind, binding, end, options);
        tween.duration = duration.max(0.0);
        Ok(self.registry.register(tween))
    }

    /// Create an empty sequence
    pub fn sequence(&mut self) -> SequenceBuilder<'_> {
        let tween = match self.registry.take_pooled(PoolKey::Sequence) {
            Some(tween) => tween,
            None => {
                let instance = self.registry.next_instance(PoolKey::Sequence);
                Tween::new(instance, TweenKind::Sequence(SequenceState::default()), &self.config)
            }
        };
        let id = self.registry.register(tween);
        SequenceBuilder::new(self, id)
    }

    /// Reconfigure a leaf tween that hasn't started or been nested yet
    pub fn edit(&mut self, id: TweenId) -> Option<TweenBuilder<'_>> {
        if !self.editable(id, false) {
            return None;
        }
        Some(TweenBuilder::new(self, Ok(id)))
    }

    /// Reconfigure or extend a sequence that hasn't started or been nested yet
    pub fn edit_sequence(&mut self, id: TweenId) -> Option<SequenceBuilder<'_>> {
        if !self.editable(id, true) {
            return None;
        }
        Some(SequenceBuilder::new(self, id))
    }

    fn editable(&self, id: TweenId, sequence: bool) -> bool {
        match self.registry.tweens.get(id) {
            Some(tween) if tween.active && tween.is_sequence() == sequence && !tween.creation_locked => true,
            Some(_) => {
                tracing::debug!("Tween {:?} is locked, killed or of another kind, edit ignored", id);
                false
            }
            None => false,
        }
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance every playing top-level tween
    ///
    /// `delta` is scaled by the global time scale; tweens flagged with
    /// `independent_update` use `independent_delta` as is.
    pub fn tick(&mut self, delta: f32, independent_delta: f32) {
        if self.update_depth > 0 {
            tracing::warn!("TweenScheduler::tick called from a tween callback, ignoring");
            return;
        }
        if !self.registry.has_active() {
            return;
        }

        self.begin_update();
        let scaled = delta * self.time_scale;
        // Tweens created during this tick land past the end and wait for the next one
        for slot in 0..self.registry.active_len() {
            if let Some(id) = self.registry.active_at(slot) {
                self.tick_tween(id, scaled, independent_delta);
            }
        }
        self.end_update();
    }

    fn tick_tween(&mut self, id: TweenId, delta: f32, independent_delta: f32) {
        let Some(tween) = self.registry.tweens.get_mut(id) else {
            return;
        };
        if !tween.active || !tween.is_playing {
            return;
        }
        tween.creation_locked = true;

        let base = if tween.independent_update { independent_delta } else { delta };
        let mut delta = base * tween.time_scale;
        if delta < TIME_EPSILON {
            return;
        }
        if !tween.delay_complete {
            delta = tween.update_delay(tween.elapsed_delay + delta);
            if delta <= 0.0 {
                return;
            }
            if tween.played_once {
                self.fire(id, CallbackKind::Play);
                if !self.is_live(id) {
                    return;
                }
            }
        }

        if !self.startup(id) {
            self.registry.mark_for_killing(id);
            return;
        }
        let Some(tween) = self.registry.tweens.get(id) else {
            return;
        };
        let target = advance(
            tween.position,
            tween.completed_loops,
            tween.duration,
            tween.loops,
            delta,
            tween.is_backwards,
        );
        if self.resolve_tween(id, target.position, target.completed_loops, UpdateMode::Update) {
            self.registry.mark_for_killing(id);
        }
    }

    // ========================================================================
    // Update scopes
    // ========================================================================

    fn begin_update(&mut self) {
        self.update_depth += 1;
    }

    fn end_update(&mut self) {
        if self.update_depth == 1 {
            self.flush_kills();
        }
        self.update_depth -= 1;
    }

    /// Apply queued kills, then close the gaps they left. Runs with the scope
    /// still open so kill callbacks can queue more kills.
    fn flush_kills(&mut self) {
        let mut killed = 0usize;
        while let Some(id) = self.registry.pop_kill() {
            self.despawn(id);
            killed += 1;
        }
        if killed > 0 {
            tracing::trace!("Killed {} tweens", killed);
        }
        debug_assert!(!self.registry.has_pending_kills());
        self.registry.compact();
    }

    /// Fire `on_kill`, release nested children, then pool or drop the record
    fn despawn(&mut self, id: TweenId) {
        self.fire(id, CallbackKind::Kill);
        let Some(tween) = self.registry.remove(id) else {
            return;
        };
        if let Some(state) = tween.sequence() {
            let children: SmallVec<[TweenId; 8]> = state.child_ids().collect();
            for child in children {
                self.despawn(child);
            }
        }
        self.registry.release(tween, &self.config);
    }

    // ========================================================================
    // Control
    // ========================================================================

    fn control(&mut self, filter: TweenFilter<'_>, mut op: impl FnMut(&mut Self, TweenId) -> bool) -> usize {
        self.begin_update();
        let mut affected = 0;
        match filter {
            TweenFilter::Tween(id) => {
                let state = self.registry.tweens.get(id).map(|t| (t.active, t.parent.is_some()));
                match state {
                    Some((_, true)) => {
                        tracing::warn!("Tween {:?} is nested in a sequence, control the sequence instead", id);
                    }
                    Some((true, false)) => {
                        if op(self, id) {
                            affected += 1;
                        }
                    }
                    _ => {}
                }
            }
            _ => {
                for slot in 0..self.registry.active_len() {
                    let Some(id) = self.registry.active_at(slot) else {
                        continue;
                    };
                    let selected = self
                        .registry
                        .tweens
                        .get(id)
                        .is_some_and(|t| t.active && filter.matches(t));
                    if selected && op(self, id) {
                        affected += 1;
                    }
                }
            }
        }
        self.end_update();
        affected
    }

    /// Resume playback
    pub fn play<'a>(&mut self, filter: impl Into<TweenFilter<'a>>) -> usize {
        self.control(filter.into(), Self::play_one)
    }

    pub fn pause<'a>(&mut self, filter: impl Into<TweenFilter<'a>>) -> usize {
        self.control(filter.into(), Self::pause_one)
    }

    pub fn toggle_pause<'a>(&mut self, filter: impl Into<TweenFilter<'a>>) -> usize {
        self.control(filter.into(), Self::toggle_pause_one)
    }

    /// Play forwards, reversing direction if needed
    pub fn play_forward<'a>(&mut self, filter: impl Into<TweenFilter<'a>>) -> usize {
        self.control(filter.into(), Self::play_forward_one)
    }

    /// Play backwards towards the start, reversing direction if needed
    pub fn play_backwards<'a>(&mut self, filter: impl Into<TweenFilter<'a>>) -> usize {
        self.control(filter.into(), Self::play_backwards_one)
    }

    /// Reverse the playing direction without changing the play state
    pub fn flip<'a>(&mut self, filter: impl Into<TweenFilter<'a>>) -> usize {
        self.control(filter.into(), Self::flip_one)
    }

    /// Rewind and play from the start. With `include_delay` the delay runs again.
    pub fn restart<'a>(&mut self, filter: impl Into<TweenFilter<'a>>, include_delay: bool) -> usize {
        self.control(filter.into(), |scheduler, id| scheduler.restart_one(id, include_delay))
    }

    /// Send back to the start and pause
    pub fn rewind<'a>(&mut self, filter: impl Into<TweenFilter<'a>>, include_delay: bool) -> usize {
        self.control(filter.into(), |scheduler, id| scheduler.rewind_one(id, include_delay))
    }

    /// Jump to the end. Endless tweens are skipped.
    pub fn complete<'a>(&mut self, filter: impl Into<TweenFilter<'a>>) -> usize {
        self.control(filter.into(), Self::complete_one)
    }

    /// Seek to `to` seconds (loops included), then keep playing if `and_play`
    pub fn goto<'a>(&mut self, filter: impl Into<TweenFilter<'a>>, to: f32, and_play: bool) -> usize {
        self.control(filter.into(), |scheduler, id| scheduler.seek_one(id, to, and_play))
    }

    /// Kill, optionally completing first. Outside a tick the kill is
    /// immediate; inside one it is applied when the tick ends.
    pub fn kill<'a>(&mut self, filter: impl Into<TweenFilter<'a>>, complete: bool) -> usize {
        self.control(filter.into(), |scheduler, id| {
            if complete {
                scheduler.complete_one(id);
            }
            scheduler.registry.mark_for_killing(id);
            true
        })
    }

    pub fn kill_all(&mut self, complete: bool) -> usize {
        self.kill(TweenFilter::All, complete)
    }

    /// Kill everything and drop every pooled tween
    pub fn clear(&mut self) {
        self.kill_all(false);
        self.registry.purge_pools();
    }

    // ========================================================================
    // Capacity
    // ========================================================================

    /// Expected concurrent leaf tweens and sequences. Exceeding these only logs.
    pub fn set_capacity(&mut self, leaves: usize, sequences: usize) {
        self.registry.set_capacity(leaves, sequences);
    }

    pub fn capacity(&self) -> (usize, usize) {
        self.registry.capacity()
    }

    /// Drop pooled tweens, returns how many were dropped
    pub fn purge_pools(&mut self) -> usize {
        self.registry.purge_pools()
    }

    pub fn counts(&self) -> TweenCounts {
        self.registry.counts()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Whether the handle refers to a tween that hasn't been killed
    pub fn is_active(&self, id: TweenId) -> bool {
        self.is_live(id)
    }

    pub fn is_playing(&self, id: TweenId) -> bool {
        self.registry.tweens.get(id).is_some_and(|t| t.is_playing)
    }

    pub fn is_complete(&self, id: TweenId) -> bool {
        self.registry.tweens.get(id).is_some_and(|t| t.is_complete)
    }

    pub fn is_backwards(&self, id: TweenId) -> bool {
        self.registry.tweens.get(id).is_some_and(|t| t.is_backwards)
    }

    /// Whether the tween is owned by a sequence
    pub fn is_nested(&self, id: TweenId) -> bool {
        self.registry.tweens.get(id).is_some_and(|t| t.parent.is_some())
    }

    /// Position inside the current loop
    pub fn position(&self, id: TweenId) -> Option<f32> {
        self.registry.tweens.get(id).map(|t| t.position)
    }

    pub fn completed_loops(&self, id: TweenId) -> Option<i32> {
        self.registry.tweens.get(id).map(|t| t.completed_loops)
    }

    /// Length of one loop, or of all loops (infinite for endless tweens)
    pub fn duration(&self, id: TweenId, include_loops: bool) -> Option<f32> {
        self.registry.tweens.get(id).map(|t| {
            if include_loops {
                t.total_duration()
            } else {
                t.duration
            }
        })
    }

    pub fn elapsed(&self, id: TweenId, include_loops: bool) -> Option<f32> {
        self.registry.tweens.get(id).map(|t| t.elapsed(include_loops))
    }

    /// Fraction of the whole tween played so far; endless tweens report the
    /// current loop
    pub fn progress(&self, id: TweenId) -> Option<f32> {
        self.registry.tweens.get(id).map(|t| {
            if t.duration <= 0.0 {
                if t.is_complete {
                    1.0
                } else {
                    0.0
                }
            } else if t.loops == INFINITE_LOOPS {
                t.position / t.duration
            } else {
                (t.elapsed(true) / t.total_duration()).clamp(0.0, 1.0)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn float_target() -> Rc<RefCell<f32>> {
        Rc::new(RefCell::new(0.0))
    }

    fn scheduler() -> TweenScheduler {
        TweenScheduler::new(SchedulerConfig::testing())
    }

    #[test]
    fn test_tick_advances_and_completes() {
        let mut scheduler = scheduler();
        let target = float_target();
        let id = scheduler.to(Binding::weak(&target), 10.0, 1.0).build().unwrap();

        scheduler.tick(0.5, 0.5);
        assert!((*target.borrow() - 5.0).abs() < 1e-4);
        assert_eq!(scheduler.progress(id), Some(0.5));

        scheduler.tick(0.75, 0.75);
        assert_eq!(*target.borrow(), 10.0);
        // Auto-killed and pooled
        assert!(!scheduler.is_active(id));
        assert_eq!(scheduler.counts().pooled_leaves, 1);
        assert_eq!(scheduler.counts().registered, 0);
    }

    #[test]
    fn test_delay_consumes_time_first() {
        let mut scheduler = scheduler();
        let target = float_target();
        let id = scheduler
            .to(Binding::weak(&target), 1.0, 1.0)
            .delay(0.5)
            .build()
            .unwrap();

        scheduler.tick(0.25, 0.25);
        assert_eq!(scheduler.position(id), Some(0.0));
        scheduler.tick(0.5, 0.5);
        assert!((scheduler.position(id).unwrap() - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_time_scales() {
        let mut scheduler = scheduler();
        let a = float_target();
        let b = float_target();
        let c = float_target();
        let slow = scheduler
            .to(Binding::weak(&a), 1.0, 1.0)
            .time_scale(0.5)
            .build()
            .unwrap();
        let independent = scheduler
            .to(Binding::weak(&b), 1.0, 1.0)
            .independent_update(true)
            .build()
            .unwrap();
        let normal = scheduler.to(Binding::weak(&c), 1.0, 1.0).build().unwrap();

        scheduler.set_time_scale(2.0);
        scheduler.tick(0.1, 0.3);
        assert!((scheduler.position(slow).unwrap() - 0.1).abs() < 1e-5);
        assert!((scheduler.position(independent).unwrap() - 0.3).abs() < 1e-5);
        assert!((scheduler.position(normal).unwrap() - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_tag_filter() {
        let mut scheduler = scheduler();
        let target = float_target();
        let a = scheduler.to(Binding::weak(&target), 1.0, 1.0).tag("ui").build().unwrap();
        let b = scheduler.to(Binding::weak(&target), 1.0, 1.0).tag("ui").build().unwrap();
        let c = scheduler.to(Binding::weak(&target), 1.0, 1.0).build().unwrap();

        assert_eq!(scheduler.pause(TweenFilter::Tag("ui")), 2);
        assert!(!scheduler.is_playing(a));
        assert!(!scheduler.is_playing(b));
        assert!(scheduler.is_playing(c));

        assert_eq!(scheduler.kill(TweenFilter::Tag("ui"), false), 2);
        assert!(!scheduler.is_active(a));
        assert!(scheduler.is_active(c));
        assert_eq!(scheduler.counts().registered, 1);
    }

    #[test]
    fn test_goto_matches_ticks() {
        let mut scheduler = scheduler();
        let ticked = float_target();
        let seeked = float_target();
        scheduler
            .to(Binding::weak(&ticked), 4.0, 2.0)
            .ease(crate::Ease::InOutQuad)
            .build()
            .unwrap();
        let id = scheduler
            .to(Binding::weak(&seeked), 4.0, 2.0)
            .ease(crate::Ease::InOutQuad)
            .auto_play(false)
            .build()
            .unwrap();

        for _ in 0..13 {
            scheduler.tick(0.1, 0.1);
        }
        assert_eq!(scheduler.goto(id, 1.3, false), 1);
        assert!((*ticked.borrow() - *seeked.borrow()).abs() < 1e-4);
    }

    #[test]
    fn test_kill_with_complete_jumps_to_end() {
        let mut scheduler = scheduler();
        let target = float_target();
        let completes = Rc::new(Cell::new(0));
        let counter = Rc::clone(&completes);
        let id = scheduler
            .to(Binding::weak(&target), 3.0, 1.0)
            .on_complete(move |_, _| counter.set(counter.get() + 1))
            .build()
            .unwrap();

        assert_eq!(scheduler.kill(id, true), 1);
        assert_eq!(*target.borrow(), 3.0);
        assert_eq!(completes.get(), 1);
        assert!(!scheduler.is_active(id));
    }

    #[test]
    fn test_on_kill_fires_once_and_may_kill_others() {
        let mut scheduler = scheduler();
        let target = float_target();
        let other = scheduler.to(Binding::weak(&target), 1.0, 1.0).build().unwrap();
        let kills = Rc::new(Cell::new(0));
        let counter = Rc::clone(&kills);
        let id = scheduler
            .to(Binding::weak(&target), 1.0, 1.0)
            .on_kill(move |scheduler, _| {
                counter.set(counter.get() + 1);
                scheduler.kill(other, false);
            })
            .build()
            .unwrap();

        scheduler.kill(id, false);
        scheduler.kill(id, false);
        assert_eq!(kills.get(), 1);
        assert!(!scheduler.is_active(other));
        assert_eq!(scheduler.counts().registered, 0);
    }

    #[test]
    fn test_reentrant_tick_is_ignored() {
        let mut scheduler = scheduler();
        let target = float_target();
        let id = scheduler
            .to(Binding::weak(&target), 1.0, 1.0)
            .on_update(|scheduler, _| scheduler.tick(10.0, 10.0))
            .build()
            .unwrap();

        scheduler.tick(0.25, 0.25);
        assert_eq!(scheduler.position(id), Some(0.25));
    }

    #[test]
    fn test_nested_tweens_refuse_control() {
        let mut scheduler = scheduler();
        let target = float_target();
        let child = scheduler.to(Binding::weak(&target), 1.0, 1.0).build().unwrap();
        scheduler.sequence().append(child).build().unwrap();

        assert!(scheduler.is_nested(child));
        assert_eq!(scheduler.kill(child, false), 0);
        assert_eq!(scheduler.pause(child), 0);
        assert!(scheduler.is_active(child));
    }

    #[test]
    fn test_not_recyclable_is_destroyed() {
        let mut scheduler = scheduler();
        let target = float_target();
        let id = scheduler
            .to(Binding::weak(&target), 1.0, 1.0)
            .recyclable(false)
            .build()
            .unwrap();
        scheduler.kill(id, false);
        assert_eq!(scheduler.counts().total_leaves(), 0);
    }

    #[test]
    fn test_clear_empties_everything() {
        let mut scheduler = scheduler();
        let target = float_target();
        for _ in 0..3 {
            scheduler.to(Binding::weak(&target), 1.0, 1.0).build().unwrap();
        }
        scheduler.clear();
        assert_eq!(scheduler.counts(), TweenCounts::default());
    }

    #[test]
    fn test_restart_replays() {
        let mut scheduler = scheduler();
        let target = float_target();
        let id = scheduler
            .to(Binding::weak(&target), 1.0, 1.0)
            .auto_kill(false)
            .build()
            .unwrap();
        scheduler.tick(2.0, 2.0);
        assert!(scheduler.is_complete(id));

        assert_eq!(scheduler.restart(id, true), 1);
        assert_eq!(*target.borrow(), 0.0);
        assert!(scheduler.is_playing(id));
        scheduler.tick(0.5, 0.5);
        assert!((*target.borrow() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_flip_and_elapsed() {
        let mut scheduler = scheduler();
        let target = float_target();
        let id = scheduler
            .to(Binding::weak(&target), 1.0, 1.0)
            .loops(3)
            .build()
            .unwrap();

        scheduler.tick(1.5, 1.5);
        assert_eq!(scheduler.elapsed(id, true), Some(1.5));
        assert_eq!(scheduler.elapsed(id, false), Some(0.5));
        assert_eq!(scheduler.duration(id, true), Some(3.0));

        assert_eq!(scheduler.flip(id), 1);
        assert!(scheduler.is_backwards(id));
        scheduler.tick(0.25, 0.25);
        assert_eq!(scheduler.elapsed(id, true), Some(1.25));
    }

    #[test]
    fn test_edit_sequence_until_started() {
        let mut scheduler = scheduler();
        let target = float_target();
        let child = scheduler.to(Binding::weak(&target), 1.0, 1.0).build().unwrap();
        let seq = scheduler.sequence().build().unwrap();

        scheduler.edit_sequence(seq).unwrap().append(child).build().unwrap();
        assert_eq!(scheduler.duration(seq, false), Some(1.0));
        // Leaf edits don't apply to sequences
        assert!(scheduler.edit(seq).is_none());

        scheduler.tick(0.1, 0.1);
        assert!(scheduler.edit_sequence(seq).is_none());
    }

    #[test]
    fn test_capacity_settings() {
        let mut scheduler = scheduler();
        assert_eq!(scheduler.capacity(), (16, 4));
        scheduler.set_capacity(64, 8);
        assert_eq!(scheduler.capacity(), (64, 8));

        let target = float_target();
        let id = scheduler.to(Binding::weak(&target), 1.0, 1.0).build().unwrap();
        scheduler.kill(id, false);
        assert_eq!(scheduler.purge_pools(), 1);
        assert_eq!(scheduler.counts().pooled_leaves, 0);
    }

    #[test]
    fn test_raw_id_round_trip() {
        let mut scheduler = scheduler();
        let id = scheduler.sequence().build().unwrap();
        assert_eq!(TweenId::from_raw(id.to_raw()), id);
    }
}
