//! Tween record
//!
//! Every tween, leaf or sequence, is one [`Tween`] stored in the scheduler's
//! arena. The record is reused by the pool: [`Tween::reset`] returns every
//! mutable field to its configured default while keeping allocations
//! (the leaf payload box, the sequence entry list) for the next owner.

use crate::config::SchedulerConfig;
use crate::easing::Ease;
use crate::leaf::LeafDriver;
use crate::scheduler::TweenScheduler;
use crate::sequence::SequenceState;
use crate::values::CodecId;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::rc::Rc;

new_key_type! {
    /// Handle to a tween or sequence owned by a [`TweenScheduler`]
    ///
    /// Handles are generational: once a tween is killed its handle stops
    /// resolving, even if the underlying record is recycled.
    pub struct TweenId;
}

impl TweenId {
    /// Convert to a raw u64, e.g. to hand a handle across an FFI boundary
    pub fn to_raw(self) -> u64 {
        self.0.as_ffi()
    }

    /// Reconstruct from a value produced by [`to_raw`](Self::to_raw)
    pub fn from_raw(raw: u64) -> Self {
        TweenId::from(slotmap::KeyData::from_ffi(raw))
    }
}

/// Loop count meaning "repeat forever"
pub const INFINITE_LOOPS: i32 = -1;

/// How a tween behaves when it wraps around a loop boundary
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopType {
    /// Jump back to the start value
    #[default]
    Restart,
    /// Play back and forth
    Yoyo,
    /// Each loop continues from where the previous one ended
    Incremental,
}

/// Callback invoked with the scheduler and the id of the tween that fired it
///
/// Callbacks run synchronously and may freely create, kill or control other
/// tweens. Kills requested from a callback take effect at the end of the
/// current update.
pub type TweenCallback = Rc<dyn Fn(&mut TweenScheduler, TweenId)>;

/// Which callback slot to fire
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CallbackKind {
    Start,
    Play,
    Pause,
    Rewind,
    Update,
    StepComplete,
    Complete,
    Kill,
}

#[derive(Clone, Default)]
pub(crate) struct TweenCallbacks {
    pub on_start: Option<TweenCallback>,
    pub on_play: Option<TweenCallback>,
    pub on_pause: Option<TweenCallback>,
    pub on_rewind: Option<TweenCallback>,
    pub on_update: Option<TweenCallback>,
    pub on_step_complete: Option<TweenCallback>,
    pub on_complete: Option<TweenCallback>,
    pub on_kill: Option<TweenCallback>,
}

impl TweenCallbacks {
    pub fn get(&self, kind: CallbackKind) -> Option<&TweenCallback> {
        match kind {
            CallbackKind::Start => self.on_start.as_ref(),
            CallbackKind::Play => self.on_play.as_ref(),
            CallbackKind::Pause => self.on_pause.as_ref(),
            CallbackKind::Rewind => self.on_rewind.as_ref(),
            CallbackKind::Update => self.on_update.as_ref(),
            CallbackKind::StepComplete => self.on_step_complete.as_ref(),
            CallbackKind::Complete => self.on_complete.as_ref(),
            CallbackKind::Kill => self.on_kill.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, kind: CallbackKind) -> &mut Option<TweenCallback> {
        match kind {
            CallbackKind::Start => &mut self.on_start,
            CallbackKind::Play => &mut self.on_play,
            CallbackKind::Pause => &mut self.on_pause,
            CallbackKind::Rewind => &mut self.on_rewind,
            CallbackKind::Update => &mut self.on_update,
            CallbackKind::StepComplete => &mut self.on_step_complete,
            CallbackKind::Complete => &mut self.on_complete,
            CallbackKind::Kill => &mut self.on_kill,
        }
    }

    pub fn any(&self) -> bool {
        self.on_start.is_some()
            || self.on_play.is_some()
            || self.on_pause.is_some()
            || self.on_rewind.is_some()
            || self.on_update.is_some()
            || self.on_step_complete.is_some()
            || self.on_complete.is_some()
            || self.on_kill.is_some()
    }
}

/// Payload that differs between leaves and sequences
pub(crate) enum TweenKind {
    Leaf(Box<dyn LeafDriver>),
    Sequence(SequenceState),
}

/// Pool bucket a tween returns to when released
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum PoolKey {
    Leaf(CodecId),
    Sequence,
}

pub(crate) struct Tween {
    /// Allocation serial, preserved across recycling
    pub instance: u64,
    pub kind: TweenKind,

    // Registry bookkeeping
    pub active: bool,
    pub kill_queued: bool,
    pub active_slot: Option<usize>,
    pub parent: Option<TweenId>,

    // Configuration
    pub tag: Option<String>,
    pub time_scale: f32,
    pub independent_update: bool,
    pub ease: Ease,
    pub overshoot: f32,
    pub period: f32,
    pub loops: i32,
    pub loop_type: LoopType,
    pub delay: f32,
    pub auto_kill: bool,
    pub recyclable: bool,
    pub is_relative: bool,
    pub is_from: bool,
    pub speed_based: bool,
    pub callbacks: TweenCallbacks,

    // Playback state
    pub creation_locked: bool,
    pub startup_done: bool,
    pub played_once: bool,
    pub delay_complete: bool,
    pub elapsed_delay: f32,
    pub duration: f32,
    pub full_duration: f32,
    pub position: f32,
    pub completed_loops: i32,
    pub is_playing: bool,
    pub is_complete: bool,
    pub is_backwards: bool,
}

impl Tween {
    pub fn new(instance: u64, kind: TweenKind, config: &SchedulerConfig) -> Self {
        let mut tween = Self {
            instance,
            kind,
            active: false,
            kill_queued: false,
            active_slot: None,
            parent: None,
            tag: None,
            time_scale: 1.0,
            independent_update: false,
            ease: Ease::Linear,
            overshoot: 0.0,
            period: 0.0,
            loops: 1,
            loop_type: LoopType::Restart,
            delay: 0.0,
            auto_kill: true,
            recyclable: true,
            is_relative: false,
            is_from: false,
            speed_based: false,
            callbacks: TweenCallbacks::default(),
            creation_locked: false,
            startup_done: false,
            played_once: false,
            delay_complete: true,
            elapsed_delay: 0.0,
            duration: 0.0,
            full_duration: 0.0,
            position: 0.0,
            completed_loops: 0,
            is_playing: false,
            is_complete: false,
            is_backwards: false,
        };
        tween.reset(config);
        tween
    }

    /// Return every mutable field to its default, keeping payload allocations
    pub fn reset(&mut self, config: &SchedulerConfig) {
        self.active = false;
        self.kill_queued = false;
        self.active_slot = None;
        self.parent = None;

        self.tag = None;
        self.time_scale = 1.0;
        self.independent_update = false;
        self.overshoot = config.default_overshoot;
        self.period = config.default_period;
        self.loops = 1;
        self.loop_type = config.default_loop_type;
        self.delay = 0.0;
        self.auto_kill = config.default_auto_kill;
        self.recyclable = config.default_recyclable;
        self.is_relative = false;
        self.is_from = false;
        self.speed_based = false;
        self.callbacks = TweenCallbacks::default();

        self.creation_locked = false;
        self.startup_done = false;
        self.played_once = false;
        self.delay_complete = true;
        self.elapsed_delay = 0.0;
        self.duration = 0.0;
        self.full_duration = 0.0;
        self.position = 0.0;
        self.completed_loops = 0;
        self.is_playing = config.default_auto_play;
        self.is_complete = false;
        self.is_backwards = false;

        match &mut self.kind {
            TweenKind::Leaf(driver) => {
                self.ease = config.default_ease;
                driver.release();
            }
            TweenKind::Sequence(state) => {
                // Sequences remap children linearly unless told otherwise
                self.ease = Ease::Linear;
                state.clear();
            }
        }
    }

    pub fn pool_key(&self) -> PoolKey {
        match &self.kind {
            TweenKind::Leaf(driver) => PoolKey::Leaf(driver.codec_id()),
            TweenKind::Sequence(_) => PoolKey::Sequence,
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, TweenKind::Sequence(_))
    }

    pub fn sequence(&self) -> Option<&SequenceState> {
        match &self.kind {
            TweenKind::Sequence(state) => Some(state),
            TweenKind::Leaf(_) => None,
        }
    }

    pub fn sequence_mut(&mut self) -> Option<&mut SequenceState> {
        match &mut self.kind {
            TweenKind::Sequence(state) => Some(state),
            TweenKind::Leaf(_) => None,
        }
    }

    pub fn has_loops(&self) -> bool {
        self.loops == INFINITE_LOOPS || self.loops > 1
    }

    /// Duration including every loop, infinite for endless tweens
    pub fn total_duration(&self) -> f32 {
        if self.loops == INFINITE_LOOPS {
            f32::INFINITY
        } else {
            self.duration * self.loops as f32
        }
    }

    pub fn set_delay(&mut self, delay: f32) {
        self.delay = delay.max(0.0);
        self.elapsed_delay = 0.0;
        self.delay_complete = self.delay <= 0.0;
    }

    /// Record `elapsed` seconds of delay. Returns the time left over once the
    /// delay is exhausted, 0 while still waiting.
    pub fn update_delay(&mut self, elapsed: f32) -> f32 {
        if elapsed > self.delay {
            self.elapsed_delay = self.delay;
            self.delay_complete = true;
            elapsed - self.delay
        } else {
            self.elapsed_delay = elapsed;
            0.0
        }
    }

    /// Local time elapsed since the start, optionally counting finished loops
    pub fn elapsed(&self, include_loops: bool) -> f32 {
        if !include_loops {
            return self.position;
        }
        let loops = if self.position >= self.duration {
            self.completed_loops - 1
        } else {
            self.completed_loops
        };
        loops.max(0) as f32 * self.duration + self.position
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.as_deref() == Some(tag)
    }
}
