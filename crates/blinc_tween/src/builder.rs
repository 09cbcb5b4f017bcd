//! Two-phase tween creation
//!
//! [`TweenScheduler::to`] and [`TweenScheduler::sequence`] register a tween
//! right away and hand back a builder borrowing the scheduler. Configuration
//! goes through the builder; once it is dropped the tween can only be
//! reconfigured through [`TweenScheduler::edit`] until its first tick or
//! until it is nested, after which it is locked.
//!
//! ```ignore
//! let fade = scheduler
//!     .to(Binding::weak(&opacity), 0.0, 0.3)
//!     .ease(Ease::InQuad)
//!     .build()?;
//!
//! scheduler
//!     .sequence()
//!     .append(fade)
//!     .append_interval(0.5)
//!     .append_callback(|_, _| tracing::info!("faded"))
//!     .loops(2)
//!     .build()?;
//! ```

use crate::easing::Ease;
use crate::error::Result;
use crate::scheduler::TweenScheduler;
use crate::tween::{CallbackKind, LoopType, Tween, TweenCallback, TweenId, INFINITE_LOOPS};
use std::rc::Rc;

/// Configuration shared by leaf and sequence builders
macro_rules! common_config {
    () => {
        /// Number of loops, [`INFINITE_LOOPS`](crate::INFINITE_LOOPS) (or any negative value) to repeat forever
        pub fn loops(self, loops: i32) -> Self {
            let loops = if loops < 0 { INFINITE_LOOPS } else { loops.max(1) };
            self.update(|tween| tween.loops = loops)
        }

        /// How loops wrap around
        pub fn loop_type(self, loop_type: LoopType) -> Self {
            self.update(|tween| tween.loop_type = loop_type)
        }

        pub fn ease(self, ease: Ease) -> Self {
            self.update(|tween| tween.ease = ease)
        }

        /// Back overshoot or elastic amplitude, and elastic period
        pub fn ease_params(self, overshoot: f32, period: f32) -> Self {
            self.update(|tween| {
                tween.overshoot = overshoot;
                tween.period = period;
            })
        }

        /// Seconds to wait before the first tick moves the tween
        pub fn delay(self, delay: f32) -> Self {
            self.update(|tween| tween.set_delay(delay))
        }

        /// Kill the tween once it completes
        pub fn auto_kill(self, auto_kill: bool) -> Self {
            self.update(|tween| tween.auto_kill = auto_kill)
        }

        /// Return the tween to the pool when killed instead of destroying it
        pub fn recyclable(self, recyclable: bool) -> Self {
            self.update(|tween| tween.recyclable = recyclable)
        }

        /// Start playing on the first tick
        pub fn auto_play(self, auto_play: bool) -> Self {
            self.update(|tween| tween.is_playing = auto_play)
        }

        /// Identity tag used by filtered operations
        pub fn tag(self, tag: impl Into<String>) -> Self {
            let tag = tag.into();
            self.update(|tween| tween.tag = Some(tag))
        }

        pub fn time_scale(self, time_scale: f32) -> Self {
            self.update(|tween| tween.time_scale = time_scale.max(0.0))
        }

        /// Use the host's independent delta, unaffected by the global time scale
        pub fn independent_update(self, independent: bool) -> Self {
            self.update(|tween| tween.independent_update = independent)
        }

        pub fn on_start(self, callback: impl Fn(&mut TweenScheduler, TweenId) + 'static) -> Self {
            self.callback(CallbackKind::Start, callback)
        }

        pub fn on_play(self, callback: impl Fn(&mut TweenScheduler, TweenId) + 'static) -> Self {
            self.callback(CallbackKind::Play, callback)
        }

        pub fn on_pause(self, callback: impl Fn(&mut TweenScheduler, TweenId) + 'static) -> Self {
            self.callback(CallbackKind::Pause, callback)
        }

        pub fn on_rewind(self, callback: impl Fn(&mut TweenScheduler, TweenId) + 'static) -> Self {
            self.callback(CallbackKind::Rewind, callback)
        }

        pub fn on_update(self, callback: impl Fn(&mut TweenScheduler, TweenId) + 'static) -> Self {
            self.callback(CallbackKind::Update, callback)
        }

        pub fn on_step_complete(self, callback: impl Fn(&mut TweenScheduler, TweenId) + 'static) -> Self {
            self.callback(CallbackKind::StepComplete, callback)
        }

        pub fn on_complete(self, callback: impl Fn(&mut TweenScheduler, TweenId) + 'static) -> Self {
            self.callback(CallbackKind::Complete, callback)
        }

        pub fn on_kill(self, callback: impl Fn(&mut TweenScheduler, TweenId) + 'static) -> Self {
            self.callback(CallbackKind::Kill, callback)
        }

        fn callback(self, kind: CallbackKind, callback: impl Fn(&mut TweenScheduler, TweenId) + 'static) -> Self {
            let callback: TweenCallback = Rc::new(callback);
            self.update(|tween| *tween.callbacks.slot_mut(kind) = Some(callback))
        }
    };
}

// ============================================================================
// Leaf builder
// ============================================================================

/// Configures a leaf tween created by [`TweenScheduler::to`]
///
/// If creation failed every setter is a no-op and [`build`](Self::build)
/// returns the error.
#[must_use = "call build() to get the tween handle"]
pub struct TweenBuilder<'a> {
    scheduler: &'a mut TweenScheduler,
    result: Result<TweenId>,
}

impl<'a> TweenBuilder<'a> {
    pub(crate) fn new(scheduler: &'a mut TweenScheduler, result: Result<TweenId>) -> Self {
        Self { scheduler, result }
    }

    fn update(self, apply: impl FnOnce(&mut Tween)) -> Self {
        if let Ok(id) = self.result {
            if let Some(tween) = self.scheduler.registry.tweens.get_mut(id) {
                apply(tween);
            }
        }
        self
    }

    common_config!();

    /// Treat the end value as an offset from the live start value
    pub fn relative(self, relative: bool) -> Self {
        self.update(|tween| tween.is_relative = relative)
    }

    /// Animate from the configured value to the live one
    pub fn from(self, from: bool) -> Self {
        self.update(|tween| tween.is_from = from)
    }

    /// Interpret the duration as a speed in units per second
    pub fn speed_based(self, speed_based: bool) -> Self {
        self.update(|tween| tween.speed_based = speed_based)
    }

    /// Handle of the tween being configured
    pub fn id(&self) -> Option<TweenId> {
        self.result.as_ref().ok().copied()
    }

    pub fn build(self) -> Result<TweenId> {
        self.result
    }
}

// ============================================================================
// Sequence builder
// ============================================================================

/// Configures a sequence created by [`TweenScheduler::sequence`]
///
/// Inserting a tween moves it out of the top-level registry: from then on it
/// is driven by the sequence and can't be controlled on its own. Invalid
/// insertions (a killed tween, one already nested, the sequence itself) are
/// logged and ignored.
#[must_use = "call build() to get the sequence handle"]
pub struct SequenceBuilder<'a> {
    scheduler: &'a mut TweenScheduler,
    id: TweenId,
}

impl<'a> SequenceBuilder<'a> {
    pub(crate) fn new(scheduler: &'a mut TweenScheduler, id: TweenId) -> Self {
        Self { scheduler, id }
    }

    fn update(self, apply: impl FnOnce(&mut Tween)) -> Self {
        if let Some(tween) = self.scheduler.registry.tweens.get_mut(self.id) {
            apply(tween);
        }
        self
    }

    common_config!();

    /// Add a tween at the end of the timeline
    pub fn append(self, child: TweenId) -> Self {
        self.scheduler.sequence_append(self.id, child);
        self
    }

    /// Add a tween at the start, pushing everything else later
    pub fn prepend(self, child: TweenId) -> Self {
        self.scheduler.sequence_prepend(self.id, child);
        self
    }

    /// Add a tween at the same offset as the previously inserted one
    pub fn join(self, child: TweenId) -> Self {
        self.scheduler.sequence_join(self.id, child);
        self
    }

    /// Add a tween at an absolute offset
    pub fn insert(self, at: f32, child: TweenId) -> Self {
        self.scheduler.sequence_insert(self.id, at.max(0.0), child);
        self
    }

    pub fn append_interval(self, interval: f32) -> Self {
        self.scheduler.sequence_append_interval(self.id, interval);
        self
    }

    pub fn prepend_interval(self, interval: f32) -> Self {
        self.scheduler.sequence_prepend_interval(self.id, interval);
        self
    }

    /// Fire a callback when playback reaches the current end of the timeline
    pub fn append_callback(self, callback: impl Fn(&mut TweenScheduler, TweenId) + 'static) -> Self {
        let at = self.scheduler.registry.tweens.get(self.id).map_or(0.0, |seq| seq.duration);
        self.insert_callback(at, callback)
    }

    pub fn prepend_callback(self, callback: impl Fn(&mut TweenScheduler, TweenId) + 'static) -> Self {
        self.insert_callback(0.0, callback)
    }

    /// Fire a callback when playback passes `at`. It receives the sequence's id.
    pub fn insert_callback(self, at: f32, callback: impl Fn(&mut TweenScheduler, TweenId) + 'static) -> Self {
        self.scheduler.sequence_insert_callback(self.id, at, Rc::new(callback));
        self
    }

    pub fn id(&self) -> TweenId {
        self.id
    }

    pub fn build(self) -> Result<TweenId> {
        Ok(self.id)
    }
}
