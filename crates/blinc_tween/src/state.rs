//! Per-tween state machine
//!
//! [`TweenScheduler::resolve_tween`] moves a tween to a resolved
//! `(position, completed_loops)` pair, applies it and fires callbacks. Ticks
//! and seeks both end up here; they only differ in how the target pair is
//! computed (see [`crate::resolve`]) and in the [`UpdateMode`] passed along.
//!
//! The playback primitives below (play, pause, rewind, ...) act on a single
//! tween and are what the scheduler's filtered operations are built from.

use crate::leaf::{ApplyParams, StartupParams};
use crate::resolve::{clamp_position, completed_steps, orient, seek, StepInput};
use crate::scheduler::TweenScheduler;
use crate::sequence::SequenceMove;
use crate::tween::{CallbackKind, LoopType, TweenId, TweenKind, INFINITE_LOOPS};

/// Why a tween is being moved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UpdateMode {
    /// Regular tick: start, update and step callbacks fire
    Update,
    /// Seek or control request: only complete, rewind and pause fire
    Goto,
}

impl TweenScheduler {
    /// Whether `id` still resolves to a tween that has not been killed
    pub(crate) fn is_live(&self, id: TweenId) -> bool {
        self.registry.tweens.get(id).is_some_and(|tween| tween.active)
    }

    pub(crate) fn fire(&mut self, id: TweenId, kind: CallbackKind) {
        let callback = self
            .registry
            .tweens
            .get(id)
            .and_then(|tween| tween.callbacks.get(kind))
            .cloned();
        if let Some(callback) = callback {
            callback(self, id);
        }
    }

    /// Run one-time startup. Returns false if the tween cannot run.
    pub(crate) fn startup(&mut self, id: TweenId) -> bool {
        let Some(tween) = self.registry.tweens.get_mut(id) else {
            return false;
        };
        if tween.startup_done {
            return true;
        }

        match &mut tween.kind {
            TweenKind::Leaf(driver) => {
                let params = StartupParams {
                    is_relative: tween.is_relative,
                    is_from: tween.is_from,
                };
                match driver.startup(&params) {
                    Ok(magnitude) => {
                        if tween.speed_based {
                            // Duration was configured as units per second
                            tween.duration = if tween.duration > 0.0 {
                                magnitude / tween.duration
                            } else {
                                0.0
                            };
                        }
                    }
                    Err(err) => {
                        tracing::warn!("Tween startup failed, killing it: {}", err);
                        return false;
                    }
                }
            }
            TweenKind::Sequence(state) => {
                if state.entries.is_empty() && !tween.callbacks.any() {
                    tracing::debug!("Empty sequence started, killing it");
                    return false;
                }
                state.sort_entries();
            }
        }
        tween.startup_done = true;
        tween.full_duration = tween.total_duration();
        true
    }

    /// Move a tween to `(to_position, to_loops)`, apply it and fire callbacks.
    /// Returns whether the tween must be killed.
    pub(crate) fn resolve_tween(&mut self, id: TweenId, to_position: f32, to_loops: i32, mode: UpdateMode) -> bool {
        if !self.startup(id) {
            return true;
        }

        let Some(tween) = self.registry.tweens.get_mut(id) else {
            return true;
        };
        if !tween.played_once && mode == UpdateMode::Update {
            tween.played_once = true;
            for kind in [CallbackKind::Start, CallbackKind::Play] {
                self.fire(id, kind);
                if !self.is_live(id) {
                    return true;
                }
            }
        }

        let Some(tween) = self.registry.tweens.get_mut(id) else {
            return true;
        };
        let prev_position = tween.position;
        let prev_loops = tween.completed_loops;
        let was_rewound = prev_position <= 0.0 && prev_loops <= 0;
        let was_complete = tween.is_complete;

        tween.completed_loops = to_loops;
        if tween.loops != INFINITE_LOOPS {
            tween.is_complete = to_loops == tween.loops;
        }
        let steps = completed_steps(StepInput {
            ticking: mode == UpdateMode::Update,
            is_sequence: tween.is_sequence(),
            backwards: tween.is_backwards,
            prev_loops,
            loops: to_loops,
            to_position,
            was_rewound,
            was_complete,
        });
        tween.position = clamp_position(to_position, tween.duration, to_loops, tween.is_complete);

        let was_playing = tween.is_playing;
        if tween.is_playing {
            tween.is_playing = if tween.is_backwards {
                !(tween.completed_loops == 0 && tween.position <= 0.0)
            } else {
                !tween.is_complete
            };
        }

        let loop_type = if tween.has_loops() {
            tween.loop_type
        } else {
            LoopType::Restart
        };
        let orientation = orient(loop_type, tween.position, tween.duration, tween.completed_loops, false);

        let killed = if tween.is_sequence() {
            self.apply_sequence(
                id,
                SequenceMove {
                    prev_position,
                    prev_loops,
                    steps,
                    inverse: orientation.inverse,
                    mode,
                },
            )
        } else {
            self.apply_leaf(id, orientation.position)
        };
        if killed {
            return true;
        }

        if mode == UpdateMode::Update {
            self.fire(id, CallbackKind::Update);
        }
        if self
            .registry
            .tweens
            .get(id)
            .is_some_and(|t| t.position <= 0.0 && t.completed_loops <= 0 && !was_rewound)
        {
            self.fire(id, CallbackKind::Rewind);
        }
        if mode == UpdateMode::Update {
            for _ in 0..steps {
                self.fire(id, CallbackKind::StepComplete);
            }
        }
        if self
            .registry
            .tweens
            .get(id)
            .is_some_and(|t| t.is_complete && !was_complete)
        {
            self.fire(id, CallbackKind::Complete);
        }
        if self
            .registry
            .tweens
            .get(id)
            .is_some_and(|t| !t.is_playing && was_playing && (!t.is_complete || !t.auto_kill))
        {
            self.fire(id, CallbackKind::Pause);
        }

        self.registry
            .tweens
            .get(id)
            .map_or(true, |t| (t.auto_kill && t.is_complete) || !t.active)
    }

    /// Evaluate a leaf at `elapsed` and write the value to its target
    fn apply_leaf(&mut self, id: TweenId, elapsed: f32) -> bool {
        let parent_loops = self
            .registry
            .tweens
            .get(id)
            .and_then(|tween| tween.parent)
            .and_then(|parent| self.registry.tweens.get(parent))
            .filter(|parent| parent.loop_type == LoopType::Incremental)
            .map(|parent| {
                if parent.is_complete {
                    parent.completed_loops - 1
                } else {
                    parent.completed_loops
                }
            });

        let Some(tween) = self.registry.tweens.get_mut(id) else {
            return true;
        };
        let incremental = tween.loop_type == LoopType::Incremental;
        let own_loops = if !incremental {
            0
        } else if tween.is_complete {
            tween.completed_loops - 1
        } else {
            tween.completed_loops
        };
        let mut increments = own_loops as f32;
        if let Some(parent_loops) = parent_loops {
            let per_parent_loop = if incremental { tween.loops } else { 1 };
            increments += (per_parent_loop * parent_loops) as f32;
        }

        let params = ApplyParams {
            elapsed,
            duration: tween.duration,
            ease: tween.ease,
            overshoot: tween.overshoot,
            period: tween.period,
            increments,
        };
        let TweenKind::Leaf(driver) = &mut tween.kind else {
            return false;
        };
        match driver.apply(&params) {
            Ok(()) => false,
            Err(err) => {
                tracing::warn!("Tween target lost, killing it: {}", err);
                true
            }
        }
    }

    // ========================================================================
    // Playback primitives
    // ========================================================================

    /// Seek to an absolute time (all loops included). Returns whether the
    /// tween must be killed.
    pub(crate) fn goto_tween(&mut self, id: TweenId, to: f32, and_play: bool, mode: UpdateMode) -> bool {
        // Speed-based durations are only known after startup
        if !self.startup(id) {
            return true;
        }
        let Some(tween) = self.registry.tweens.get_mut(id) else {
            return true;
        };
        let was_playing = tween.is_playing;
        tween.is_playing = and_play;
        tween.delay_complete = true;
        tween.elapsed_delay = tween.delay;
        let target = seek(to, tween.duration, tween.loops);

        let kill = self.resolve_tween(id, target.position, target.completed_loops, mode);
        // resolve_tween can't see this pause, playback was stopped up front
        if !and_play && was_playing && !kill {
            self.fire(id, CallbackKind::Pause);
        }
        kill
    }

    pub(crate) fn play_one(&mut self, id: TweenId) -> bool {
        let Some(tween) = self.registry.tweens.get_mut(id) else {
            return false;
        };
        let can_play = if tween.is_backwards {
            tween.completed_loops > 0 || tween.position > 0.0
        } else {
            !tween.is_complete
        };
        if tween.is_playing || !can_play {
            return false;
        }
        tween.is_playing = true;
        if tween.played_once && tween.delay_complete {
            self.fire(id, CallbackKind::Play);
        }
        true
    }

    pub(crate) fn pause_one(&mut self, id: TweenId) -> bool {
        let Some(tween) = self.registry.tweens.get_mut(id) else {
            return false;
        };
        if !tween.is_playing {
            return false;
        }
        tween.is_playing = false;
        self.fire(id, CallbackKind::Pause);
        true
    }

    pub(crate) fn toggle_pause_one(&mut self, id: TweenId) -> bool {
        if self.registry.tweens.get(id).is_some_and(|t| t.is_playing) {
            self.pause_one(id)
        } else {
            self.play_one(id)
        }
    }

    pub(crate) fn play_forward_one(&mut self, id: TweenId) -> bool {
        let Some(tween) = self.registry.tweens.get_mut(id) else {
            return false;
        };
        if tween.is_complete {
            tween.is_backwards = false;
            tween.is_playing = false;
            return false;
        }
        if tween.is_backwards {
            tween.is_backwards = false;
            self.play_one(id);
            return true;
        }
        self.play_one(id)
    }

    pub(crate) fn play_backwards_one(&mut self, id: TweenId) -> bool {
        let Some(tween) = self.registry.tweens.get_mut(id) else {
            return false;
        };
        if tween.completed_loops == 0 && tween.position <= 0.0 {
            tween.is_backwards = true;
            tween.is_playing = false;
            self.fire(id, CallbackKind::Rewind);
            return false;
        }
        if !tween.is_backwards {
            tween.is_backwards = true;
            self.play_one(id);
            return true;
        }
        self.play_one(id)
    }

    pub(crate) fn flip_one(&mut self, id: TweenId) -> bool {
        let Some(tween) = self.registry.tweens.get_mut(id) else {
            return false;
        };
        tween.is_backwards = !tween.is_backwards;
        true
    }

    /// Send a tween back to its start and stop it
    pub(crate) fn rewind_one(&mut self, id: TweenId, include_delay: bool) -> bool {
        let Some(tween) = self.registry.tweens.get_mut(id) else {
            return false;
        };
        let was_playing = tween.is_playing;
        tween.is_playing = false;
        let mut rewound = false;
        if tween.delay > 0.0 {
            if include_delay {
                rewound = tween.elapsed_delay > 0.0;
                tween.elapsed_delay = 0.0;
                tween.delay_complete = false;
            } else {
                rewound = tween.elapsed_delay < tween.delay;
                tween.elapsed_delay = tween.delay;
                tween.delay_complete = true;
            }
        }

        if tween.position > 0.0 || tween.completed_loops > 0 || !tween.startup_done {
            if self.resolve_tween(id, 0.0, 0, UpdateMode::Goto) {
                self.registry.mark_for_killing(id);
            } else if was_playing {
                self.fire(id, CallbackKind::Pause);
            }
            true
        } else {
            // Already at the start
            self.fire(id, CallbackKind::Rewind);
            rewound
        }
    }

    /// Rewind and play from the start
    pub(crate) fn restart_one(&mut self, id: TweenId, include_delay: bool) -> bool {
        let Some(tween) = self.registry.tweens.get_mut(id) else {
            return false;
        };
        let was_paused = !tween.is_playing;
        tween.is_backwards = false;
        self.rewind_one(id, include_delay);
        let Some(tween) = self.registry.tweens.get_mut(id) else {
            return true;
        };
        if !tween.active {
            return true;
        }
        tween.is_playing = true;
        if was_paused && tween.played_once && tween.delay_complete {
            self.fire(id, CallbackKind::Play);
        }
        true
    }

    /// Jump to the end of the last loop. Endless tweens can't complete.
    pub(crate) fn complete_one(&mut self, id: TweenId) -> bool {
        if !self.startup(id) {
            self.registry.mark_for_killing(id);
            return true;
        }
        let Some(tween) = self.registry.tweens.get(id) else {
            return false;
        };
        if tween.loops == INFINITE_LOOPS || tween.is_complete {
            return false;
        }
        let (duration, loops) = (tween.duration, tween.loops);
        let kill = self.resolve_tween(id, duration, loops, UpdateMode::Goto);
        if let Some(tween) = self.registry.tweens.get_mut(id) {
            tween.is_playing = false;
        }
        if kill {
            self.registry.mark_for_killing(id);
        }
        true
    }

    /// Seek and optionally keep playing. Returns true if the seek was applied.
    pub(crate) fn seek_one(&mut self, id: TweenId, to: f32, and_play: bool) -> bool {
        if !self.registry.tweens.contains_key(id) {
            return false;
        }
        if self.goto_tween(id, to, and_play, UpdateMode::Goto) {
            self.registry.mark_for_killing(id);
        }
        true
    }
}
