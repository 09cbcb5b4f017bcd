//! Position arithmetic shared by leaves, sequences and the tick driver
//!
//! Everything here is pure. A tween's place in time is the pair
//! `(position, completed_loops)` where `position` is in `[0, duration]`.
//! `position == duration` marks the forward edge of the current loop; with
//! `completed_loops > 0` an exact `0` is normalized to that edge so a loop
//! seam has a single representation.

use crate::tween::{LoopType, INFINITE_LOOPS};

/// Where a tween lands after a move
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Target {
    pub position: f32,
    pub completed_loops: i32,
}

/// Literal position to evaluate, after applying yoyo parity and direction
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orientation {
    /// Whether the evaluated position is mirrored (`duration - position`)
    pub inverse: bool,
    /// Position to hand to the ease / children
    pub position: f32,
}

/// Resolve whether a yoyo tween is currently running its mirrored half
///
/// Odd loops play in reverse. At the forward edge (`position >= duration`)
/// the parity flips, since the edge belongs to the loop that just completed.
/// `flip` inverts the result, for callers that are themselves running
/// backwards.
pub fn orient(
    loop_type: LoopType,
    position: f32,
    duration: f32,
    completed_loops: i32,
    flip: bool,
) -> Orientation {
    let mut inverse = loop_type == LoopType::Yoyo
        && if position < duration {
            completed_loops % 2 != 0
        } else {
            completed_loops % 2 == 0
        };
    if flip {
        inverse = !inverse;
    }
    let position = if inverse { duration - position } else { position };
    Orientation { inverse, position }
}

/// Advance by `delta` seconds of local time, wrapping loop by loop
///
/// Wrapping is iterative so that a delta spanning several loops lands on the
/// right loop count. A non-positive duration completes one loop per call
/// (all of them when the loop count is finite).
pub(crate) fn advance(
    position: f32,
    completed_loops: i32,
    duration: f32,
    loops: i32,
    delta: f32,
    backwards: bool,
) -> Target {
    if duration <= 0.0 {
        return Target {
            position: 0.0,
            completed_loops: if loops == INFINITE_LOOPS {
                completed_loops + 1
            } else {
                loops
            },
        };
    }

    let was_end = position >= duration;
    let mut to_position = position;
    let mut to_loops = completed_loops;

    if backwards {
        to_position -= delta;
        while to_position < 0.0 && to_loops > -1 {
            to_position += duration;
            to_loops -= 1;
        }
        if to_loops < 0 || (was_end && to_loops < 1) {
            // Went past the very beginning: equivalent to a rewind
            to_position = 0.0;
            to_loops = if was_end { 1 } else { 0 };
        }
    } else {
        to_position += delta;
        while to_position >= duration && (loops == INFINITE_LOOPS || to_loops < loops) {
            to_position -= duration;
            to_loops += 1;
        }
    }

    if was_end {
        to_loops -= 1;
    }
    if loops != INFINITE_LOOPS && to_loops >= loops {
        to_position = duration;
    }

    Target {
        position: to_position,
        completed_loops: to_loops,
    }
}

/// Split an absolute time (all loops included) into position and loop count
///
/// Division gives the first estimate; the correction loops absorb the
/// rounding error division leaves at exact loop boundaries.
pub(crate) fn seek(to: f32, duration: f32, loops: i32) -> Target {
    if duration <= 0.0 {
        return Target {
            position: 0.0,
            completed_loops: if loops == INFINITE_LOOPS { 1 } else { loops },
        };
    }

    let to = to.max(0.0);
    let mut completed = (to / duration).floor() as i32;
    let mut position = to - completed as f32 * duration;
    while position >= duration {
        position -= duration;
        completed += 1;
    }
    while position < 0.0 && completed > 0 {
        position += duration;
        completed -= 1;
    }
    let position = position.max(0.0);

    if loops != INFINITE_LOOPS && completed >= loops {
        Target {
            position: duration,
            completed_loops: loops,
        }
    } else {
        Target {
            position,
            completed_loops: completed,
        }
    }
}

/// Clamp a resolved position into `[0, duration]`, normalizing loop seams
pub(crate) fn clamp_position(position: f32, duration: f32, completed_loops: i32, is_complete: bool) -> f32 {
    if position > duration {
        duration
    } else if position <= 0.0 {
        if completed_loops > 0 || is_complete {
            duration
        } else {
            0.0
        }
    } else {
        position
    }
}

/// Inputs to [`completed_steps`]
#[derive(Clone, Copy, Debug)]
pub(crate) struct StepInput {
    pub ticking: bool,
    pub is_sequence: bool,
    pub backwards: bool,
    pub prev_loops: i32,
    pub loops: i32,
    pub to_position: f32,
    pub was_rewound: bool,
    pub was_complete: bool,
}

/// How many loop boundaries were crossed by a move
///
/// Only ticks count steps for leaves. Sequences also count them on seeks so
/// they can replay their children once per crossed loop.
pub(crate) fn completed_steps(input: StepInput) -> i32 {
    let steps = if input.ticking {
        if input.backwards {
            let mut steps = if input.loops < input.prev_loops {
                input.prev_loops - input.loops
            } else if input.to_position <= 0.0 && !input.was_rewound {
                1
            } else {
                0
            };
            if input.was_complete {
                steps -= 1;
            }
            steps
        } else if input.loops > input.prev_loops {
            input.loops - input.prev_loops
        } else {
            0
        }
    } else if input.is_sequence {
        (input.prev_loops - input.loops).abs()
    } else {
        0
    };
    steps.max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(position: f32, completed_loops: i32) -> Target {
        Target {
            position,
            completed_loops,
        }
    }

    #[test]
    fn test_advance_within_loop() {
        assert_eq!(advance(0.25, 0, 1.0, 1, 0.5, false), target(0.75, 0));
        assert_eq!(advance(0.75, 0, 1.0, 1, 0.25, true), target(0.5, 0));
    }

    #[test]
    fn test_advance_spans_several_loops() {
        // loops=3, duration=1, one 3.5s step
        assert_eq!(advance(0.0, 0, 1.0, 3, 3.5, false), target(1.0, 3));
        assert_eq!(advance(0.0, 0, 1.0, INFINITE_LOOPS, 3.5, false), target(0.5, 3));
    }

    #[test]
    fn test_advance_from_loop_edge() {
        // Sitting at the end of loop 1 is the same instant as the start of loop 2
        assert_eq!(advance(1.0, 1, 1.0, 3, 0.25, false), target(0.25, 1));
    }

    #[test]
    fn test_advance_backwards_wraps_and_rewinds() {
        assert_eq!(advance(0.25, 2, 1.0, 3, 0.5, true), target(0.75, 1));
        assert_eq!(advance(0.25, 0, 1.0, 3, 5.0, true), target(0.0, 0));
        // From the completed edge, leaving the last loop drops one completion
        assert_eq!(advance(1.0, 1, 1.0, 1, 0.25, true), target(0.75, 0));
    }

    #[test]
    fn test_advance_zero_duration() {
        assert_eq!(advance(0.0, 4, 0.0, INFINITE_LOOPS, 0.016, false), target(0.0, 5));
        assert_eq!(advance(0.0, 0, 0.0, 3, 0.016, false), target(0.0, 3));
    }

    #[test]
    fn test_seek_corrects_boundaries() {
        assert_eq!(seek(2.5, 1.0, 4), target(0.5, 2));
        assert_eq!(seek(3.0, 1.0, 4), target(0.0, 3));
        assert_eq!(seek(9.0, 1.0, 4), target(1.0, 4));
        assert_eq!(seek(-1.0, 1.0, 4), target(0.0, 0));
        let t = seek(1.2, 0.4, INFINITE_LOOPS);
        assert_eq!(t.completed_loops, 3);
        assert!(t.position.abs() < 1e-5 || (t.position - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_clamp_position_normalizes_seam() {
        assert_eq!(clamp_position(0.0, 2.0, 1, false), 2.0);
        assert_eq!(clamp_position(0.0, 2.0, 0, false), 0.0);
        assert_eq!(clamp_position(0.0, 2.0, 0, true), 2.0);
        assert_eq!(clamp_position(3.0, 2.0, 0, false), 2.0);
        assert_eq!(clamp_position(1.5, 2.0, 0, false), 1.5);
    }

    #[test]
    fn test_orient_yoyo_parity() {
        let forward = orient(LoopType::Yoyo, 0.25, 1.0, 0, false);
        assert!(!forward.inverse);
        assert_eq!(forward.position, 0.25);

        let mirrored = orient(LoopType::Yoyo, 0.25, 1.0, 1, false);
        assert!(mirrored.inverse);
        assert_eq!(mirrored.position, 0.75);

        // Forward edge of the first loop is still the non-mirrored half
        assert!(!orient(LoopType::Yoyo, 1.0, 1.0, 1, false).inverse);
        assert!(orient(LoopType::Yoyo, 1.0, 1.0, 2, false).inverse);

        assert!(!orient(LoopType::Restart, 0.25, 1.0, 1, false).inverse);
        assert!(orient(LoopType::Restart, 0.25, 1.0, 1, true).inverse);
    }

    #[test]
    fn test_completed_steps() {
        let base = StepInput {
            ticking: true,
            is_sequence: false,
            backwards: false,
            prev_loops: 0,
            loops: 3,
            to_position: 1.0,
            was_rewound: true,
            was_complete: false,
        };
        assert_eq!(completed_steps(base), 3);
        assert_eq!(
            completed_steps(StepInput {
                ticking: false,
                ..base
            }),
            0
        );
        assert_eq!(
            completed_steps(StepInput {
                ticking: false,
                is_sequence: true,
                ..base
            }),
            3
        );
        // Leaving the completed state backwards is not a step
        assert_eq!(
            completed_steps(StepInput {
                backwards: true,
                prev_loops: 1,
                loops: 0,
                to_position: 0.75,
                was_rewound: false,
                was_complete: true,
                ..base
            }),
            0
        );
        // Reaching the start backwards is one
        assert_eq!(
            completed_steps(StepInput {
                backwards: true,
                prev_loops: 0,
                loops: 0,
                to_position: 0.0,
                was_rewound: false,
                ..base
            }),
            1
        );
    }
}
