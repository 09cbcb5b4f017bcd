//! Easing functions
//!
//! Robert Penner's easing set expressed over `(elapsed, duration)` rather than
//! a normalized `t`, so the same evaluation can be fed raw tween positions.
//! Every curve returns `0.0` at `elapsed == 0` and `1.0` at
//! `elapsed == duration` (back and elastic overshoot in between).

use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

const TWO_PI: f32 = PI * 2.0;

/// Default overshoot for the `Back` family and amplitude for `Elastic`
pub const DEFAULT_OVERSHOOT: f32 = 1.70158;

/// Easing curve applied to a tween's local position
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Ease {
    Linear,
    InSine,
    OutSine,
    InOutSine,
    InQuad,
    #[default]
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    InQuint,
    OutQuint,
    InOutQuint,
    InExpo,
    OutExpo,
    InOutExpo,
    InCirc,
    OutCirc,
    InOutCirc,
    InElastic,
    OutElastic,
    InOutElastic,
    InBack,
    OutBack,
    InOutBack,
    InBounce,
    OutBounce,
    InOutBounce,
    /// User curve over normalized time (0.0 to 1.0)
    #[serde(skip)]
    Custom(fn(f32) -> f32),
}

impl Ease {
    /// Evaluate the curve, returning the eased fraction of the change
    ///
    /// `overshoot_or_amplitude` drives the `Back` overshoot and the `Elastic`
    /// amplitude; `period` only affects `Elastic` (0 picks a default).
    /// A non-positive duration always evaluates to `1.0`.
    pub fn evaluate(self, elapsed: f32, duration: f32, overshoot_or_amplitude: f32, period: f32) -> f32 {
        if duration <= 0.0 {
            return 1.0;
        }
        let time = elapsed;
        match self {
            Ease::Linear => time / duration,
            Ease::InSine => -(time / duration * FRAC_PI_2).cos() + 1.0,
            Ease::OutSine => (time / duration * FRAC_PI_2).sin(),
            Ease::InOutSine => -0.5 * ((PI * time / duration).cos() - 1.0),
            Ease::InQuad => {
                let t = time / duration;
                t * t
            }
            Ease::OutQuad => {
                let t = time / duration;
                -t * (t - 2.0)
            }
            Ease::InOutQuad => {
                let t = time / (duration * 0.5);
                if t < 1.0 {
                    return 0.5 * t * t;
                }
                let t = t - 1.0;
                -0.5 * (t * (t - 2.0) - 1.0)
            }
            Ease::InCubic => {
                let t = time / duration;
                t * t * t
            }
            Ease::OutCubic => {
                let t = time / duration - 1.0;
                t * t * t + 1.0
            }
            Ease::InOutCubic => {
                let t = time / (duration * 0.5);
                if t < 1.0 {
                    return 0.5 * t * t * t;
                }
                let t = t - 2.0;
                0.5 * (t * t * t + 2.0)
            }
            Ease::InQuart => (time / duration).powi(4),
            Ease::OutQuart => {
                let t = time / duration - 1.0;
                -(t.powi(4) - 1.0)
            }
            Ease::InOutQuart => {
                let t = time / (duration * 0.5);
                if t < 1.0 {
                    return 0.5 * t.powi(4);
                }
                let t = t - 2.0;
                -0.5 * (t.powi(4) - 2.0)
            }
            Ease::InQuint => (time / duration).powi(5),
            Ease::OutQuint => {
                let t = time / duration - 1.0;
                t.powi(5) + 1.0
            }
            Ease::InOutQuint => {
                let t = time / (duration * 0.5);
                if t < 1.0 {
                    return 0.5 * t.powi(5);
                }
                let t = t - 2.0;
                0.5 * (t.powi(5) + 2.0)
            }
            Ease::InExpo => {
                if time == 0.0 {
                    0.0
                } else {
                    2f32.powf(10.0 * (time / duration - 1.0))
                }
            }
            Ease::OutExpo => {
                if time == duration {
                    1.0
                } else {
                    -(2f32.powf(-10.0 * time / duration)) + 1.0
                }
            }
            Ease::InOutExpo => {
                if time == 0.0 {
                    return 0.0;
                }
                if time == duration {
                    return 1.0;
                }
                let t = time / (duration * 0.5);
                if t < 1.0 {
                    return 0.5 * 2f32.powf(10.0 * (t - 1.0));
                }
                0.5 * (-(2f32.powf(-10.0 * (t - 1.0))) + 2.0)
            }
            Ease::InCirc => {
                let t = time / duration;
                -((1.0 - t * t).max(0.0).sqrt() - 1.0)
            }
            Ease::OutCirc => {
                let t = time / duration - 1.0;
                (1.0 - t * t).max(0.0).sqrt()
            }
            Ease::InOutCirc => {
                let t = time / (duration * 0.5);
                if t < 1.0 {
                    return -0.5 * ((1.0 - t * t).max(0.0).sqrt() - 1.0);
                }
                let t = t - 2.0;
                0.5 * ((1.0 - t * t).max(0.0).sqrt() + 1.0)
            }
            Ease::InElastic => {
                if time == 0.0 {
                    return 0.0;
                }
                let t = time / duration;
                if t == 1.0 {
                    return 1.0;
                }
                let (amplitude, period, s) = elastic_params(duration * 0.3, overshoot_or_amplitude, period);
                let t = t - 1.0;
                -(amplitude * 2f32.powf(10.0 * t) * ((t * duration - s) * TWO_PI / period).sin())
            }
            Ease::OutElastic => {
                if time == 0.0 {
                    return 0.0;
                }
                let t = time / duration;
                if t == 1.0 {
                    return 1.0;
                }
                let (amplitude, period, s) = elastic_params(duration * 0.3, overshoot_or_amplitude, period);
                amplitude * 2f32.powf(-10.0 * t) * ((t * duration - s) * TWO_PI / period).sin() + 1.0
            }
            Ease::InOutElastic => {
                if time == 0.0 {
                    return 0.0;
                }
                let t = time / (duration * 0.5);
                if t == 2.0 {
                    return 1.0;
                }
                let (amplitude, period, s) = elastic_params(duration * 0.45, overshoot_or_amplitude, period);
                let t = t - 1.0;
                let wave = ((t * duration - s) * TWO_PI / period).sin();
                if t < 0.0 {
                    -0.5 * (amplitude * 2f32.powf(10.0 * t) * wave)
                } else {
                    amplitude * 2f32.powf(-10.0 * t) * wave * 0.5 + 1.0
                }
            }
            Ease::InBack => {
                let s = overshoot_or_amplitude;
                let t = time / duration;
                t * t * ((s + 1.0) * t - s)
            }
            Ease::OutBack => {
                let s = overshoot_or_amplitude;
                let t = time / duration - 1.0;
                t * t * ((s + 1.0) * t + s) + 1.0
            }
            Ease::InOutBack => {
                let s = overshoot_or_amplitude * 1.525;
                let t = time / (duration * 0.5);
                if t < 1.0 {
                    return 0.5 * (t * t * ((s + 1.0) * t - s));
                }
                let t = t - 2.0;
                0.5 * (t * t * ((s + 1.0) * t + s) + 2.0)
            }
            Ease::InBounce => bounce_in(time, duration),
            Ease::OutBounce => bounce_out(time, duration),
            Ease::InOutBounce => {
                if time < duration * 0.5 {
                    bounce_in(time * 2.0, duration) * 0.5
                } else {
                    bounce_out(time * 2.0 - duration, duration) * 0.5 + 0.5
                }
            }
            Ease::Custom(curve) => curve((time / duration).clamp(0.0, 1.0)),
        }
    }

    /// Evaluate the curve as an absolute value: `start + change * eased`
    pub fn apply(
        self,
        elapsed: f32,
        start: f32,
        change: f32,
        duration: f32,
        overshoot_or_amplitude: f32,
        period: f32,
    ) -> f32 {
        start + change * self.evaluate(elapsed, duration, overshoot_or_amplitude, period)
    }
}

/// Resolve (amplitude, period, phase shift) for the elastic family
fn elastic_params(default_period: f32, amplitude: f32, period: f32) -> (f32, f32, f32) {
    let period = if period == 0.0 { default_period } else { period };
    if amplitude < 1.0 {
        (1.0, period, period / 4.0)
    } else {
        (amplitude, period, period / TWO_PI * (1.0 / amplitude).asin())
    }
}

fn bounce_out(time: f32, duration: f32) -> f32 {
    let t = time / duration;
    if t < 1.0 / 2.75 {
        7.5625 * t * t
    } else if t < 2.0 / 2.75 {
        let t = t - 1.5 / 2.75;
        7.5625 * t * t + 0.75
    } else if t < 2.5 / 2.75 {
        let t = t - 2.25 / 2.75;
        7.5625 * t * t + 0.9375
    } else {
        let t = t - 2.625 / 2.75;
        7.5625 * t * t + 0.984375
    }
}

fn bounce_in(time: f32, duration: f32) -> f32 {
    1.0 - bounce_out(duration - time, duration)
}
