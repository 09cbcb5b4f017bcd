//! Animatable value types and codecs
//!
//! A [`Codec`] is the per-value-type strategy a leaf tween delegates to:
//! it converts the live value into a start value, combines relative and
//! incremental offsets, and interpolates between start and end. The
//! scheduler never looks inside values; it only talks to codecs.
//!
//! A [`Binding`] is the getter/setter pair that connects a tween to the
//! value it animates.

use crate::error::{Result, TweenError};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

/// Identifies a codec. Tweens driven by the same codec share a pool bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodecId {
    Float,
    Double,
    Int,
    Vec2,
    Vec3,
    Color,
    /// Third-party codecs pick a unique name
    Custom(&'static str),
}

/// Strategy for converting, combining and interpolating one value type
pub trait Codec: 'static {
    /// Value read from and written to the target
    type Value: Clone + Default + 'static;
    /// Per-tween codec options
    type Options: Clone + Default + 'static;

    /// Pool bucket for tweens driven by this codec
    const ID: CodecId;

    /// Convert the live target value into the tween's start value
    fn convert(value: &Self::Value) -> Self::Value {
        value.clone()
    }

    /// Reject unusable end values at creation
    fn validate(_options: &Self::Options, _end: &Self::Value) -> Result<()> {
        Ok(())
    }

    /// `to - from`
    fn change(from: &Self::Value, to: &Self::Value) -> Self::Value;

    /// `base + delta * times`, used for relative ends and incremental loops
    fn offset(base: &Self::Value, delta: &Self::Value, times: f32) -> Self::Value;

    /// Value at eased fraction `t` of the change
    fn interpolate(options: &Self::Options, start: &Self::Value, change: &Self::Value, t: f32) -> Self::Value;

    /// Length of a change, used to derive speed-based durations
    fn magnitude(change: &Self::Value) -> f32;
}

/// Trait for values that can be linearly interpolated
pub trait Tweenable: Clone + Default + 'static {
    /// Pool bucket for [`Lerp<Self>`]
    const CODEC: CodecId;

    /// Component-wise `other - self`
    fn delta(&self, other: &Self) -> Self;

    /// Component-wise `self + delta * times`
    fn offset(&self, delta: &Self, times: f32) -> Self;

    /// Euclidean length
    fn magnitude(&self) -> f32;

    /// Component-wise rounding, used by snapping
    fn snapped(&self) -> Self;

    /// Whether every component is finite
    fn is_finite(&self) -> bool;
}

/// Options for [`Lerp`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LerpOptions {
    /// Round interpolated values to whole numbers
    pub snapping: bool,
}

/// Linear codec for any [`Tweenable`] value
pub struct Lerp<T>(PhantomData<T>);

impl<T: Tweenable> Codec for Lerp<T> {
    type Value = T;
    type Options = LerpOptions;

    const ID: CodecId = T::CODEC;

    fn validate(_options: &LerpOptions, end: &T) -> Result<()> {
        if end.is_finite() {
            Ok(())
        } else {
            Err(TweenError::configuration("end value is not finite"))
        }
    }

    fn change(from: &T, to: &T) -> T {
        from.delta(to)
    }

    fn offset(base: &T, delta: &T, times: f32) -> T {
        base.offset(delta, times)
    }

    fn interpolate(options: &LerpOptions, start: &T, change: &T, t: f32) -> T {
        let value = start.offset(change, t);
        if options.snapping {
            value.snapped()
        } else {
            value
        }
    }

    fn magnitude(change: &T) -> f32 {
        change.magnitude()
    }
}

/// Integer codec: interpolates in floating point and rounds to the nearest integer
pub struct IntCodec;

impl Codec for IntCodec {
    type Value = i32;
    type Options = ();

    const ID: CodecId = CodecId::Int;

    fn change(from: &i32, to: &i32) -> i32 {
        to - from
    }

    fn offset(base: &i32, delta: &i32, times: f32) -> i32 {
        base + (*delta as f32 * times).round() as i32
    }

    fn interpolate(_options: &(), start: &i32, change: &i32, t: f32) -> i32 {
        (*start as f32 + *change as f32 * t).round() as i32
    }

    fn magnitude(change: &i32) -> f32 {
        change.unsigned_abs() as f32
    }
}

// ============================================================================
// Value types
// ============================================================================

/// 2D vector
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 3D vector
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Linear RGBA color
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

// ============================================================================
// f32 / f64 Implementation
// ============================================================================

impl Tweenable for f32 {
    const CODEC: CodecId = CodecId::Float;

    fn delta(&self, other: &Self) -> Self {
        other - self
    }

    fn offset(&self, delta: &Self, times: f32) -> Self {
        self + delta * times
    }

    fn magnitude(&self) -> f32 {
        self.abs()
    }

    fn snapped(&self) -> Self {
        self.round()
    }

    fn is_finite(&self) -> bool {
        f32::is_finite(*self)
    }
}

impl Tweenable for f64 {
    const CODEC: CodecId = CodecId::Double;

    fn delta(&self, other: &Self) -> Self {
        other - self
    }

    fn offset(&self, delta: &Self, times: f32) -> Self {
        self + delta * times as f64
    }

    fn magnitude(&self) -> f32 {
        self.abs() as f32
    }

    fn snapped(&self) -> Self {
        self.round()
    }

    fn is_finite(&self) -> bool {
        f64::is_finite(*self)
    }
}

// ============================================================================
// Vector and Color Implementations
// ============================================================================

impl Tweenable for Vec2 {
    const CODEC: CodecId = CodecId::Vec2;

    fn delta(&self, other: &Self) -> Self {
        Vec2::new(other.x - self.x, other.y - self.y)
    }

    fn offset(&self, delta: &Self, times: f32) -> Self {
        Vec2::new(self.x + delta.x * times, self.y + delta.y * times)
    }

    fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    fn snapped(&self) -> Self {
        Vec2::new(self.x.round(), self.y.round())
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Tweenable for Vec3 {
    const CODEC: CodecId = CodecId::Vec3;

    fn delta(&self, other: &Self) -> Self {
        Vec3::new(other.x - self.x, other.y - self.y, other.z - self.z)
    }

    fn offset(&self, delta: &Self, times: f32) -> Self {
        Vec3::new(
            self.x + delta.x * times,
            self.y + delta.y * times,
            self.z + delta.z * times,
        )
    }

    fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    fn snapped(&self) -> Self {
        Vec3::new(self.x.round(), self.y.round(), self.z.round())
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Tweenable for Color {
    const CODEC: CodecId = CodecId::Color;

    fn delta(&self, other: &Self) -> Self {
        Color::rgba(
            other.r - self.r,
            other.g - self.g,
            other.b - self.b,
            other.a - self.a,
        )
    }

    fn offset(&self, delta: &Self, times: f32) -> Self {
        Color::rgba(
            self.r + delta.r * times,
            self.g + delta.g * times,
            self.b + delta.b * times,
            self.a + delta.a * times,
        )
    }

    fn magnitude(&self) -> f32 {
        (self.r * self.r + self.g * self.g + self.b * self.b + self.a * self.a).sqrt()
    }

    // Channels are normalized, rounding would only produce 0 or 1
    fn snapped(&self) -> Self {
        *self
    }

    fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

// ============================================================================
// Binding
// ============================================================================

type Getter<T> = Rc<dyn Fn() -> Option<T>>;
type Setter<T> = Rc<dyn Fn(T) -> bool>;

/// Getter/setter pair connecting a tween to the value it animates
///
/// The getter returns `None` and the setter returns `false` once the target
/// is gone; the tween is then killed on the current tick.
pub struct Binding<T> {
    getter: Getter<T>,
    setter: Setter<T>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            getter: Rc::clone(&self.getter),
            setter: Rc::clone(&self.setter),
        }
    }
}

impl<T: Clone + 'static> Binding<T> {
    /// Create a binding from explicit accessors
    pub fn new<G, S>(getter: G, setter: S) -> Self
    where
        G: Fn() -> Option<T> + 'static,
        S: Fn(T) -> bool + 'static,
    {
        Self {
            getter: Rc::new(getter),
            setter: Rc::new(setter),
        }
    }

    /// Bind to a shared cell without keeping it alive
    pub fn weak(target: &Rc<RefCell<T>>) -> Self {
        let read: Weak<RefCell<T>> = Rc::downgrade(target);
        let write = read.clone();
        Self::new(
            move || {
                read.upgrade().map(|cell| {
                    let value = cell.borrow().clone();
                    value
                })
            },
            move |value| match write.upgrade() {
                Some(cell) => {
                    *cell.borrow_mut() = value;
                    true
                }
                None => false,
            },
        )
    }

    /// Bind to one field of a shared struct without keeping it alive
    pub fn weak_field<S: 'static>(target: &Rc<RefCell<S>>, get: fn(&S) -> T, set: fn(&mut S, T)) -> Self {
        let read: Weak<RefCell<S>> = Rc::downgrade(target);
        let write = read.clone();
        Self::new(
            move || {
                read.upgrade().map(|cell| {
                    let value = get(&cell.borrow());
                    value
                })
            },
            move |value| match write.upgrade() {
                Some(cell) => {
                    set(&mut cell.borrow_mut(), value);
                    true
                }
                None => false,
            },
        )
    }

    /// Read the live value
    pub fn get(&self) -> Result<T> {
        (self.getter)().ok_or(TweenError::LiveReferenceLost)
    }

    /// Write a value to the target
    pub fn set(&self, value: T) -> Result<()> {
        if (self.setter)(value) {
            Ok(())
        } else {
            Err(TweenError::LiveReferenceLost)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_lerp() {
        let options = LerpOptions::default();
        let change = Lerp::<f32>::change(&10.0, &20.0);
        assert_eq!(change, 10.0);
        assert!((Lerp::<f32>::interpolate(&options, &10.0, &change, 0.25) - 12.5).abs() < 1e-6);
    }

    #[test]
    fn test_snapping() {
        let options = LerpOptions { snapping: true };
        assert_eq!(Lerp::<f32>::interpolate(&options, &0.0, &10.0, 0.33), 3.0);
        let v = Lerp::<Vec2>::interpolate(&options, &Vec2::new(0.0, 0.0), &Vec2::new(10.0, 5.0), 0.46);
        assert_eq!(v, Vec2::new(5.0, 2.0));
    }

    #[test]
    fn test_vec3_offset_and_magnitude() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 4.0, 0.0);
        let change = Lerp::<Vec3>::change(&a, &b);
        assert_eq!(Lerp::<Vec3>::magnitude(&change), 5.0);
        assert_eq!(Lerp::<Vec3>::offset(&b, &change, 2.0), Vec3::new(9.0, 12.0, 0.0));
    }

    #[test]
    fn test_int_codec_rounds() {
        assert_eq!(IntCodec::interpolate(&(), &0, &10, 0.26), 3);
        assert_eq!(IntCodec::offset(&5, &10, 2.0), 25);
        assert_eq!(IntCodec::magnitude(&-7), 7.0);
    }

    #[test]
    fn test_validate_rejects_nan() {
        assert!(Lerp::<f32>::validate(&LerpOptions::default(), &f32::NAN).is_err());
        assert!(Lerp::<Color>::validate(&LerpOptions::default(), &Color::rgba(1.0, 0.0, 0.0, 1.0)).is_ok());
    }

    #[test]
    fn test_weak_binding_loses_target() {
        let target = Rc::new(RefCell::new(1.0f32));
        let binding = Binding::weak(&target);
        assert_eq!(binding.get().unwrap(), 1.0);
        binding.set(4.0).unwrap();
        assert_eq!(*target.borrow(), 4.0);

        drop(target);
        assert!(matches!(binding.get(), Err(TweenError::LiveReferenceLost)));
        assert!(matches!(binding.set(2.0), Err(TweenError::LiveReferenceLost)));
    }

    #[test]
    fn test_weak_field_binding() {
        let target = Rc::new(RefCell::new(Vec3::new(1.0, 2.0, 3.0)));
        let binding = Binding::weak_field(&target, |v: &Vec3| v.y, |v: &mut Vec3, y| v.y = y);
        assert_eq!(binding.get().unwrap(), 2.0);
        binding.set(7.0).unwrap();
        assert_eq!(target.borrow().y, 7.0);
    }
}
