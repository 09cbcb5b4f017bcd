//! Leaf tween payload
//!
//! The scheduler stores every tween in one arena, so the value-typed part of
//! a leaf lives behind the object-safe [`LeafDriver`] trait. [`LeafCore`] is
//! the only implementation; it owns the binding plus start/end/change values
//! and delegates all arithmetic to its [`Codec`].

use crate::easing::Ease;
use crate::error::{Result, TweenError};
use crate::values::{Binding, Codec, CodecId};
use std::any::Any;

/// Inputs to a leaf's one-time startup
#[derive(Clone, Copy, Debug)]
pub(crate) struct StartupParams {
    pub is_relative: bool,
    pub is_from: bool,
}

/// Inputs to one evaluate-and-apply pass
#[derive(Clone, Copy, Debug)]
pub(crate) struct ApplyParams {
    /// Local position handed to the ease (already mirrored for yoyo)
    pub elapsed: f32,
    pub duration: f32,
    pub ease: Ease,
    pub overshoot: f32,
    pub period: f32,
    /// How many whole changes to add to the start value (incremental loops)
    pub increments: f32,
}

/// Type-erased view of a leaf tween's value state
pub(crate) trait LeafDriver {
    fn codec_id(&self) -> CodecId;

    /// Resolve start, end and change from the live target.
    /// Returns the magnitude of the change.
    fn startup(&mut self, params: &StartupParams) -> Result<f32>;

    /// Evaluate the value at the given position and write it to the target
    fn apply(&mut self, params: &ApplyParams) -> Result<()>;

    /// Drop the binding and clear values before the tween is pooled
    fn release(&mut self);

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub(crate) struct LeafCore<C: Codec> {
    binding: Option<Binding<C::Value>>,
    options: C::Options,
    start: C::Value,
    end: C::Value,
    change: C::Value,
}

impl<C: Codec> LeafCore<C> {
    pub fn new(binding: Binding<C::Value>, end: C::Value, options: C::Options) -> Self {
        Self {
            binding: Some(binding),
            options,
            start: C::Value::default(),
            end,
            change: C::Value::default(),
        }
    }

    /// Core with no target yet, bound later through [`rebind`](Self::rebind)
    pub fn unbound() -> Self {
        Self {
            binding: None,
            options: C::Options::default(),
            start: C::Value::default(),
            end: C::Value::default(),
            change: C::Value::default(),
        }
    }

    /// Point a recycled core at a new target
    pub fn rebind(&mut self, binding: Binding<C::Value>, end: C::Value, options: C::Options) {
        self.binding = Some(binding);
        self.options = options;
        self.start = C::Value::default();
        self.end = end;
        self.change = C::Value::default();
    }

    fn binding(&self) -> Result<&Binding<C::Value>> {
        self.binding.as_ref().ok_or(TweenError::LiveReferenceLost)
    }
}

impl<C: Codec> LeafDriver for LeafCore<C> {
    fn codec_id(&self) -> CodecId {
        C::ID
    }

    fn startup(&mut self, params: &StartupParams) -> Result<f32> {
        let live = C::convert(&self.binding()?.get()?);
        if params.is_from {
            // The live value becomes the destination, the configured one the origin
            let origin = if params.is_relative {
                C::offset(&live, &self.end, 1.0)
            } else {
                self.end.clone()
            };
            self.end = live;
            self.start = origin;
        } else {
            if params.is_relative {
                self.end = C::offset(&live, &self.end, 1.0);
            }
            self.start = live;
        }
        self.change = C::change(&self.start, &self.end);
        Ok(C::magnitude(&self.change))
    }

    fn apply(&mut self, params: &ApplyParams) -> Result<()> {
        let eased = params
            .ease
            .evaluate(params.elapsed, params.duration, params.overshoot, params.period);
        let value = if params.increments != 0.0 {
            let start = C::offset(&self.start, &self.change, params.increments);
            C::interpolate(&self.options, &start, &self.change, eased)
        } else {
            C::interpolate(&self.options, &self.start, &self.change, eased)
        };
        self.binding()?.set(value)
    }

    fn release(&mut self) {
        self.binding = None;
        self.start = C::Value::default();
        self.end = C::Value::default();
        self.change = C::Value::default();
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::{Lerp, LerpOptions};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn apply_at(core: &mut LeafCore<Lerp<f32>>, elapsed: f32, increments: f32) {
        core.apply(&ApplyParams {
            elapsed,
            duration: 1.0,
            ease: Ease::Linear,
            overshoot: 0.0,
            period: 0.0,
            increments,
        })
        .unwrap();
    }

    #[test]
    fn test_startup_reads_live_value() {
        let target = Rc::new(RefCell::new(10.0f32));
        let mut core = LeafCore::<Lerp<f32>>::new(Binding::weak(&target), 20.0, LerpOptions::default());
        let magnitude = core
            .startup(&StartupParams {
                is_relative: false,
                is_from: false,
            })
            .unwrap();
        assert_eq!(magnitude, 10.0);

        apply_at(&mut core, 0.5, 0.0);
        assert_eq!(*target.borrow(), 15.0);
    }

    #[test]
    fn test_relative_and_from() {
        let target = Rc::new(RefCell::new(10.0f32));
        let mut core = LeafCore::<Lerp<f32>>::new(Binding::weak(&target), 5.0, LerpOptions::default());
        core.startup(&StartupParams {
            is_relative: true,
            is_from: false,
        })
        .unwrap();
        apply_at(&mut core, 1.0, 0.0);
        assert_eq!(*target.borrow(), 15.0);

        let target = Rc::new(RefCell::new(10.0f32));
        let mut core = LeafCore::<Lerp<f32>>::new(Binding::weak(&target), 0.0, LerpOptions::default());
        core.startup(&StartupParams {
            is_relative: false,
            is_from: true,
        })
        .unwrap();
        apply_at(&mut core, 0.0, 0.0);
        assert_eq!(*target.borrow(), 0.0);
        apply_at(&mut core, 1.0, 0.0);
        assert_eq!(*target.borrow(), 10.0);
    }

    #[test]
    fn test_increments_offset_start() {
        let target = Rc::new(RefCell::new(0.0f32));
        let mut core = LeafCore::<Lerp<f32>>::new(Binding::weak(&target), 2.0, LerpOptions::default());
        core.startup(&StartupParams {
            is_relative: false,
            is_from: false,
        })
        .unwrap();
        apply_at(&mut core, 0.5, 2.0);
        assert_eq!(*target.borrow(), 5.0);
    }

    #[test]
    fn test_lost_target_fails() {
        let target = Rc::new(RefCell::new(0.0f32));
        let mut core = LeafCore::<Lerp<f32>>::new(Binding::weak(&target), 1.0, LerpOptions::default());
        drop(target);
        let result = core.startup(&StartupParams {
            is_relative: false,
            is_from: false,
        });
        assert!(matches!(result, Err(TweenError::LiveReferenceLost)));

        core.release();
        assert!(core.binding().is_err());
        assert!(LeafCore::<Lerp<f32>>::unbound().binding().is_err());
    }
}
