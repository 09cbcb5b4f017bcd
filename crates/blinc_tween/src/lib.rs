//! Blinc Tween System
//!
//! Tick-driven tweens and sequences, driven by a host clock.
//!
//! # Features
//!
//! - **Tweens**: Interpolate any bound value towards an end value with easing
//! - **Loops**: Restart, yoyo and incremental loops, finite or endless
//! - **Sequences**: Compose tweens and callbacks on a timeline, nestable
//! - **Seeking**: `goto` lands on the same state as ticking there
//! - **Deferred kills**: Callbacks can kill anything, including the caller
//! - **Pooling**: Killed tweens are recycled per value codec
//!
//! The scheduler is single-threaded and owns every tween. Targets are
//! reached through [`Binding`]s, so a tween whose target is dropped kills
//! itself on its next update.
//!
//! ```ignore
//! use blinc_tween::{Binding, Ease, LoopType, SchedulerConfig, TweenScheduler};
//!
//! let mut scheduler = TweenScheduler::new(SchedulerConfig::standard());
//! let x = Rc::new(RefCell::new(0.0f32));
//!
//! scheduler
//!     .to(Binding::weak(&x), 100.0, 0.5)
//!     .ease(Ease::OutBack)
//!     .loops(2)
//!     .loop_type(LoopType::Yoyo)
//!     .build()?;
//!
//! scheduler.tick(1.0 / 60.0, 1.0 / 60.0);
//! ```

pub mod builder;
pub mod config;
pub mod easing;
pub mod error;
mod leaf;
pub mod pool;
mod resolve;
pub mod scheduler;
mod sequence;
mod state;
pub mod tween;
pub mod values;


pub use builder::{SequenceBuilder, TweenBuilder};
pub use config::SchedulerConfig;
pub use easing::{Ease, DEFAULT_OVERSHOOT};
pub use error::{Result, TweenError};
pub use pool::TweenCounts;
pub use resolve::{orient, Orientation};
pub use scheduler::{TweenFilter, TweenScheduler};
pub use tween::{LoopType, TweenCallback, TweenId, INFINITE_LOOPS};
pub use values::{Binding, Codec, CodecId, Color, IntCodec, Lerp, LerpOptions, Tweenable, Vec2, Vec3};
