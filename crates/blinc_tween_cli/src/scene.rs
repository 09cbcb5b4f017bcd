//! Scene files
//!
//! A scene is a set of float tracks, played side by side or chained into a
//! sequence:
//!
//! ```toml
//! mode = "sequence"
//! loops = 2
//! loop_type = "Yoyo"
//!
//! [[track]]
//! name = "x"
//! end = 100.0
//! duration = 0.5
//! ease = "OutBack"
//! ```

use anyhow::{Context, Result};
use blinc_tween::{Binding, Ease, LoopType, TweenId, TweenScheduler};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// How tracks are arranged
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneMode {
    /// Every track is a top-level tween
    #[default]
    Parallel,
    /// Tracks are appended to one sequence, in file order
    Sequence,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Scene {
    #[serde(default)]
    pub mode: SceneMode,
    /// Sequence loops (sequence mode only)
    #[serde(default = "default_loops")]
    pub loops: i32,
    /// Sequence loop type (sequence mode only)
    #[serde(default)]
    pub loop_type: LoopType,
    #[serde(default, rename = "track")]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Track {
    pub name: String,
    #[serde(default)]
    pub start: f32,
    pub end: f32,
    pub duration: f32,
    #[serde(default)]
    pub ease: Ease,
    #[serde(default = "default_loops")]
    pub loops: i32,
    #[serde(default)]
    pub loop_type: LoopType,
    #[serde(default)]
    pub delay: f32,
    /// Treat `end` as an offset from `start`
    #[serde(default)]
    pub relative: bool,
}

fn default_loops() -> i32 {
    1
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let scene: Scene =
            toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
        if scene.tracks.is_empty() {
            anyhow::bail!("{} defines no [[track]] entries", path.display());
        }
        Ok(scene)
    }

    /// Create the scene's tweens. Returns the live values in track order and
    /// the top-level handles driving them.
    pub fn spawn(&self, scheduler: &mut TweenScheduler) -> Result<(Vec<Rc<RefCell<f32>>>, Vec<TweenId>)> {
        let mut values = Vec::with_capacity(self.tracks.len());
        let mut ids = Vec::with_capacity(self.tracks.len());

        for track in &self.tracks {
            let value = Rc::new(RefCell::new(track.start));
            let id = scheduler
                .to(Binding::weak(&value), track.end, track.duration)
                .ease(track.ease)
                .loops(track.loops)
                .loop_type(track.loop_type)
                .delay(track.delay)
                .relative(track.relative)
                .auto_kill(false)
                .tag(track.name.clone())
                .build()
                .with_context(|| format!("Invalid track '{}'", track.name))?;
            values.push(value);
            ids.push(id);
        }

        if self.mode == SceneMode::Parallel {
            return Ok((values, ids));
        }

        let mut sequence = scheduler.sequence();
        for id in &ids {
            sequence = sequence.append(*id);
        }
        let sequence = sequence
            .loops(self.loops)
            .loop_type(self.loop_type)
            .auto_kill(false)
            .build()?;
        Ok((values, vec![sequence]))
    }
}
