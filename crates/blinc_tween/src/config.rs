//! Scheduler configuration presets

use crate::easing::{Ease, DEFAULT_OVERSHOOT};
use crate::error::Result;
use crate::tween::LoopType;
use serde::{Deserialize, Serialize};

/// Configuration for a [`TweenScheduler`](crate::TweenScheduler)
///
/// Capacities are soft limits: the registry grows past them (logging once)
/// rather than refusing a tween. The `default_*` fields seed every newly
/// created or recycled tween before the builder runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Expected number of concurrent leaf tweens
    pub max_leaves: usize,
    /// Expected number of concurrent sequences
    pub max_sequences: usize,
    /// Ease applied to new leaf tweens
    pub default_ease: Ease,
    /// Back overshoot / elastic amplitude applied to new tweens
    pub default_overshoot: f32,
    /// Elastic period applied to new tweens (0 = curve default)
    pub default_period: f32,
    /// Loop type used when loops are set without an explicit type
    pub default_loop_type: LoopType,
    /// Whether tweens are killed automatically on completion
    pub default_auto_kill: bool,
    /// Whether tweens start playing on the first tick
    pub default_auto_play: bool,
    /// Whether killed tweens go back to the pool
    pub default_recyclable: bool,
    /// Global multiplier applied to every tick delta
    pub time_scale: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl SchedulerConfig {
    /// Standard configuration for general use.
    pub fn standard() -> Self {
        Self {
            max_leaves: 200,
            max_sequences: 50,
            default_ease: Ease::OutQuad,
            default_overshoot: DEFAULT_OVERSHOOT,
            default_period: 0.0,
            default_loop_type: LoopType::Restart,
            default_auto_kill: true,
            default_auto_play: true,
            default_recyclable: true,
            time_scale: 1.0,
        }
    }

    /// Pre-sized for scenes that run thousands of tweens at once.
    pub fn high_capacity() -> Self {
        Self {
            max_leaves: 3_125,
            max_sequences: 500,
            ..Self::standard()
        }
    }

    /// Testing configuration: linear easing and no pooling surprises.
    pub fn testing() -> Self {
        Self {
            max_leaves: 16,
            max_sequences: 4,
            default_ease: Ease::Linear,
            ..Self::standard()
        }
    }

    /// Set the expected tween capacities.
    pub fn with_capacity(mut self, leaves: usize, sequences: usize) -> Self {
        self.max_leaves = leaves;
        self.max_sequences = sequences;
        self
    }

    /// Set the default ease.
    pub fn with_default_ease(mut self, ease: Ease) -> Self {
        self.default_ease = ease;
        self
    }

    /// Set the default loop type.
    pub fn with_default_loop_type(mut self, loop_type: LoopType) -> Self {
        self.default_loop_type = loop_type;
        self
    }

    /// Enable or disable auto-kill for new tweens.
    pub fn with_auto_kill(mut self, auto_kill: bool) -> Self {
        self.default_auto_kill = auto_kill;
        self
    }

    /// Enable or disable auto-play for new tweens.
    pub fn with_auto_play(mut self, auto_play: bool) -> Self {
        self.default_auto_play = auto_play;
        self
    }

    /// Enable or disable recycling for new tweens.
    pub fn with_recyclable(mut self, recyclable: bool) -> Self {
        self.default_recyclable = recyclable;
        self
    }

    /// Set the global time scale.
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// Parse a configuration from TOML. Missing keys keep their standard value.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to a TOML string
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SchedulerConfig::from_toml_str(
            r#"
            max_leaves = 1000
            default_ease = "InOutSine"
            default_loop_type = "Yoyo"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_leaves, 1000);
        assert_eq!(config.max_sequences, 50);
        assert_eq!(config.default_ease, Ease::InOutSine);
        assert_eq!(config.default_loop_type, LoopType::Yoyo);
        assert!(config.default_auto_kill);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SchedulerConfig::high_capacity().with_time_scale(0.5);
        let text = config.to_toml_string().unwrap();
        assert_eq!(SchedulerConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_toml() {
        assert!(SchedulerConfig::from_toml_str("max_leaves = \"lots\"").is_err());
    }
}
