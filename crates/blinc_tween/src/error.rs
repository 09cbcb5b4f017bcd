//! Error types for blinc_tween

use thiserror::Error;

/// Errors surfaced by the tween scheduler
///
/// Only creation and configuration loading return these to the caller.
/// A [`TweenError::LiveReferenceLost`] raised while ticking is logged and
/// turned into a kill of the offending tween; it never escapes `tick()`.
#[derive(Error, Debug)]
pub enum TweenError {
    /// The codec rejected the requested end value or options, or the
    /// duration was not a usable number
    #[error("Tween configuration rejected: {0}")]
    Configuration(String),

    /// The getter/setter target no longer resolves
    #[error("Tween target is no longer reachable")]
    LiveReferenceLost,

    /// Failed to parse a scheduler configuration
    #[error("Invalid scheduler config: {0}")]
    InvalidConfig(#[from] toml::de::Error),

    /// Failed to serialize a scheduler configuration
    #[error("Failed to serialize scheduler config: {0}")]
    SerializeConfig(#[from] toml::ser::Error),
}

impl TweenError {
    /// Shorthand for a [`TweenError::Configuration`] error
    pub fn configuration(message: impl Into<String>) -> Self {
        TweenError::Configuration(message.into())
    }
}

/// Result type for blinc_tween operations
pub type Result<T> = std::result::Result<T, TweenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TweenError::configuration("end value is NaN");
        assert_eq!(
            err.to_string(),
            "Tween configuration rejected: end value is NaN"
        );
        assert_eq!(
            TweenError::LiveReferenceLost.to_string(),
            "Tween target is no longer reachable"
        );
    }
}
