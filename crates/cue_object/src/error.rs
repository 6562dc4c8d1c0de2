//! Cue error types

use thiserror::Error;

/// Errors raised while loading or validating a cue
///
/// Runtime requests (start, stop, toggle) never fail; rejected requests are
/// logged and observable through the cue state.
#[derive(Error, Debug)]
pub enum CueError {
    /// A configuration value breaks an invariant
    #[error("invalid cue config: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// Failed to read a cue file
    #[error("failed to read cue config: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a cue file
    #[error("failed to parse cue config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl CueError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        CueError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Audio playback errors reported by an [`AudioOutput`](crate::AudioOutput)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// The output does not know the requested clip
    #[error("audio clip not found: {0}")]
    ClipNotFound(String),
}

/// Result type for cue operations
pub type Result<T> = std::result::Result<T, CueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_display() {
        let err = CueError::invalid("loop_duration", "must be greater than 0, got -1");
        assert_eq!(
            err.to_string(),
            "invalid cue config: loop_duration must be greater than 0, got -1"
        );
    }

    #[test]
    fn test_audio_error_display() {
        let err = AudioError::ClipNotFound("chime".to_string());
        assert!(err.to_string().contains("chime"));
    }
}
