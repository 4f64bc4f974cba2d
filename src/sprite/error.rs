//! Sprite pipeline error types.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Failure of one load generation.
///
/// Cloneable so a single failure can be handed to every caller awaiting
/// the same generation.
#[derive(Debug, Clone, Error)]
pub enum SpriteError {
    #[error("IO error when reading `{}`", .0.display())]
    Io(PathBuf, #[source] Arc<std::io::Error>),

    #[error("failed to decode image `{path}`: {reason}", path = .0.display(), reason = .1)]
    Decode(PathBuf, String),

    #[error("packing failed: {0}")]
    Pack(String),

    #[error("failed to encode sprite sheet: {0}")]
    Encode(String),

    #[error("failed to emit `{0}`")]
    Emit(String, #[source] Arc<std::io::Error>),

    #[error("background task failed: {0}")]
    Task(String),
}

impl SpriteError {
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io(path.into(), Arc::new(err))
    }
}

impl From<tokio::task::JoinError> for SpriteError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_sprite_error_display() {
        let err = SpriteError::io("icons/a.png", Error::new(ErrorKind::NotFound, "gone"));
        let display = format!("{err}");
        assert!(display.contains("IO error"));
        assert!(display.contains("icons/a.png"));

        let err = SpriteError::Decode(PathBuf::from("bad.png"), "truncated".into());
        assert_eq!(
            format!("{err}"),
            "failed to decode image `bad.png`: truncated"
        );
    }

    #[test]
    fn test_sprite_error_clone_shares_source() {
        let err = SpriteError::io("a.png", Error::other("boom"));
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
