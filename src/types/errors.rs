//! Error types for radarmatch.
//!
//! Score validation never produces errors: malformed scores are corrected
//! and reported as [`ValidationIssue`](crate::score::ValidationIssue) data.
//! The variants here cover configuration, I/O, storage and the per-request
//! render failures that the scheduler catches and logs.

use thiserror::Error;

/// Default result type for radarmatch.
pub type RadarResult<T> = Result<T, RadarError>;

/// Errors raised by radarmatch.
#[derive(Error, Debug)]
pub enum RadarError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Render failed for '{0}': {1}")]
    Render(String, String),

    #[error("Could not attach surface to '{0}': {1}")]
    Mount(String, String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Render service is no longer running")]
    ServiceStopped,

    #[error("{0}")]
    Other(String),
}

impl RadarError {
    /// Creates a generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Creates a configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a render failure for a target.
    pub fn render<T: Into<String>, S: Into<String>>(target: T, msg: S) -> Self {
        Self::Render(target.into(), msg.into())
    }

    /// Creates a mount failure for a target.
    pub fn mount<T: Into<String>, S: Into<String>>(target: T, msg: S) -> Self {
        Self::Mount(target.into(), msg.into())
    }

    /// Creates a storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// True for the failures that stay inside a single render request.
    pub fn is_render_failure(&self) -> bool {
        matches!(self, Self::Render(..) | Self::Mount(..))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_failure_classification() {
        assert!(RadarError::render("card-1", "boom").is_render_failure());
        assert!(RadarError::mount("card-1", "detached").is_render_failure());
        assert!(!RadarError::config("bad").is_render_failure());
        assert!(!RadarError::ServiceStopped.is_render_failure());
    }

    #[test]
    fn test_display_includes_target() {
        let err = RadarError::render("card-7", "surface too small");
        assert_eq!(
            err.to_string(),
            "Render failed for 'card-7': surface too small"
        );
    }
}
