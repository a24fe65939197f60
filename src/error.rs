//! Error taxonomy shared across the player core.
//!
//! Nothing here is fatal to the process: tag I/O failures are caught at the
//! track boundary, pipeline errors surface as notifications and stop the
//! track, and scrobble failures are logged. Callers degrade a failing track
//! to an unplayable/untaggable item instead of aborting the session.

use thiserror::Error;

/// Common result type for player operations.
pub type Result<T> = std::result::Result<T, PlayerError>;

#[derive(Error, Debug)]
pub enum PlayerError {
    /// Operation is not meaningful for this track kind (e.g. writing tags
    /// to a CD track).
    #[error("operation not supported: {0}")]
    UnsupportedOperation(&'static str),

    /// No tag reader/writer is available for this file format.
    #[error("no tag handler for format: {0}")]
    UnsupportedFormat(String),

    /// Seek or volume value outside the accepted bounds.
    #[error("value out of range: {0}")]
    OutOfRange(String),

    /// Filesystem or network access failure while reading/writing tags or
    /// resolving a playlist URL.
    #[error("i/o failure: {0}")]
    IoFailure(String),

    /// The media engine reported an error event.
    #[error("pipeline error: {0}")]
    Pipeline(String),
}

impl From<std::io::Error> for PlayerError {
    fn from(err: std::io::Error) -> Self {
        PlayerError::IoFailure(err.to_string())
    }
}

impl From<reqwest::Error> for PlayerError {
    fn from(err: reqwest::Error) -> Self {
        PlayerError::IoFailure(err.to_string())
    }
}

impl From<lofty::error::LoftyError> for PlayerError {
    fn from(err: lofty::error::LoftyError) -> Self {
        PlayerError::IoFailure(err.to_string())
    }
}
