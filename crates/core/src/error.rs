use std::time::Duration;

/// Error type for the encoder capability.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("ffmpeg/ffprobe binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffmpeg/ffprobe execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse ffprobe output: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("video file not found: {0}")]
    VideoNotFound(String),

    #[error("no video stream available for frame extraction")]
    MissingVideoStream,

    #[error("encoder produced no image at {0}")]
    EmptyOutput(String),

    #[error("image extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("image extraction cancelled")]
    Cancelled,
}

/// Error surfaced by the extraction planner.
///
/// Cancellation is kept apart from encoder failures so callers can skip
/// logging it as a real failure.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("image extraction cancelled")]
    Cancelled,

    #[error(transparent)]
    Encoding(EncodingError),
}

impl ExtractionError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<EncodingError> for ExtractionError {
    fn from(err: EncodingError) -> Self {
        match err {
            EncodingError::Cancelled => Self::Cancelled,
            other => Self::Encoding(other),
        }
    }
}
