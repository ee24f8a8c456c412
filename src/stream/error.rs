//! Streaming error types

/// Error type for streaming state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// `start()` was called while already streaming
    AlreadyStreaming,
    /// `stop()` was called while idle
    NotStreaming,
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::AlreadyStreaming => write!(f, "Already streaming"),
            StreamError::NotStreaming => write!(f, "Not streaming"),
        }
    }
}

impl std::error::Error for StreamError {}
