// Audio capture and WAV decode errors

use std::fmt;

/// Errors from the capture subsystem and WAV collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// No matching audio input device was found.
    NoInputDevice { name: Option<String> },

    /// Failed to open the input stream.
    StreamOpenFailed { reason: String },

    /// The input stream reported an error while running.
    StreamFailure { reason: String },

    /// The recognizer is already capturing.
    AlreadyRunning,

    /// The recognizer is not capturing.
    NotRunning,

    /// A fixed-duration recording delivered fewer samples than requested.
    ShortCapture { expected: usize, captured: usize },

    /// A WAV file could not be read or decoded.
    Wav { path: String, reason: String },
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::NoInputDevice { name: Some(name) } => {
                write!(f, "no input device named '{}'", name)
            }
            AudioError::NoInputDevice { name: None } => {
                write!(f, "no default input device available")
            }
            AudioError::StreamOpenFailed { reason } => {
                write!(f, "failed to open input stream: {}", reason)
            }
            AudioError::StreamFailure { reason } => {
                write!(f, "input stream failed: {}", reason)
            }
            AudioError::AlreadyRunning => {
                write!(f, "recognizer is already running; stop it first")
            }
            AudioError::NotRunning => {
                write!(f, "recognizer is not running")
            }
            AudioError::ShortCapture { expected, captured } => {
                write!(
                    f,
                    "capture ended early: got {} of {} samples",
                    captured, expected
                )
            }
            AudioError::Wav { path, reason } => {
                write!(f, "cannot read WAV '{}': {}", path, reason)
            }
        }
    }
}

impl std::error::Error for AudioError {}
