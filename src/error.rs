//! Error types for the translation pipeline.
//!
//! Every error here is recovered at the session or HTTP boundary. None of them
//! are fatal: the popup stays usable after any single failure.

use thiserror::Error;

/// Outcome classification for a translation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// Source text was empty after trimming; nothing was sent.
    #[error("nothing to translate")]
    EmptyInput,

    /// Another translation is still pending in this session.
    #[error("a translation is already in progress")]
    AlreadyInProgress,

    /// The provider answered with a non-200 `responseStatus`.
    #[error("translation API error: {detail}")]
    Api { detail: String },

    /// No response, or a response that could not be decoded.
    #[error("connection error: {0}")]
    Connection(String),
}

impl TranslateError {
    /// Errors that callers drop without telling the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::AlreadyInProgress)
    }

    /// Status text shown to the user, `None` for silent errors.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::EmptyInput | Self::AlreadyInProgress => None,
            Self::Api { detail } => Some(format!("API error: {}", detail)),
            Self::Connection(_) => Some("Connection error. Check your internet.".to_string()),
        }
    }
}

/// Failures of the persistent key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The backing store could not be reached (read or write).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A stored value exists but has the wrong shape.
    #[error("stored value for '{key}' is invalid: {reason}")]
    Corrupt { key: String, reason: String },

    /// A value could not be encoded for writing. Nothing was written.
    #[error("failed to encode value for '{key}': {reason}")]
    Serialize { key: String, reason: String },
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "Error: storage unavailable.",
            Self::Corrupt { .. } => "Error loading history.",
            Self::Serialize { .. } => "Error saving data.",
        }
    }
}

/// Failures reported by speech recognition or synthesis engines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("speech service network error")]
    Network,

    #[error("no speech detected")]
    NoSpeech,

    #[error("speech not recognized")]
    NoMatch,

    #[error("speech engine not available")]
    Unsupported,

    #[error("nothing to speak")]
    NothingToSpeak,

    #[error("audio playback failed: {0}")]
    Playback(String),

    #[error("speech error: {0}")]
    Other(String),
}

impl SpeechError {
    /// Classify a recognition engine error code.
    pub fn from_code(code: &str) -> Self {
        match code {
            "not-allowed" | "permission-denied" => Self::PermissionDenied,
            "network" => Self::Network,
            "no-speech" => Self::NoSpeech,
            "no-match" => Self::NoMatch,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied => "Microphone permission required.".to_string(),
            Self::Network => "Network error. Check your internet.".to_string(),
            Self::NoSpeech => "Error: no speech detected.".to_string(),
            Self::NoMatch => "Didn't catch that. Try again.".to_string(),
            Self::Unsupported => "Speech recognition is not supported here.".to_string(),
            Self::NothingToSpeak => "Nothing to listen to.".to_string(),
            Self::Playback(_) => "Error playing audio.".to_string(),
            Self::Other(code) => format!("Voice error: {}", code),
        }
    }
}
