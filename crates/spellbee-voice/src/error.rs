//! Error types for the spelling quiz

use thiserror::Error;

/// Result type alias for quiz operations
pub type VoiceResult<T> = Result<T, VoiceError>;

/// Errors that can surface from the recognition session or the phase controller.
///
/// Transient engine conditions (no speech, unsolicited end, start races) are absorbed
/// inside `RecognitionSession` and never show up here.
#[derive(Error, Debug)]
pub enum VoiceError {
    /// No usable recognition capability. Fatal to the whole quiz.
    #[error("Speech engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Microphone access refused. Blocks listening, never the controller.
    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Vocabulary is empty")]
    EmptyVocabulary,

    #[error("Channel send error: {0}")]
    ChannelSend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config load error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VoiceError {
    /// Whether this error must halt the quiz.
    pub fn is_fatal(&self) -> bool {
        matches!(self, VoiceError::EngineUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_engine_unavailable_is_fatal() {
        assert!(VoiceError::EngineUnavailable("gone".into()).is_fatal());
        assert!(!VoiceError::PermissionDenied("no mic".into()).is_fatal());
        assert!(!VoiceError::Synthesis("voice missing".into()).is_fatal());
    }
}
