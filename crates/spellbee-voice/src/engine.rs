//! Collaborator seams: the speech-to-text engine, the speech synthesizer and the
//! presentation surface.
//!
//! Engines push [`EngineEvent`]s into the sender handed to [`RecognitionEngine::start`].
//! Each start gets a fresh channel; dropping the receiving side is the unsubscribe.

use crate::error::VoiceResult;
use crate::phase::GamePhase;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

/// What the recognizer is listening for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecognitionMode {
    /// Free speech: trigger phrases, answers, "next".
    FreeText,
    /// Letter-by-letter spelling; only `[A-Z]` is committed.
    LettersOnly,
}

impl RecognitionMode {
    pub fn is_letters(self) -> bool {
        matches!(self, RecognitionMode::LettersOnly)
    }
}

/// One ranked hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionAlternative {
    pub transcript: String,
    /// Engine confidence in `[0, 1]`.
    pub confidence: f32,
}

impl RecognitionAlternative {
    pub fn new(transcript: impl Into<String>, confidence: f32) -> Self {
        Self {
            transcript: transcript.into(),
            confidence,
        }
    }
}

/// One recognition event as pushed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// Ranked best-first.
    pub alternatives: Vec<RecognitionAlternative>,
    pub is_final: bool,
    /// Position of this result within the engine session.
    pub sequence_index: i64,
}

impl RecognitionResult {
    /// Final result with a single hypothesis.
    pub fn final_text(transcript: impl Into<String>, sequence_index: i64) -> Self {
        Self {
            alternatives: vec![RecognitionAlternative::new(transcript, 1.0)],
            is_final: true,
            sequence_index,
        }
    }

    /// Interim (revisable) result with a single hypothesis.
    pub fn interim_text(transcript: impl Into<String>, sequence_index: i64) -> Self {
        Self {
            alternatives: vec![RecognitionAlternative::new(transcript, 1.0)],
            is_final: false,
            sequence_index,
        }
    }

    /// Add a lower-ranked hypothesis.
    pub fn with_alternative(mut self, transcript: impl Into<String>, confidence: f32) -> Self {
        self.alternatives
            .push(RecognitionAlternative::new(transcript, confidence));
        self
    }
}

/// Failures the engine reports while running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineFailure {
    /// Nothing was heard before the engine gave up.
    NoSpeech,
    /// The engine aborted the stream.
    Aborted,
    /// Capture permission was refused.
    NotAllowed,
    /// Anything else (network, audio capture, ...).
    Other(String),
}

/// Events delivered on the session channel.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Result(RecognitionResult),
    Error(EngineFailure),
    /// The engine stopped on its own (e.g. silence timeout) or acknowledged a stop.
    Ended,
}

/// Why `RecognitionEngine::start` failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStartError {
    /// Engine is mid-transition (still stopping or already started). Retryable once.
    InvalidState,
    PermissionDenied(String),
    Unavailable(String),
}

pub type EngineEventSender = mpsc::UnboundedSender<EngineEvent>;

/// Options for one continuous, interim-enabled recognition stream.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionOptions {
    pub mode: RecognitionMode,
    pub language: String,
    pub max_alternatives: u8,
    pub continuous: bool,
    pub interim_results: bool,
}

/// External speech-to-text engine. Implement for the platform recognizer.
pub trait RecognitionEngine: Send {
    /// Begin streaming; results go to `events` until `stop` or the engine ends.
    fn start(
        &mut self,
        options: &RecognitionOptions,
        events: EngineEventSender,
    ) -> Result<(), EngineStartError>;

    /// Request the engine to stop. Must tolerate being called when idle.
    fn stop(&mut self);
}

/// External speech synthesizer. Resolves when speaking finished or failed.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, text: &str, rate: f32, pitch: f32) -> VoiceResult<()>;
}

/// Synthesizer that says nothing and completes immediately. Useful for headless runs.
#[derive(Debug, Default)]
pub struct SilentSynthesizer;

#[async_trait]
impl SpeechSynthesizer for SilentSynthesizer {
    async fn speak(&self, text: &str, _rate: f32, _pitch: f32) -> VoiceResult<()> {
        info!(text = %text, "silent synthesizer: skipping speech");
        Ok(())
    }
}

/// Snapshot handed to the presentation surface on every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewFrame {
    pub phase: GamePhase,
    pub word_index: usize,
    /// Committed text of the current phase.
    pub committed: String,
    /// Live, uncommitted hypothesis. Replaced by `status` when one is set.
    pub preview: String,
    /// Prompt and verdict text spoken for the current word.
    pub dialog: String,
    /// Remaining phase time as a percentage in `[0, 100]`.
    pub time_left_percent: f32,
    pub status: Option<String>,
}

/// Presentation collaborator. Rendering is entirely its concern.
pub trait QuizView: Send {
    fn render(&mut self, frame: &ViewFrame);
}

/// View that discards every frame.
#[derive(Debug, Default)]
pub struct NullView;

impl QuizView for NullView {
    fn render(&mut self, _frame: &ViewFrame) {}
}
