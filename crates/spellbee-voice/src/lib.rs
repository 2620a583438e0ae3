//! # Spellbee Voice - Voice-driven spelling quiz
//!
//! Listens to ranked speech-recognition hypotheses, decodes them into free text or a
//! letter-by-letter spelling, and runs a timed three-phase quiz over a fixed word list.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                         Phase Controller                          │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────────┐   │
//! │  │ Engine events│→ │  Alternative │→ │ Phonetic decoder       │   │
//! │  │  (mpsc)      │  │  selector    │  │ (letters mode only)    │   │
//! │  └──────────────┘  └──────────────┘  └────────────────────────┘   │
//! │                                               ↓                   │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────────┐   │
//! │  │ Synthesizer  │← │ ANSWER/SPELL │← │ Transcript accumulator │   │
//! │  │  (prompts)   │  │ /WAIT tick   │  │ (dedup, capped)        │   │
//! │  └──────────────┘  └──────────────┘  └────────────────────────┘   │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The speech engine, the synthesizer and the view are collaborators behind the
//! traits in [`engine`].

pub mod accumulator;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod phase;
pub mod phonetic;
pub mod runner;
pub mod selector;
pub mod session;
pub mod vocabulary;

pub use accumulator::TranscriptAccumulator;
pub use config::{PhaseConfig, QuizConfig, RecognitionConfig, SpeechConfig};
pub use controller::PhaseController;
pub use engine::{
    EngineEvent, EngineEventSender, EngineFailure, EngineStartError, NullView, QuizView,
    RecognitionAlternative, RecognitionEngine, RecognitionMode, RecognitionOptions,
    RecognitionResult, SilentSynthesizer, SpeechSynthesizer, ViewFrame,
};
pub use error::{VoiceError, VoiceResult};
pub use phase::{GamePhase, GameState, QuizEvent, Scoreboard, Trigger};
pub use phonetic::PhoneticDecoder;
pub use runner::{control_channel, run_quiz, spawn_quiz, ControlCommand, QuizHandle};
pub use selector::{AlternativeSelector, Selection};
pub use session::RecognitionSession;
pub use vocabulary::{load_vocabulary, parse_vocabulary, WordEntry};
