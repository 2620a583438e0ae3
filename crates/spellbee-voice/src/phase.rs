//! Quiz phases, the controller-owned game state, and the events it publishes.

use crate::accumulator::TranscriptAccumulator;
use crate::config::PhaseConfig;
use crate::engine::RecognitionMode;
use crate::vocabulary::WordEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One timed stage of the quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Learner talks about the word, may ask for details, may say the word.
    Answer,
    /// Learner spells the word letter by letter.
    Spell,
    /// Verdict spoken; waiting for "next".
    Wait,
}

impl GamePhase {
    pub fn duration(self, config: &PhaseConfig) -> Duration {
        let secs = match self {
            GamePhase::Answer => config.answer_secs,
            GamePhase::Spell => config.spell_secs,
            GamePhase::Wait => config.wait_secs,
        };
        Duration::from_secs(secs)
    }

    /// Recognition mode the phase listens in.
    pub fn recognition_mode(self) -> RecognitionMode {
        match self {
            GamePhase::Spell => RecognitionMode::LettersOnly,
            GamePhase::Answer | GamePhase::Wait => RecognitionMode::FreeText,
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GamePhase::Answer => "ANSWER",
            GamePhase::Spell => "SPELL",
            GamePhase::Wait => "WAIT",
        };
        f.write_str(name)
    }
}

/// Quiz position. Owned and mutated only by the phase controller.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub word_index: usize,
    pub phase: GamePhase,
    /// Accumulated tick time inside the current phase.
    pub elapsed: Duration,
    pub recognition_mode: RecognitionMode,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            word_index: 0,
            phase: GamePhase::Answer,
            elapsed: Duration::ZERO,
            recognition_mode: RecognitionMode::FreeText,
        }
    }
}

impl GameState {
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Enter `phase`, restarting its clock.
    pub fn enter(&mut self, phase: GamePhase) {
        self.phase = phase;
        self.elapsed = Duration::ZERO;
        self.recognition_mode = phase.recognition_mode();
    }

    /// Move to the next word, wrapping around.
    pub fn advance_word(&mut self, word_count: usize) {
        if word_count > 0 {
            self.word_index = (self.word_index + 1) % word_count;
        }
    }
}

/// Spoken cue asking for details about the current word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    PartOfSpeech,
    Pronunciation,
    Definition,
    Example,
}

impl Trigger {
    /// Evaluation order; the first match wins.
    pub const PRIORITY: [Trigger; 4] = [
        Trigger::PartOfSpeech,
        Trigger::Pronunciation,
        Trigger::Definition,
        Trigger::Example,
    ];

    pub fn phrases(self) -> &'static [&'static str] {
        match self {
            Trigger::PartOfSpeech => &["part of speech", "part"],
            Trigger::Pronunciation => &["repeat"],
            Trigger::Definition => &["definition"],
            Trigger::Example => &["example", "sentence"],
        }
    }

    /// The entry field this trigger reads out.
    pub fn field(self, entry: &WordEntry) -> &str {
        match self {
            Trigger::PartOfSpeech => &entry.part_of_speech,
            Trigger::Pronunciation => &entry.pronunciation,
            Trigger::Definition => &entry.definition,
            Trigger::Example => &entry.example,
        }
    }

    /// Highest-priority trigger heard in the committed text.
    pub fn detect(accumulator: &TranscriptAccumulator) -> Option<Trigger> {
        Self::PRIORITY
            .into_iter()
            .find(|t| t.phrases().iter().any(|p| accumulator.includes(p)))
    }
}

/// Running tally for the current quiz run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub attempted: u32,
    pub correct: u32,
}

impl Scoreboard {
    pub fn record(&mut self, correct: bool) {
        self.attempted += 1;
        if correct {
            self.correct += 1;
        }
    }
}

/// Events published by the controller for outer observers.
#[derive(Debug, Clone)]
pub enum QuizEvent {
    PhaseEntered {
        phase: GamePhase,
        word_index: usize,
        timestamp: DateTime<Utc>,
    },

    /// A trigger phrase was answered during ANSWER.
    TriggerAnswered { trigger: Trigger, word_index: usize },

    /// SPELL finished.
    Verdict {
        word: String,
        spelled: String,
        correct: bool,
        timestamp: DateTime<Utc>,
    },

    /// Non-fatal condition shown to the learner (e.g. microphone refused).
    Status { message: String },

    /// The quiz stopped. `reason` is set when it stopped on a fatal error.
    Halted {
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entering_phase_resets_clock_and_mode() {
        let mut s = GameState {
            elapsed: Duration::from_secs(12),
            ..Default::default()
        };
        s.enter(GamePhase::Spell);
        assert_eq!(s.elapsed, Duration::ZERO);
        assert_eq!(s.recognition_mode, RecognitionMode::LettersOnly);
    }

    #[test]
    fn word_index_wraps() {
        let mut s = GameState {
            word_index: 2,
            ..Default::default()
        };
        s.advance_word(3);
        assert_eq!(s.word_index, 0);
    }

    #[test]
    fn trigger_priority_prefers_part_of_speech() {
        let mut acc = TranscriptAccumulator::default();
        acc.append("give me the definition and part of speech", 0, false);
        assert_eq!(Trigger::detect(&acc), Some(Trigger::PartOfSpeech));
    }

    #[test]
    fn sentence_maps_to_example() {
        let mut acc = TranscriptAccumulator::default();
        acc.append("use it in a sentence", 0, false);
        assert_eq!(Trigger::detect(&acc), Some(Trigger::Example));
        acc.clear();
        assert_eq!(Trigger::detect(&acc), None);
    }

    #[test]
    fn durations_follow_config() {
        let c = PhaseConfig::default();
        assert_eq!(GamePhase::Answer.duration(&c), Duration::from_secs(60));
        assert_eq!(GamePhase::Spell.duration(&c), Duration::from_secs(20));
        assert_eq!(GamePhase::Wait.duration(&c), Duration::from_secs(10));
        assert_eq!(GamePhase::Wait.to_string(), "WAIT");
    }
}
