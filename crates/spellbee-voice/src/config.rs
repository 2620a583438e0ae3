//! Quiz configuration: phase clocks, recognition tuning and speech parameters.
//!
//! Load order: serde defaults, then an optional file (`SPELLBEE_CONFIG`, default
//! `config/spellbee` with the extension inferred), then `SPELLBEE__*` environment
//! variables, e.g. `SPELLBEE__PHASES__SPELL_SECS=30`.

use crate::error::{VoiceError, VoiceResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Durations of the three quiz phases and the scheduler tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    /// ANSWER phase length in seconds (default: 60)
    pub answer_secs: u64,
    /// SPELL phase length in seconds (default: 20)
    pub spell_secs: u64,
    /// WAIT phase length in seconds (default: 10)
    pub wait_secs: u64,
    /// Poll tick period in milliseconds (default: 250)
    pub tick_ms: u64,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            answer_secs: 60,
            spell_secs: 20,
            wait_secs: 10,
            tick_ms: 250,
        }
    }
}

impl PhaseConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Recognition session tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// BCP-47 language handed to the engine (default: "en-US")
    pub language: String,
    /// Ranked hypotheses requested per result (default: 5)
    pub max_alternatives: u8,
    /// Delay before restarting after no-speech or an unsolicited end (default: 350ms)
    pub restart_debounce_ms: u64,
    /// Maximum characters kept in the committed transcript (default: 200)
    pub transcript_cap: usize,
    /// Expand unmapped multi-letter tokens into their letters while spelling (default: false)
    pub expand_whole_words: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            max_alternatives: 5,
            restart_debounce_ms: 350,
            transcript_cap: 200,
            expand_whole_words: false,
        }
    }
}

impl RecognitionConfig {
    pub fn restart_debounce(&self) -> Duration {
        Duration::from_millis(self.restart_debounce_ms)
    }
}

/// Speech synthesis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub rate: f32,
    pub pitch: f32,
    /// Silence kept after synthesis completes before listening resumes (default: 400ms)
    pub trailing_buffer_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            trailing_buffer_ms: 400,
        }
    }
}

impl SpeechConfig {
    pub fn trailing_buffer(&self) -> Duration {
        Duration::from_millis(self.trailing_buffer_ms)
    }
}

/// Top-level quiz configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    pub phases: PhaseConfig,
    pub recognition: RecognitionConfig,
    pub speech: SpeechConfig,
    /// JSON array of word entries. The daemon falls back to a built-in list when unset.
    pub vocabulary_path: Option<PathBuf>,
}

impl QuizConfig {
    /// Load config from file and environment. Precedence: env > `SPELLBEE_CONFIG` file > defaults.
    pub fn load() -> VoiceResult<Self> {
        let config_path =
            std::env::var("SPELLBEE_CONFIG").unwrap_or_else(|_| "config/spellbee".to_string());

        let built = config::Config::builder()
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(config::Environment::with_prefix("SPELLBEE").separator("__"))
            .build()?;

        let loaded: Self = built.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject values that would stall or spin the controller.
    pub fn validate(&self) -> VoiceResult<()> {
        let phases = &self.phases;
        if phases.answer_secs == 0 || phases.spell_secs == 0 || phases.wait_secs == 0 {
            return Err(VoiceError::Config(format!(
                "phase durations must be positive (answer {}s, spell {}s, wait {}s)",
                phases.answer_secs, phases.spell_secs, phases.wait_secs
            )));
        }
        if phases.tick_ms == 0 {
            return Err(VoiceError::Config("tick_ms must be positive".to_string()));
        }
        if self.recognition.transcript_cap == 0 {
            return Err(VoiceError::Config(
                "transcript_cap must be positive".to_string(),
            ));
        }
        if self.recognition.max_alternatives == 0 {
            return Err(VoiceError::Config(
                "max_alternatives must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
