//! Vocabulary entries supplied once at startup and read-only afterwards.

use crate::error::{VoiceError, VoiceResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One quiz word with the fields the learner can ask for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordEntry {
    pub word: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub part_of_speech: String,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub pronunciation: String,
    #[serde(default)]
    pub difficulty: String,
}

impl WordEntry {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            definition: String::new(),
            part_of_speech: String::new(),
            example: String::new(),
            pronunciation: String::new(),
            difficulty: String::new(),
        }
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = definition.into();
        self
    }

    pub fn with_part_of_speech(mut self, part_of_speech: impl Into<String>) -> Self {
        self.part_of_speech = part_of_speech.into();
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = example.into();
        self
    }

    pub fn with_pronunciation(mut self, pronunciation: impl Into<String>) -> Self {
        self.pronunciation = pronunciation.into();
        self
    }
}

/// Parse a JSON array of entries. Entries with a blank word are rejected.
pub fn parse_vocabulary(json: &str) -> VoiceResult<Vec<WordEntry>> {
    let words: Vec<WordEntry> = serde_json::from_str(json)?;
    if let Some(pos) = words.iter().position(|w| w.word.trim().is_empty()) {
        return Err(VoiceError::Config(format!("vocabulary entry {} has no word", pos)));
    }
    if words.is_empty() {
        return Err(VoiceError::EmptyVocabulary);
    }
    Ok(words)
}

/// Read and parse a vocabulary file.
pub fn load_vocabulary(path: &Path) -> VoiceResult<Vec<WordEntry>> {
    let json = std::fs::read_to_string(path)?;
    parse_vocabulary(&json)
}
