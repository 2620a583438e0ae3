//! **TranscriptAccumulator** — committed text of the current phase.
//!
//! Engines may redeliver final results they already reported, so anything at or
//! below the last processed sequence index is ignored. The buffer keeps only the
//! most recent `cap` characters.

use tracing::debug;

/// Default cap on committed characters.
pub const DEFAULT_CAP: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptAccumulator {
    finalized: String,
    last_processed_index: i64,
    cap: usize,
}

impl Default for TranscriptAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_CAP)
    }
}

impl TranscriptAccumulator {
    pub fn new(cap: usize) -> Self {
        Self {
            finalized: String::new(),
            last_processed_index: -1,
            cap: cap.max(1),
        }
    }

    /// Commit a selected candidate. Returns false when the index was already processed.
    pub fn append(&mut self, candidate: &str, sequence_index: i64, letter_mode: bool) -> bool {
        if sequence_index <= self.last_processed_index {
            debug!(
                sequence_index,
                last = self.last_processed_index,
                "skipping already processed result"
            );
            return false;
        }

        if letter_mode {
            self.finalized
                .extend(candidate.chars().filter(|c| c.is_ascii_uppercase()));
        } else {
            let joined = format!("{} {}", self.finalized, candidate);
            self.finalized = joined.trim().to_string();
        }
        self.last_processed_index = sequence_index;
        self.enforce_cap();
        true
    }

    /// Committed text, trimmed, keeping the most recent `cap` characters.
    pub fn text(&self) -> String {
        tail_chars(self.finalized.trim(), self.cap).to_string()
    }

    /// Case-insensitive containment over [`text`](Self::text).
    pub fn includes(&self, needle: &str) -> bool {
        self.text()
            .to_lowercase()
            .contains(&needle.to_lowercase())
    }

    pub fn clear(&mut self) {
        self.finalized.clear();
        self.last_processed_index = -1;
    }

    /// Forget the dedup position but keep the text. Engine sessions number results from 0.
    pub fn begin_engine_session(&mut self) {
        self.last_processed_index = -1;
    }

    pub fn last_processed_index(&self) -> i64 {
        self.last_processed_index
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn is_empty(&self) -> bool {
        self.finalized.trim().is_empty()
    }

    fn enforce_cap(&mut self) {
        let kept = tail_chars(&self.finalized, self.cap);
        if kept.len() != self.finalized.len() {
            self.finalized = kept.to_string();
        }
    }
}

/// Last `n` characters of `s`, respecting char boundaries.
fn tail_chars(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    match s.char_indices().nth(count - n) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}
