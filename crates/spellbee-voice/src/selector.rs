//! **AlternativeSelector** — pick the best hypothesis of one recognition event.
//!
//! Free text takes the engine's top-ranked transcript as-is. While spelling, every
//! hypothesis is decoded and scored so that a longer decode always outranks a shorter
//! one and confidence only breaks ties within the same length. Hypotheses that decode
//! to the same letters pool their scores, so agreement across the ranking beats a
//! single confident outlier.

use crate::engine::RecognitionResult;
use crate::phonetic::PhoneticDecoder;

/// Weight of one decoded letter. Larger than the maximum confidence bonus.
const LETTER_WEIGHT: u32 = 1000;
/// Confidence is scaled into `0..=CONFIDENCE_SCALE`.
const CONFIDENCE_SCALE: f32 = 100.0;

/// Outcome of selecting among the hypotheses of one result.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Text to commit or preview (decoded letters while spelling).
    pub text: String,
    /// Transcript the text was taken from.
    pub raw: String,
    pub confidence: f32,
}

impl Selection {
    fn empty() -> Self {
        Self {
            text: String::new(),
            raw: String::new(),
            confidence: 0.0,
        }
    }
}

struct Candidate {
    letters: String,
    score: u32,
    raw: String,
    confidence: f32,
}

/// Length-then-confidence score of one decode.
pub fn score(decoded_len: usize, confidence: f32) -> u32 {
    let bonus = (confidence.clamp(0.0, 1.0) * CONFIDENCE_SCALE).round() as u32;
    (decoded_len as u32).saturating_mul(LETTER_WEIGHT).saturating_add(bonus)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlternativeSelector {
    decoder: PhoneticDecoder,
}

impl AlternativeSelector {
    pub fn new(decoder: PhoneticDecoder) -> Self {
        Self { decoder }
    }

    pub fn decoder(&self) -> &PhoneticDecoder {
        &self.decoder
    }

    pub fn select(&self, result: &RecognitionResult, letter_mode: bool) -> Selection {
        if letter_mode {
            self.select_letters(result)
        } else {
            Self::select_top(result)
        }
    }

    fn select_top(result: &RecognitionResult) -> Selection {
        match result.alternatives.first() {
            Some(top) => Selection {
                text: top.transcript.trim().to_string(),
                raw: top.transcript.clone(),
                confidence: top.confidence,
            },
            None => Selection::empty(),
        }
    }

    fn select_letters(&self, result: &RecognitionResult) -> Selection {
        // Kept in first-seen order so ties go to the earlier decode.
        let mut candidates: Vec<Candidate> = Vec::with_capacity(result.alternatives.len());

        for alt in &result.alternatives {
            let letters = self.decoder.decode(&alt.transcript);
            let points = score(letters.len(), alt.confidence);
            match candidates.iter_mut().find(|c| c.letters == letters) {
                Some(existing) => existing.score = existing.score.saturating_add(points),
                None => candidates.push(Candidate {
                    letters,
                    score: points,
                    raw: alt.transcript.clone(),
                    confidence: alt.confidence,
                }),
            }
        }

        let mut best: Option<Candidate> = None;
        for candidate in candidates {
            let better = best.as_ref().map_or(true, |b| candidate.score > b.score);
            if better {
                best = Some(candidate);
            }
        }

        best.map_or_else(Selection::empty, |b| Selection {
            text: b.letters,
            raw: b.raw,
            confidence: b.confidence,
        })
    }
}
