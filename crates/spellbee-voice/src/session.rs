//! **RecognitionSession** — lifecycle wrapper around the external speech engine.
//!
//! Owns the engine handle and the phase accumulator. Every engine start opens a new
//! event channel and every stop drops its receiver, so results from an earlier run
//! can never land in a later one. Transient engine trouble (no speech, unsolicited
//! end, a start racing a stop) is absorbed here; only a dead engine or a refused
//! microphone reaches the caller.

use crate::accumulator::TranscriptAccumulator;
use crate::config::RecognitionConfig;
use crate::engine::{
    EngineEvent, EngineFailure, EngineStartError, RecognitionEngine, RecognitionMode,
    RecognitionOptions, RecognitionResult,
};
use crate::error::{VoiceError, VoiceResult};
use crate::phonetic::PhoneticDecoder;
use crate::selector::AlternativeSelector;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub struct RecognitionSession {
    engine: Box<dyn RecognitionEngine>,
    config: RecognitionConfig,
    selector: AlternativeSelector,
    accumulator: TranscriptAccumulator,

    // Subscription to the running engine; `None` while unsubscribed.
    events: Option<mpsc::UnboundedReceiver<EngineEvent>>,

    mode: RecognitionMode,
    active: bool,
    intends_to_run: bool,
    restart_at: Option<Instant>,
    preview: String,
}

impl RecognitionSession {
    pub fn new(engine: Box<dyn RecognitionEngine>, config: RecognitionConfig) -> Self {
        let decoder = PhoneticDecoder::with_word_expansion(config.expand_whole_words);
        Self {
            engine,
            selector: AlternativeSelector::new(decoder),
            accumulator: TranscriptAccumulator::new(config.transcript_cap),
            config,
            events: None,
            mode: RecognitionMode::FreeText,
            active: false,
            intends_to_run: false,
            restart_at: None,
            preview: String::new(),
        }
    }

    /// Start listening in `mode`. Already listening in the same mode is a no-op.
    pub fn start(&mut self, mode: RecognitionMode) -> VoiceResult<()> {
        if self.active && self.mode == mode {
            debug!(?mode, "recognition already active");
            self.intends_to_run = true;
            return Ok(());
        }
        if self.active {
            self.release_engine();
        }

        self.mode = mode;
        self.intends_to_run = true;
        self.restart_at = None;
        self.launch()
    }

    /// Stop listening and suppress auto-restart. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.intends_to_run = false;
        self.restart_at = None;
        if self.active {
            info!(mode = ?self.mode, "stopping recognition");
        }
        self.release_engine();
        self.preview.clear();
    }

    /// Drain every pending engine event.
    ///
    /// Only a refused microphone is reported; everything else is handled in place.
    pub fn pump(&mut self) -> VoiceResult<()> {
        loop {
            let event = match self.events.as_mut().map(|rx| rx.try_recv()) {
                Some(Ok(event)) => event,
                _ => break,
            };
            self.handle_event(event)?;
        }
        Ok(())
    }

    /// Perform a scheduled restart once its debounce has elapsed.
    pub fn poll_restart(&mut self) -> VoiceResult<()> {
        let Some(at) = self.restart_at else {
            return Ok(());
        };
        if Instant::now() < at {
            return Ok(());
        }
        self.restart_at = None;
        if !self.intends_to_run {
            return Ok(());
        }

        info!(mode = ?self.mode, "restarting recognition");
        self.release_engine();
        self.launch()
    }

    pub fn handle_event(&mut self, event: EngineEvent) -> VoiceResult<()> {
        match event {
            EngineEvent::Result(result) => self.handle_result(&result),
            EngineEvent::Error(EngineFailure::NotAllowed) => {
                warn!("engine reports capture not allowed");
                self.intends_to_run = false;
                self.restart_at = None;
                self.release_engine();
                return Err(VoiceError::PermissionDenied(
                    "speech capture not allowed".to_string(),
                ));
            }
            EngineEvent::Error(failure) => {
                match &failure {
                    EngineFailure::NoSpeech => debug!("no speech detected"),
                    other => warn!(failure = ?other, "transient engine failure"),
                }
                self.schedule_restart();
            }
            EngineEvent::Ended => {
                debug!("engine ended");
                self.active = false;
                self.events = None;
                self.schedule_restart();
            }
        }
        Ok(())
    }

    fn handle_result(&mut self, result: &RecognitionResult) {
        let letter_mode = self.mode.is_letters();
        let selection = self.selector.select(result, letter_mode);
        if result.is_final {
            let committed =
                self.accumulator
                    .append(&selection.text, result.sequence_index, letter_mode);
            if committed {
                debug!(
                    text = %selection.text,
                    raw = %selection.raw,
                    confidence = selection.confidence,
                    index = result.sequence_index,
                    "committed final result"
                );
            }
            self.preview.clear();
        } else {
            self.preview = selection.text;
        }
    }

    fn schedule_restart(&mut self) {
        if !self.intends_to_run || self.restart_at.is_some() {
            return;
        }
        let debounce = self.config.restart_debounce();
        debug!(debounce_ms = debounce.as_millis() as u64, "scheduling restart");
        self.restart_at = Some(Instant::now() + debounce);
    }

    fn launch(&mut self) -> VoiceResult<()> {
        let options = self.options();
        let (tx, rx) = mpsc::unbounded_channel();

        let first = self.engine.start(&options, tx.clone());
        let outcome = match first {
            Err(EngineStartError::InvalidState) => {
                warn!("engine busy on start; stopping and retrying once");
                self.engine.stop();
                self.engine.start(&options, tx)
            }
            other => other,
        };

        if let Err(e) = outcome {
            self.intends_to_run = false;
            self.active = false;
            self.events = None;
            return Err(match e {
                EngineStartError::PermissionDenied(msg) => VoiceError::PermissionDenied(msg),
                EngineStartError::Unavailable(msg) => VoiceError::EngineUnavailable(msg),
                EngineStartError::InvalidState => VoiceError::EngineUnavailable(
                    "engine stayed in an invalid state after retry".to_string(),
                ),
            });
        }

        self.events = Some(rx);
        self.active = true;
        self.accumulator.begin_engine_session();
        self.preview.clear();
        info!(mode = ?self.mode, language = %options.language, "recognition started");
        Ok(())
    }

    /// Stop the engine and unsubscribe without touching intent.
    fn release_engine(&mut self) {
        if self.active {
            self.engine.stop();
        }
        self.active = false;
        self.events = None;
    }

    fn options(&self) -> RecognitionOptions {
        RecognitionOptions {
            mode: self.mode,
            language: self.config.language.clone(),
            max_alternatives: self.config.max_alternatives,
            continuous: true,
            interim_results: true,
        }
    }

    pub fn accumulator(&self) -> &TranscriptAccumulator {
        &self.accumulator
    }

    pub fn accumulator_mut(&mut self) -> &mut TranscriptAccumulator {
        &mut self.accumulator
    }

    /// Live, uncommitted hypothesis of the current utterance.
    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn mode(&self) -> RecognitionMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn intends_to_run(&self) -> bool {
        self.intends_to_run
    }

    pub fn restart_pending(&self) -> bool {
        self.restart_at.is_some()
    }
}

impl Drop for RecognitionSession {
    fn drop(&mut self) {
        self.release_engine();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineEventSender;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct Shared {
        sender: Option<EngineEventSender>,
        starts: u32,
        stops: u32,
        start_plan: VecDeque<Result<(), EngineStartError>>,
    }

    #[derive(Clone, Default)]
    struct FakeEngine(Arc<Mutex<Shared>>);

    impl FakeEngine {
        fn push(&self, event: EngineEvent) {
            let shared = self.0.lock().unwrap();
            if let Some(tx) = &shared.sender {
                let _ = tx.send(event);
            }
        }

        fn plan(&self, outcome: Result<(), EngineStartError>) {
            self.0.lock().unwrap().start_plan.push_back(outcome);
        }

        fn starts(&self) -> u32 {
            self.0.lock().unwrap().starts
        }
    }

    impl RecognitionEngine for FakeEngine {
        fn start(
            &mut self,
            _options: &RecognitionOptions,
            events: EngineEventSender,
        ) -> Result<(), EngineStartError> {
            let mut shared = self.0.lock().unwrap();
            shared.starts += 1;
            let outcome = shared.start_plan.pop_front().unwrap_or(Ok(()));
            if outcome.is_ok() {
                shared.sender = Some(events);
            }
            outcome
        }

        fn stop(&mut self) {
            let mut shared = self.0.lock().unwrap();
            shared.stops += 1;
            shared.sender = None;
        }
    }

    fn session(engine: &FakeEngine) -> RecognitionSession {
        RecognitionSession::new(Box::new(engine.clone()), RecognitionConfig::default())
    }

    #[test]
    fn final_results_commit_and_interims_preview() {
        let engine = FakeEngine::default();
        let mut s = session(&engine);
        s.start(RecognitionMode::LettersOnly).unwrap();

        engine.push(EngineEvent::Result(RecognitionResult::interim_text("alpha", 0)));
        s.pump().unwrap();
        assert_eq!(s.preview(), "A");
        assert!(s.accumulator().is_empty());

        engine.push(EngineEvent::Result(RecognitionResult::final_text("alpha", 0)));
        s.pump().unwrap();
        assert_eq!(s.preview(), "");
        assert_eq!(s.accumulator().text(), "A");
    }

    #[test]
    fn same_mode_start_is_noop() {
        let engine = FakeEngine::default();
        let mut s = session(&engine);
        s.start(RecognitionMode::FreeText).unwrap();
        s.start(RecognitionMode::FreeText).unwrap();
        assert_eq!(engine.starts(), 1);
    }

    #[test]
    fn invalid_state_is_retried_once() {
        let engine = FakeEngine::default();
        engine.plan(Err(EngineStartError::InvalidState));
        let mut s = session(&engine);
        s.start(RecognitionMode::FreeText).unwrap();
        assert!(s.is_active());
        assert_eq!(engine.starts(), 2);
    }

    #[test]
    fn second_invalid_state_is_fatal() {
        let engine = FakeEngine::default();
        engine.plan(Err(EngineStartError::InvalidState));
        engine.plan(Err(EngineStartError::InvalidState));
        let mut s = session(&engine);
        let err = s.start(RecognitionMode::FreeText).unwrap_err();
        assert!(err.is_fatal());
        assert!(!s.intends_to_run());
    }

    #[test]
    fn permission_refusal_is_not_fatal() {
        let engine = FakeEngine::default();
        engine.plan(Err(EngineStartError::PermissionDenied("blocked".into())));
        let mut s = session(&engine);
        let err = s.start(RecognitionMode::FreeText).unwrap_err();
        assert!(matches!(err, VoiceError::PermissionDenied(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn stop_unsubscribes_and_is_idempotent() {
        let engine = FakeEngine::default();
        let mut s = session(&engine);
        s.start(RecognitionMode::FreeText).unwrap();
        s.stop();
        s.stop();
        assert!(!s.is_active());
        assert_eq!(engine.0.lock().unwrap().stops, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unsolicited_end_restarts_after_debounce() {
        let engine = FakeEngine::default();
        let mut s = session(&engine);
        s.start(RecognitionMode::LettersOnly).unwrap();
        engine.push(EngineEvent::Result(RecognitionResult::final_text("bee", 0)));
        engine.push(EngineEvent::Ended);
        s.pump().unwrap();
        assert!(s.restart_pending());

        s.poll_restart().unwrap();
        assert_eq!(engine.starts(), 1);

        tokio::time::advance(Duration::from_millis(400)).await;
        s.poll_restart().unwrap();
        assert_eq!(engine.starts(), 2);
        assert!(s.is_active());
        assert_eq!(s.accumulator().text(), "B");

        // New engine session numbers results from zero again.
        engine.push(EngineEvent::Result(RecognitionResult::final_text("sea", 0)));
        s.pump().unwrap();
        assert_eq!(s.accumulator().text(), "BC");
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_pending_restart() {
        let engine = FakeEngine::default();
        let mut s = session(&engine);
        s.start(RecognitionMode::FreeText).unwrap();
        engine.push(EngineEvent::Error(EngineFailure::NoSpeech));
        s.pump().unwrap();
        assert!(s.restart_pending());
        s.stop();
        tokio::time::advance(Duration::from_secs(1)).await;
        s.poll_restart().unwrap();
        assert_eq!(engine.starts(), 1);
    }
}
