//! **PhaseController** — the quiz state machine.
//!
//! ```text
//!   ANSWER ──(word heard | Da elapsed)──▶ SPELL ──(match | overflow | Ds elapsed)──▶ WAIT
//!     ▲  └─ trigger phrase: speak field, keep listening                              │
//!     └───────────────────────────(“next” | Dw elapsed), next word ──────────────────┘
//! ```
//!
//! All work happens inside [`tick`](PhaseController::tick) or a control call, one at a
//! time. Recognition is stopped before anything is spoken and restarted only after the
//! synthesizer finished and the trailing buffer passed, so the quiz never hears itself.

use crate::config::QuizConfig;
use crate::engine::{QuizView, RecognitionEngine, RecognitionMode, SpeechSynthesizer, ViewFrame};
use crate::error::{VoiceError, VoiceResult};
use crate::phase::{GamePhase, GameState, QuizEvent, Scoreboard, Trigger};
use crate::session::RecognitionSession;
use crate::vocabulary::WordEntry;
use chrono::Utc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

const SPELL_PROMPT: &str = "Now spell the word carefully, one letter at a time.";
const NEXT_INSTRUCTION: &str = "Say next to continue.";
const NEXT_PHRASE: &str = "next";
const MISSING_FIELD: &str = "Sorry, I don't have that for this word.";

pub struct PhaseController {
    words: Vec<WordEntry>,
    config: QuizConfig,
    session: RecognitionSession,
    synthesizer: Box<dyn SpeechSynthesizer>,
    view: Box<dyn QuizView>,

    state: GameState,
    running: bool,
    dialog: String,
    status: Option<String>,
    scoreboard: Scoreboard,

    event_tx: mpsc::UnboundedSender<QuizEvent>,
}

impl PhaseController {
    /// Build a controller over a non-empty vocabulary. Returns the quiz event receiver.
    pub fn new(
        words: Vec<WordEntry>,
        config: QuizConfig,
        engine: Box<dyn RecognitionEngine>,
        synthesizer: Box<dyn SpeechSynthesizer>,
        view: Box<dyn QuizView>,
    ) -> VoiceResult<(Self, mpsc::UnboundedReceiver<QuizEvent>)> {
        if words.is_empty() {
            return Err(VoiceError::EmptyVocabulary);
        }
        config.validate()?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let session = RecognitionSession::new(engine, config.recognition.clone());

        info!(words = words.len(), "phase controller ready");

        let controller = Self {
            words,
            config,
            session,
            synthesizer,
            view,
            state: GameState::default(),
            running: false,
            dialog: String::new(),
            status: None,
            scoreboard: Scoreboard::default(),
            event_tx,
        };
        Ok((controller, event_rx))
    }

    /// Begin (or resume) the quiz in ANSWER for the current word.
    pub async fn start(&mut self) -> VoiceResult<()> {
        if self.running {
            debug!("quiz already running");
            return Ok(());
        }
        info!(word_index = self.state.word_index, "quiz starting");
        self.running = true;
        self.status = None;
        self.enter_answer().await
    }

    /// Halt recognition and cancel pending restarts. Safe from any state.
    pub fn stop(&mut self) {
        let was_running = self.running;
        self.running = false;
        self.session.stop();
        if was_running {
            info!(phase = %self.state.phase, "quiz stopped");
            self.emit(QuizEvent::Halted {
                reason: None,
                timestamp: Utc::now(),
            });
        }
        self.render();
    }

    /// Manual skip to the next word.
    pub async fn next(&mut self) -> VoiceResult<()> {
        self.session.accumulator_mut().clear();
        self.state.advance_word(self.words.len());
        info!(word_index = self.state.word_index, "skipping to next word");
        if self.running {
            self.enter_answer().await
        } else {
            self.render();
            Ok(())
        }
    }

    /// One scheduler tick: advance the phase clock, take in engine events, evaluate
    /// the current phase, refresh the view.
    ///
    /// Returns an error only when the quiz had to halt.
    pub async fn tick(&mut self) -> VoiceResult<()> {
        if !self.running {
            return Ok(());
        }
        self.state.elapsed += self.config.phases.tick();

        let pumped = self.session.pump();
        self.absorb(pumped)?;
        let restarted = self.session.poll_restart();
        self.absorb(restarted)?;

        match self.state.phase {
            GamePhase::Answer => self.poll_answer().await?,
            GamePhase::Spell => self.poll_spell().await?,
            GamePhase::Wait => self.poll_wait().await?,
        }

        self.render();
        Ok(())
    }

    async fn poll_answer(&mut self) -> VoiceResult<()> {
        let word = self.current_word().word.clone();
        let timed_out = self.phase_expired();
        if timed_out || self.session.accumulator().includes(&word) {
            debug!(timed_out, "answer phase complete");
            return self.enter_spell().await;
        }

        if let Some(trigger) = Trigger::detect(self.session.accumulator()) {
            self.answer_trigger(trigger).await?;
        }
        Ok(())
    }

    async fn answer_trigger(&mut self, trigger: Trigger) -> VoiceResult<()> {
        info!(?trigger, word_index = self.state.word_index, "trigger phrase heard");
        let field = trigger.field(self.current_word()).trim();
        let reply = if field.is_empty() {
            MISSING_FIELD.to_string()
        } else {
            field.to_string()
        };

        self.speak(&reply).await;
        self.session.accumulator_mut().clear();
        self.listen(RecognitionMode::FreeText)?;
        self.emit(QuizEvent::TriggerAnswered {
            trigger,
            word_index: self.state.word_index,
        });
        Ok(())
    }

    async fn poll_spell(&mut self) -> VoiceResult<()> {
        let target = spelling_target(&self.current_word().word);
        let letters = self.session.accumulator().text().to_uppercase();

        if letters.len() > target.len() {
            debug!(letters = %letters, target_len = target.len(), "spelling overran the word");
            return self.finish_spell(false, letters).await;
        }
        if letters == target {
            return self.finish_spell(true, letters).await;
        }
        if self.phase_expired() {
            let correct = letters == target;
            return self.finish_spell(correct, letters).await;
        }
        Ok(())
    }

    async fn poll_wait(&mut self) -> VoiceResult<()> {
        if self.session.accumulator().includes(NEXT_PHRASE) || self.phase_expired() {
            self.session.accumulator_mut().clear();
            self.state.advance_word(self.words.len());
            return self.enter_answer().await;
        }
        Ok(())
    }

    async fn enter_answer(&mut self) -> VoiceResult<()> {
        self.state.enter(GamePhase::Answer);
        let word = self.current_word().word.clone();
        self.dialog = format!("Your word is {}.", word);
        info!(word_index = self.state.word_index, word = %word, "entering ANSWER");

        let prompt = self.dialog.clone();
        self.speak(&prompt).await;
        self.session.accumulator_mut().clear();
        self.listen(RecognitionMode::FreeText)?;
        self.emit_phase_entered();
        self.render();
        Ok(())
    }

    async fn enter_spell(&mut self) -> VoiceResult<()> {
        self.speak(SPELL_PROMPT).await;
        self.session.accumulator_mut().clear();
        self.state.enter(GamePhase::Spell);
        info!(word_index = self.state.word_index, "entering SPELL");
        self.listen(RecognitionMode::LettersOnly)?;
        self.emit_phase_entered();
        self.render();
        Ok(())
    }

    async fn finish_spell(&mut self, correct: bool, spelled: String) -> VoiceResult<()> {
        let word = self.current_word().word.clone();
        let verdict = if correct {
            format!("Correct! You spelled {}.", spelled)
        } else {
            format!("Wrong spelling! The word was {}.", word)
        };
        info!(correct, spelled = %spelled, word = %word, "spelling verdict");

        self.scoreboard.record(correct);
        self.emit(QuizEvent::Verdict {
            word,
            spelled,
            correct,
            timestamp: Utc::now(),
        });

        self.dialog = format!("{} {} {}", self.dialog, verdict, NEXT_INSTRUCTION)
            .trim()
            .to_string();
        let spoken = self.dialog.clone();
        self.speak(&spoken).await;
        self.session.accumulator_mut().clear();
        self.state.enter(GamePhase::Wait);
        self.listen(RecognitionMode::FreeText)?;
        self.emit_phase_entered();
        self.render();
        Ok(())
    }

    /// Stop listening, speak, then hold for the trailing buffer. Synthesis failures are
    /// logged and treated as an immediate completion.
    async fn speak(&mut self, text: &str) {
        self.session.stop();
        self.render();

        let speech = &self.config.speech;
        match self.synthesizer.speak(text, speech.rate, speech.pitch).await {
            Ok(()) => tokio::time::sleep(speech.trailing_buffer()).await,
            Err(e) => warn!(error = %e, "synthesis failed; continuing silently"),
        }
    }

    fn listen(&mut self, mode: RecognitionMode) -> VoiceResult<()> {
        self.state.recognition_mode = mode;
        let started = self.session.start(mode);
        if started.is_ok() && self.status.take().is_some() {
            info!("listening again; clearing status");
        }
        self.absorb(started)
    }

    /// Route session errors: refusals become status, a dead engine halts the quiz.
    fn absorb(&mut self, result: VoiceResult<()>) -> VoiceResult<()> {
        match result {
            Ok(()) => Ok(()),
            Err(VoiceError::PermissionDenied(msg)) => {
                warn!(reason = %msg, "listening blocked by permissions");
                let message = format!("Microphone permission denied: {}", msg);
                self.status = Some(message.clone());
                self.emit(QuizEvent::Status { message });
                Ok(())
            }
            Err(e) if e.is_fatal() => {
                self.halt(&e);
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "recognition error ignored");
                Ok(())
            }
        }
    }

    fn halt(&mut self, cause: &VoiceError) {
        error!(error = %cause, "quiz halted");
        self.running = false;
        self.session.stop();
        self.status = Some(format!("Speech recognition unavailable: {}", cause));
        self.emit(QuizEvent::Halted {
            reason: Some(cause.to_string()),
            timestamp: Utc::now(),
        });
        self.render();
    }

    fn phase_expired(&self) -> bool {
        self.state.elapsed >= self.state.phase.duration(&self.config.phases)
    }

    fn emit_phase_entered(&self) {
        self.emit(QuizEvent::PhaseEntered {
            phase: self.state.phase,
            word_index: self.state.word_index,
            timestamp: Utc::now(),
        });
    }

    fn emit(&self, event: QuizEvent) {
        if self.event_tx.send(event).is_err() {
            trace!("no quiz event listener");
        }
    }

    fn render(&mut self) {
        let frame = self.frame();
        self.view.render(&frame);
    }

    /// Snapshot of what the presentation surface should show.
    pub fn frame(&self) -> ViewFrame {
        let preview = match &self.status {
            Some(status) => status.clone(),
            None => self.session.preview().to_string(),
        };
        ViewFrame {
            phase: self.state.phase,
            word_index: self.state.word_index,
            committed: self.session.accumulator().text(),
            preview,
            dialog: self.dialog.clone(),
            time_left_percent: self.time_left_percent(),
            status: self.status.clone(),
        }
    }

    fn time_left_percent(&self) -> f32 {
        let total = self.state.phase.duration(&self.config.phases).as_secs_f32();
        if total <= 0.0 {
            return 0.0;
        }
        let left = 1.0 - self.state.elapsed_seconds() / total;
        (left * 100.0).clamp(0.0, 100.0)
    }

    pub fn current_word(&self) -> &WordEntry {
        // word_index is kept in range by GameState::advance_word and the non-empty check in new.
        &self.words[self.state.word_index % self.words.len()]
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn word_index(&self) -> usize {
        self.state.word_index
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn dialog(&self) -> &str {
        &self.dialog
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn scoreboard(&self) -> Scoreboard {
        self.scoreboard
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn session(&self) -> &RecognitionSession {
        &self.session
    }

    pub fn tick_period(&self) -> Duration {
        self.config.phases.tick()
    }
}

/// The uppercase letters a correct spelling must produce.
fn spelling_target(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
