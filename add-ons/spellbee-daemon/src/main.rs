//! Spellbee console daemon
//!
//! Plays the spelling quiz in a terminal. Every typed line is treated as a final
//! recognition result (spell with "alpha bravo ..." or single letters); lines starting
//! with `:` are controls: `:start`, `:stop`, `:next`, `:quit`. Speech output is logged.

use async_trait::async_trait;
use spellbee_voice::{
    load_vocabulary, spawn_quiz, EngineEvent, EngineEventSender, EngineStartError,
    PhaseController, QuizConfig, QuizEvent, QuizHandle, QuizView, RecognitionEngine,
    RecognitionOptions, RecognitionResult, SpeechSynthesizer, ViewFrame, VoiceResult, WordEntry,
};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Engine fed by stdin. The stdin task writes into whichever channel the current run owns.
#[derive(Clone, Default)]
struct ConsoleEngine {
    current: Arc<Mutex<Option<EngineEventSender>>>,
}

impl ConsoleEngine {
    fn hear(&self, transcript: &str, index: i64) -> bool {
        let Ok(slot) = self.current.lock() else {
            return false;
        };
        match slot.as_ref() {
            Some(tx) => tx
                .send(EngineEvent::Result(RecognitionResult::final_text(transcript, index)))
                .is_ok(),
            None => false,
        }
    }
}

impl RecognitionEngine for ConsoleEngine {
    fn start(
        &mut self,
        options: &RecognitionOptions,
        events: EngineEventSender,
    ) -> Result<(), EngineStartError> {
        let mut slot = self
            .current
            .lock()
            .map_err(|e| EngineStartError::Unavailable(e.to_string()))?;
        *slot = Some(events);
        info!(mode = ?options.mode, "🎤 listening");
        Ok(())
    }

    fn stop(&mut self) {
        if let Ok(mut slot) = self.current.lock() {
            *slot = None;
        }
    }
}

/// Synthesizer that writes prompts to the log instead of a speaker.
struct LogSynthesizer;

#[async_trait]
impl SpeechSynthesizer for LogSynthesizer {
    async fn speak(&self, text: &str, rate: f32, pitch: f32) -> VoiceResult<()> {
        info!(rate, pitch, "🔊 {}", text);
        Ok(())
    }
}

/// Prints a frame whenever something other than the clock changed.
#[derive(Default)]
struct ConsoleView {
    last: Option<ViewFrame>,
}

impl QuizView for ConsoleView {
    fn render(&mut self, frame: &ViewFrame) {
        let changed = match &self.last {
            Some(prev) => {
                prev.phase != frame.phase
                    || prev.word_index != frame.word_index
                    || prev.committed != frame.committed
                    || prev.preview != frame.preview
                    || prev.dialog != frame.dialog
            }
            None => true,
        };
        if changed {
            println!(
                "[{} | word {} | {:>3.0}%] heard: {:?} live: {:?}",
                frame.phase,
                frame.word_index + 1,
                frame.time_left_percent,
                frame.committed,
                frame.preview
            );
        }
        self.last = Some(frame.clone());
    }
}

fn builtin_words() -> Vec<WordEntry> {
    vec![
        WordEntry::new("apple")
            .with_part_of_speech("noun")
            .with_definition("A round fruit with red, yellow, or green skin.")
            .with_example("She packed an apple for lunch.")
            .with_pronunciation("apple"),
        WordEntry::new("bridge")
            .with_part_of_speech("noun")
            .with_definition("A structure carrying a road or path across an obstacle.")
            .with_example("They walked across the bridge at sunset.")
            .with_pronunciation("bridge"),
        WordEntry::new("quiet")
            .with_part_of_speech("adjective")
            .with_definition("Making little or no noise.")
            .with_example("The library was quiet all afternoon.")
            .with_pronunciation("quiet"),
    ]
}

fn verdict_line(correct: bool) -> &'static str {
    if correct {
        "✅ spelled correctly"
    } else {
        "❌ misspelled"
    }
}

async fn read_console(engine: ConsoleEngine, handle: QuizHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut index: i64 = 0;

    while let Ok(Some(line)) = lines.next_line().await {
        let sent = match line.trim() {
            "" => continue,
            ":start" => handle.start(),
            ":stop" => handle.stop(),
            ":next" => handle.next(),
            ":quit" => {
                let _ = handle.shutdown();
                break;
            }
            heard => {
                if !engine.hear(heard, index) {
                    warn!("not listening right now; line ignored");
                }
                index += 1;
                Ok(())
            }
        };
        if let Err(e) = sent {
            warn!(error = %e, "quiz loop is gone");
            break;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[spellbee-daemon] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = QuizConfig::load()?;
    let words = match &config.vocabulary_path {
        Some(path) => load_vocabulary(path)?,
        None => builtin_words(),
    };
    info!(
        words = words.len(),
        answer_secs = config.phases.answer_secs,
        spell_secs = config.phases.spell_secs,
        wait_secs = config.phases.wait_secs,
        "🐝 Spellbee starting"
    );

    let engine = ConsoleEngine::default();
    let (controller, mut quiz_events) = PhaseController::new(
        words,
        config,
        Box::new(engine.clone()),
        Box::new(LogSynthesizer),
        Box::new(ConsoleView::default()),
    )?;

    let (handle, mut task) = spawn_quiz(controller);
    handle.start()?;
    tokio::spawn(read_console(engine, handle.clone()));

    tokio::spawn(async move {
        while let Some(event) = quiz_events.recv().await {
            if let QuizEvent::Verdict { word, correct, .. } = event {
                info!(word = %word, correct, "{}", verdict_line(correct));
            }
        }
    });

    let (controller, outcome) = tokio::select! {
        joined = &mut task => joined?,
        _ = tokio::signal::ctrl_c() => {
            info!("CTRL-C received; stopping quiz");
            handle.shutdown()?;
            task.await?
        }
    };

    let score = controller.scoreboard();
    info!(correct = score.correct, attempted = score.attempted, "👋 quiz over");
    outcome?;
    Ok(())
}
