//! Scheduler and control surface.
//!
//! One interval tick per controller drives every phase; control commands (start,
//! stop, next) arrive on a channel and are handled between ticks, never during one.
//! The tick is disarmed while the quiz is stopped.

use crate::controller::PhaseController;
use crate::error::{VoiceError, VoiceResult};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

/// Commands accepted by a running quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Stop,
    Next,
    /// Stop and leave the run loop.
    Shutdown,
}

/// Cloneable handle for an outer caller (e.g. a manual skip button).
#[derive(Debug, Clone)]
pub struct QuizHandle {
    tx: mpsc::UnboundedSender<ControlCommand>,
}

impl QuizHandle {
    pub fn start(&self) -> VoiceResult<()> {
        self.send(ControlCommand::Start)
    }

    pub fn stop(&self) -> VoiceResult<()> {
        self.send(ControlCommand::Stop)
    }

    pub fn next(&self) -> VoiceResult<()> {
        self.send(ControlCommand::Next)
    }

    pub fn shutdown(&self) -> VoiceResult<()> {
        self.send(ControlCommand::Shutdown)
    }

    fn send(&self, command: ControlCommand) -> VoiceResult<()> {
        self.tx
            .send(command)
            .map_err(|e| VoiceError::ChannelSend(e.to_string()))
    }
}

/// Create a control handle and the receiver `run_quiz` consumes.
pub fn control_channel() -> (QuizHandle, mpsc::UnboundedReceiver<ControlCommand>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QuizHandle { tx }, rx)
}

/// Drive `controller` until shutdown, a closed control channel, or a fatal error.
///
/// The controller is not started automatically; send [`ControlCommand::Start`].
pub async fn run_quiz(
    controller: &mut PhaseController,
    mut control_rx: mpsc::UnboundedReceiver<ControlCommand>,
) -> VoiceResult<()> {
    let period = controller.tick_period();
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(tick_ms = period.as_millis() as u64, "quiz loop running");

    loop {
        tokio::select! {
            biased;

            command = control_rx.recv() => match command {
                Some(ControlCommand::Start) => {
                    controller.start().await?;
                    // First poll comes one full period after the prompt finishes.
                    ticker.reset();
                }
                Some(ControlCommand::Stop) => controller.stop(),
                Some(ControlCommand::Next) => controller.next().await?,
                Some(ControlCommand::Shutdown) | None => {
                    controller.stop();
                    break;
                }
            },
            _ = ticker.tick(), if controller.is_running() => {
                if let Err(e) = controller.tick().await {
                    warn!(error = %e, "quiz loop ending");
                    return Err(e);
                }
            }
        }
    }

    info!("quiz loop finished");
    Ok(())
}

/// Spawn the quiz loop on the current runtime. The task hands the controller back
/// when it ends so the caller can inspect the final state.
pub fn spawn_quiz(
    mut controller: PhaseController,
) -> (QuizHandle, JoinHandle<(PhaseController, VoiceResult<()>)>) {
    let (handle, control_rx) = control_channel();
    let task = tokio::spawn(async move {
        let outcome = run_quiz(&mut controller, control_rx).await;
        (controller, outcome)
    });
    (handle, task)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_reports_closed_channel() {
        let (handle, rx) = control_channel();
        assert!(handle.next().is_ok());
        drop(rx);
        assert!(matches!(handle.start(), Err(VoiceError::ChannelSend(_))));
    }
}
