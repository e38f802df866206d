//! Console input handler with recording toggle.
//!
//! Reads commands from stdin and forwards them to the main application.
//! An empty line toggles recording the way a push-to-talk key would.

use crate::{AppCommand, AppError, AppResult, RecordingState, terminal_prompt::PromptAnswers};

use std::{panic::Location, sync::Arc, time::Duration};

use error_location::ErrorLocation;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// Start or stop depending on the current state.
    Toggle,
    /// Send this command as-is.
    Command(AppCommand),
    /// Print the command list.
    Help,
}

/// Parse one line of console input. Returns `None` for unknown commands.
pub fn parse_line(line: &str) -> Option<ConsoleInput> {
    let line = line.trim();
    if line.is_empty() {
        return Some(ConsoleInput::Toggle);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, Some(rest.trim()).filter(|rest| !rest.is_empty())),
        None => (line, None),
    };

    let input = match word.to_ascii_lowercase().as_str() {
        "start" | "record" => ConsoleInput::Command(AppCommand::StartRecording {
            target: rest.map(str::to_string),
        }),
        "stop" => ConsoleInput::Command(AppCommand::StopRecording),
        "permission" => ConsoleInput::Command(AppCommand::RequestPermission),
        "status" => ConsoleInput::Command(AppCommand::ShowStatus),
        "meetings" => ConsoleInput::Command(AppCommand::ListMeetings),
        "quit" | "exit" => ConsoleInput::Command(AppCommand::Shutdown),
        "help" | "?" => ConsoleInput::Help,
        _ => return None,
    };

    Some(input)
}

const HELP: &str = "\
Commands:
  start [meeting id | title]  start recording (creates a meeting if none matches)
  stop                        stop recording
  <enter>                     toggle recording
  permission                  ask for microphone access
  status                      show recorder state
  meetings                    list known meetings
  quit                        exit";

/// Console handler forwarding stdin lines as application commands.
pub struct ConsoleHandler {
    state: Arc<Mutex<RecordingState>>,
    command_tx: mpsc::Sender<AppCommand>,
    prompt_answers: PromptAnswers,
}

impl ConsoleHandler {
    /// Create a handler sharing the application's view of the recording state.
    pub fn new(
        state: Arc<Mutex<RecordingState>>,
        command_tx: mpsc::Sender<AppCommand>,
        prompt_answers: PromptAnswers,
    ) -> Self {
        Self {
            state,
            command_tx,
            prompt_answers,
        }
    }

    /// Run the console loop until shutdown or end of input.
    #[instrument(skip_all)]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let (line_tx, mut line_rx) = mpsc::channel(32);

        // Single persistent blocking task that forwards stdin lines.
        // Shutdown: when line_rx is dropped (loop breaks), the next
        // line_tx.blocking_send() fails, breaking the blocking loop.
        let handle = tokio::task::spawn_blocking(move || {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match stdin.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        if line_tx.blocking_send(line.clone()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        println!("{}", HELP);

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Console handler shutting down");
                    break;
                }
                line = line_rx.recv() => {
                    match line {
                        Some(line) => self.handle_line(line).await?,
                        None => {
                            info!("End of console input");
                            self.send(AppCommand::Shutdown).await?;
                            break;
                        }
                    }
                }
            }
        }

        drop(line_rx);

        // Best-effort join: the blocking task may be stuck in read_line()
        // until the user presses enter. The runtime abandons it on exit.
        match tokio::time::timeout(Duration::from_secs(1), handle).await {
            Ok(Ok(())) => debug!("Console reader stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Console reader task panicked"),
            Err(_) => debug!("Console reader still blocked on stdin, will be cleaned up on exit"),
        }

        Ok(())
    }

    /// Handle one line of input.
    pub async fn handle_line(&self, line: String) -> AppResult<()> {
        let Some(line) = self.prompt_answers.offer(line) else {
            return Ok(());
        };

        match parse_line(&line) {
            Some(ConsoleInput::Toggle) => self.toggle().await,
            Some(ConsoleInput::Command(command)) => self.send(command).await,
            Some(ConsoleInput::Help) => {
                println!("{}", HELP);
                Ok(())
            }
            None => {
                println!("Unknown command: {} (type 'help')", line.trim());
                Ok(())
            }
        }
    }

    #[instrument(skip(self))]
    async fn toggle(&self) -> AppResult<()> {
        let state = self.state.lock().await;

        let command = match &*state {
            RecordingState::Idle => AppCommand::StartRecording { target: None },
            RecordingState::Recording { meeting_id, .. } => {
                debug!(meeting_id = %meeting_id, "Toggle stops current recording");
                AppCommand::StopRecording
            }
        };

        // The application updates the state once the command has been
        // applied, so it is only read here.
        drop(state);
        self.send(command).await
    }

    #[track_caller]
    fn send_failed(command: &AppCommand, e: impl std::fmt::Display) -> AppError {
        AppError::ChannelSendFailed {
            message: format!("Failed to send {:?}: {}", command, e),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    async fn send(&self, command: AppCommand) -> AppResult<()> {
        let description = command.clone();
        self.command_tx
            .send(command)
            .await
            .map_err(|e| Self::send_failed(&description, e))
    }
}
