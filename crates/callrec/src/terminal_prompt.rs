//! Microphone consent prompt on the terminal.
//!
//! The console handler owns stdin. While a prompt is open it hands the next
//! line to [`PromptAnswers::offer`] instead of parsing it as a command.

use callrec_core::{ConsentAnswer, ConsentPrompt};

use std::{
    io::Write,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

type PendingAnswer = Arc<Mutex<Option<oneshot::Sender<String>>>>;

/// Asks for microphone consent by printing a question and waiting for a line.
pub struct TerminalPrompt {
    pending: PendingAnswer,
}

/// Routes typed lines to an open [`TerminalPrompt`].
#[derive(Clone)]
pub struct PromptAnswers {
    pending: PendingAnswer,
}

impl TerminalPrompt {
    /// Create a prompt and the handle that feeds it answers.
    pub fn new() -> (Self, PromptAnswers) {
        let pending: PendingAnswer = Arc::new(Mutex::new(None));
        (
            Self {
                pending: Arc::clone(&pending),
            },
            PromptAnswers { pending },
        )
    }
}

impl PromptAnswers {
    /// Deliver `line` to the open prompt.
    ///
    /// Returns the line back when no prompt is waiting for it.
    pub fn offer(&self, line: String) -> Option<String> {
        let sender = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        match sender {
            Some(sender) => {
                if sender.send(line).is_err() {
                    debug!("Consent prompt closed before the answer arrived");
                }
                None
            }
            None => Some(line),
        }
    }
}

/// Interpret a typed answer. Anything other than yes or no dismisses.
pub fn parse_answer(line: &str) -> ConsentAnswer {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "allow" => ConsentAnswer::Allow,
        "n" | "no" | "deny" => ConsentAnswer::Deny,
        _ => ConsentAnswer::Dismissed,
    }
}

#[async_trait]
impl ConsentPrompt for TerminalPrompt {
    #[instrument(skip(self))]
    async fn ask(&self) -> ConsentAnswer {
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            if pending.replace(tx).is_some() {
                warn!("Replacing an unanswered consent prompt");
            }
        }

        print!("CallRec would like to use your microphone. Allow? [y/n]: ");
        if let Err(e) = std::io::stdout().flush() {
            warn!(error = %e, "Failed to flush prompt");
        }

        let answer = match rx.await {
            Ok(line) => parse_answer(&line),
            Err(_) => ConsentAnswer::Dismissed,
        };

        info!(answer = ?answer, "Consent prompt answered");
        answer
    }
}
