//! Live recorder status on the terminal.
//!
//! Prints a line for every transition (recording started or stopped,
//! permission changed, new error) and a level meter while recording.

use callrec_core::{PermissionState, PublishedState};

use std::{
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use tokio::sync::watch;
use tracing::{debug, instrument, warn};

const METER_WIDTH: usize = 20;

/// `HH:MM:SS` for a recording duration.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{:02}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

/// Fixed-width bar for a level in `[0, 1]`.
pub fn level_bar(level: f32, width: usize) -> String {
    let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
    let filled = ((level * width as f32).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// One-line summary of the recorder state.
pub fn render_status(state: &PublishedState) -> String {
    let mut line = if state.is_recording {
        format!(
            "REC {} {}",
            format_duration(state.duration),
            level_bar(state.level, METER_WIDTH)
        )
    } else {
        "Idle".to_string()
    };

    line.push_str(&format!("  microphone: {}", state.permission));

    if let Some(error) = &state.last_error {
        line.push_str(&format!("  error: {}", error));
    }

    line
}

/// Transition lines worth printing when going from `before` to `after`.
///
/// A denial names `consent_file`, which holds the stored decision.
pub fn describe_changes(
    before: &PublishedState,
    after: &PublishedState,
    consent_file: &Path,
) -> Vec<String> {
    let mut lines = Vec::new();

    if before.permission != after.permission {
        lines.push(match after.permission {
            PermissionState::Granted => "Microphone access granted".to_string(),
            PermissionState::Denied => format!(
                "Microphone access denied. Recording is unavailable. Delete {} to be asked again.",
                consent_file.display()
            ),
            PermissionState::NotDetermined => "Microphone access not decided".to_string(),
        });
    }

    match (before.is_recording, after.is_recording) {
        (false, true) => lines.push("Recording started".to_string()),
        (true, false) => lines.push(format!(
            "Recording stopped after {}",
            format_duration(before.duration)
        )),
        _ => {}
    }

    if after.last_error != before.last_error
        && let Some(error) = &after.last_error
    {
        lines.push(format!("Error: {}", error));
    }

    lines
}

/// Prints recorder state changes until shutdown.
pub struct StatusReporter {
    updates: watch::Receiver<PublishedState>,
    consent_file: PathBuf,
}

impl StatusReporter {
    /// Report changes published on `updates`.
    pub fn new(updates: watch::Receiver<PublishedState>, consent_file: PathBuf) -> Self {
        Self {
            updates,
            consent_file,
        }
    }

    /// Run until shutdown is signalled or the recorder goes away.
    #[instrument(skip_all)]
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut last = self.updates.borrow_and_update().clone();
        let mut last_meter_second = None;

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    debug!("Status reporter shutting down");
                    break;
                }
                changed = self.updates.changed() => {
                    if changed.is_err() {
                        debug!("Recorder gone, status reporter exiting");
                        break;
                    }

                    let current = self.updates.borrow_and_update().clone();
                    let transitions = describe_changes(&last, &current, &self.consent_file);

                    if !transitions.is_empty() {
                        // Finish any meter line before printing transitions.
                        if last_meter_second.take().is_some() {
                            println!();
                        }
                        for line in transitions {
                            println!("{}", line);
                        }
                    }

                    if current.is_recording {
                        let second = current.duration.as_secs();
                        if last_meter_second != Some(second) {
                            last_meter_second = Some(second);
                            print!("\r{}", render_status(&current));
                            if let Err(e) = std::io::stdout().flush() {
                                warn!(error = %e, "Failed to flush status line");
                            }
                        }
                    } else if last_meter_second.take().is_some() {
                        println!();
                    }

                    last = current;
                }
            }
        }
    }
}
