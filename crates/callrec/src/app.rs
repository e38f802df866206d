use crate::{
    AppCommand, AppResult, RecordingState, config::Config, meeting_store::MeetingStore,
    status_reporter::render_status,
};

use callrec_core::{PublishedState, RecorderHandle};

use std::{sync::Arc, time::Instant};

use tokio::sync::{Mutex, mpsc, watch};
use tracing::{error, info, instrument, warn};

/// Main application state.
///
/// Applies console commands to the recorder one at a time and keeps the
/// shared [`RecordingState`] in line with what the recorder publishes.
pub struct App {
    pub(crate) recorder: RecorderHandle,
    pub(crate) meetings: MeetingStore,
    pub(crate) config: Config,
    pub(crate) state: Arc<Mutex<RecordingState>>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("CallRec starting");

        let mut recorder_updates = self.recorder.subscribe();

        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        AppCommand::StartRecording { target } => {
                            if let Err(e) = self.start_recording(target.as_deref()).await {
                                error!(error = ?e, "Failed to start recording");
                                println!("Could not start recording: {}", e.user_message());
                            }
                        }
                        AppCommand::StopRecording => {
                            self.stop_recording().await;
                        }
                        AppCommand::RequestPermission => {
                            let status = self.recorder.request_access().await;
                            println!("Microphone access: {}", status);
                        }
                        AppCommand::ShowStatus => {
                            println!("{}", render_status(&self.recorder.state()));
                        }
                        AppCommand::ListMeetings => {
                            self.list_meetings();
                        }
                        AppCommand::Shutdown => {
                            info!("Shutdown requested");
                            break;
                        }
                    }
                }

                changed = recorder_updates.changed() => {
                    if changed.is_err() {
                        info!("Recorder has shut down");
                        break;
                    }
                    let published = recorder_updates.borrow_and_update().clone();
                    self.sync_state(&published).await;
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        self.recorder.shutdown().await;
        *self.state.lock().await = RecordingState::Idle;

        let _ = self.shutdown_tx.send(true);
        info!("CallRec shut down successfully");

        Ok(())
    }

    /// Start recording the meeting matching `target`, creating one if needed.
    #[instrument(skip(self))]
    async fn start_recording(&mut self, target: Option<&str>) -> AppResult<()> {
        let mut meeting = self
            .meetings
            .resolve(target, self.config.meetings.default_length_minutes);

        let path = self
            .recorder
            .start_for_meeting(&mut meeting, &self.config.recording.output_dir)
            .await?;

        *self.state.lock().await = RecordingState::Recording {
            started_at: Instant::now(),
            meeting_id: meeting.id.clone(),
        };

        println!(
            "Recording \"{}\" to {}",
            meeting.display_title(),
            path.display()
        );
        info!(meeting_id = %meeting.id, path = ?path, "Recording started");

        self.meetings.upsert(meeting);
        if let Err(e) = self.meetings.save() {
            // The recording itself is unaffected.
            error!(error = ?e, "Failed to save meetings");
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn stop_recording(&self) {
        self.recorder.stop().await;

        let mut state = self.state.lock().await;
        if let RecordingState::Recording {
            started_at,
            meeting_id,
        } = &*state
        {
            info!(
                meeting_id = %meeting_id,
                duration_ms = started_at.elapsed().as_millis(),
                "Recording stopped"
            );
        }
        *state = RecordingState::Idle;
    }

    fn list_meetings(&self) {
        let meetings = self.meetings.meetings();
        if meetings.is_empty() {
            println!("No meetings yet");
            return;
        }

        for meeting in meetings {
            let recording = meeting
                .recording_path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "not recorded".to_string());
            println!(
                "{}  {}  {}  {}",
                meeting.id,
                meeting.starts_at.format("%Y-%m-%d %H:%M"),
                meeting.display_title(),
                recording
            );
        }
    }

    /// Drop back to idle when the recorder ended a recording on its own.
    async fn sync_state(&self, published: &PublishedState) {
        if published.is_recording {
            return;
        }

        let mut state = self.state.lock().await;
        if let RecordingState::Recording { meeting_id, .. } = &*state {
            warn!(
                meeting_id = %meeting_id,
                error = ?published.last_error,
                "Recording ended by the recorder"
            );
            *state = RecordingState::Idle;
        }
    }
}
