use crate::{
    Meeting, MeetingId, PermissionGate, PermissionState, RecorderError,
    error::Result as CoreResult,
    recorder::{manager::Command, state::PublishedState},
};

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{info, instrument, warn};

/// Cloneable handle to a running [`RecordingManager`](crate::RecordingManager).
///
/// Getters read the last published state and never wait. Operations are
/// queued to the manager task and applied in the order they were sent.
/// When the last handle is dropped the manager stops any active recording
/// and exits.
#[derive(Clone)]
pub struct RecorderHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<PublishedState>,
    gate: PermissionGate,
}

impl RecorderHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        state: watch::Receiver<PublishedState>,
        gate: PermissionGate,
    ) -> Self {
        Self {
            commands,
            state,
            gate,
        }
    }

    /// Synchronous authorization snapshot from the platform store.
    pub fn current_status(&self) -> PermissionState {
        self.gate.current_status()
    }

    /// Prompt for microphone access if undecided, and publish the result.
    #[instrument(skip(self))]
    pub async fn request_access(&self) -> PermissionState {
        let (reply, response) = oneshot::channel();

        if self.send(Command::RequestAccess { reply }).await.is_err() {
            return self.gate.current_status();
        }

        response
            .await
            .unwrap_or_else(|_| self.gate.cached_status())
    }

    /// Re-read the platform status and publish it.
    #[instrument(skip(self))]
    pub async fn refresh_permission(&self) -> PermissionState {
        let (reply, response) = oneshot::channel();

        if self.send(Command::RefreshPermission { reply }).await.is_err() {
            return self.gate.current_status();
        }

        response
            .await
            .unwrap_or_else(|_| self.gate.cached_status())
    }

    /// Start recording `meeting_id` into `directory`.
    ///
    /// Requests permission first when it is undecided. Any active recording
    /// is stopped before the new one begins. Returns the destination file.
    ///
    /// # Errors
    ///
    /// [`RecorderError::PermissionRequired`], [`RecorderError::DeviceSetupFailed`]
    /// or [`RecorderError::DeviceStartFailed`] when recording could not begin,
    /// [`RecorderError::StartCancelled`] when a stop arrived while waiting
    /// for permission.
    #[instrument(skip(self, directory), fields(meeting_id = %meeting_id))]
    pub async fn start(&self, meeting_id: &MeetingId, directory: &Path) -> CoreResult<PathBuf> {
        let (reply, response) = oneshot::channel();

        self.send(Command::Start {
            meeting_id: meeting_id.clone(),
            directory: directory.to_path_buf(),
            reply,
        })
        .await?;

        response
            .await
            .map_err(|_| RecorderError::manager_unavailable())?
    }

    /// Start recording `meeting` and write the recording metadata back to it.
    ///
    /// The meeting is only modified when recording actually started.
    #[instrument(skip(self, meeting, directory), fields(meeting_id = %meeting.id, title = meeting.display_title()))]
    pub async fn start_for_meeting(
        &self,
        meeting: &mut Meeting,
        directory: &Path,
    ) -> CoreResult<PathBuf> {
        let path = self.start(&meeting.id, directory).await?;

        meeting.mark_recording_started(path.clone(), Utc::now());
        info!(path = ?path, "Meeting marked as recorded");

        Ok(path)
    }

    /// Stop recording. Does nothing when idle.
    ///
    /// Once this returns, the device is released and no further samples
    /// will be published for the stopped session.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let (reply, response) = oneshot::channel();

        if self.send(Command::Stop { reply }).await.is_ok() {
            let _ = response.await;
        }
    }

    /// Stop any recording and end the manager task.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        let (reply, response) = oneshot::channel();

        if self.send(Command::Shutdown { reply }).await.is_ok() {
            let _ = response.await;
        }
    }

    /// Latest published state.
    pub fn state(&self) -> PublishedState {
        self.state.borrow().clone()
    }

    /// Published permission status.
    pub fn permission(&self) -> PermissionState {
        self.state.borrow().permission
    }

    /// Whether a recording is in progress.
    pub fn is_recording(&self) -> bool {
        self.state.borrow().is_recording
    }

    /// Elapsed time of the current recording.
    pub fn duration(&self) -> Duration {
        self.state.borrow().duration
    }

    /// Current input level in `[0, 1]`.
    pub fn level(&self) -> f32 {
        self.state.borrow().level
    }

    /// Most recent error message.
    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().last_error.clone()
    }

    /// Receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<PublishedState> {
        self.state.clone()
    }

    async fn send(&self, command: Command) -> CoreResult<()> {
        self.commands.send(command).await.map_err(|_| {
            warn!("Recording manager is not running");
            RecorderError::manager_unavailable()
        })
    }
}
