//! Compatibility surface for call sites written against the older
//! recording service. Everything here reads from or forwards to a
//! [`RecorderHandle`]; no state is kept of its own.

use crate::{
    Meeting, PermissionState,
    recorder::{handle::RecorderHandle, state::PublishedState},
};

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

/// Permission status under its older names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingPermissionStatus {
    /// Access allowed.
    Granted,
    /// Access refused.
    Denied,
    /// Not asked yet.
    #[default]
    Undetermined,
}

impl RecordingPermissionStatus {
    /// The equivalent [`PermissionState`].
    pub fn modern(self) -> PermissionState {
        match self {
            Self::Granted => PermissionState::Granted,
            Self::Denied => PermissionState::Denied,
            Self::Undetermined => PermissionState::NotDetermined,
        }
    }
}

impl From<PermissionState> for RecordingPermissionStatus {
    fn from(state: PermissionState) -> Self {
        match state {
            PermissionState::Granted => Self::Granted,
            PermissionState::Denied => Self::Denied,
            PermissionState::NotDetermined => Self::Undetermined,
        }
    }
}

impl fmt::Display for RecordingPermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Undetermined => "undetermined",
        };
        f.write_str(name)
    }
}

/// Published state under the older field names.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LegacySnapshot {
    /// See [`PublishedState::is_recording`].
    pub is_recording: bool,
    /// See [`PublishedState::duration`].
    pub recording_duration: Duration,
    /// See [`PublishedState::level`].
    pub recording_level: f32,
    /// See [`PublishedState::last_error`].
    pub error_message: Option<String>,
    /// See [`PublishedState::permission`].
    pub authorization_status: RecordingPermissionStatus,
}

impl From<&PublishedState> for LegacySnapshot {
    fn from(state: &PublishedState) -> Self {
        Self {
            is_recording: state.is_recording,
            recording_duration: state.duration,
            recording_level: state.level,
            error_message: state.last_error.clone(),
            authorization_status: state.permission.into(),
        }
    }
}

/// Change notifications projected to [`LegacySnapshot`].
pub struct LegacySubscription {
    inner: watch::Receiver<PublishedState>,
}

impl LegacySubscription {
    /// Snapshot of the latest state.
    pub fn current(&self) -> LegacySnapshot {
        LegacySnapshot::from(&*self.inner.borrow())
    }

    /// Wait for the next change. `None` once the recorder has shut down.
    pub async fn changed(&mut self) -> Option<LegacySnapshot> {
        self.inner.changed().await.ok()?;
        Some(LegacySnapshot::from(&*self.inner.borrow_and_update()))
    }
}

/// The older recording service interface.
#[derive(Clone)]
pub struct LegacyRecordingService {
    recorder: RecorderHandle,
    documents_dir: PathBuf,
}

impl LegacyRecordingService {
    /// Wrap `recorder`, saving recordings into `documents_dir`.
    pub fn new(recorder: RecorderHandle, documents_dir: impl Into<PathBuf>) -> Self {
        let documents_dir = documents_dir.into();
        info!(documents_dir = ?documents_dir, "Legacy recording service initialized");

        Self {
            recorder,
            documents_dir,
        }
    }

    /// The handle this service forwards to.
    pub fn modern(&self) -> &RecorderHandle {
        &self.recorder
    }

    /// Where recordings are written.
    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    /// All published fields at once.
    pub fn snapshot(&self) -> LegacySnapshot {
        LegacySnapshot::from(&self.recorder.state())
    }

    /// Whether a recording is in progress.
    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Elapsed time of the current recording.
    pub fn recording_duration(&self) -> Duration {
        self.recorder.duration()
    }

    /// Input level in `[0, 1]`.
    pub fn recording_level(&self) -> f32 {
        self.recorder.level()
    }

    /// Most recent error message.
    pub fn error_message(&self) -> Option<String> {
        self.recorder.last_error()
    }

    /// Microphone authorization.
    pub fn authorization_status(&self) -> RecordingPermissionStatus {
        self.recorder.permission().into()
    }

    /// Receive a snapshot after every change.
    pub fn subscribe(&self) -> LegacySubscription {
        LegacySubscription {
            inner: self.recorder.subscribe(),
        }
    }

    /// Logs the published status. The recorder keeps it current on its own.
    pub fn check_recording_permission(&self) -> RecordingPermissionStatus {
        let status = self.authorization_status();
        info!(status = %status, "Permission check requested");
        status
    }

    /// Re-read the platform status.
    pub async fn refresh_permission_status(&self) -> RecordingPermissionStatus {
        info!("Permission status refresh requested");
        self.recorder.refresh_permission().await.into()
    }

    /// Prompt for microphone access if undecided.
    #[instrument(skip(self))]
    pub async fn request_recording_permission(&self) -> RecordingPermissionStatus {
        info!("Permission request via legacy interface");
        self.recorder.request_access().await.into()
    }

    /// Record `meeting` into the documents directory.
    ///
    /// On success the meeting's recording metadata is updated and the file
    /// path returned. Failures are only visible through
    /// [`error_message`](Self::error_message).
    #[instrument(skip(self, meeting), fields(meeting_id = %meeting.id))]
    pub async fn start_recording(&self, meeting: &mut Meeting) -> Option<PathBuf> {
        info!(title = meeting.display_title(), "Starting recording for meeting");

        match self
            .recorder
            .start_for_meeting(meeting, &self.documents_dir)
            .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                error!(error = %e, "Failed to start recording for meeting");
                None
            }
        }
    }

    /// Stop any recording.
    pub async fn stop_recording(&self) {
        info!("Stopping recording via legacy interface");
        self.recorder.stop().await;
    }

    /// Alias of [`request_recording_permission`](Self::request_recording_permission).
    #[deprecated(note = "use `RecorderHandle::request_access` instead")]
    pub async fn force_system_permission_dialog(&self) -> RecordingPermissionStatus {
        warn!("Deprecated force_system_permission_dialog called");
        self.request_recording_permission().await
    }

    /// Alias of [`request_recording_permission`](Self::request_recording_permission).
    #[deprecated(note = "use `RecorderHandle::request_access` instead")]
    pub async fn force_permission_request(&self) -> RecordingPermissionStatus {
        warn!("Deprecated force_permission_request called");
        self.request_recording_permission().await
    }

    /// Alias of [`request_recording_permission`](Self::request_recording_permission).
    #[deprecated(note = "use `RecorderHandle::request_access` instead")]
    pub async fn trigger_microphone_usage(&self) -> RecordingPermissionStatus {
        warn!("Deprecated trigger_microphone_usage called");
        self.request_recording_permission().await
    }
}
