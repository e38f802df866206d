use crate::PermissionState;

use std::time::Duration;

use serde::Serialize;

/// Recorder state observed by presentation code.
///
/// Published as a whole after every transition, so observers never see a
/// half-applied change. While `is_recording` is false, `duration` and
/// `level` are zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PublishedState {
    /// Microphone authorization.
    pub permission: PermissionState,
    /// Whether a session is capturing.
    pub is_recording: bool,
    /// Time since the session started.
    pub duration: Duration,
    /// Input level in `[0, 1]`.
    pub level: f32,
    /// Most recent failure, cleared by a successful start or a stop.
    pub last_error: Option<String>,
}

impl PublishedState {
    pub(crate) fn reset_capture(&mut self) {
        self.is_recording = false;
        self.duration = Duration::ZERO;
        self.level = 0.0;
    }
}
