use crate::{CaptureDevice, SessionId};

use std::{path::PathBuf, time::Duration};

use tokio::time::Instant;
use tracing::info;

/// One active capture: the device, where it writes, and when it began.
///
/// Owns the device exclusively. Dropping the session stops the device, so
/// no code path can leak a capturing handle.
pub(crate) struct RecordingSession {
    id: SessionId,
    device: Box<dyn CaptureDevice>,
    destination: PathBuf,
    started_at: Instant,
}

impl RecordingSession {
    pub(crate) fn new(id: SessionId, device: Box<dyn CaptureDevice>, destination: PathBuf) -> Self {
        Self {
            id,
            device,
            destination,
            started_at: Instant::now(),
        }
    }

    pub(crate) fn id(&self) -> SessionId {
        self.id
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub(crate) fn is_capturing(&self) -> bool {
        self.device.is_recording()
    }

    /// Refresh the meter and return the channel 0 average power in dBFS.
    pub(crate) fn sample_power(&mut self) -> f32 {
        self.device.update_meters();
        self.device.average_power(0)
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.device.stop();
        info!(
            session = %self.id,
            destination = ?self.destination,
            duration_ms = self.elapsed().as_millis(),
            "Recording session released"
        );
    }
}
