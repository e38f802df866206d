use crate::{EncoderSettings, error::Result as CoreResult};

use std::{fmt, path::Path};

use tokio::sync::mpsc;
use tracing::debug;

/// Identifies one recording session for the lifetime of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(crate) u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Asynchronous signal raised by a capture device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSignal {
    /// The device finished writing its file.
    Finished {
        /// Whether the file was finalized cleanly.
        successfully: bool,
    },
    /// The encoder reported an error. Capture may or may not continue.
    EncodeError {
        /// Description of the failure, if the device supplied one.
        message: Option<String>,
    },
}

/// A [`CaptureSignal`] tagged with the session whose device raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEvent {
    /// Session that owned the device.
    pub session: SessionId,
    /// What happened.
    pub signal: CaptureSignal,
}

/// Sending half of the device signal channel.
///
/// Safe to use from audio callbacks and encoder threads: sending never
/// blocks and never touches recorder state directly. Signals are handled
/// later on the recording manager task.
#[derive(Clone)]
pub struct DeviceEventSender {
    session: SessionId,
    tx: mpsc::UnboundedSender<DeviceEvent>,
}

impl DeviceEventSender {
    pub(crate) fn new(session: SessionId, tx: mpsc::UnboundedSender<DeviceEvent>) -> Self {
        Self { session, tx }
    }

    /// Session this sender reports for.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Report that the device finished writing.
    pub fn finished(&self, successfully: bool) {
        self.send(CaptureSignal::Finished { successfully });
    }

    /// Report an encoder failure.
    pub fn encode_error(&self, message: Option<String>) {
        self.send(CaptureSignal::EncodeError { message });
    }

    fn send(&self, signal: CaptureSignal) {
        let event = DeviceEvent {
            session: self.session,
            signal,
        };
        if self.tx.send(event).is_err() {
            debug!(session = %self.session, "Recorder gone, dropping device signal");
        }
    }
}

/// A capture device bound to one destination file.
///
/// Owned exclusively by a single recording session and only driven from
/// the recording manager task.
pub trait CaptureDevice: Send {
    /// Enable or disable level metering. Must be enabled before `record`.
    fn set_metering_enabled(&mut self, enabled: bool);

    /// Begin capturing. Returns `false` if capture could not start.
    fn record(&mut self) -> bool;

    /// Halt capture and release the underlying hardware and file.
    ///
    /// Calling this more than once has no further effect.
    fn stop(&mut self);

    /// Whether the device is currently capturing.
    fn is_recording(&self) -> bool;

    /// Refresh the metering snapshot.
    fn update_meters(&mut self);

    /// Average power of `channel` in dBFS as of the last meter refresh.
    fn average_power(&self, channel: usize) -> f32;
}

/// Creates capture devices for new sessions.
pub trait CaptureBackend: Send + Sync {
    /// Construct and configure a device writing to `destination`.
    ///
    /// Asynchronous failures must be reported through `events`, never by
    /// panicking on the callback thread.
    fn open(
        &self,
        destination: &Path,
        settings: &EncoderSettings,
        events: DeviceEventSender,
    ) -> CoreResult<Box<dyn CaptureDevice>>;
}
