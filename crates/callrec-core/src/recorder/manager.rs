//! Recording manager task.
//!
//! All recorder state lives in one `tokio` task. Handles talk to it through
//! a command channel; capture devices report through an event channel; the
//! sampling interval ticks inside the same `select!`. Every transition is
//! therefore applied in one place, one at a time, and published as a whole.
//!
//! A stop (or a newer start) that arrives while a start is waiting for the
//! permission prompt cancels that start: the waiting caller gets
//! [`RecorderError::StartCancelled`] and no device is opened.

use crate::{
    CaptureBackend, DeviceEvent, DeviceEventSender, MeetingId, PermissionGate, PermissionState,
    PermissionStore, RECORDING_SETTINGS, RecorderError, SessionId,
    audio::CaptureSignal,
    error::Result as CoreResult,
    recorder::{
        RecorderHandle,
        sampling::{DEFAULT_SAMPLING_INTERVAL, SamplingLoop, next_tick, take_sample},
        session::RecordingSession,
        state::PublishedState,
    },
};

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use tokio::{
    runtime::{Handle, RuntimeFlavor},
    sync::{mpsc, oneshot, watch},
};
use tracing::{debug, error, info, instrument, warn};

/// Tuning for a [`RecordingManager`].
#[derive(Debug, Clone)]
pub struct RecorderOptions {
    /// Time between duration/level samples while recording.
    pub sampling_interval: Duration,
    /// Commands that may queue before senders wait.
    pub command_capacity: usize,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            sampling_interval: DEFAULT_SAMPLING_INTERVAL,
            command_capacity: 32,
        }
    }
}

pub(crate) enum Command {
    RequestAccess {
        reply: oneshot::Sender<PermissionState>,
    },
    RefreshPermission {
        reply: oneshot::Sender<PermissionState>,
    },
    Start {
        meeting_id: MeetingId,
        directory: PathBuf,
        reply: oneshot::Sender<CoreResult<PathBuf>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

struct PendingStart {
    ticket: u64,
    meeting_id: MeetingId,
    directory: PathBuf,
    reply: oneshot::Sender<CoreResult<PathBuf>>,
}

struct PermissionResolved {
    ticket: u64,
    status: PermissionState,
}

/// Owns microphone permission, the active session and its sampling loop.
///
/// Never used directly: [`RecordingManager::spawn`] moves it onto its own
/// task and returns the [`RecorderHandle`] to drive it.
pub struct RecordingManager {
    gate: PermissionGate,
    backend: Arc<dyn CaptureBackend>,
    options: RecorderOptions,
    session: Option<RecordingSession>,
    sampler: Option<SamplingLoop>,
    pending_start: Option<PendingStart>,
    pending_access: Vec<(u64, oneshot::Sender<PermissionState>)>,
    next_ticket: u64,
    next_session: u64,
    /// Most recently created session; device events from older ones are ignored.
    latest_session: Option<SessionId>,
    state_tx: watch::Sender<PublishedState>,
    commands: mpsc::Receiver<Command>,
    device_tx: mpsc::UnboundedSender<DeviceEvent>,
    device_rx: mpsc::UnboundedReceiver<DeviceEvent>,
    permission_tx: mpsc::UnboundedSender<PermissionResolved>,
    permission_rx: mpsc::UnboundedReceiver<PermissionResolved>,
}

impl RecordingManager {
    /// Start the manager task and return a handle to it.
    ///
    /// Reads the current permission status once so observers start with it.
    /// Must be called from within a Tokio runtime.
    #[instrument(skip_all)]
    pub fn spawn(
        store: Arc<dyn PermissionStore>,
        backend: Arc<dyn CaptureBackend>,
        options: RecorderOptions,
    ) -> RecorderHandle {
        let gate = PermissionGate::new(store);

        let initial = PublishedState {
            permission: gate.cached_status(),
            ..PublishedState::default()
        };
        let (state_tx, state_rx) = watch::channel(initial);
        let (command_tx, commands) = mpsc::channel(options.command_capacity.max(1));
        let (device_tx, device_rx) = mpsc::unbounded_channel();
        let (permission_tx, permission_rx) = mpsc::unbounded_channel();

        info!(
            permission = %gate.cached_status(),
            sampling_interval_ms = options.sampling_interval.as_millis(),
            "Recording manager initialized"
        );

        let manager = Self {
            gate: gate.clone(),
            backend,
            options,
            session: None,
            sampler: None,
            pending_start: None,
            pending_access: Vec::new(),
            next_ticket: 0,
            next_session: 0,
            latest_session: None,
            state_tx,
            commands,
            device_tx,
            device_rx,
            permission_tx,
            permission_rx,
        };

        tokio::spawn(manager.run());

        RecorderHandle::new(command_tx, state_rx, gate)
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(command) => {
                            if !self.handle_command(command) {
                                return;
                            }
                        }
                        None => {
                            info!("All recorder handles dropped");
                            break;
                        }
                    }
                }
                Some(resolved) = self.permission_rx.recv() => {
                    self.handle_permission(resolved);
                }
                Some(event) = self.device_rx.recv() => {
                    self.handle_device_event(event);
                }
                _ = next_tick(&mut self.sampler) => {
                    self.handle_tick();
                }
            }
        }

        self.teardown();
    }

    /// Returns `false` once the manager should exit.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::RequestAccess { reply } => {
                let status = self.gate.current_status();
                self.publish_permission(status);

                if status == PermissionState::NotDetermined {
                    let ticket = self.request_permission();
                    self.pending_access.push((ticket, reply));
                } else {
                    let _ = reply.send(status);
                }
            }
            Command::RefreshPermission { reply } => {
                let status = self.gate.current_status();
                self.publish_permission(status);
                let _ = reply.send(status);
            }
            Command::Start {
                meeting_id,
                directory,
                reply,
            } => self.begin_start(meeting_id, directory, reply),
            Command::Stop { reply } => {
                self.cancel_pending_start();
                self.stop();
                let _ = reply.send(());
            }
            Command::Shutdown { reply } => {
                info!("Shutdown requested");
                self.teardown();
                let _ = reply.send(());
                return false;
            }
        }

        true
    }

    fn begin_start(
        &mut self,
        meeting_id: MeetingId,
        directory: PathBuf,
        reply: oneshot::Sender<CoreResult<PathBuf>>,
    ) {
        // The newest start wins over one still waiting for permission.
        self.cancel_pending_start();

        let status = self.gate.current_status();
        self.publish_permission(status);

        match status {
            PermissionState::Granted => {
                let result = self.start_session(&meeting_id, &directory);
                let _ = reply.send(result);
            }
            PermissionState::Denied => {
                let _ = reply.send(Err(self.fail_start(RecorderError::permission_required())));
            }
            PermissionState::NotDetermined => {
                let ticket = self.request_permission();
                debug!(meeting_id = %meeting_id, ticket, "Start waiting for permission");
                self.pending_start = Some(PendingStart {
                    ticket,
                    meeting_id,
                    directory,
                    reply,
                });
            }
        }
    }

    /// Ask for permission off the manager task so commands keep flowing.
    fn request_permission(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let gate = self.gate.clone();
        let tx = self.permission_tx.clone();
        tokio::spawn(async move {
            let status = gate.request_access().await;
            let _ = tx.send(PermissionResolved { ticket, status });
        });

        ticket
    }

    fn handle_permission(&mut self, resolved: PermissionResolved) {
        let PermissionResolved { ticket, status } = resolved;
        self.publish_permission(status);

        let waiters = std::mem::take(&mut self.pending_access);
        for (waiting_ticket, reply) in waiters {
            if waiting_ticket == ticket {
                let _ = reply.send(status);
            } else {
                self.pending_access.push((waiting_ticket, reply));
            }
        }

        let matches_pending = self
            .pending_start
            .as_ref()
            .is_some_and(|pending| pending.ticket == ticket);
        if !matches_pending {
            debug!(ticket, status = %status, "Permission resolved with no waiting start");
            return;
        }

        let Some(pending) = self.pending_start.take() else {
            return;
        };

        let result = if status.is_granted() {
            self.start_session(&pending.meeting_id, &pending.directory)
        } else {
            Err(self.fail_start(RecorderError::permission_required()))
        };
        let _ = pending.reply.send(result);
    }

    fn cancel_pending_start(&mut self) {
        if let Some(pending) = self.pending_start.take() {
            info!(meeting_id = %pending.meeting_id, "Cancelling start waiting for permission");
            let _ = pending.reply.send(Err(RecorderError::start_cancelled()));
        }
    }

    /// `Starting -> Active` or `Starting -> Idle`.
    #[instrument(skip_all, fields(meeting_id = %meeting_id))]
    fn start_session(&mut self, meeting_id: &MeetingId, directory: &Path) -> CoreResult<PathBuf> {
        // Never two sessions at once.
        self.stop();

        let destination = meeting_id.recording_path(directory);
        let session_id = SessionId(self.next_session);
        self.next_session += 1;
        self.latest_session = Some(session_id);

        info!(session = %session_id, destination = ?destination, "Starting recording");

        let events = DeviceEventSender::new(session_id, self.device_tx.clone());
        let backend = Arc::clone(&self.backend);
        let opened = device_io(|| backend.open(&destination, &RECORDING_SETTINGS, events));
        let mut device = match opened {
            Ok(device) => device,
            Err(RecorderError::DeviceSetupFailed { reason, location }) => {
                return Err(self.fail_start(RecorderError::DeviceSetupFailed { reason, location }));
            }
            Err(other) => {
                return Err(self.fail_start(RecorderError::device_setup_failed(other.user_message())));
            }
        };

        device.set_metering_enabled(true);

        if !device_io(|| device.record()) {
            device_io(|| device.stop());
            return Err(self.fail_start(RecorderError::device_start_failed()));
        }

        self.session = Some(RecordingSession::new(session_id, device, destination.clone()));
        let sampler = SamplingLoop::start(self.options.sampling_interval);
        debug!(period_ms = sampler.period().as_millis(), "Sampling loop started");
        self.sampler = Some(sampler);

        let permission = self.gate.cached_status();
        self.publish(|state| {
            state.permission = permission;
            state.is_recording = true;
            state.duration = Duration::ZERO;
            state.level = 0.0;
            state.last_error = None;
        });

        info!(session = %session_id, "Recording started successfully");

        Ok(destination)
    }

    fn fail_start(&mut self, error: RecorderError) -> RecorderError {
        let message = error.user_message();
        error!(error = %error, "Recording start failed");

        self.publish(|state| {
            state.reset_capture();
            state.last_error = Some(message);
        });

        error
    }

    /// `Active -> Idle`. No effect when idle.
    fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            self.sampler = None;
            return;
        };

        info!(session = %session.id(), "Stopping recording");

        // Cancel sampling before the device goes away.
        self.sampler = None;
        device_io(|| drop(session));

        self.publish(|state| {
            state.reset_capture();
            state.last_error = None;
        });

        info!("Recording stopped");
    }

    fn teardown(&mut self) {
        self.cancel_pending_start();

        let status = self.gate.cached_status();
        for (_, reply) in self.pending_access.drain(..) {
            let _ = reply.send(status);
        }

        self.stop();
    }

    fn handle_tick(&mut self) {
        let Some(session) = self.session.as_mut() else {
            debug!("Sampling tick without a session, cancelling loop");
            self.sampler = None;
            self.publish(|state| {
                state.duration = Duration::ZERO;
                state.level = 0.0;
            });
            return;
        };

        match take_sample(session) {
            Some(sample) => {
                self.publish(|state| {
                    state.duration = state.duration.max(sample.duration);
                    state.level = sample.level;
                });
            }
            None => {
                // The device left capture on its own (error or platform stop).
                warn!(session = %session.id(), "Capture device stopped independently");
                self.sampler = None;
                self.session = None;
                self.publish(PublishedState::reset_capture);
            }
        }
    }

    fn handle_device_event(&mut self, event: DeviceEvent) {
        if Some(event.session) != self.latest_session {
            debug!(session = %event.session, "Ignoring signal from a superseded session");
            return;
        }

        match event.signal {
            CaptureSignal::Finished { successfully: true } => {
                info!(session = %event.session, "Recording finished");
            }
            CaptureSignal::Finished {
                successfully: false,
            } => {
                self.set_error("Recording finished unsuccessfully".to_string());
            }
            CaptureSignal::EncodeError {
                message: Some(message),
            } => {
                self.set_error(format!("Recording error: {}", message));
            }
            CaptureSignal::EncodeError { message: None } => {
                warn!(session = %event.session, "Encode error reported without details");
            }
        }
    }

    fn set_error(&mut self, message: String) {
        error!(error = %message, "Recorder error");
        self.publish(|state| state.last_error = Some(message));
    }

    fn publish_permission(&mut self, status: PermissionState) {
        if !status.is_granted() && self.session.is_some() {
            // Recording requires permission; a revoked grant ends the session.
            warn!(status = %status, "Microphone permission revoked while recording");
            self.stop();
        }
        self.publish(|state| state.permission = status);
    }

    /// Apply `update` and notify observers if anything changed.
    fn publish(&self, update: impl FnOnce(&mut PublishedState)) {
        self.state_tx.send_if_modified(|state| {
            let before = state.clone();
            update(state);
            *state != before
        });
    }
}

/// Run blocking device work (opening, finalizing the file) on this task.
///
/// On a multi-threaded runtime other tasks move to another worker while it
/// runs. A current-thread runtime runs it directly.
fn device_io<T>(work: impl FnOnce() -> T) -> T {
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(work),
        _ => work(),
    }
}
