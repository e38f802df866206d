//! Scripted stand-ins for the platform permission store and capture hardware.

use crate::{
    CaptureBackend, CaptureDevice, CoreResult, DeviceEventSender, EncoderSettings,
    PermissionState, PermissionStore, RecorderError, RecorderHandle, RecorderOptions,
    RecordingManager, SILENCE_DB,
};

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Notify;

/// Permission store whose status and prompt answer are set by the test.
pub(crate) struct ScriptedPermissionStore {
    status: Mutex<PermissionState>,
    answer: PermissionState,
    hold: Option<Arc<Notify>>,
    requests: AtomicUsize,
}

impl ScriptedPermissionStore {
    pub(crate) fn new(status: PermissionState, answer: PermissionState) -> Self {
        Self {
            status: Mutex::new(status),
            answer,
            hold: None,
            requests: AtomicUsize::new(0),
        }
    }

    pub(crate) fn granted() -> Self {
        Self::new(PermissionState::Granted, PermissionState::Granted)
    }

    /// The prompt will not answer until `hold` is notified.
    pub(crate) fn held(answer: PermissionState, hold: Arc<Notify>) -> Self {
        Self {
            hold: Some(hold),
            ..Self::new(PermissionState::NotDetermined, answer)
        }
    }

    pub(crate) fn set_status(&self, status: PermissionState) {
        *self.status.lock().unwrap() = status;
    }

    pub(crate) fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionStore for ScriptedPermissionStore {
    fn status(&self) -> PermissionState {
        *self.status.lock().unwrap()
    }

    async fn request(&self) -> PermissionState {
        let current = self.status();
        if current != PermissionState::NotDetermined {
            return current;
        }

        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }

        self.set_status(self.answer);
        self.answer
    }
}

/// What a fake device has been asked to do.
pub(crate) struct DeviceProbe {
    pub(crate) recording: AtomicBool,
    pub(crate) stopped: AtomicBool,
    pub(crate) stop_calls: AtomicUsize,
    pub(crate) metering: AtomicBool,
    pub(crate) metering_before_record: AtomicBool,
    pub(crate) meter_refreshes: AtomicUsize,
    power_db: AtomicU32,
}

impl DeviceProbe {
    fn new() -> Self {
        Self {
            recording: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            stop_calls: AtomicUsize::new(0),
            metering: AtomicBool::new(false),
            metering_before_record: AtomicBool::new(false),
            meter_refreshes: AtomicUsize::new(0),
            power_db: AtomicU32::new(SILENCE_DB.to_bits()),
        }
    }

    pub(crate) fn set_power_db(&self, db: f32) {
        self.power_db.store(db.to_bits(), Ordering::SeqCst);
    }

    /// Simulate the device leaving capture on its own.
    pub(crate) fn drop_out(&self) {
        self.recording.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

pub(crate) struct FakeDevice {
    probe: Arc<DeviceProbe>,
    fail_record: bool,
}

impl FakeDevice {
    pub(crate) fn new(fail_record: bool) -> (Self, Arc<DeviceProbe>) {
        let probe = Arc::new(DeviceProbe::new());
        (
            Self {
                probe: Arc::clone(&probe),
                fail_record,
            },
            probe,
        )
    }
}

impl CaptureDevice for FakeDevice {
    fn set_metering_enabled(&mut self, enabled: bool) {
        self.probe.metering.store(enabled, Ordering::SeqCst);
    }

    fn record(&mut self) -> bool {
        self.probe
            .metering_before_record
            .store(self.probe.metering.load(Ordering::SeqCst), Ordering::SeqCst);

        if self.fail_record {
            return false;
        }
        self.probe.recording.store(true, Ordering::SeqCst);
        true
    }

    fn stop(&mut self) {
        self.probe.recording.store(false, Ordering::SeqCst);
        self.probe.stopped.store(true, Ordering::SeqCst);
        self.probe.stop_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn is_recording(&self) -> bool {
        self.probe.recording.load(Ordering::SeqCst)
    }

    fn update_meters(&mut self) {
        self.probe.meter_refreshes.fetch_add(1, Ordering::SeqCst);
    }

    fn average_power(&self, _channel: usize) -> f32 {
        f32::from_bits(self.probe.power_db.load(Ordering::SeqCst))
    }
}

/// A device handed out by [`FakeBackend`], with everything it was opened with.
#[derive(Clone)]
pub(crate) struct OpenedDevice {
    pub(crate) destination: PathBuf,
    pub(crate) settings: EncoderSettings,
    pub(crate) events: DeviceEventSender,
    pub(crate) probe: Arc<DeviceProbe>,
}

/// Capture backend that creates the destination file and hands out fakes.
#[derive(Default)]
pub(crate) struct FakeBackend {
    pub(crate) fail_open: AtomicBool,
    pub(crate) fail_record: AtomicBool,
    opened: Mutex<Vec<OpenedDevice>>,
}

impl FakeBackend {
    pub(crate) fn opened(&self) -> Vec<OpenedDevice> {
        self.opened.lock().unwrap().clone()
    }

    pub(crate) fn device(&self, index: usize) -> OpenedDevice {
        self.opened()[index].clone()
    }
}

impl CaptureBackend for FakeBackend {
    fn open(
        &self,
        destination: &Path,
        settings: &EncoderSettings,
        events: DeviceEventSender,
    ) -> CoreResult<Box<dyn CaptureDevice>> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(RecorderError::device_setup_failed("no input device"));
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(destination, b"").unwrap();

        let (device, probe) = FakeDevice::new(self.fail_record.load(Ordering::SeqCst));
        self.opened.lock().unwrap().push(OpenedDevice {
            destination: destination.to_path_buf(),
            settings: *settings,
            events,
            probe,
        });

        Ok(Box::new(device))
    }
}

/// A manager over scripted collaborators.
pub(crate) struct Harness {
    pub(crate) recorder: RecorderHandle,
    pub(crate) store: Arc<ScriptedPermissionStore>,
    pub(crate) backend: Arc<FakeBackend>,
    pub(crate) dir: tempfile::TempDir,
}

impl Harness {
    pub(crate) fn new(store: ScriptedPermissionStore) -> Self {
        Self::with_backend(store, FakeBackend::default())
    }

    pub(crate) fn granted() -> Self {
        Self::new(ScriptedPermissionStore::granted())
    }

    pub(crate) fn with_backend(store: ScriptedPermissionStore, backend: FakeBackend) -> Self {
        let store = Arc::new(store);
        let backend = Arc::new(backend);
        let recorder = RecordingManager::spawn(
            Arc::clone(&store) as Arc<dyn PermissionStore>,
            Arc::clone(&backend) as Arc<dyn CaptureBackend>,
            RecorderOptions {
                sampling_interval: Duration::from_millis(100),
                ..RecorderOptions::default()
            },
        );

        Self {
            recorder,
            store,
            backend,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub(crate) fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Let spawned tasks run until they are all waiting.
pub(crate) async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// Yield until `condition` holds.
pub(crate) async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
