use crate::{
    CaptureBackend, CaptureDevice, DeviceEventSender, EncoderSettings, FfmpegEncoder,
    RecorderError,
    audio::{PowerMeter, SILENCE_DB, writer::EncoderWriter},
    error::Result as CoreResult,
};

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, SyncSender, TrySendError},
    },
};

use cpal::{
    Device, Stream, StreamConfig, StreamError,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use tracing::{error, info, instrument, warn};

/// Audio blocks buffered between the capture callback and the encoder.
///
/// At typical callback sizes (10ms) this covers a few seconds of encoder stall.
const ENCODER_QUEUE_DEPTH: usize = 256;

/// Capture backend recording from a cpal input device through ffmpeg.
#[derive(Debug, Clone)]
pub struct CpalBackend {
    ffmpeg_path: PathBuf,
    device_name: Option<String>,
}

impl CpalBackend {
    /// Create a backend using `ffmpeg_path` for encoding and the named input
    /// device (or the system default when `None`).
    pub fn new<P: Into<PathBuf>>(ffmpeg_path: P, device_name: Option<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            device_name,
        }
    }

    #[track_caller]
    fn select_device(&self) -> CoreResult<Device> {
        let host = cpal::default_host();

        let Some(wanted) = self.device_name.as_deref() else {
            return host
                .default_input_device()
                .ok_or_else(|| RecorderError::device_setup_failed("No microphone found"));
        };

        let devices = host.input_devices().map_err(|e| {
            RecorderError::device_setup_failed(format!("Failed to list input devices: {}", e))
        })?;

        #[allow(deprecated)]
        let found = devices
            .into_iter()
            .find(|device| device.name().map(|name| name == wanted).unwrap_or(false));

        found.ok_or_else(|| {
            RecorderError::device_setup_failed(format!("Input device not found: {}", wanted))
        })
    }
}

impl CaptureBackend for CpalBackend {
    #[instrument(skip(self, settings, events), fields(session = %events.session()))]
    fn open(
        &self,
        destination: &Path,
        settings: &EncoderSettings,
        events: DeviceEventSender,
    ) -> CoreResult<Box<dyn CaptureDevice>> {
        let device = self.select_device()?;

        let config = device.default_input_config().map_err(|e| {
            RecorderError::device_setup_failed(format!("Failed to get config: {}", e))
        })?;
        let config: StreamConfig = config.into();

        let encoder = FfmpegEncoder::spawn(
            &self.ffmpeg_path,
            destination,
            config.sample_rate,
            config.channels,
            settings,
        )?;

        info!(
            device_id = ?device.id(),
            sample_rate = config.sample_rate,
            channels = config.channels,
            destination = ?destination,
            "Capture device configured"
        );

        let recording = Arc::new(AtomicBool::new(false));
        let writer = EncoderWriter::new(encoder, events.clone(), Arc::clone(&recording));

        Ok(Box::new(CpalRecorder {
            device,
            config,
            events,
            meter: Arc::new(PowerMeter::new()),
            recording,
            shutdown: Arc::new(AtomicBool::new(false)),
            stream: None,
            writer,
        }))
    }
}

struct CpalRecorder {
    device: Device,
    config: StreamConfig,
    events: DeviceEventSender,
    meter: Arc<PowerMeter>,
    recording: Arc<AtomicBool>,
    /// Set before the stream is dropped so a late callback writes nothing.
    shutdown: Arc<AtomicBool>,
    stream: Option<Stream>,
    writer: EncoderWriter,
}

impl CpalRecorder {
    fn build_stream(&self, sample_tx: SyncSender<Vec<f32>>) -> Result<Stream, String> {
        let meter = Arc::clone(&self.meter);
        let shutdown = Arc::clone(&self.shutdown);
        let overrun_reported = Arc::new(AtomicBool::new(false));
        let data_events = self.events.clone();

        let error_events = self.events.clone();
        let recording = Arc::clone(&self.recording);

        self.device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if shutdown.load(Ordering::Acquire) {
                        return;
                    }
                    meter.accumulate(data);

                    match sample_tx.try_send(data.to_vec()) {
                        Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                        Err(TrySendError::Full(_)) => {
                            if !overrun_reported.swap(true, Ordering::AcqRel) {
                                data_events.encode_error(Some(
                                    "Encoder is falling behind, audio was dropped".to_string(),
                                ));
                            }
                        }
                    }
                },
                move |err: StreamError| {
                    error!("Audio stream error: {}", err);
                    if matches!(err, StreamError::DeviceNotAvailable) {
                        recording.store(false, Ordering::Release);
                    }
                    error_events.encode_error(Some(format!("Audio stream error: {}", err)));
                },
                None,
            )
            .map_err(|e| format!("Failed to build stream: {}", e))
    }
}

impl CaptureDevice for CpalRecorder {
    fn set_metering_enabled(&mut self, enabled: bool) {
        self.meter.set_enabled(enabled);
    }

    #[instrument(skip(self), fields(session = %self.events.session()))]
    fn record(&mut self) -> bool {
        if self.stream.is_some() {
            return self.is_recording();
        }
        if !self.writer.is_idle() {
            warn!("Capture device already used");
            return false;
        }

        let (sample_tx, sample_rx) = mpsc::sync_channel(ENCODER_QUEUE_DEPTH);

        let stream = match self.build_stream(sample_tx) {
            Ok(stream) => stream,
            Err(reason) => {
                error!(%reason, "Capture could not start");
                self.writer.abort();
                return false;
            }
        };

        if let Err(e) = stream.play() {
            error!("Failed to start stream: {}", e);
            drop(stream);
            self.writer.abort();
            return false;
        }

        self.recording.store(true, Ordering::Release);

        match self.writer.start(sample_rx) {
            Ok(()) => {
                self.stream = Some(stream);
                info!("Audio capture started");
                true
            }
            Err(e) => {
                error!("Failed to spawn encoder thread: {}", e);
                self.recording.store(false, Ordering::Release);
                self.shutdown.store(true, Ordering::Release);
                drop(stream);
                false
            }
        }
    }

    #[instrument(skip(self), fields(session = %self.events.session()))]
    fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.recording.store(false, Ordering::Release);

        // Dropping the stream drops the callback's sender, which ends the
        // writer loop and lets ffmpeg finalize the file.
        if let Some(stream) = self.stream.take() {
            drop(stream);
            info!("Audio capture stopped");
        }

        self.writer.close();
    }

    fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Acquire)
    }

    fn update_meters(&mut self) {
        self.meter.refresh();
    }

    fn average_power(&self, channel: usize) -> f32 {
        // Channels are metered together; the recording itself is mono.
        if channel == 0 {
            self.meter.average_power()
        } else {
            SILENCE_DB
        }
    }
}

impl Drop for CpalRecorder {
    fn drop(&mut self) {
        self.stop();
    }
}
