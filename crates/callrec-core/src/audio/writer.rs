//! Encoder thread shared by capture devices.
//!
//! Capture callbacks push sample blocks into a bounded channel; the writer
//! thread drains it into ffmpeg and reports the outcome as device signals.

use crate::{DeviceEventSender, FfmpegEncoder};

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::Receiver,
    },
    thread::{self, JoinHandle},
};

use tracing::{debug, error, info};

/// Owns an encoder until capture starts, then the thread feeding it.
pub(crate) struct EncoderWriter {
    encoder: Option<FfmpegEncoder>,
    thread: Option<JoinHandle<()>>,
    events: DeviceEventSender,
    recording: Arc<AtomicBool>,
}

impl EncoderWriter {
    pub(crate) fn new(
        encoder: FfmpegEncoder,
        events: DeviceEventSender,
        recording: Arc<AtomicBool>,
    ) -> Self {
        Self {
            encoder: Some(encoder),
            thread: None,
            events,
            recording,
        }
    }

    /// Whether the encoder is still waiting for capture to start.
    pub(crate) fn is_idle(&self) -> bool {
        self.encoder.is_some()
    }

    /// Hand the encoder to a thread writing every block received on `samples`.
    ///
    /// The thread finishes once all senders are dropped.
    pub(crate) fn start(&mut self, samples: Receiver<Vec<f32>>) -> io::Result<()> {
        let Some(encoder) = self.encoder.take() else {
            return Err(io::Error::other("encoder already started"));
        };

        let events = self.events.clone();
        let recording = Arc::clone(&self.recording);
        let handle = thread::Builder::new()
            .name("callrec-encoder".into())
            .spawn(move || run_writer(encoder, samples, events, recording))?;

        self.thread = Some(handle);
        Ok(())
    }

    /// Kill an encoder that never started. Emits nothing.
    pub(crate) fn abort(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            debug!("Discarding encoder of a device that never recorded");
            encoder.abort();
        }
    }

    /// Wait for the writer thread to finalize the file.
    ///
    /// The sample senders must already be dropped. An encoder that never
    /// started is aborted instead.
    pub(crate) fn close(&mut self) {
        if let Some(handle) = self.thread.take()
            && handle.join().is_err()
        {
            error!("Encoder thread panicked");
        }
        self.abort();
    }
}

impl Drop for EncoderWriter {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_writer(
    mut encoder: FfmpegEncoder,
    samples: Receiver<Vec<f32>>,
    events: DeviceEventSender,
    recording: Arc<AtomicBool>,
) {
    let mut write_failed = false;

    for block in samples.iter() {
        if let Err(e) = encoder.write_samples(&block) {
            error!(error = %e, "Failed to write audio to encoder");
            recording.store(false, Ordering::Release);
            events.encode_error(Some(format!("Failed to write audio to encoder: {}", e)));
            write_failed = true;
            break;
        }
    }
    drop(samples);

    let destination = encoder.destination().to_path_buf();
    let finalized = match encoder.finish() {
        Ok(success) => success,
        Err(e) => {
            error!(error = %e, "Failed to wait for encoder");
            false
        }
    };

    info!(destination = ?destination, finalized, "Encoder finished");

    // A write failure has already been reported with a more specific message.
    if !write_failed {
        events.finished(finalized);
    }
}
