//! ffmpeg child process turning raw PCM into the recording file.

use crate::{EncoderSettings, RecorderError, error::Result as CoreResult};

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use tracing::{debug, info, instrument, warn};

/// Pipes interleaved f32 samples into an ffmpeg process.
///
/// ffmpeg downmixes and resamples the device's native format to the
/// recording settings and writes the container on exit.
pub struct FfmpegEncoder {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    destination: PathBuf,
}

impl FfmpegEncoder {
    /// Command-line arguments for encoding `input_rate`/`input_channels`
    /// float PCM from stdin into `destination`.
    pub fn command_args(
        destination: &Path,
        input_rate: u32,
        input_channels: u16,
        settings: &EncoderSettings,
    ) -> Vec<String> {
        vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-f".into(),
            "f32le".into(),
            "-ar".into(),
            input_rate.to_string(),
            "-ac".into(),
            input_channels.to_string(),
            "-i".into(),
            "pipe:0".into(),
            "-ac".into(),
            settings.channels.to_string(),
            "-ar".into(),
            settings.sample_rate.to_string(),
            "-c:a".into(),
            settings.codec.ffmpeg_name().into(),
            "-b:a".into(),
            format!("{}k", settings.quality.mono_bitrate_kbps() * u32::from(settings.channels)),
            "-y".into(),
            destination.to_string_lossy().into_owned(),
        ]
    }

    /// Create (or truncate) the destination, then start ffmpeg writing to it.
    ///
    /// An unwritable destination fails here, before any audio is captured.
    #[track_caller]
    #[instrument(skip(settings))]
    pub fn spawn(
        ffmpeg: &Path,
        destination: &Path,
        input_rate: u32,
        input_channels: u16,
        settings: &EncoderSettings,
    ) -> CoreResult<Self> {
        prepare_destination(destination)?;

        let args = Self::command_args(destination, input_rate, input_channels, settings);

        let mut child = Command::new(ffmpeg)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                RecorderError::device_setup_failed(format!(
                    "Failed to launch encoder {:?}: {}",
                    ffmpeg, e
                ))
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            RecorderError::device_setup_failed("Encoder stdin was not captured")
        })?;

        info!(pid = child.id(), "Encoder started");

        Ok(Self {
            child: Some(child),
            stdin: Some(stdin),
            destination: destination.to_path_buf(),
        })
    }

    /// Destination the encoder writes to.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Write a block of interleaved samples.
    pub fn write_samples(&mut self, samples: &[f32]) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "encoder input closed"))?;

        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        stdin.write_all(&bytes)
    }

    /// Close the input and wait for ffmpeg to finalize the file.
    ///
    /// Returns whether ffmpeg exited successfully.
    #[instrument(skip(self), fields(destination = ?self.destination))]
    pub fn finish(mut self) -> io::Result<bool> {
        drop(self.stdin.take());

        let Some(mut child) = self.child.take() else {
            return Ok(false);
        };

        let status = child.wait()?;
        debug!(status = %status, "Encoder exited");

        Ok(status.success())
    }

    /// Kill ffmpeg without finalizing.
    pub fn abort(mut self) {
        self.kill();
    }

    fn kill(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                warn!(error = %e, "Failed to kill encoder");
            }
            let _ = child.wait();
        }
    }
}

#[track_caller]
fn prepare_destination(destination: &Path) -> CoreResult<()> {
    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| {
            RecorderError::device_setup_failed(format!(
                "Failed to create recording directory {:?}: {}",
                parent, e
            ))
        })?;
    }

    fs::File::create(destination).map_err(|e| {
        RecorderError::device_setup_failed(format!(
            "Failed to create recording file {:?}: {}",
            destination, e
        ))
    })?;

    debug!(destination = ?destination, "Recording file created");
    Ok(())
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        self.kill();
    }
}
