//! CallRec Core Library
//!
//! Microphone permission, meeting recording sessions and live level
//! sampling for the CallRec meeting recorder, built on CPAL and ffmpeg.
//!
//! # Example
//!
//! ```no_run
//! use callrec_core::{
//!     ConsentAnswer, ConsentFileStore, ConsentPrompt, CoreResult, CpalBackend, MeetingId,
//!     RecorderOptions, RecordingManager,
//! };
//!
//! use std::{path::Path, sync::Arc, time::Duration};
//!
//! struct AlwaysAllow;
//!
//! #[async_trait::async_trait]
//! impl ConsentPrompt for AlwaysAllow {
//!     async fn ask(&self) -> ConsentAnswer {
//!         ConsentAnswer::Allow
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let store = Arc::new(ConsentFileStore::new("consent.toml", Arc::new(AlwaysAllow)));
//!     let backend = Arc::new(CpalBackend::new("ffmpeg", None));
//!     let recorder = RecordingManager::spawn(store, backend, RecorderOptions::default());
//!
//!     let path = recorder
//!         .start(&MeetingId::new("standup"), Path::new("recordings"))
//!         .await?;
//!     tokio::time::sleep(Duration::from_secs(3)).await;
//!     recorder.stop().await;
//!
//!     println!("Recorded: {}", path.display());
//!     Ok(())
//! }
//! ```

mod audio;
mod error;
mod meeting;
mod permission;
mod recorder;

pub use {
    audio::{
        AUDIO_EXTENSION, AudioCodec, CaptureBackend, CaptureDevice, CaptureSignal, CpalBackend,
        DeviceEvent, DeviceEventSender, EncoderQuality, EncoderSettings, FfmpegEncoder,
        METER_FLOOR_DB, RECORDING_SETTINGS, SILENCE_DB, SessionId, normalize_level, power_db,
    },
    error::{RecorderError, Result as CoreResult},
    meeting::{Meeting, MeetingId},
    permission::{
        ConsentAnswer, ConsentFileStore, ConsentPrompt, PermissionGate, PermissionState,
        PermissionStore,
    },
    recorder::{
        DEFAULT_SAMPLING_INTERVAL, LegacyRecordingService, LegacySnapshot, LegacySubscription,
        PublishedState, RecorderHandle, RecorderOptions, RecordingManager,
        RecordingPermissionStatus,
    },
};
