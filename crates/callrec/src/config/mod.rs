mod audio_config;
#[allow(clippy::module_inception)]
mod config;
mod meetings_config;
mod permission_config;
mod recording_config;

pub(crate) use {
    audio_config::AudioConfig, config::Config, meetings_config::MeetingsConfig,
    permission_config::PermissionConfig, recording_config::RecordingConfig,
};

use crate::{AppError, AppResult};

use std::panic::Location;

use directories::ProjectDirs;
use error_location::ErrorLocation;

pub(crate) const DEFAULT_SAMPLING_INTERVAL_MS: u64 = 100;
pub(crate) const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";
pub(crate) const DEFAULT_MEETING_LENGTH_MINUTES: u32 = 60;

pub(crate) fn default_sampling_interval_ms() -> u64 {
    DEFAULT_SAMPLING_INTERVAL_MS
}

pub(crate) fn default_ffmpeg_path() -> std::path::PathBuf {
    DEFAULT_FFMPEG_PATH.into()
}

pub(crate) fn default_meeting_length_minutes() -> u32 {
    DEFAULT_MEETING_LENGTH_MINUTES
}

/// Platform directories for configuration, data and logs.
#[track_caller]
pub(crate) fn project_dirs() -> AppResult<ProjectDirs> {
    ProjectDirs::from("com", "callrec", "CallRec").ok_or_else(|| AppError::ConfigError {
        reason: "Failed to get project directories".to_string(),
        location: ErrorLocation::from(Location::caller()),
    })
}
