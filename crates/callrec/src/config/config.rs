//! Configuration management for callrec.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, validation, and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{
        AudioConfig, DEFAULT_FFMPEG_PATH, DEFAULT_MEETING_LENGTH_MINUTES,
        DEFAULT_SAMPLING_INTERVAL_MS, MeetingsConfig, PermissionConfig, RecordingConfig,
        project_dirs,
    },
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Main configuration struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Recording output configuration.
    pub recording: RecordingConfig,
    /// Audio device configuration.
    pub audio: AudioConfig,
    /// Microphone consent configuration.
    pub permission: PermissionConfig,
    /// Meeting store configuration.
    pub meetings: MeetingsConfig,
}

impl Config {
    /// Load configuration from disk, creating default if not found.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let dirs = project_dirs()?;
        let config_dir = dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Self::load_from(&config_dir.join("config.toml"), dirs.data_dir())
    }

    /// Load configuration from `config_path`, writing defaults rooted at
    /// `data_dir` when the file does not exist.
    #[track_caller]
    #[instrument]
    pub fn load_from(config_path: &Path, data_dir: &Path) -> AppResult<Self> {
        if !config_path.exists() {
            info!("No config found, creating default");
            let config = Self::defaults(data_dir);
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to read config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        config.validate()?;

        info!(config_path = ?config_path, "Configuration loaded");

        Ok(config)
    }

    /// Default configuration with every file under `data_dir`.
    pub fn defaults(data_dir: &Path) -> Self {
        Config {
            recording: RecordingConfig {
                output_dir: data_dir.join("recordings"),
                sampling_interval_ms: DEFAULT_SAMPLING_INTERVAL_MS,
            },
            audio: AudioConfig {
                selected_device: None,
                ffmpeg_path: PathBuf::from(DEFAULT_FFMPEG_PATH),
            },
            permission: PermissionConfig {
                consent_file: data_dir.join("consent.toml"),
            },
            meetings: MeetingsConfig {
                store_file: data_dir.join("meetings.toml"),
                default_length_minutes: DEFAULT_MEETING_LENGTH_MINUTES,
            },
        }
    }

    /// Reject values the recorder cannot work with.
    #[track_caller]
    pub fn validate(&self) -> AppResult<()> {
        if self.recording.sampling_interval_ms == 0 {
            return Err(AppError::ConfigError {
                reason: "recording.sampling_interval_ms must be greater than zero".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        if self.meetings.default_length_minutes == 0 {
            return Err(AppError::ConfigError {
                reason: "meetings.default_length_minutes must be greater than zero".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }

    /// Save configuration to `config_path` using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Atomic write: write to temp file then rename
        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }
}
