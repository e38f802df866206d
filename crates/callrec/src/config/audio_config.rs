use crate::config::default_ffmpeg_path;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Audio device configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Selected input device name (None = default device).
    #[serde(default)]
    pub selected_device: Option<String>,
    /// ffmpeg executable used to encode recordings.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
}
