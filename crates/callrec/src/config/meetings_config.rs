use crate::config::default_meeting_length_minutes;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Meeting persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingsConfig {
    /// TOML file listing known meetings.
    pub store_file: PathBuf,
    /// Scheduled length of meetings created from the console.
    #[serde(default = "default_meeting_length_minutes")]
    pub default_length_minutes: u32,
}
