use crate::config::default_sampling_interval_ms;

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

/// Where recordings go and how often live readings refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Directory receiving `<meeting id>.m4a` files.
    pub output_dir: PathBuf,
    /// Milliseconds between duration/level samples.
    #[serde(default = "default_sampling_interval_ms")]
    pub sampling_interval_ms: u64,
}

impl RecordingConfig {
    /// Sampling interval as a [`Duration`].
    pub fn sampling_interval(&self) -> Duration {
        Duration::from_millis(self.sampling_interval_ms)
    }
}
