use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Microphone consent storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionConfig {
    /// File holding the user's one-time consent decision.
    pub consent_file: PathBuf,
}
