//! File-backed microphone consent.
//!
//! Desktop platforms have no per-app microphone authorization API that cpal
//! exposes, so the one-time decision is kept in a small TOML file. A missing
//! file means the user has never been asked.

use crate::{
    ConsentPrompt, PermissionState, PermissionStore, RecorderError,
    error::Result as CoreResult,
};

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConsentRecord {
    decision: PermissionState,
    decided_at: DateTime<Utc>,
}

/// Permission store persisting the user's decision to disk.
pub struct ConsentFileStore {
    path: PathBuf,
    prompt: Arc<dyn ConsentPrompt>,
    prompt_lock: Mutex<()>,
}

impl ConsentFileStore {
    /// Create a store backed by `path`, asking through `prompt` when needed.
    pub fn new<P: Into<PathBuf>>(path: P, prompt: Arc<dyn ConsentPrompt>) -> Self {
        Self {
            path: path.into(),
            prompt,
            prompt_lock: Mutex::new(()),
        }
    }

    /// Location of the consent file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_record(&self) -> Option<ConsentRecord> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Failed to read consent file");
                return None;
            }
        };

        match toml::from_str::<ConsentRecord>(&contents) {
            Ok(record) if record.decision != PermissionState::NotDetermined => Some(record),
            Ok(_) => None,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Ignoring corrupt consent file");
                None
            }
        }
    }

    #[track_caller]
    fn write_record(&self, record: &ConsentRecord) -> CoreResult<()> {
        let contents = toml::to_string_pretty(record)
            .map_err(|e| RecorderError::consent_store(format!("Failed to serialize: {e}")))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                RecorderError::consent_store(format!("Failed to create directory: {e}"))
            })?;
        }

        // Atomic write: temp file then rename
        let temp_path = self.path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path)
            .map_err(|e| RecorderError::consent_store(format!("Failed to create temp file: {e}")))?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| RecorderError::consent_store(format!("Failed to write temp file: {e}")))?;

        temp_file
            .sync_all()
            .map_err(|e| RecorderError::consent_store(format!("Failed to sync temp file: {e}")))?;

        fs::rename(&temp_path, &self.path)
            .map_err(|e| RecorderError::consent_store(format!("Failed to rename temp file: {e}")))?;

        debug!(path = ?self.path, decision = %record.decision, "Consent decision saved");

        Ok(())
    }
}

#[async_trait]
impl PermissionStore for ConsentFileStore {
    fn status(&self) -> PermissionState {
        self.read_record()
            .map(|record| record.decision)
            .unwrap_or(PermissionState::NotDetermined)
    }

    #[instrument(skip(self), fields(path = ?self.path))]
    async fn request(&self) -> PermissionState {
        // One prompt at a time; later callers see the stored answer.
        let _guard = self.prompt_lock.lock().await;

        if let Some(record) = self.read_record() {
            return record.decision;
        }

        let answer = self.prompt.ask().await;
        let decision = PermissionState::from(answer);

        info!(answer = ?answer, decision = %decision, "Consent prompt answered");

        let record = ConsentRecord {
            decision,
            decided_at: Utc::now(),
        };

        if let Err(e) = self.write_record(&record) {
            // The answer still stands for this run.
            error!(error = %e, "Failed to persist consent decision");
        }

        decision
    }
}
