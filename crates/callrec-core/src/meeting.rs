//! Meeting reference supplied by the calendar side of the application.

use crate::AUDIO_EXTENSION;

use std::{
    fmt,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Stable identifier of a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeetingId(String);

impl MeetingId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier.
    pub fn generate() -> Self {
        Self::from(Uuid::new_v4())
    }

    /// The identifier as given.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File-name-safe form of the identifier.
    ///
    /// Anything other than ASCII letters, digits, `-` and `_` becomes `_`, so
    /// an identifier can never escape the recording directory. When anything
    /// was replaced (or the identifier is empty) a `.` and the first 16 hex
    /// digits of the identifier's SHA-256 are appended. Untouched stems never
    /// contain `.`, so distinct identifiers get distinct files.
    pub fn file_stem(&self) -> String {
        let mut replaced = self.0.is_empty();
        let stem: String = self
            .0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    replaced = true;
                    '_'
                }
            })
            .collect();

        if !replaced {
            return stem;
        }

        let digest = Sha256::digest(self.0.as_bytes());
        let tag: String = digest.iter().take(8).map(|b| format!("{:02x}", b)).collect();
        let stem = if stem.is_empty() { "_" } else { stem.as_str() };

        format!("{}.{}", stem, tag)
    }

    /// Recording file for this meeting inside `directory`.
    ///
    /// Deterministic, so recording the same meeting again overwrites the
    /// previous file.
    pub fn recording_path(&self, directory: &Path) -> PathBuf {
        directory.join(format!("{}.{}", self.file_stem(), AUDIO_EXTENSION))
    }
}

impl From<Uuid> for MeetingId {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for MeetingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A meeting that can be recorded.
///
/// Only the recording metadata (`recording_path`, `is_recorded`,
/// `updated_at`) is ever touched by the recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    /// Stable identifier.
    pub id: MeetingId,
    /// Display title.
    pub title: Option<String>,
    /// Scheduled start.
    pub starts_at: DateTime<Utc>,
    /// Scheduled end.
    pub ends_at: DateTime<Utc>,
    /// File holding the latest recording.
    #[serde(default)]
    pub recording_path: Option<PathBuf>,
    /// Whether a recording was ever started.
    #[serde(default)]
    pub is_recorded: bool,
    /// Last modification.
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    /// A meeting that has not been recorded yet.
    pub fn new(
        id: MeetingId,
        title: Option<String>,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            starts_at,
            ends_at,
            recording_path: None,
            is_recorded: false,
            updated_at: Utc::now(),
        }
    }

    /// Title for logs and display.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    /// Record that a recording to `path` has started.
    pub fn mark_recording_started(&mut self, path: PathBuf, at: DateTime<Utc>) {
        self.recording_path = Some(path);
        self.is_recorded = true;
        self.updated_at = at;
    }
}
