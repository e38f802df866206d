//! Persistent list of meetings.
//!
//! Stands in for the calendar side of the application: meetings are kept in
//! a TOML file, looked up by id or title from the console, and updated with
//! recording metadata once a recording starts.

use crate::{AppError, AppResult};

use callrec_core::{Meeting, MeetingId};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
};

use chrono::{Duration, Utc};
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

#[derive(Debug, Default, Serialize, Deserialize)]
struct MeetingFile {
    #[serde(default)]
    meetings: Vec<Meeting>,
}

/// Meetings loaded from and saved to a TOML file.
#[derive(Debug)]
pub struct MeetingStore {
    path: PathBuf,
    meetings: Vec<Meeting>,
}

impl MeetingStore {
    /// Load meetings from `path`. A missing file yields an empty store.
    #[track_caller]
    #[instrument]
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            debug!("No meeting store found, starting empty");
            return Ok(Self {
                path: path.to_path_buf(),
                meetings: Vec::new(),
            });
        }

        let contents = fs::read_to_string(path).map_err(|e| AppError::MeetingStoreError {
            reason: format!("Failed to read meetings: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let file: MeetingFile = toml::from_str(&contents).map_err(|e| AppError::MeetingStoreError {
            reason: format!("Failed to parse meetings: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(count = file.meetings.len(), "Meetings loaded");

        Ok(Self {
            path: path.to_path_buf(),
            meetings: file.meetings,
        })
    }

    /// All known meetings.
    pub fn meetings(&self) -> &[Meeting] {
        &self.meetings
    }

    /// Find a meeting by exact id, or by title ignoring case.
    pub fn find(&self, target: &str) -> Option<&Meeting> {
        self.meetings
            .iter()
            .find(|meeting| meeting.id.as_str() == target)
            .or_else(|| {
                self.meetings.iter().find(|meeting| {
                    meeting
                        .title
                        .as_deref()
                        .is_some_and(|title| title.eq_ignore_ascii_case(target))
                })
            })
    }

    /// Resolve the meeting to record.
    ///
    /// An existing meeting matching `target` is returned as-is. Otherwise a
    /// new meeting starting now is created, titled `target` when given.
    pub fn resolve(&self, target: Option<&str>, length_minutes: u32) -> Meeting {
        if let Some(existing) = target.and_then(|target| self.find(target)) {
            return existing.clone();
        }

        let starts_at = Utc::now();
        let meeting = Meeting::new(
            MeetingId::generate(),
            target.map(str::to_string),
            starts_at,
            starts_at + Duration::minutes(i64::from(length_minutes)),
        );
        info!(meeting_id = %meeting.id, title = meeting.display_title(), "Created meeting");
        meeting
    }

    /// Insert `meeting`, replacing any meeting with the same id.
    pub fn upsert(&mut self, meeting: Meeting) {
        match self.meetings.iter_mut().find(|m| m.id == meeting.id) {
            Some(existing) => *existing = meeting,
            None => self.meetings.push(meeting),
        }
    }

    /// Save all meetings using the atomic write pattern.
    #[track_caller]
    #[instrument(skip(self), fields(path = ?self.path))]
    pub fn save(&self) -> AppResult<()> {
        let file = MeetingFile {
            meetings: self.meetings.clone(),
        };

        let contents = toml::to_string_pretty(&file).map_err(|e| AppError::MeetingStoreError {
            reason: format!("Failed to serialize meetings: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Atomic write: write to temp file then rename
        let temp_path = self.path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path)?;
        temp_file.write_all(contents.as_bytes())?;
        temp_file.sync_all()?;

        fs::rename(&temp_path, &self.path).map_err(|e| AppError::MeetingStoreError {
            reason: format!("Failed to rename temp meetings file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        debug!(count = self.meetings.len(), "Meetings saved");

        Ok(())
    }
}
