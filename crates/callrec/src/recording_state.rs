use std::time::Instant;

use callrec_core::MeetingId;

/// What the console believes the recorder is doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingState {
    /// Not currently recording.
    Idle,
    /// Currently recording a meeting.
    Recording {
        /// When recording started.
        started_at: Instant,
        /// Meeting being recorded, for log correlation.
        meeting_id: MeetingId,
    },
}
