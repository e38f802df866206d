/// Commands sent from the console handler to the main application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Start recording a meeting.
    StartRecording {
        /// Meeting id or title; a new meeting is created when nothing matches
        /// or when omitted.
        target: Option<String>,
    },
    /// Stop the current recording.
    StopRecording,
    /// Ask for microphone access.
    RequestPermission,
    /// Print the recorder state.
    ShowStatus,
    /// Print the known meetings.
    ListMeetings,
    /// Request application shutdown.
    Shutdown,
}
