use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

/// Recording errors with source location tracking.
///
/// Every variant is recoverable: the worst outcome of any of them is that
/// the user cannot record right now and may retry.
#[derive(Error, Debug)]
pub enum RecorderError {
    /// Start attempted without granted microphone permission, including after
    /// an automatic request the user declined.
    #[error("Microphone permission is required to record audio {location}")]
    PermissionRequired {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Constructing or configuring the capture device failed.
    #[error("Recording setup failed: {reason} {location}")]
    DeviceSetupFailed {
        /// Description of the setup failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The capture device reported that it could not begin recording.
    #[error("Failed to start audio recording {location}")]
    DeviceStartFailed {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A stop request (or a newer start) arrived while this start was still
    /// waiting for the permission decision.
    #[error("Recording start cancelled {location}")]
    StartCancelled {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The recording manager task has exited.
    #[error("Recording manager is not running {location}")]
    ManagerUnavailable {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Reading or writing the persisted consent decision failed.
    #[error("Consent store error: {reason} {location}")]
    ConsentStore {
        /// Description of the store failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl RecorderError {
    #[track_caller]
    pub(crate) fn permission_required() -> Self {
        Self::PermissionRequired {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn device_setup_failed(reason: impl Into<String>) -> Self {
        Self::DeviceSetupFailed {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn device_start_failed() -> Self {
        Self::DeviceStartFailed {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn start_cancelled() -> Self {
        Self::StartCancelled {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn manager_unavailable() -> Self {
        Self::ManagerUnavailable {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn consent_store(reason: impl Into<String>) -> Self {
        Self::ConsentStore {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Human-readable message without the source location.
    ///
    /// This is the text published as the observable `last_error`.
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionRequired { .. } => {
                "Microphone permission is required to record audio".to_string()
            }
            Self::DeviceSetupFailed { reason, .. } => format!("Recording setup failed: {reason}"),
            Self::DeviceStartFailed { .. } => "Failed to start audio recording".to_string(),
            Self::StartCancelled { .. } => "Recording start cancelled".to_string(),
            Self::ManagerUnavailable { .. } => "Recording manager is not running".to_string(),
            Self::ConsentStore { reason, .. } => format!("Consent store error: {reason}"),
        }
    }
}

/// Result type alias using [`RecorderError`].
pub type Result<T> = std::result::Result<T, RecorderError>;
