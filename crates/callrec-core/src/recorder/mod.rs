mod handle;
mod legacy;
mod manager;
pub(crate) mod sampling;
pub(crate) mod session;
mod state;

pub use {
    handle::RecorderHandle,
    legacy::{LegacyRecordingService, LegacySnapshot, LegacySubscription, RecordingPermissionStatus},
    manager::{RecorderOptions, RecordingManager},
    sampling::DEFAULT_SAMPLING_INTERVAL,
    state::PublishedState,
};
