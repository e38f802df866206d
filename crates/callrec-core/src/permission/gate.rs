use crate::{PermissionState, PermissionStore};

use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};

use tracing::{debug, info, instrument};

/// Caches microphone authorization in front of a [`PermissionStore`].
///
/// Cheap to clone; all clones share the same cache. The cache is what keeps
/// a granted status from silently regressing when the platform store briefly
/// reports `NotDetermined`.
#[derive(Clone)]
pub struct PermissionGate {
    store: Arc<dyn PermissionStore>,
    cached: Arc<AtomicU8>,
}

impl PermissionGate {
    /// Create a gate over the given store, reading its status once.
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        let initial = store.status();
        debug!(status = %initial, "Permission gate initialized");

        Self {
            store,
            cached: Arc::new(AtomicU8::new(initial.to_u8())),
        }
    }

    /// Synchronous snapshot of the authorization status.
    pub fn current_status(&self) -> PermissionState {
        let observed = self.store.status();
        self.remember(observed)
    }

    /// Last status seen by this gate, without consulting the store.
    pub fn cached_status(&self) -> PermissionState {
        PermissionState::from_u8(self.cached.load(Ordering::Acquire))
    }

    /// Ask for microphone access if it has not been decided yet.
    ///
    /// Returns immediately when the status is already `Granted` or `Denied`;
    /// the platform never shows the prompt twice.
    #[instrument(skip(self))]
    pub async fn request_access(&self) -> PermissionState {
        let status = self.current_status();
        if status != PermissionState::NotDetermined {
            debug!(status = %status, "Permission already decided, not prompting");
            return status;
        }

        info!("Requesting microphone permission");
        let answer = self.store.request().await;
        let status = self.remember(answer);

        info!(status = %status, "Permission request resolved");

        status
    }

    fn remember(&self, observed: PermissionState) -> PermissionState {
        let mut merged = observed;
        let _ = self
            .cached
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |previous| {
                merged = PermissionState::from_u8(previous).merge(observed);
                Some(merged.to_u8())
            });
        merged
    }
}
