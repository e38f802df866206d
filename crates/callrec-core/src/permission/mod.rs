mod consent_store;
mod gate;
mod state;
mod store;

pub use {
    consent_store::ConsentFileStore,
    gate::PermissionGate,
    state::PermissionState,
    store::{ConsentAnswer, ConsentPrompt, PermissionStore},
};
