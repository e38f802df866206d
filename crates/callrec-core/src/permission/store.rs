use crate::PermissionState;

use async_trait::async_trait;

/// Platform authorization store for microphone access.
///
/// Implementations are queried from the recording manager task and from
/// handle getters, so `status` must return without blocking on the user.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Current authorization as recorded by the platform.
    fn status(&self) -> PermissionState;

    /// Ask the user for access.
    ///
    /// Only prompts while the status is `NotDetermined`; a decided status is
    /// returned as-is. Waits for as long as the user takes to answer.
    async fn request(&self) -> PermissionState;
}

/// Answer given to a one-time consent prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentAnswer {
    /// The user allowed microphone access.
    Allow,
    /// The user refused microphone access.
    Deny,
    /// The prompt was closed without a choice.
    Dismissed,
}

impl From<ConsentAnswer> for PermissionState {
    fn from(answer: ConsentAnswer) -> Self {
        match answer {
            ConsentAnswer::Allow => PermissionState::Granted,
            // A dismissed prompt counts as a refusal.
            ConsentAnswer::Deny | ConsentAnswer::Dismissed => PermissionState::Denied,
        }
    }
}

/// Presents the consent question to the user.
#[async_trait]
pub trait ConsentPrompt: Send + Sync {
    /// Show the prompt and wait for the answer.
    async fn ask(&self) -> ConsentAnswer;
}
