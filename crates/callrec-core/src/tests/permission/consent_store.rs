use crate::{ConsentAnswer, ConsentFileStore, ConsentPrompt, PermissionState, PermissionStore};

use std::{
    fs,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;

struct FixedPrompt {
    answer: ConsentAnswer,
    asked: AtomicUsize,
}

impl FixedPrompt {
    fn new(answer: ConsentAnswer) -> Arc<Self> {
        Arc::new(Self {
            answer,
            asked: AtomicUsize::new(0),
        })
    }

    fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConsentPrompt for FixedPrompt {
    async fn ask(&self) -> ConsentAnswer {
        self.asked.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.answer
    }
}

/// WHAT: A missing consent file reads as NotDetermined
/// WHY: First launch must show the prompt
#[test]
fn given_no_consent_file_when_reading_status_then_not_determined() {
    // Given: An empty directory
    let dir = tempfile::tempdir().unwrap();
    let store = ConsentFileStore::new(
        dir.path().join("consent.toml"),
        FixedPrompt::new(ConsentAnswer::Allow),
    );

    // When / Then: Undecided
    assert_eq!(store.status(), PermissionState::NotDetermined);
}

/// WHAT: An allowed prompt is persisted and read back by a fresh store
/// WHY: Users decide once, not on every launch
#[tokio::test]
async fn given_allowed_prompt_when_requesting_then_decision_persisted() {
    // Given: A store whose prompt allows
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("consent.toml");
    let prompt = FixedPrompt::new(ConsentAnswer::Allow);
    let store = ConsentFileStore::new(&path, prompt.clone());

    // When: Requesting
    let status = store.request().await;

    // Then: Granted, written to disk, visible to a new store without prompting
    assert_eq!(status, PermissionState::Granted);
    assert_eq!(store.path(), path.as_path());
    assert!(path.exists());
    assert!(!path.with_extension("toml.tmp").exists());

    let other_prompt = FixedPrompt::new(ConsentAnswer::Deny);
    let reopened = ConsentFileStore::new(&path, other_prompt.clone());
    assert_eq!(reopened.status(), PermissionState::Granted);
    assert_eq!(reopened.request().await, PermissionState::Granted);
    assert_eq!(other_prompt.asked(), 0);
    assert_eq!(prompt.asked(), 1);
}

/// WHAT: A dismissed prompt counts as a denial
/// WHY: Closing the prompt is not consent
#[tokio::test]
async fn given_dismissed_prompt_when_requesting_then_denied() {
    // Given: A prompt the user closes
    let dir = tempfile::tempdir().unwrap();
    let store = ConsentFileStore::new(
        dir.path().join("consent.toml"),
        FixedPrompt::new(ConsentAnswer::Dismissed),
    );

    // When: Requesting
    let status = store.request().await;

    // Then: Denied and remembered
    assert_eq!(status, PermissionState::Denied);
    assert_eq!(store.status(), PermissionState::Denied);
}

/// WHAT: A corrupt consent file reads as NotDetermined
/// WHY: A damaged file should lead to asking again, not to a crash
#[test]
fn given_corrupt_consent_file_when_reading_status_then_not_determined() {
    // Given: Garbage in the consent file
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("consent.toml");
    fs::write(&path, "decision = [not toml").unwrap();
    let store = ConsentFileStore::new(&path, FixedPrompt::new(ConsentAnswer::Allow));

    // When / Then: Undecided
    assert_eq!(store.status(), PermissionState::NotDetermined);
}

/// WHAT: Concurrent requests show the prompt once
/// WHY: Two simultaneous starts must not open two dialogs
#[tokio::test]
async fn given_concurrent_requests_when_prompting_then_asked_once() {
    // Given: A store whose prompt allows
    let dir = tempfile::tempdir().unwrap();
    let prompt = FixedPrompt::new(ConsentAnswer::Allow);
    let store = ConsentFileStore::new(dir.path().join("consent.toml"), prompt.clone());

    // When: Two requests race
    let (first, second) = tokio::join!(store.request(), store.request());

    // Then: Both granted after one prompt
    assert_eq!(first, PermissionState::Granted);
    assert_eq!(second, PermissionState::Granted);
    assert_eq!(prompt.asked(), 1);
}
