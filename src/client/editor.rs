//! Debounced auto-encryption for the paste editor.
//!
//! Content changes mark the editor `Dirty` and re-arm a single debounce
//! timer; when it fires, the latest plaintext — and only the latest — is
//! sealed with a fresh IV. Re-arming cancels the pending run instead of
//! queueing another. `flush` (blur) seals immediately.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::crypto::envelope::{self, EnvelopeKey};
use crate::models::paste::EncryptedEnvelope;

/// Default debounce applied between a keystroke and re-encryption.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Editor encryption states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    /// Content changed; a debounce timer is pending.
    Dirty,
    /// The debounce fired and sealing is in progress.
    Encrypting,
    /// The latest content is sealed.
    Ready,
    /// Sealing failed; no envelope is held.
    Failed,
}

struct Inner {
    state: EditorState,
    plaintext: String,
    generation: u64,
    sealed: Option<EncryptedEnvelope>,
}

/// Drives encryption of editor content under a cancelable debounce.
pub struct AutoEncryptor {
    key: Arc<EnvelopeKey>,
    debounce: Duration,
    inner: Arc<Mutex<Inner>>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl AutoEncryptor {
    pub fn new(key: EnvelopeKey, debounce: Duration) -> Self {
        Self {
            key: Arc::new(key),
            debounce,
            inner: Arc::new(Mutex::new(Inner {
                state: EditorState::Ready,
                plaintext: String::new(),
                generation: 0,
                sealed: None,
            })),
            pending: Mutex::new(None),
        }
    }

    /// Registers a content change: cancels any pending run and re-arms the
    /// debounce timer for the new plaintext.
    pub fn note_change(&self, plaintext: &str) {
        let generation = {
            let mut inner = self.inner.lock().unwrap();
            inner.plaintext = plaintext.to_string();
            inner.generation += 1;
            inner.state = EditorState::Dirty;
            inner.generation
        };

        let mut pending = self.pending.lock().unwrap();
        if let Some(handle) = pending.take() {
            handle.abort();
        }

        let inner = Arc::clone(&self.inner);
        let key = Arc::clone(&self.key);
        let debounce = self.debounce;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            seal_latest(&inner, &key, generation);
        }));
    }

    /// Seals the current content immediately (blur), cancelling any
    /// pending debounce run.
    pub fn flush(&self) {
        if let Some(handle) = self.pending.lock().unwrap().take() {
            handle.abort();
        }

        let generation = self.inner.lock().unwrap().generation;
        seal_latest(&self.inner, &self.key, generation);
    }

    pub fn state(&self) -> EditorState {
        self.inner.lock().unwrap().state
    }

    /// The envelope of the latest sealed content, if any.
    pub fn sealed(&self) -> Option<EncryptedEnvelope> {
        self.inner.lock().unwrap().sealed.clone()
    }
}

fn seal_latest(inner: &Mutex<Inner>, key: &EnvelopeKey, generation: u64) {
    let plaintext = {
        let mut guard = inner.lock().unwrap();
        if guard.generation != generation {
            // A newer change re-armed the timer; its run seals instead.
            return;
        }
        guard.state = EditorState::Encrypting;
        guard.plaintext.clone()
    };

    let result = envelope::seal(&plaintext, key);

    let mut guard = inner.lock().unwrap();
    if guard.generation != generation {
        return;
    }
    match result {
        Ok(sealed) => {
            guard.sealed = Some(sealed);
            guard.state = EditorState::Ready;
        }
        Err(e) => {
            tracing::warn!("Editor encryption failed: {}", e);
            guard.sealed = None;
            guard.state = EditorState::Failed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::envelope::open;

    fn key_pair() -> (EnvelopeKey, EnvelopeKey) {
        let key = EnvelopeKey::generate();
        let copy = EnvelopeKey::import(&key.export()).unwrap();
        (key, copy)
    }

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_waits_before_sealing() {
        let (key, _) = key_pair();
        let editor = AutoEncryptor::new(key, DEFAULT_DEBOUNCE);

        editor.note_change("draft");
        tokio::time::advance(Duration::from_millis(300)).await;
        settle().await;
        assert_eq!(editor.state(), EditorState::Dirty);
        assert!(editor.sealed().is_none());

        tokio::time::advance(Duration::from_millis(300)).await;
        settle().await;
        assert_eq!(editor.state(), EditorState::Ready);
        assert!(editor.sealed().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_cancels_and_seals_only_the_latest() {
        let (key, copy) = key_pair();
        let editor = AutoEncryptor::new(key, DEFAULT_DEBOUNCE);

        editor.note_change("first");
        tokio::time::advance(Duration::from_millis(400)).await;
        settle().await;

        // Re-armed before the first timer fired; still dirty.
        editor.note_change("second");
        tokio::time::advance(Duration::from_millis(400)).await;
        settle().await;
        assert_eq!(editor.state(), EditorState::Dirty);

        tokio::time::advance(Duration::from_millis(200)).await;
        settle().await;
        assert_eq!(editor.state(), EditorState::Ready);

        let sealed = editor.sealed().unwrap();
        assert_eq!(open(&sealed, &copy).unwrap(), "second");
    }

    #[tokio::test(start_paused = true)]
    async fn flush_seals_immediately() {
        let (key, copy) = key_pair();
        let editor = AutoEncryptor::new(key, DEFAULT_DEBOUNCE);

        editor.note_change("typed then blurred");
        editor.flush();

        assert_eq!(editor.state(), EditorState::Ready);
        let sealed = editor.sealed().unwrap();
        assert_eq!(open(&sealed, &copy).unwrap(), "typed then blurred");

        // The aborted debounce run must not seal again later.
        let before = editor.sealed().unwrap();
        tokio::time::advance(Duration::from_millis(600)).await;
        settle().await;
        assert_eq!(editor.sealed().unwrap(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn resealing_the_same_content_changes_the_iv() {
        let (key, _) = key_pair();
        let editor = AutoEncryptor::new(key, DEFAULT_DEBOUNCE);

        editor.note_change("same content");
        editor.flush();
        let first = editor.sealed().unwrap();

        editor.note_change("same content");
        editor.flush();
        let second = editor.sealed().unwrap();

        assert_ne!(first.iv, second.iv);
        assert_ne!(first.ciphertext, second.ciphertext);
    }
}
