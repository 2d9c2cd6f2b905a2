use std::sync::{Arc, RwLock};

/// Process-wide holder of the generative service credential
///
/// Seeded from the environment. Cleared when the provider rejects the key so that
/// later calls fail fast with a missing credential until a new key is supplied.
#[derive(Clone, Default)]
pub struct CredentialStore {
    key: Arc<RwLock<Option<String>>>,
}

impl CredentialStore {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: Arc::new(RwLock::new(key.filter(|k| !k.trim().is_empty()))),
        }
    }

    pub fn get(&self) -> Option<String> {
        self.key.read().ok().and_then(|key| key.clone())
    }

    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }

    /// Replaces the credential. Blank keys clear it.
    pub fn set(&self, key: String) {
        let key = Some(key).filter(|k| !k.trim().is_empty());
        if let Ok(mut slot) = self.key.write() {
            *slot = key;
            tracing::info!(configured = slot.is_some(), "AI credential updated");
        }
    }

    pub fn reset(&self) {
        if let Ok(mut slot) = self.key.write() {
            *slot = None;
        }
        tracing::warn!("AI credential was rejected and has been cleared");
    }
}
