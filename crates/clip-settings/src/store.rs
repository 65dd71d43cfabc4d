//! Live settings store with change notifications.
//!
//! One JSON document, two namespaces:
//! - `extensionState` — the mode controller's persisted blob
//! - `settings` — user preferences ([`ClipSettings`])
//!
//! The store is the single source of truth for mode across contexts. Every
//! commit bumps a revision and broadcasts a [`StoreSnapshot`] on a watch
//! channel; a context's local idea of the current mode is a cache refreshed
//! from that feed.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde_json::{Value, json};
use tokio::sync::watch;
use tracing::debug;

use clip_core::state::ExtensionState;

use crate::errors::{Result, SettingsError};
use crate::loader::deep_merge;
use crate::types::ClipSettings;

/// Immutable view of the store at one revision.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreSnapshot {
    /// Monotonic commit counter; starts at 0 for the initial document.
    pub revision: u64,
    /// The `extensionState` namespace.
    pub extension_state: ExtensionState,
    /// The `settings` namespace.
    pub settings: ClipSettings,
}

struct Document {
    revision: u64,
    extension_state: ExtensionState,
    settings: ClipSettings,
}

impl Document {
    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            revision: self.revision,
            extension_state: self.extension_state,
            settings: self.settings.clone(),
        }
    }
}

/// The persisted key-value store both contexts consult.
pub struct SettingsStore {
    inner: RwLock<Document>,
    path: Option<PathBuf>,
    tx: watch::Sender<StoreSnapshot>,
}

impl SettingsStore {
    /// An in-memory store seeded with defaults. Used by tests and by
    /// sessions that do not persist across restarts.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_settings(ClipSettings::default())
    }

    /// An in-memory store seeded with the given preferences.
    #[must_use]
    pub fn with_settings(settings: ClipSettings) -> Self {
        let doc = Document {
            revision: 0,
            extension_state: ExtensionState::inactive(),
            settings,
        };
        let (tx, _rx) = watch::channel(doc.snapshot());
        Self {
            inner: RwLock::new(doc),
            path: None,
            tx,
        }
    }

    /// Open a file-backed store, creating the document from defaults when
    /// the file does not exist yet.
    pub fn open(path: &Path) -> Result<Self> {
        let (extension_state, settings) = if path.exists() {
            debug!(?path, "loading store document");
            let content = std::fs::read_to_string(path)?;
            let raw: Value = serde_json::from_str(&content)?;

            let state = raw
                .get("extensionState")
                .cloned()
                .map(serde_json::from_value)
                .transpose()?
                .unwrap_or_else(ExtensionState::inactive);

            let defaults = serde_json::to_value(ClipSettings::default())?;
            let merged = match raw.get("settings") {
                Some(user) => deep_merge(defaults, user.clone()),
                None => defaults,
            };
            (state, serde_json::from_value(merged)?)
        } else {
            debug!(?path, "store document not found, starting from defaults");
            (ExtensionState::inactive(), ClipSettings::default())
        };

        let doc = Document {
            revision: 0,
            extension_state,
            settings,
        };
        let (tx, _rx) = watch::channel(doc.snapshot());
        Ok(Self {
            inner: RwLock::new(doc),
            path: Some(path.to_path_buf()),
            tx,
        })
    }

    /// Current view of both namespaces.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        self.inner.read().snapshot()
    }

    /// The `extensionState` namespace.
    #[must_use]
    pub fn extension_state(&self) -> ExtensionState {
        self.inner.read().extension_state
    }

    /// The `settings` namespace.
    #[must_use]
    pub fn settings(&self) -> ClipSettings {
        self.inner.read().settings.clone()
    }

    /// Subscribe to commit notifications.
    ///
    /// The receiver is primed with the current snapshot; callers typically
    /// `changed().await` and re-read.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.tx.subscribe()
    }

    /// Replace the `extensionState` namespace.
    pub fn set_extension_state(&self, state: ExtensionState) -> Result<()> {
        let mut doc = self.inner.write();
        doc.extension_state = state;
        self.commit(&mut doc)
    }

    /// Deep-merge a patch into the `settings` namespace.
    ///
    /// The merged document is validated by deserializing before anything is
    /// committed; an invalid patch leaves the store untouched.
    pub fn update_settings(&self, patch: Value) -> Result<ClipSettings> {
        let mut doc = self.inner.write();
        let current = serde_json::to_value(&doc.settings)?;
        let merged = deep_merge(current, patch);
        let updated: ClipSettings = serde_json::from_value(merged)
            .map_err(|e| SettingsError::InvalidValue(e.to_string()))?;
        doc.settings = updated.clone();
        self.commit(&mut doc)?;
        Ok(updated)
    }

    /// Bump the revision, persist when file-backed, notify subscribers.
    fn commit(&self, doc: &mut Document) -> Result<()> {
        doc.revision += 1;
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let raw = json!({
                "extensionState": doc.extension_state,
                "settings": doc.settings,
            });
            std::fs::write(path, serde_json::to_string_pretty(&raw)?)?;
        }
        let _ = self.tx.send(doc.snapshot());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
