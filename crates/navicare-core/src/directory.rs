//! Provider Directory Cache: saved providers persisted in Sled.
//!
//! The whole saved set lives under one key as a JSON array. It is loaded once
//! on open and rewritten (and flushed) after every toggle.

use crate::error::DirectoryError;
use crate::types::Provider;
use sled::Db;
use std::path::Path;

/// Key holding the saved-provider array.
pub const SAVED_PROVIDERS_KEY: &str = "navicare_saved_providers";

pub struct ProviderDirectory {
    db: Db,
    saved: Vec<Provider>,
}

impl ProviderDirectory {
    /// Opens or creates the store at `path` and loads the saved set.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryError> {
        let db = sled::open(path)?;
        Ok(Self::from_db(db))
    }

    /// In-memory store, discarded on drop.
    pub fn temporary() -> Result<Self, DirectoryError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self::from_db(db))
    }

    fn from_db(db: Db) -> Self {
        let saved = load_saved(&db);
        tracing::debug!(target: "navicare::directory", count = saved.len(), "Saved providers loaded");
        Self { db, saved }
    }

    pub fn saved(&self) -> &[Provider] {
        &self.saved
    }

    pub fn is_saved(&self, provider: &Provider) -> bool {
        self.saved.iter().any(|p| p.same_identity(provider))
    }

    /// Remove every entry with the provider's (name, phone), or append it if none.
    /// The new set is persisted before it replaces the in-memory one.
    pub fn toggle_saved(&mut self, provider: &Provider) -> Result<&[Provider], DirectoryError> {
        let next = toggle_provider(&self.saved, provider);
        let bytes = serde_json::to_vec(&next)?;
        self.db.insert(SAVED_PROVIDERS_KEY, bytes)?;
        self.db.flush()?;
        tracing::info!(
            target: "navicare::directory",
            provider = %provider.name,
            saved = next.len() > self.saved.len(),
            count = next.len(),
            "Saved providers updated"
        );
        self.saved = next;
        Ok(&self.saved)
    }
}

/// Missing or unreadable data is an empty set.
fn load_saved(db: &Db) -> Vec<Provider> {
    let raw = match db.get(SAVED_PROVIDERS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(target: "navicare::directory", error = %e, "Saved providers unreadable, starting empty");
            return Vec::new();
        }
    };
    match serde_json::from_slice(&raw) {
        Ok(saved) => saved,
        Err(e) => {
            tracing::warn!(target: "navicare::directory", error = %e, "Saved providers corrupt, starting empty");
            Vec::new()
        }
    }
}

/// Toggle by identity without touching storage.
pub fn toggle_provider(saved: &[Provider], provider: &Provider) -> Vec<Provider> {
    if saved.iter().any(|p| p.same_identity(provider)) {
        saved
            .iter()
            .filter(|p| !p.same_identity(provider))
            .cloned()
            .collect()
    } else {
        let mut next = saved.to_vec();
        next.push(provider.clone());
        next
    }
}
