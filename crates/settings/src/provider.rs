use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ivory_domain::{PreferenceKey, PreferenceValue, Preferences};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::StoreError;
use crate::store::KeyValueStore;

/// Owns the user's preferences and keeps them in step with a persisted store.
///
/// Writes are refused until the first [`load`](Self::load) has finished so
/// the defaults held before then never overwrite what is on disk.
///
/// Every write is stamped when it is created. Writes may be awaited in any
/// order, but a write older than the last one stored for its key is dropped.
pub struct SettingsProvider<S> {
    store: Arc<Mutex<Writer<S>>>,
    preferences: Preferences,
    loaded: bool,
    next_stamp: AtomicU64,
}

struct Writer<S> {
    store: S,
    stored: HashMap<PreferenceKey, u64>,
}

impl<S: KeyValueStore + 'static> SettingsProvider<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(Mutex::new(Writer {
                store,
                stored: HashMap::new(),
            })),
            preferences: Preferences::default(),
            loaded: false,
            next_stamp: AtomicU64::new(1),
        }
    }

    /// Reads every tracked preference from the store.
    ///
    /// A failing store leaves the defaults in place; the provider counts as
    /// loaded either way.
    pub async fn load(&mut self) -> &Preferences {
        let mut writer = self.store.lock().await;
        let store = &mut writer.store;
        match store.load().await {
            Ok(()) => {
                for key in PreferenceKey::ALL {
                    let Some(raw) = store.get(key.as_str()) else {
                        continue;
                    };
                    if raw.is_null() {
                        continue;
                    }
                    match key.coerce(&raw) {
                        Some(value) => {
                            self.preferences.apply(value);
                        }
                        None => warn!(%key, value = %raw, "ignoring stored preference of the wrong type"),
                    }
                }
                info!(preferences = ?self.preferences, "settings loaded");
            }
            Err(err) => error!(?err, "failed to load settings, using defaults"),
        }
        drop(writer);
        self.loaded = true;
        &self.preferences
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn get(&self, key: PreferenceKey) -> PreferenceValue {
        self.preferences.get(key)
    }

    /// Writes one preference and flushes the store.
    ///
    /// Resolves immediately without touching the store while the initial
    /// load is outstanding.
    pub fn save_setting(
        &self,
        value: PreferenceValue,
    ) -> impl Future<Output = Result<(), StoreError>> + Send + 'static {
        let store = self.loaded.then(|| Arc::clone(&self.store));
        let stamp = self.next_stamp.fetch_add(1, Ordering::Relaxed);
        async move {
            let key = value.key();
            let Some(store) = store else {
                debug!(%key, "settings still loading, skipping save");
                return Ok(());
            };
            let mut writer = store.lock().await;
            if writer.stored.get(&key).is_some_and(|&last| last > stamp) {
                debug!(%key, stamp, "newer value already saved, dropping stale write");
                return Ok(());
            }
            writer.store.set(key.as_str(), value.to_json());
            writer.store.save().await?;
            writer.stored.insert(key, stamp);
            debug!(%key, stamp, "setting saved");
            Ok(())
        }
    }

    /// Updates the in-memory value and hands back the write to schedule when
    /// it changed.
    pub fn set(
        &mut self,
        value: PreferenceValue,
    ) -> Option<impl Future<Output = Result<(), StoreError>> + Send + 'static> {
        if !self.preferences.apply(value.clone()) || !self.loaded {
            return None;
        }
        Some(self.save_setting(value))
    }
}
