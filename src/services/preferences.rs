//! Persisted view preferences.
//!
//! Each preference lives under its own key and is loaded, validated and
//! saved independently. Loading never fails: a missing, unreadable or
//! invalid entry yields the default. Saving is best-effort: failures are
//! logged and the in-memory value is kept.

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::models::preferences::{SortDirection, SortKey, TrendFilter, ViewPreferences};

/// Storage keys, one per preference field
pub mod keys {
    pub const SEARCH: &str = "crypto-dashboard.top-coins.search";
    pub const TREND_FILTER: &str = "crypto-dashboard.top-coins.filter";
    pub const SORT_KEY: &str = "crypto-dashboard.top-coins.sort-key";
    pub const SORT_DIRECTION: &str = "crypto-dashboard.top-coins.sort-direction";
}

/// Raw string storage keyed by preference name
pub trait PreferenceStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, raw: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside a directory
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl PreferenceStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write(&self, key: &str, raw: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let io_err = |source: std::io::Error| StorageError::Io {
            key: key.to_string(),
            source,
        };

        fs::write(&tmp, raw).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)
    }
}

/// In-process storage, lost on exit
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_raw(&self, key: &str, raw: &str) {
        self.entries.lock().insert(key.to_string(), raw.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

impl PreferenceStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    fn write(&self, key: &str, raw: &str) -> Result<(), StorageError> {
        self.insert_raw(key, raw);
        Ok(())
    }
}

/// Typed load/save over a [`PreferenceStorage`]
#[derive(Clone)]
pub struct PreferenceStore {
    storage: Arc<dyn PreferenceStorage>,
}

impl PreferenceStore {
    pub fn new(storage: Arc<dyn PreferenceStorage>) -> Self {
        Self { storage }
    }

    /// Store backed by `dir`, or by memory when the directory is unusable.
    pub fn open_dir(dir: &Path) -> Self {
        match FileStorage::new(dir) {
            Ok(storage) => Self::new(Arc::new(storage)),
            Err(e) => {
                warn!(error = %e, "Preference directory unavailable, preferences will not persist");
                Self::new(Arc::new(MemoryStorage::new()))
            }
        }
    }

    /// Reads `key`, falling back to `default` when the entry is absent,
    /// unreadable, not valid JSON for `T`, or rejected by `validator`.
    pub fn load<T, V>(&self, key: &str, default: T, validator: V) -> T
    where
        T: DeserializeOwned,
        V: Fn(&T) -> bool,
    {
        let raw = match self.storage.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(e) => {
                warn!(key = key, error = %e, "Failed to read preference, using default");
                return default;
            }
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) if validator(&value) => value,
            Ok(_) => {
                debug!(key = key, "Stored preference rejected by validator, using default");
                default
            }
            Err(e) => {
                debug!(key = key, error = %e, "Stored preference is malformed, using default");
                default
            }
        }
    }

    /// Writes `value` under `key`; errors are logged, never returned.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_save(key, value) {
            warn!(key = key, error = %e, "Failed to persist preference");
        }
    }

    fn try_save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.storage.write(key, &raw)
    }

    pub fn persistent<T, V>(
        &self,
        key: &'static str,
        default: T,
        validator: V,
    ) -> PersistentValue<T>
    where
        T: Serialize + DeserializeOwned,
        V: Fn(&T) -> bool,
    {
        let value = self.load(key, default, validator);
        PersistentValue {
            key,
            value,
            store: self.clone(),
        }
    }
}

/// A loaded value that writes itself back on every change
pub struct PersistentValue<T: Serialize> {
    key: &'static str,
    value: T,
    store: PreferenceStore,
}

impl<T: Serialize> PersistentValue<T> {
    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        self.store.save(self.key, &self.value);
    }

    pub fn update<F>(&mut self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.value);
        self.set(next);
    }
}

fn any_value<T>(_: &T) -> bool {
    true
}

/// The four coin-table preferences, each under its own key
pub struct ViewPreferencesStore {
    search_term: PersistentValue<String>,
    trend_filter: PersistentValue<TrendFilter>,
    sort_key: PersistentValue<SortKey>,
    sort_direction: PersistentValue<SortDirection>,
}

impl ViewPreferencesStore {
    /// Enum membership is enforced by deserialization, so every decoded
    /// value passes the validator.
    pub fn open(store: &PreferenceStore) -> Self {
        let defaults = ViewPreferences::default();
        Self {
            search_term: store.persistent(keys::SEARCH, defaults.search_term, any_value),
            trend_filter: store.persistent(keys::TREND_FILTER, defaults.trend_filter, any_value),
            sort_key: store.persistent(keys::SORT_KEY, defaults.sort_key, any_value),
            sort_direction: store.persistent(
                keys::SORT_DIRECTION,
                defaults.sort_direction,
                any_value,
            ),
        }
    }

    pub fn preferences(&self) -> ViewPreferences {
        ViewPreferences {
            search_term: self.search_term.get().clone(),
            trend_filter: *self.trend_filter.get(),
            sort_key: *self.sort_key.get(),
            sort_direction: *self.sort_direction.get(),
        }
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term.set(term.into());
    }

    pub fn set_trend_filter(&mut self, filter: TrendFilter) {
        self.trend_filter.set(filter);
    }

    pub fn set_sort_key(&mut self, key: SortKey) {
        self.sort_key.set(key);
    }

    pub fn set_sort_direction(&mut self, direction: SortDirection) {
        self.sort_direction.set(direction);
    }

    pub fn toggle_sort_direction(&mut self) {
        self.sort_direction.update(|current| current.toggled());
    }

    /// Back to "", all, market_cap_rank, asc.
    pub fn reset(&mut self) {
        let defaults = ViewPreferences::default();
        self.set_search_term(defaults.search_term);
        self.set_trend_filter(defaults.trend_filter);
        self.set_sort_key(defaults.sort_key);
        self.set_sort_direction(defaults.sort_direction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStorage;

    impl PreferenceStorage for FailingStorage {
        fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Io {
                key: key.to_string(),
                source: std::io::Error::new(ErrorKind::PermissionDenied, "denied"),
            })
        }

        fn write(&self, key: &str, _raw: &str) -> Result<(), StorageError> {
            Err(StorageError::Io {
                key: key.to_string(),
                source: std::io::Error::new(ErrorKind::StorageFull, "quota exceeded"),
            })
        }
    }

    fn memory_store() -> (Arc<MemoryStorage>, PreferenceStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = PreferenceStore::new(storage.clone());
        (storage, store)
    }

    #[test]
    fn test_absent_key_uses_default() {
        let (_, store) = memory_store();
        assert_eq!(store.load("missing", 7u32, any_value), 7);
    }

    #[test]
    fn test_round_trip() {
        let (_, store) = memory_store();
        store.save(keys::SORT_KEY, &SortKey::TotalVolume);
        assert_eq!(
            store.load(keys::SORT_KEY, SortKey::default(), any_value),
            SortKey::TotalVolume
        );
    }

    #[test]
    fn test_corrupt_or_invalid_values_fall_back() {
        let (storage, store) = memory_store();
        storage.insert_raw(keys::TREND_FILTER, "{not json");
        assert_eq!(
            store.load(keys::TREND_FILTER, TrendFilter::All, any_value),
            TrendFilter::All
        );

        storage.insert_raw(keys::TREND_FILTER, "\"sideways\"");
        assert_eq!(
            store.load(keys::TREND_FILTER, TrendFilter::All, any_value),
            TrendFilter::All
        );
    }

    #[test]
    fn test_validator_rejection_falls_back() {
        let (storage, store) = memory_store();
        storage.insert_raw("limit", "500");
        assert_eq!(store.load("limit", 10u32, |v: &u32| *v <= 100), 10);
    }

    #[test]
    fn test_one_corrupt_key_does_not_affect_others() {
        let (storage, store) = memory_store();
        storage.insert_raw(keys::SEARCH, "\"sol\"");
        storage.insert_raw(keys::TREND_FILTER, "42");
        storage.insert_raw(keys::SORT_KEY, "\"market_cap\"");
        storage.insert_raw(keys::SORT_DIRECTION, "\"desc\"");

        let prefs = ViewPreferencesStore::open(&store).preferences();
        assert_eq!(prefs.search_term, "sol");
        assert_eq!(prefs.trend_filter, TrendFilter::All);
        assert_eq!(prefs.sort_key, SortKey::MarketCap);
        assert_eq!(prefs.sort_direction, SortDirection::Desc);
    }

    #[test]
    fn test_mutations_persist_each_field() {
        let (storage, store) = memory_store();
        let mut view = ViewPreferencesStore::open(&store);

        view.set_search_term("eth");
        view.set_trend_filter(TrendFilter::Losers);
        view.toggle_sort_direction();

        assert_eq!(storage.raw(keys::SEARCH).as_deref(), Some("\"eth\""));
        assert_eq!(storage.raw(keys::TREND_FILTER).as_deref(), Some("\"losers\""));
        assert_eq!(storage.raw(keys::SORT_DIRECTION).as_deref(), Some("\"desc\""));
        assert_eq!(storage.raw(keys::SORT_KEY), None);

        let reloaded = ViewPreferencesStore::open(&store).preferences();
        assert_eq!(reloaded, view.preferences());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let (_, store) = memory_store();
        let mut view = ViewPreferencesStore::open(&store);
        view.set_search_term("doge");
        view.set_sort_key(SortKey::PriceChange7d);
        view.reset();

        assert_eq!(view.preferences(), ViewPreferences::default());
        assert_eq!(
            ViewPreferencesStore::open(&store).preferences(),
            ViewPreferences::default()
        );
    }

    #[test]
    fn test_storage_failures_are_swallowed() {
        let store = PreferenceStore::new(Arc::new(FailingStorage));
        let mut view = ViewPreferencesStore::open(&store);
        assert_eq!(view.preferences(), ViewPreferences::default());

        view.set_sort_key(SortKey::CurrentPrice);
        assert_eq!(view.preferences().sort_key, SortKey::CurrentPrice);
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::open_dir(dir.path());

        store.save(keys::SEARCH, &"btc".to_string());
        assert!(dir.path().join("crypto-dashboard.top-coins.search.json").exists());

        let reopened = PreferenceStore::open_dir(dir.path());
        assert_eq!(reopened.load(keys::SEARCH, String::new(), any_value), "btc");
    }
}
