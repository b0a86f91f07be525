#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Persisted user preferences.
//!
//! The dashboard keeps a handful of per-user flags, currently just
//! whether the first-run tour has played. [`KeyValueStore`] decouples
//! that logic from where the flags live: a JSON file on disk, an
//! in-memory map for tests, or whatever the host platform offers.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Errors that can occur reading or writing preferences.
#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    /// Preference storage could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted preferences file is not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// String-keyed storage for small preference values.
///
/// Implementations must be `Send + Sync` so one store can back every
/// view of the host.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError`] if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError>;

    /// Stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError`] if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), PrefsError>;
}

/// In-memory store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store persisted as one JSON object in a file.
///
/// Every write rewrites the whole file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`, loading any entries already saved.
    /// A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError`] if the file exists but cannot be read or
    /// is not a JSON object of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PrefsError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), PrefsError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PrefsError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }
}

/// Key under which the first-run tour flag is stored.
const TOUR_SHOWN_KEY: &str = "tourShown";

/// Decides whether the first-run tour should play.
pub struct OnboardingGate {
    store: std::sync::Arc<dyn KeyValueStore>,
}

impl OnboardingGate {
    /// Creates a gate over the given store.
    #[must_use]
    pub fn new(store: std::sync::Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Whether the tour has not been shown yet.
    ///
    /// A store that cannot be read counts as "not shown".
    #[must_use]
    pub fn should_show(&self) -> bool {
        match self.store.get(TOUR_SHOWN_KEY) {
            Ok(flag) => flag.as_deref().is_none_or(str::is_empty),
            Err(e) => {
                log::warn!("Preference read failed: {e}");
                true
            }
        }
    }

    /// Records that the tour has been shown.
    pub fn mark_shown(&self) {
        if let Err(e) = self.store.set(TOUR_SHOWN_KEY, "true") {
            log::warn!("Preference write failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, PrefsError> {
            Err(std::io::Error::other("store offline").into())
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), PrefsError> {
            Err(std::io::Error::other("store offline").into())
        }
    }

    #[test]
    fn tour_shows_exactly_once() {
        let gate = OnboardingGate::new(Arc::new(MemoryStore::new()));

        assert!(gate.should_show());
        gate.mark_shown();
        assert!(!gate.should_show());
    }

    #[test]
    fn empty_flag_value_reads_as_unset() {
        let store = Arc::new(MemoryStore::new());
        store.set(TOUR_SHOWN_KEY, "").unwrap();

        let gate = OnboardingGate::new(store);
        assert!(gate.should_show());
    }

    #[test]
    fn broken_store_never_suppresses_the_tour() {
        let gate = OnboardingGate::new(Arc::new(BrokenStore));

        assert!(gate.should_show());
        gate.mark_shown();
        assert!(gate.should_show());
    }

    #[test]
    fn file_store_round_trips_across_reopen() {
        let path = std::env::temp_dir().join("careboard_prefs_reopen_test.json");
        let _ = std::fs::remove_file(&path);

        {
            let store = FileStore::open(&path).unwrap();
            store.set("tourShown", "true").unwrap();
            store.set("theme", "dark").unwrap();
        }

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("tourShown").unwrap().as_deref(), Some("true"));
        assert_eq!(reopened.get("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(reopened.get("absent").unwrap(), None);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let path = std::env::temp_dir().join("careboard_prefs_missing_test.json");
        let _ = std::fs::remove_file(&path);

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("tourShown").unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let path = std::env::temp_dir().join("careboard_prefs_corrupt_test.json");
        std::fs::write(&path, "not json at all").unwrap();

        assert!(matches!(
            FileStore::open(&path),
            Err(PrefsError::Json(_))
        ));

        std::fs::remove_file(&path).unwrap();
    }
}
