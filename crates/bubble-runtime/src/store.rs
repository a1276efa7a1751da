#![forbid(unsafe_code)]

//! Show-once persistence.
//!
//! A step with a show-once key is displayed at most once per install. The
//! controllers only see the [`ShownStore`] trait; two backends ship here:
//!
//! - [`MemoryStore`]: in-process set, lost on exit.
//! - `FileStore` (requires `state-persistence`): JSON document on disk,
//!   rewritten atomically on every new key.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `StoreError::Io` | File I/O failure on open | Returned from `open` |
//! | `StoreError::Serialization` | Unparseable JSON | Returned from `open` |
//! | Write failure on `set` | Disk full, permissions | Logged, key kept in memory |
//! | Namespace or version mismatch | File from another store or a newer release | Stored keys ignored, store read-only |
//!
//! A read-only store records new keys in memory only, so a file it does not
//! understand is never overwritten or deleted.

use std::fmt;

use ahash::AHashSet;

/// Namespace shared by all show-once keys, kept apart from other
/// application preferences.
pub const SHOWN_NAMESPACE: &str = "BubbleShowCasePrefs";

/// A namespaced show-once key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey(String);

impl StoreKey {
    /// Namespace a caller-supplied key.
    pub fn new(key: &str) -> Self {
        Self(format!("{SHOWN_NAMESPACE}/{key}"))
    }

    /// The full namespaced key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The caller-supplied part of the key.
    pub fn local(&self) -> &str {
        self.0
            .strip_prefix(SHOWN_NAMESPACE)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Flat string-keyed boolean set.
pub trait ShownStore {
    /// Whether the key was recorded.
    fn has(&self, key: &StoreKey) -> bool;

    /// Record the key. Never fails from the caller's point of view.
    fn set(&mut self, key: &StoreKey);
}

/// Errors from opening a persistent store.
#[derive(Debug)]
pub enum StoreError {
    /// I/O error during file operations.
    Io(std::io::Error),
    /// Serialization or deserialization error.
    Serialization(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Serialization(msg) => write!(f, "serialization error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Serialization(_) => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// In-memory show-once store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    keys: AHashSet<String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with caller-supplied keys already recorded.
    #[must_use]
    pub fn with_shown<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            keys: keys
                .into_iter()
                .map(|k| StoreKey::new(k).as_str().to_owned())
                .collect(),
        }
    }

    /// Number of recorded keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl ShownStore for MemoryStore {
    fn has(&self, key: &StoreKey) -> bool {
        self.keys.contains(key.as_str())
    }

    fn set(&mut self, key: &StoreKey) {
        self.keys.insert(key.as_str().to_owned());
    }
}

#[cfg(feature = "state-persistence")]
mod file_store {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeSet;
    use std::fs::{self, File};
    use std::io::{BufReader, BufWriter, Write};
    use std::path::{Path, PathBuf};

    use bubble_core::{debug, warn};

    /// On-disk format.
    #[derive(Serialize, Deserialize)]
    struct ShownFile {
        format_version: u32,
        namespace: String,
        /// Caller-supplied keys, sorted for stable diffs.
        shown: BTreeSet<String>,
    }

    impl ShownFile {
        const FORMAT_VERSION: u32 = 1;
    }

    /// JSON-file show-once store.
    ///
    /// # File Format
    ///
    /// ```json
    /// {
    ///   "format_version": 1,
    ///   "namespace": "BubbleShowCasePrefs",
    ///   "shown": ["onboarding.search", "onboarding.profile"]
    /// }
    /// ```
    ///
    /// Writes go to `{path}.tmp` first and are renamed into place.
    pub struct FileStore {
        path: PathBuf,
        keys: AHashSet<String>,
        read_only: bool,
    }

    impl FileStore {
        /// Open a store at `path`, loading any keys already recorded there.
        ///
        /// A missing file is an empty store; it is created on the first
        /// [`set`](ShownStore::set).
        pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
            let path = path.as_ref().to_path_buf();
            let loaded = load(&path)?;
            let (keys, read_only) = match loaded {
                Loaded::Keys(keys) => (keys, false),
                Loaded::Foreign => (AHashSet::new(), true),
            };
            debug!(
                path = %path.display(),
                keys = keys.len(),
                read_only,
                "opened show-once store"
            );
            Ok(Self {
                path,
                keys,
                read_only,
            })
        }

        /// Open the store at the default location for an application:
        /// `$XDG_STATE_HOME/bubble/{app_name}/BubbleShowCasePrefs.json`.
        pub fn open_for_app(app_name: &str) -> Result<Self, StoreError> {
            Self::open(default_path(app_name))
        }

        /// Location of the backing file.
        pub fn path(&self) -> &Path {
            &self.path
        }

        /// Whether the backing file belongs to another store or format, in
        /// which case nothing is written to it.
        pub fn is_read_only(&self) -> bool {
            self.read_only
        }

        /// Forget every recorded key and delete the file. A read-only store
        /// only forgets its in-memory keys.
        pub fn clear(&mut self) -> Result<(), StoreError> {
            self.keys.clear();
            if !self.read_only && self.path.exists() {
                fs::remove_file(&self.path)?;
            }
            Ok(())
        }

        fn temp_path(&self) -> PathBuf {
            let mut tmp = self.path.clone();
            tmp.set_extension("json.tmp");
            tmp
        }

        fn save(&self) -> Result<(), StoreError> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }

            let file = ShownFile {
                format_version: ShownFile::FORMAT_VERSION,
                namespace: SHOWN_NAMESPACE.to_owned(),
                shown: self
                    .keys
                    .iter()
                    .map(|k| StoreKey(k.clone()).local().to_owned())
                    .collect(),
            };

            let tmp_path = self.temp_path();
            {
                let out = File::create(&tmp_path)?;
                let mut writer = BufWriter::new(out);
                serde_json::to_writer_pretty(&mut writer, &file).map_err(|e| {
                    StoreError::Serialization(format!("failed to serialize shown keys: {e}"))
                })?;
                writer.flush()?;
                writer.get_ref().sync_all()?;
            }
            fs::rename(&tmp_path, &self.path)?;
            Ok(())
        }
    }

    impl ShownStore for FileStore {
        fn has(&self, key: &StoreKey) -> bool {
            self.keys.contains(key.as_str())
        }

        fn set(&mut self, key: &StoreKey) {
            if !self.keys.insert(key.as_str().to_owned()) {
                return;
            }
            if self.read_only {
                debug!(
                    path = %self.path.display(),
                    key = %key,
                    "show-once file is not ours; keeping key in memory"
                );
                return;
            }
            if let Err(error) = self.save() {
                warn!(
                    path = %self.path.display(),
                    key = %key,
                    error = %error,
                    "failed to persist show-once key; keeping it in memory"
                );
            }
        }
    }

    impl fmt::Debug for FileStore {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FileStore")
                .field("path", &self.path)
                .field("keys", &self.keys.len())
                .field("read_only", &self.read_only)
                .finish()
        }
    }

    /// What `load` found on disk.
    enum Loaded {
        Keys(AHashSet<String>),
        /// A file this store must not touch.
        Foreign,
    }

    fn load(path: &Path) -> Result<Loaded, StoreError> {
        if !path.exists() {
            return Ok(Loaded::Keys(AHashSet::new()));
        }
        let reader = BufReader::new(File::open(path)?);
        let file: ShownFile = serde_json::from_reader(reader).map_err(|e| {
            StoreError::Serialization(format!("failed to parse shown keys: {e}"))
        })?;

        if file.format_version != ShownFile::FORMAT_VERSION || file.namespace != SHOWN_NAMESPACE {
            warn!(
                stored_version = file.format_version,
                namespace = %file.namespace,
                "show-once file does not match this store, opening read-only"
            );
            return Ok(Loaded::Foreign);
        }

        Ok(Loaded::Keys(
            file.shown
                .iter()
                .map(|k| StoreKey::new(k).as_str().to_owned())
                .collect(),
        ))
    }

    /// State directory, falling back to the current directory.
    fn default_path(app_name: &str) -> PathBuf {
        let base = if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
            PathBuf::from(state_home)
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".local").join("state")
        } else {
            PathBuf::from(".")
        };
        base.join("bubble")
            .join(app_name)
            .join(format!("{SHOWN_NAMESPACE}.json"))
    }
}

#[cfg(feature = "state-persistence")]
pub use file_store::FileStore;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_namespaced() {
        let key = StoreKey::new("intro");
        assert_eq!(key.as_str(), "BubbleShowCasePrefs/intro");
        assert_eq!(key.local(), "intro");
        assert_eq!(key.to_string(), "BubbleShowCasePrefs/intro");
    }

    #[test]
    fn memory_store_records_keys() {
        let mut store = MemoryStore::new();
        let key = StoreKey::new("a");
        assert!(!store.has(&key));
        store.set(&key);
        store.set(&key);
        assert!(store.has(&key));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn memory_store_prepopulated() {
        let store = MemoryStore::with_shown(["a", "b"]);
        assert!(store.has(&StoreKey::new("a")));
        assert!(store.has(&StoreKey::new("b")));
        assert!(!store.has(&StoreKey::new("c")));
    }

    #[test]
    fn store_error_display() {
        let err = StoreError::Serialization("bad".into());
        assert_eq!(err.to_string(), "serialization error: bad");
        let io = StoreError::from(std::io::Error::other("disk"));
        assert!(io.to_string().contains("disk"));
        assert!(std::error::Error::source(&io).is_some());
    }
}

#[cfg(all(test, feature = "state-persistence"))]
mod file_store_tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FileStore {
        FileStore::open(dir.path().join("shown.json")).unwrap()
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(!store.has(&StoreKey::new("intro")));
        assert!(!store.path().exists());
    }

    #[test]
    fn keys_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.set(&StoreKey::new("intro"));
        store.set(&StoreKey::new("profile"));

        let reopened = store_in(&dir);
        assert!(reopened.has(&StoreKey::new("intro")));
        assert!(reopened.has(&StoreKey::new("profile")));
        assert!(!reopened.has(&StoreKey::new("search")));
    }

    #[test]
    fn file_stores_local_keys_under_namespace() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.set(&StoreKey::new("b"));
        store.set(&StoreKey::new("a"));

        let raw = fs::read_to_string(store.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["format_version"], 1);
        assert_eq!(json["namespace"], SHOWN_NAMESPACE);
        assert_eq!(json["shown"], serde_json::json!(["a", "b"]));
        assert!(!dir.path().join("shown.json.tmp").exists());
    }

    #[test]
    fn parent_directories_are_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("shown.json");
        let mut store = FileStore::open(&path).unwrap();
        store.set(&StoreKey::new("intro"));
        assert!(path.exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shown.json");
        fs::write(&path, "{ not json").unwrap();
        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn foreign_namespace_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shown.json");
        fs::write(
            &path,
            r#"{"format_version":1,"namespace":"OtherPrefs","shown":["intro"]}"#,
        )
        .unwrap();
        let store = FileStore::open(&path).unwrap();
        assert!(!store.has(&StoreKey::new("intro")));
        assert!(store.is_read_only());
    }

    #[test]
    fn foreign_file_survives_writes_and_clear() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shown.json");
        let foreign = r#"{"format_version":1,"namespace":"OtherPrefs","shown":["keep.me"]}"#;
        fs::write(&path, foreign).unwrap();

        let mut store = FileStore::open(&path).unwrap();
        store.set(&StoreKey::new("new.key"));
        assert!(store.has(&StoreKey::new("new.key")));
        assert_eq!(fs::read_to_string(&path).unwrap(), foreign);
        assert!(!dir.path().join("shown.json.tmp").exists());

        store.clear().unwrap();
        assert!(!store.has(&StoreKey::new("new.key")));
        assert_eq!(fs::read_to_string(&path).unwrap(), foreign);
    }

    #[test]
    fn newer_format_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shown.json");
        fs::write(
            &path,
            r#"{"format_version":9,"namespace":"BubbleShowCasePrefs","shown":["intro"]}"#,
        )
        .unwrap();
        let mut store = FileStore::open(&path).unwrap();
        assert!(!store.has(&StoreKey::new("intro")));
        assert!(store.is_read_only());

        store.set(&StoreKey::new("profile"));
        let raw = fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["format_version"], 9);
        assert_eq!(json["shown"], serde_json::json!(["intro"]));
    }

    #[test]
    fn clear_removes_file_and_keys() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.set(&StoreKey::new("intro"));
        assert!(store.path().exists());
        assert!(!store.is_read_only());

        store.clear().unwrap();
        assert!(!store.path().exists());
        assert!(!store.has(&StoreKey::new("intro")));
        store.clear().unwrap();
    }
}
