//! Session storage and serialized access.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use super::Session;
use crate::error::SupportDeskError;
use crate::Result;

/// Backing resource for the session collection.
///
/// Implementations read and write the whole snapshot; there are no
/// per-record updates at this layer.
pub trait SessionStorage: Send + Sync {
    /// Read the full collection in storage order.
    fn read(&self) -> Result<Vec<Session>>;

    /// Replace the full collection.
    fn write(&self, sessions: &[Session]) -> Result<()>;

    /// Human-readable location, used in logs.
    fn describe(&self) -> String;
}

/// JSON file storage.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStorage for FileStorage {
    fn read(&self) -> Result<Vec<Session>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            SupportDeskError::StorageUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            SupportDeskError::StorageUnavailable(format!("{}: {}", self.path.display(), e))
        })
    }

    fn write(&self, sessions: &[Session]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Write-then-rename so readers never observe a half-written file.
        let json = serde_json::to_string_pretty(sessions)?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path().display().to_string()
    }
}

/// In-process storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    sessions: RwLock<Vec<Session>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self) -> Result<Vec<Session>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| SupportDeskError::LockPoisoned)?;
        Ok(sessions.clone())
    }

    fn write(&self, sessions: &[Session]) -> Result<()> {
        let mut stored = self
            .sessions
            .write()
            .map_err(|_| SupportDeskError::LockPoisoned)?;
        *stored = sessions.to_vec();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Thread-safe session store.
///
/// Every read-modify-write cycle runs under one mutex, so inbound message
/// handling and timeout sweeps never overwrite each other's snapshot.
/// Clones share the same backend and lock.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    lock: Arc<Mutex<()>>,
}

impl SessionStore {
    /// Create a store over the given backend.
    pub fn new(storage: impl SessionStorage + 'static) -> Self {
        Self {
            storage: Arc::new(storage),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create a store backed by a JSON file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(FileStorage::new(path))
    }

    /// Create a store that lives only in memory.
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// Where the snapshot is kept.
    pub fn location(&self) -> String {
        self.storage.describe()
    }

    /// Load the full collection.
    ///
    /// A missing or unreadable backing resource yields an empty collection.
    pub fn load(&self) -> Vec<Session> {
        match self.lock.lock() {
            Ok(_guard) => self.load_unlocked(),
            Err(_) => {
                tracing::error!("session store lock poisoned; treating as empty");
                Vec::new()
            }
        }
    }

    /// Persist the full collection.
    pub fn save(&self, sessions: &[Session]) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| SupportDeskError::LockPoisoned)?;
        self.storage.write(sessions)
    }

    /// Reset to an empty collection.
    pub fn clear(&self) -> Result<()> {
        self.save(&[])?;
        tracing::info!(store = %self.storage.describe(), "session store cleared");
        Ok(())
    }

    /// Run one atomic load -> mutate -> save cycle.
    ///
    /// The closure sees the full collection. The snapshot is written back
    /// only if the closure changed it; on a write failure nothing is
    /// persisted and the error is returned.
    pub fn transact<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Session>) -> T,
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| SupportDeskError::LockPoisoned)?;

        let before = self.load_unlocked();
        let mut sessions = before.clone();
        let output = f(&mut sessions);

        if sessions != before {
            self.storage.write(&sessions)?;
        }

        Ok(output)
    }

    /// [`transact`](Self::transact) on the blocking thread pool.
    ///
    /// Async callers use this so file I/O never runs on a runtime worker.
    pub async fn transact_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Session>) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.off_runtime(move |store| store.transact(f)).await
    }

    /// [`clear`](Self::clear) on the blocking thread pool.
    pub async fn clear_async(&self) -> Result<()> {
        self.off_runtime(|store| store.clear()).await
    }

    async fn off_runtime<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&SessionStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(&store)).await?
    }

    /// Get a copy of the session for an identity.
    pub fn find(&self, identity: &str) -> Option<Session> {
        self.load().into_iter().find(|s| s.identity == identity)
    }

    /// Number of sessions on file.
    pub fn count(&self) -> usize {
        self.load().len()
    }

    fn load_unlocked(&self) -> Vec<Session> {
        match self.storage.read() {
            Ok(sessions) => dedupe(sessions),
            Err(e) => {
                tracing::warn!(error = %e, "session storage unreadable; starting empty");
                Vec::new()
            }
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Keep the first record per identity.
fn dedupe(sessions: Vec<Session>) -> Vec<Session> {
    let mut seen = HashSet::new();
    let before = sessions.len();
    let unique: Vec<Session> = sessions
        .into_iter()
        .filter(|s| seen.insert(s.identity.clone()))
        .collect();

    if unique.len() != before {
        tracing::warn!(
            dropped = before - unique.len(),
            "duplicate identities in session storage"
        );
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::CloseReason;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    /// Storage whose writes always fail.
    struct ReadOnlyStorage;

    impl SessionStorage for ReadOnlyStorage {
        fn read(&self) -> Result<Vec<Session>> {
            Ok(vec![Session::new("A", 0)])
        }

        fn write(&self, _sessions: &[Session]) -> Result<()> {
            Err(SupportDeskError::StorageUnavailable("read-only".into()))
        }

        fn describe(&self) -> String {
            "read-only".into()
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = SessionStore::file(dir.path().join("contacts.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let store = SessionStore::file(file.path());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_file_save_and_load_preserves_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contacts.json");
        let store = SessionStore::file(&path);

        let sessions = vec![Session::new("B", 2), Session::new("A", 1)];
        store.save(&sessions).unwrap();

        let loaded = store.load();
        assert_eq!(loaded, sessions);
        assert!(!dir.path().join("contacts.json.tmp").exists());
    }

    #[test]
    fn test_file_creates_parent_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("contacts.json");
        let store = SessionStore::file(&path);

        store.save(&[Session::new("A", 1)]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_reads_legacy_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"[
  { "identity": "A", "lastActivityAt": 10, "ended": false },
  { "identity": "B", "lastActivityAt": 20, "ended": true }
]"#,
        )
        .unwrap();

        let store = SessionStore::file(file.path());
        let loaded = store.load();
        assert_eq!(loaded.len(), 2);
        assert!(loaded[1].ended);
    }

    #[test]
    fn test_clear() {
        let store = SessionStore::in_memory();
        store.save(&[Session::new("A", 1)]).unwrap();
        assert_eq!(store.count(), 1);

        store.clear().unwrap();
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_transact_async_on_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contacts.json");
        let store = SessionStore::file(&path);

        let created = store
            .transact_async(|sessions| {
                sessions.push(Session::new("A", 1));
                sessions.len()
            })
            .await
            .unwrap();

        assert_eq!(created, 1);
        assert_eq!(SessionStore::file(&path).count(), 1);

        store.clear_async().await.unwrap();
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_transact_async_reports_write_failure() {
        let store = SessionStore::new(ReadOnlyStorage);
        let result = store
            .transact_async(|sessions| sessions[0].close(CloseReason::Exit))
            .await;
        assert!(matches!(
            result,
            Err(SupportDeskError::StorageUnavailable(_))
        ));
    }

    #[test]
    fn test_clones_share_backend() {
        let store = SessionStore::in_memory();
        let other = store.clone();
        store.save(&[Session::new("A", 1)]).unwrap();
        assert_eq!(other.find("A"), Some(Session::new("A", 1)));
    }

    #[test]
    fn test_file_location() {
        let storage = FileStorage::new("/var/lib/support-desk/contacts.json");
        assert_eq!(storage.path(), Path::new("/var/lib/support-desk/contacts.json"));
        assert_eq!(storage.describe(), "/var/lib/support-desk/contacts.json");
    }

    #[test]
    fn test_transact_persists_changes() {
        let store = SessionStore::in_memory();
        let created = store
            .transact(|sessions| {
                sessions.push(Session::new("A", 1));
                sessions.len()
            })
            .unwrap();

        assert_eq!(created, 1);
        assert_eq!(store.find("A"), Some(Session::new("A", 1)));
    }

    #[test]
    fn test_transact_without_change_skips_write() {
        let store = SessionStore::new(ReadOnlyStorage);
        let count = store.transact(|sessions| sessions.len()).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_transact_write_failure_is_reported() {
        let store = SessionStore::new(ReadOnlyStorage);
        let result = store.transact(|sessions| sessions[0].close(CloseReason::Exit));
        assert!(matches!(
            result,
            Err(SupportDeskError::StorageUnavailable(_))
        ));
    }

    #[test]
    fn test_duplicates_dropped_on_load() {
        let store = SessionStore::in_memory();
        store
            .save(&[Session::new("A", 1), Session::new("A", 2)])
            .unwrap();

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].last_activity_at, 1);
    }

    #[test]
    fn test_concurrent_transactions_do_not_lose_updates() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(SessionStore::in_memory());
        let mut handles = vec![];

        for i in 0..50 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                store
                    .transact(|sessions| sessions.push(Session::new(format!("id-{}", i), i)))
                    .unwrap();
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.count(), 50);
    }
}
