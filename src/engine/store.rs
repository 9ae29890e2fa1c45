use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use anyhow::Context as _;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::foundation::error::{ImgcmpError, ImgcmpResult};

/// Key/value byte namespace scoped to one engine instance.
///
/// Keys are relative `/`-separated paths (see [`normalize_key`]). Source inputs are written
/// with [`StagingStore::put_if_absent`] so that a name is never written twice.
#[async_trait]
pub trait StagingStore: Send + Sync + fmt::Debug {
    async fn contains(&self, key: &str) -> ImgcmpResult<bool>;

    /// Write `bytes` under `key` unless the key exists. Returns `true` when a write happened.
    ///
    /// The existence check and the write are atomic with respect to other callers.
    async fn put_if_absent(&self, key: &str, bytes: &[u8]) -> ImgcmpResult<bool>;

    /// Write `bytes` under `key`, replacing any previous value.
    async fn put(&self, key: &str, bytes: &[u8]) -> ImgcmpResult<()>;

    async fn get(&self, key: &str) -> ImgcmpResult<Option<Vec<u8>>>;

    /// Remove `key` if present. Returns `true` when something was removed.
    async fn remove(&self, key: &str) -> ImgcmpResult<bool>;

    /// Number of writes performed since creation.
    fn write_count(&self) -> u64;
}

/// In-memory store, used by engines that encode from buffers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Arc<[u8]>>>,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl StagingStore for MemoryStore {
    async fn contains(&self, key: &str) -> ImgcmpResult<bool> {
        let key = normalize_key(key)?;
        Ok(self.entries.lock().await.contains_key(&key))
    }

    async fn put_if_absent(&self, key: &str, bytes: &[u8]) -> ImgcmpResult<bool> {
        let key = normalize_key(key)?;
        let mut entries = self.entries.lock().await;
        if entries.contains_key(&key) {
            return Ok(false);
        }
        entries.insert(key, Arc::from(bytes));
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> ImgcmpResult<()> {
        let key = normalize_key(key)?;
        self.entries.lock().await.insert(key, Arc::from(bytes));
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn get(&self, key: &str) -> ImgcmpResult<Option<Vec<u8>>> {
        let key = normalize_key(key)?;
        Ok(self.entries.lock().await.get(&key).map(|b| b.to_vec()))
    }

    async fn remove(&self, key: &str) -> ImgcmpResult<bool> {
        let key = normalize_key(key)?;
        Ok(self.entries.lock().await.remove(&key).is_some())
    }

    fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

/// Directory-backed store, used by engines that read and write real files.
///
/// Parent directories are created on first use of a key.
pub struct DirStore {
    root: PathBuf,
    // Keeps a scratch directory alive for as long as the store.
    _scratch: Option<tempfile::TempDir>,
    write_lock: Mutex<()>,
    writes: AtomicU64,
}

impl fmt::Debug for DirStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirStore")
            .field("root", &self.root)
            .field("scratch", &self._scratch.is_some())
            .field("writes", &self.write_count())
            .finish()
    }
}

impl DirStore {
    /// Use (and create if needed) `root` as the namespace directory.
    pub fn open(root: impl Into<PathBuf>) -> ImgcmpResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("create staging directory '{}'", root.display()))?;
        Ok(Self {
            root,
            _scratch: None,
            write_lock: Mutex::new(()),
            writes: AtomicU64::new(0),
        })
    }

    /// Create a store over a fresh temporary directory removed on drop.
    pub fn scratch(prefix: &str) -> ImgcmpResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .context("create scratch staging directory")?;
        Ok(Self::over_tempdir(dir))
    }

    /// Like [`DirStore::scratch`], but inside `parent` (created if needed).
    ///
    /// Every call gets its own directory, so stores sharing a parent never see each other's keys.
    pub fn scratch_in(parent: impl AsRef<Path>, prefix: &str) -> ImgcmpResult<Self> {
        let parent = parent.as_ref();
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create staging directory '{}'", parent.display()))?;
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(parent)
            .with_context(|| format!("create scratch staging directory in '{}'", parent.display()))?;
        Ok(Self::over_tempdir(dir))
    }

    fn over_tempdir(dir: tempfile::TempDir) -> Self {
        Self {
            root: dir.path().to_path_buf(),
            _scratch: Some(dir),
            write_lock: Mutex::new(()),
            writes: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path a key maps to.
    pub fn path_for(&self, key: &str) -> ImgcmpResult<PathBuf> {
        Ok(self.root.join(Path::new(&normalize_key(key)?)))
    }

    async fn write_file(&self, path: &Path, bytes: &[u8]) -> ImgcmpResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create staging directory '{}'", parent.display()))?;
        }
        tokio::fs::write(path, bytes)
            .await
            .with_context(|| format!("write staged file '{}'", path.display()))?;
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[async_trait]
impl StagingStore for DirStore {
    async fn contains(&self, key: &str) -> ImgcmpResult<bool> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("stat '{}'", path.display()))?)
    }

    async fn put_if_absent(&self, key: &str, bytes: &[u8]) -> ImgcmpResult<bool> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().await;
        let exists = tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("stat '{}'", path.display()))?;
        if exists {
            return Ok(false);
        }
        self.write_file(&path, bytes).await?;
        Ok(true)
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> ImgcmpResult<()> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().await;
        self.write_file(&path, bytes).await
    }

    async fn get(&self, key: &str) -> ImgcmpResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ImgcmpError::Other(
                anyhow::Error::new(e).context(format!("read '{}'", path.display())),
            )),
        }
    }

    async fn remove(&self, key: &str) -> ImgcmpResult<bool> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ImgcmpError::Other(
                anyhow::Error::new(e).context(format!("remove '{}'", path.display())),
            )),
        }
    }

    fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

/// Normalize and validate store keys.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute keys or
/// parent traversals (`..`).
pub fn normalize_key(key: &str) -> ImgcmpResult<String> {
    let s = key.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ImgcmpError::validation("staging keys must be relative"));
    }
    if s.is_empty() {
        return Err(ImgcmpError::validation("staging key must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ImgcmpError::validation("staging keys must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(ImgcmpError::validation(
            "staging key must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/engine/store.rs"]
mod tests;
