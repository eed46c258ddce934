use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{bail, Context as _};
use async_trait::async_trait;

/// Opaque key naming one piece of testcase content. Only a store decides
/// what the key maps to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHandle(String);

impl ContentHandle {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn key(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage collaborator owning all testcase content.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn read(&self, handle: &ContentHandle) -> anyhow::Result<String>;
    async fn write(&self, handle: &ContentHandle, content: &str) -> anyhow::Result<()>;
    async fn remove(&self, handle: &ContentHandle) -> anyhow::Result<()>;
}

/// Directory-backed store: the handle key is the filename inside `dir`.
#[derive(Debug, Clone)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn filepath(&self, handle: &ContentHandle) -> PathBuf {
        self.dir.join(handle.key())
    }
}

#[async_trait]
impl ContentStore for FsStore {
    async fn read(&self, handle: &ContentHandle) -> anyhow::Result<String> {
        let path = self.filepath(handle);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read testcase content {}", path.to_string_lossy()))
    }

    async fn write(&self, handle: &ContentHandle, content: &str) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await.with_context(|| {
            format!(
                "Failed to create testcase dir {}",
                self.dir.to_string_lossy()
            )
        })?;
        let path = self.filepath(handle);
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write testcase content {}", path.to_string_lossy()))
    }

    async fn remove(&self, handle: &ContentHandle) -> anyhow::Result<()> {
        let path = self.filepath(handle);
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("Failed to remove testcase content {}", path.to_string_lossy()))
    }
}

/// In-memory store, mainly for tests.
#[derive(Debug, Default)]
pub struct MemStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: HashMap<String, String>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub fn contains(&self, handle: &ContentHandle) -> bool {
        self.entries.lock().unwrap().contains_key(handle.key())
    }
}

#[async_trait]
impl ContentStore for MemStore {
    async fn read(&self, handle: &ContentHandle) -> anyhow::Result<String> {
        match self.entries.lock().unwrap().get(handle.key()) {
            Some(content) => Ok(content.clone()),
            None => bail!("No content stored for handle '{}'", handle),
        }
    }

    async fn write(&self, handle: &ContentHandle, content: &str) -> anyhow::Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(handle.key().to_owned(), content.to_owned());
        Ok(())
    }

    async fn remove(&self, handle: &ContentHandle) -> anyhow::Result<()> {
        match self.entries.lock().unwrap().remove(handle.key()) {
            Some(_) => Ok(()),
            None => bail!("No content stored for handle '{}'", handle),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn fs_store_roundtrip() {
        let dir = std::env::temp_dir().join(format!("cpj-store-test-{}", std::process::id()));
        let store = FsStore::new(&dir);
        let handle = ContentHandle::new("1.in");

        store.write(&handle, "3\n1 2 3\n").await.unwrap();
        assert_eq!(store.read(&handle).await.unwrap(), "3\n1 2 3\n");

        store.remove(&handle).await.unwrap();
        assert!(store.read(&handle).await.is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn mem_store_errors_on_missing_handle() {
        let store = MemStore::new();
        let handle = ContentHandle::new("1.in");
        assert!(store.read(&handle).await.is_err());
        assert!(store.remove(&handle).await.is_err());

        store.write(&handle, "x\n").await.unwrap();
        assert_eq!(store.read(&handle).await.unwrap(), "x\n");
    }
}
