use async_trait::async_trait;
use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::Mutex};

use super::{short_url, Shrinker, Unwrapper};
use crate::{error::StoreError, id::IdGenerator, models::MappingTable};

/// Mapping table persisted as a single JSON object on disk.
///
/// Every operation re-reads the whole file, and every write rewrites it in
/// full. All operations run under one lock so that concurrent shrinks can't
/// interleave their read-modify-write cycles and drop each other's entries.
#[derive(Debug)]
pub struct FileStore {
    file: Arc<TableFile>,
    base_url: Option<String>,
    ids: IdGenerator,
}

/// The backing file and the lock guarding it, shared with detached writers.
#[derive(Debug)]
struct TableFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>, ids: IdGenerator) -> Self {
        Self {
            file: Arc::new(TableFile {
                path: path.into(),
                lock: Mutex::new(()),
            }),
            base_url: None,
            ids,
        }
    }

    /// Make `shrink` return full short URLs under `base_url`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }

    /// Number of entries currently persisted.
    pub(crate) async fn len(&self) -> Result<usize, StoreError> {
        let _guard = self.file.lock.lock().await;
        Ok(self.file.load().await?.len())
    }
}

impl TableFile {
    /// A missing or blank file is an empty table. Anything else that fails
    /// to read or parse is an error; it must not be mistaken for "empty",
    /// or the next write would wipe the existing entries.
    async fn load(&self) -> Result<MappingTable, StoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(
                    "Storage file {} not found, using empty table",
                    self.path.display()
                );
                return Ok(MappingTable::new());
            }
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(MappingTable::new());
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, table: &MappingTable) -> Result<(), StoreError> {
        let json = serde_json::to_vec(table)?;
        fs::write(&self.path, json).await?;
        Ok(())
    }
}

/// Run a write cycle on its own task so it finishes, and only then releases
/// the lock, even if the caller's future is dropped halfway through.
async fn detached<T, F>(cycle: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, StoreError>> + Send + 'static,
{
    tokio::spawn(cycle)
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
}

#[async_trait]
impl Shrinker for FileStore {
    async fn shrink(&self, original_url: &str) -> Result<String, StoreError> {
        let file = self.file.clone();
        let id = self.ids.generate(original_url);
        let entry = (id.clone(), original_url.to_owned());

        let entries = detached(async move {
            let _guard = file.lock.lock().await;

            let mut table = file.load().await?;
            let (id, url) = entry;
            if let Some(previous) = table.insert(id.clone(), url.clone()) {
                if previous != url {
                    tracing::warn!("Identifier '{}' collided, overwriting '{}'", id, previous);
                }
            }
            file.save(&table).await?;
            Ok(table.len())
        })
        .await?;

        tracing::debug!("Stored '{}' as '{}' ({} entries)", original_url, id, entries);
        Ok(short_url(self.base_url.as_deref(), id))
    }
}

#[async_trait]
impl Unwrapper for FileStore {
    async fn unwrap_url(&self, id: &str) -> Result<String, StoreError> {
        let _guard = self.file.lock.lock().await;

        self.file
            .load()
            .await?
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::IdStrategy;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir, strategy: IdStrategy) -> FileStore {
        FileStore::new(dir.path().join("db.json"), IdGenerator::new(strategy))
    }

    async fn read_table(path: &Path) -> MappingTable {
        let bytes = fs::read(path).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn shrink_then_unwrap_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, IdStrategy::Hash);

        let id = store.shrink("https://example.com").await.unwrap();
        assert_eq!(store.unwrap_url(&id).await.unwrap(), "https://example.com");
    }

    #[tokio::test]
    async fn missing_file_yields_single_entry_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, IdStrategy::Hash);
        assert!(!store.path().exists());

        let id = store.shrink("https://example.com").await.unwrap();

        let table = read_table(store.path()).await;
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&id).map(String::as_str), Some("https://example.com"));
    }

    #[tokio::test]
    async fn empty_file_is_treated_as_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, IdStrategy::Hash);
        fs::write(store.path(), b"").await.unwrap();

        assert!(matches!(
            store.unwrap_url("anything").await,
            Err(StoreError::NotFound(_))
        ));
        store.shrink("https://example.com").await.unwrap();
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found_without_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, IdStrategy::Hash);

        match store.unwrap_url("doesnotexist").await {
            Err(StoreError::NotFound(id)) => assert_eq!(id, "doesnotexist"),
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn hash_strategy_deduplicates_same_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, IdStrategy::Hash);

        let first = store.shrink("https://example.com").await.unwrap();
        let second = store.shrink("https://example.com").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn random_strategy_creates_distinct_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, IdStrategy::Random);

        let first = store.shrink("https://example.com").await.unwrap();
        let second = store.shrink("https://example.com").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(store.unwrap_url(&first).await.unwrap(), "https://example.com");
        assert_eq!(store.unwrap_url(&second).await.unwrap(), "https://example.com");
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn base_url_produces_full_short_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, IdStrategy::Hash).with_base_url("http://localhost:8080/");

        let short = store.shrink("https://example.com").await.unwrap();
        let id = short
            .strip_prefix("http://localhost:8080/")
            .expect("short url should start with base url");
        assert!(!id.is_empty() && !id.contains('/'));
        assert_eq!(store.unwrap_url(id).await.unwrap(), "https://example.com");
    }

    #[tokio::test]
    async fn persisted_format_is_a_flat_json_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, IdStrategy::Hash);
        let id = store.shrink("https://example.com").await.unwrap();

        let raw = fs::read_to_string(store.path()).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let object = value.as_object().expect("table should be a JSON object");
        assert_eq!(object.len(), 1);
        assert_eq!(object.get(&id), Some(&serde_json::Value::from("https://example.com")));
    }

    #[tokio::test]
    async fn existing_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = store_in(&dir, IdStrategy::Random)
            .shrink("https://example.com")
            .await
            .unwrap();

        let reopened = store_in(&dir, IdStrategy::Random);
        assert_eq!(reopened.unwrap_url(&id).await.unwrap(), "https://example.com");
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, IdStrategy::Hash);
        fs::write(store.path(), b"[not a table").await.unwrap();

        assert!(matches!(
            store.shrink("https://example.com").await,
            Err(StoreError::Serialization(_))
        ));
        // The unreadable file must be left untouched.
        assert_eq!(fs::read(store.path()).await.unwrap(), b"[not a table");
    }

    #[tokio::test]
    async fn unwritable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(
            dir.path().join("missing-dir").join("db.json"),
            IdGenerator::default(),
        );

        assert!(matches!(
            store.shrink("https://example.com").await,
            Err(StoreError::Io(_))
        ));
    }

    #[tokio::test]
    async fn cancelled_shrink_still_completes_its_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, IdStrategy::Hash);

        // Hold the lock so the first shrink is parked when its caller gives up.
        let guard = store.file.lock.lock().await;
        let abandoned = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            store.shrink("https://example.com/abandoned"),
        )
        .await;
        assert!(abandoned.is_err());
        drop(guard);

        store.shrink("https://example.com/kept").await.unwrap();

        let abandoned_id =
            IdGenerator::new(IdStrategy::Hash).generate("https://example.com/abandoned");
        assert_eq!(
            store.unwrap_url(&abandoned_id).await.unwrap(),
            "https://example.com/abandoned"
        );
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn concurrent_shrinks_do_not_lose_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store_in(&dir, IdStrategy::Hash));

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.shrink(&format!("https://example.com/{i}")).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.len().await.unwrap(), 32);
    }
}
