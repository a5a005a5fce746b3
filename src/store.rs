//! Persistent query journal on fjall
//!
//! Records live in the `queries` keyspace under their big-endian id so that
//! key order is id order. The next id is kept in `meta`; ids are never
//! handed out twice, even after the highest record is deleted.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use fjall::{Database, Keyspace, KeyspaceCreateOptions};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task;

use crate::JournalError;
use crate::models::{Location, WeatherRecord};

const NEXT_ID_KEY: &[u8] = b"next_id";

#[derive(Serialize, Deserialize)]
struct StoredQuery {
    location: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    weather_summary: String,
    created_at: DateTime<Utc>,
}

impl StoredQuery {
    fn into_record(self, id: u64) -> WeatherRecord {
        WeatherRecord {
            id,
            location: self.location,
            latitude: self.latitude,
            longitude: self.longitude,
            start_date: self.start_date,
            end_date: self.end_date,
            weather_summary: self.weather_summary,
            created_at: Some(self.created_at),
        }
    }

    fn from_record(record: &WeatherRecord) -> Self {
        Self {
            location: record.location.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            start_date: record.start_date,
            end_date: record.end_date,
            weather_summary: record.weather_summary.clone(),
            created_at: record.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Fields of a record before the store assigns its id
#[derive(Debug, Clone)]
pub struct QueryDraft {
    pub location: Location,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weather_summary: String,
}

struct Inner {
    // Keyspaces are only valid while the database is open.
    _db: Database,
    queries: Keyspace,
    meta: Keyspace,
}

/// Handle to the journal; cheap to clone and share between handlers.
/// Every write holds `write_lock` so existence checks and the write that
/// follows them cannot interleave with another writer.
#[derive(Clone)]
pub struct QueryStore {
    inner: Arc<Inner>,
    write_lock: Arc<Mutex<()>>,
}

fn id_key(id: u64) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

fn decode_id(key: &[u8]) -> crate::Result<u64> {
    let bytes: [u8; 8] = key
        .try_into()
        .map_err(|_| JournalError::storage("malformed record key"))?;
    Ok(u64::from_be_bytes(bytes))
}

fn decode_record(key: &[u8], value: &[u8]) -> crate::Result<WeatherRecord> {
    let stored: StoredQuery = postcard::from_bytes(value)?;
    Ok(stored.into_record(decode_id(key)?))
}

async fn blocking<T, F>(f: F) -> crate::Result<T>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| JournalError::storage(format!("store task failed: {e}")))?
}

impl QueryStore {
    /// Open (or create) the journal database in `path`
    pub fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let db = Database::builder(path).open()?;
        let queries = db.keyspace("queries", KeyspaceCreateOptions::default)?;
        let meta = db.keyspace("meta", KeyspaceCreateOptions::default)?;
        tracing::info!("Opened query journal at {}", path.display());

        Ok(Self {
            inner: Arc::new(Inner {
                _db: db,
                queries,
                meta,
            }),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Store a new record and return it with its id and creation time
    #[tracing::instrument(name = "create_query", level = "debug", skip(self, draft), fields(location = %draft.location.name))]
    pub async fn create(&self, draft: QueryDraft) -> crate::Result<WeatherRecord> {
        let _guard = self.write_lock.lock().await;
        let inner = Arc::clone(&self.inner);

        let record = blocking(move || {
            let id = match inner.meta.get(NEXT_ID_KEY.to_vec())? {
                Some(bytes) => decode_id(&bytes)?,
                None => 1,
            };

            let record = WeatherRecord {
                id,
                location: draft.location.display_name(),
                latitude: Some(draft.location.latitude),
                longitude: Some(draft.location.longitude),
                start_date: draft.start_date,
                end_date: draft.end_date,
                weather_summary: draft.weather_summary,
                created_at: Some(Utc::now()),
            };
            let bytes = postcard::to_stdvec(&StoredQuery::from_record(&record))?;

            inner.queries.insert(id_key(id), bytes)?;
            inner.meta.insert(NEXT_ID_KEY.to_vec(), id_key(id + 1))?;
            Ok(record)
        })
        .await?;

        tracing::debug!("Stored query #{}", record.id);
        Ok(record)
    }

    pub async fn get(&self, id: u64) -> crate::Result<Option<WeatherRecord>> {
        let inner = Arc::clone(&self.inner);
        blocking(move || {
            inner
                .queries
                .get(id_key(id))?
                .map(|bytes| decode_record(&id_key(id), &bytes))
                .transpose()
        })
        .await
    }

    /// All records, newest first
    pub async fn list(&self) -> crate::Result<Vec<WeatherRecord>> {
        let mut records = self.all().await?;
        records.reverse();
        Ok(records)
    }

    /// All records in id order
    pub async fn all(&self) -> crate::Result<Vec<WeatherRecord>> {
        let inner = Arc::clone(&self.inner);
        blocking(move || {
            inner
                .queries
                .iter()
                .map(|guard| {
                    let (key, value) = guard.into_inner()?;
                    decode_record(&key, &value)
                })
                .collect()
        })
        .await
    }

    /// Overwrite an existing record. Fails with `NotFound` if the id is unknown.
    pub async fn replace(&self, record: WeatherRecord) -> crate::Result<WeatherRecord> {
        let _guard = self.write_lock.lock().await;
        let inner = Arc::clone(&self.inner);
        blocking(move || {
            let key = id_key(record.id);
            if inner.queries.get(key.clone())?.is_none() {
                return Err(JournalError::not_found("Not found"));
            }
            let bytes = postcard::to_stdvec(&StoredQuery::from_record(&record))?;
            inner.queries.insert(key, bytes)?;
            Ok(record)
        })
        .await
    }

    /// Remove a record; `false` when there was nothing to remove
    pub async fn delete(&self, id: u64) -> crate::Result<bool> {
        let _guard = self.write_lock.lock().await;
        let inner = Arc::clone(&self.inner);
        blocking(move || {
            let key = id_key(id);
            if inner.queries.get(key.clone())?.is_none() {
                return Ok(false);
            }
            inner.queries.remove(key)?;
            Ok(true)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn draft(name: &str, summary: &str) -> QueryDraft {
        QueryDraft {
            location: Location::with_country(52.52, 13.41, name.to_string(), "Germany".into()),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
            weather_summary: summary.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let dir = TempDir::new().unwrap();
        let store = QueryStore::open(dir.path()).unwrap();

        let created = store.create(draft("Berlin", "min 1°C / max 6°C")).await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.location, "Berlin, Germany");
        assert_eq!(created.coordinates(), Some((52.52, 13.41)));
        assert!(created.created_at.is_some());

        let fetched = store.get(1).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(store.get(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = QueryStore::open(dir.path()).unwrap();

        for name in ["Berlin", "Hamburg", "Munich"] {
            store.create(draft(name, "")).await.unwrap();
        }

        let ids: Vec<u64> = store.list().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        let ids: Vec<u64> = store.all().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused() {
        let dir = TempDir::new().unwrap();
        let store = QueryStore::open(dir.path()).unwrap();

        store.create(draft("Berlin", "")).await.unwrap();
        let second = store.create(draft("Hamburg", "")).await.unwrap();
        assert!(store.delete(second.id).await.unwrap());
        assert!(!store.delete(second.id).await.unwrap());

        let third = store.create(draft("Munich", "")).await.unwrap();
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn test_replace() {
        let dir = TempDir::new().unwrap();
        let store = QueryStore::open(dir.path()).unwrap();

        let mut record = store.create(draft("Berlin", "old")).await.unwrap();
        record.weather_summary = "new".to_string();
        store.replace(record.clone()).await.unwrap();
        assert_eq!(store.get(record.id).await.unwrap().unwrap().weather_summary, "new");

        record.id = 99;
        assert!(matches!(
            store.replace(record).await,
            Err(JournalError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_ids() {
        let dir = TempDir::new().unwrap();
        let store = QueryStore::open(dir.path()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.create(draft(&format!("Town {i}"), "")).await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=8).collect::<Vec<u64>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_replace_never_resurrects_deleted_record() {
        let dir = TempDir::new().unwrap();
        let store = QueryStore::open(dir.path()).unwrap();

        for round in 0..20 {
            let mut record = store.create(draft("Berlin", "old")).await.unwrap();
            record.weather_summary = format!("round {round}");

            let replacing = {
                let store = store.clone();
                let record = record.clone();
                tokio::spawn(async move { store.replace(record).await })
            };
            let id = record.id;
            let deleting = {
                let store = store.clone();
                tokio::spawn(async move { store.delete(id).await })
            };

            let replaced = replacing.await.unwrap();
            assert!(deleting.await.unwrap().unwrap());
            assert!(matches!(replaced, Ok(_) | Err(JournalError::NotFound { .. })));
            assert!(store.get(id).await.unwrap().is_none());
        }
    }
}
