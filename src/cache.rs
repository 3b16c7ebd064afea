use anyhow::{Result, anyhow};
use fjall::Keyspace;
use rand::RngExt;
use serde::Deserialize;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::OnceCell;
use tokio::task;

static GLOBAL_STORE: OnceCell<PersistentStore> = OnceCell::const_new();

#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    expires_at: u64, // Unix timestamp (seconds)
}

/// TTL'd key-value store backing weather caches, sessions, and user data.
pub struct PersistentStore {
    store: Keyspace,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> anyhow::Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

impl PersistentStore {
    fn new(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let items = db.keyspace("cinesky", fjall::KeyspaceCreateOptions::default)?;
        Ok(PersistentStore { store: items })
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "store_put", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + Send + Debug + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or(anyhow!("TTL overflow"))?
            .duration_since(UNIX_EPOCH)?
            .as_secs();
        let entry = StoredEntry { value, expires_at };
        let bytes = postcard::to_stdvec(&entry)?;

        let _ = task::spawn_blocking(move || store.insert(key, bytes)).await?;
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for misses or expired entries.
    #[tracing::instrument(name = "store_get", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, key_bytes)).await??;

        if let Some(bytes) = maybe_bytes {
            let entry: StoredEntry<T> = postcard::from_bytes(&bytes)?;
            let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

            if now < entry.expires_at {
                tracing::debug!("Key found and still fresh");
                Ok(Some(entry.value))
            } else {
                tracing::debug!("Key found but expired");
                self.remove(key).await?;
                Ok(None)
            }
        } else {
            tracing::debug!("Key not found");
            Ok(None)
        }
    }

    /// Manually removes a key from the store.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        let _ = task::spawn_blocking(move || store.remove(key)).await?;
        Ok(())
    }
}

/// Initializes the global persistent store. **Must be called once before use.**
pub fn init(path: impl AsRef<Path>) -> Result<()> {
    let store = PersistentStore::new(path)?;
    GLOBAL_STORE
        .set(store)
        .map_err(|_| anyhow!("Store already initialized"))?;
    Ok(())
}

/// Returns a reference to the globally initialized store.
/// # Panics
/// Panics if the store has not been initialized by calling `cache::init()` first.
fn get_store() -> &'static PersistentStore {
    GLOBAL_STORE
        .get()
        .expect("Store not initialized. Call cache::init() first.")
}

// Public, ergonomic API endpoints that use the global store.
pub async fn put<T: Serialize + Send + Debug + 'static>(key: &str, value: T, ttl: Duration) -> Result<()> {
    get_store().put(key, value, ttl).await
}

pub async fn get<T: DeserializeOwned + Send + 'static>(key: &str) -> Result<Option<T>> {
    get_store().get(key).await
}

pub async fn remove(key: &str) -> Result<()> {
    get_store().remove(key).await
}

/// Entries that should effectively never expire (user records, saved lists).
pub const PERMANENT_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Spread a base TTL by ±10% so cached upstream responses don't all
/// expire on the same tick.
pub fn jittered(base: Duration) -> Duration {
    let jitter: f32 = rand::rng().random_range(0.9..1.1);
    Duration::from_secs((base.as_secs_f32() * jitter) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jittered_stays_near_base() {
        let base = Duration::from_secs(600);
        for _ in 0..32 {
            let ttl = jittered(base);
            assert!(ttl >= Duration::from_secs(540));
            assert!(ttl <= Duration::from_secs(660));
        }
    }
}
