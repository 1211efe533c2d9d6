use std::{collections::HashMap, convert::Infallible};

use super::{CacheEntry, Store};

/// Process-local store, mainly for tests and for bypassing the persistent cache.
#[derive(Default)]
pub struct MemoryStore {
    map: tokio::sync::Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub async fn is_empty(&self) -> bool {
        self.map.lock().await.is_empty()
    }
}

impl Store for MemoryStore {
    type Error = Infallible;

    async fn load(&self, key: &str) -> Result<Option<CacheEntry>, Self::Error> {
        Ok(self.map.lock().await.get(key).cloned())
    }

    async fn save(&self, key: &str, entry: &CacheEntry) -> Result<(), Self::Error> {
        self.map.lock().await.insert(key.to_owned(), entry.clone());
        Ok(())
    }
}
