use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use super::{short_url, Shrinker, Unwrapper};
use crate::{error::StoreError, id::IdGenerator};

/// Non-persistent mapping table.
///
/// Backed by a DashMap so concurrent shrinks and lookups never block each
/// other. Entries are lost when the process exits.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, String>>,
    base_url: Option<String>,
    ids: IdGenerator,
}

impl MemoryStore {
    pub fn new(ids: IdGenerator) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            base_url: None,
            ids,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(IdGenerator::default())
    }
}

#[async_trait]
impl Shrinker for MemoryStore {
    async fn shrink(&self, original_url: &str) -> Result<String, StoreError> {
        let id = self.ids.generate(original_url);
        self.inner.insert(id.clone(), original_url.to_owned());
        Ok(short_url(self.base_url.as_deref(), id))
    }
}

#[async_trait]
impl Unwrapper for MemoryStore {
    async fn unwrap_url(&self, id: &str) -> Result<String, StoreError> {
        self.inner
            .get(id)
            .map(|v| v.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_owned()))
    }
}
