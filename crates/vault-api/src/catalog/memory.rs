//! 인메모리 리소스 카탈로그.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use vault_core::OwnershipTag;

use super::{CatalogError, ResourceCatalog};
use crate::auth::VisibilityFilter;

#[derive(Debug, Clone)]
struct CatalogEntry {
    collection: String,
    tag: OwnershipTag,
    document: serde_json::Value,
}

/// 삽입 순서를 유지하는 인메모리 카탈로그.
#[derive(Debug, Default)]
pub struct InMemoryResourceCatalog {
    entries: RwLock<Vec<CatalogEntry>>,
    unavailable: AtomicBool,
}

impl InMemoryResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(
        &self,
        collection: impl Into<String>,
        tag: OwnershipTag,
        document: serde_json::Value,
    ) {
        self.entries.write().await.push(CatalogEntry {
            collection: collection.into(),
            tag,
            document,
        });
    }

    /// `true`이면 이후 조회가 `Unavailable`을 반환합니다.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl ResourceCatalog for InMemoryResourceCatalog {
    async fn list(
        &self,
        collection: &str,
        filter: &VisibilityFilter,
    ) -> Result<Vec<serde_json::Value>, CatalogError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::Unavailable(
                "in-memory catalog marked unavailable".to_string(),
            ));
        }
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|entry| entry.collection == collection && filter.permits(&entry.tag))
            .map(|entry| entry.document.clone())
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
