//! 디렉터리 호출 시간 제한 래퍼.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use vault_core::{Subject, SubjectPatch};

use super::{DirectoryError, DirectoryResult, SubjectDirectory};

/// 모든 호출을 `budget` 안에 끝내도록 제한합니다.
///
/// 제한을 넘기면 `Unavailable`을 반환합니다. `NotFound`로 바뀌지 않습니다.
pub struct TimeoutDirectory {
    inner: Arc<dyn SubjectDirectory>,
    budget: Duration,
}

impl TimeoutDirectory {
    pub fn new(inner: Arc<dyn SubjectDirectory>, budget: Duration) -> Self {
        Self { inner, budget }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = DirectoryResult<T>> + Send,
    ) -> DirectoryResult<T> {
        match tokio::time::timeout(self.budget, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    backend = self.inner.backend_name(),
                    budget_ms = self.budget.as_millis() as u64,
                    "Subject directory call timed out"
                );
                crate::metrics::record_directory_timeout(operation);
                Err(DirectoryError::Unavailable(format!(
                    "{operation} exceeded {}ms",
                    self.budget.as_millis()
                )))
            }
        }
    }
}

#[async_trait]
impl SubjectDirectory for TimeoutDirectory {
    async fn find_by_id(&self, id: &str) -> DirectoryResult<Subject> {
        self.bounded("find_by_id", self.inner.find_by_id(id)).await
    }

    async fn find_by_username(&self, username: &str) -> DirectoryResult<Subject> {
        self.bounded("find_by_username", self.inner.find_by_username(username))
            .await
    }

    async fn insert(&self, subject: Subject) -> DirectoryResult<Subject> {
        self.bounded("insert", self.inner.insert(subject)).await
    }

    async fn update_fields(&self, id: &str, patch: &SubjectPatch) -> DirectoryResult<Subject> {
        self.bounded("update_fields", self.inner.update_fields(id, patch))
            .await
    }

    async fn health_check(&self) -> DirectoryResult<()> {
        self.bounded("health_check", self.inner.health_check()).await
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}
