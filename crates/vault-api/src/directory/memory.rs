//! 인메모리 주체 디렉터리.
//!
//! `tokio::sync::RwLock<HashMap>` 기반. 프로세스 재시작 시 모든 상태가 사라집니다.
//! 테스트를 위해 장애 주입(`set_unavailable`), 지연 주입(`with_latency`),
//! 외부 계층의 삭제를 흉내 내는 `remove`를 제공합니다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use vault_core::{Subject, SubjectPatch};

use super::{DirectoryError, DirectoryResult, SubjectDirectory};

#[derive(Debug, Default)]
pub struct InMemorySubjectDirectory {
    subjects: RwLock<HashMap<String, Subject>>,
    unavailable: AtomicBool,
    latency: Option<Duration>,
}

impl InMemorySubjectDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 모든 호출 앞에 지연을 추가합니다.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// `true`이면 이후 모든 호출이 `Unavailable`을 반환합니다.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// 주체를 제거합니다. 리소스 계층에서 계정이 삭제된 상황을 재현할 때 사용합니다.
    pub async fn remove(&self, id: &str) -> Option<Subject> {
        self.subjects.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.subjects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.subjects.read().await.is_empty()
    }

    async fn enter(&self) -> DirectoryResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable(
                "in-memory directory marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

fn username_taken(subjects: &HashMap<String, Subject>, username: &str, except_id: &str) -> bool {
    subjects
        .values()
        .any(|s| s.username == username && s.id != except_id)
}

#[async_trait]
impl SubjectDirectory for InMemorySubjectDirectory {
    async fn find_by_id(&self, id: &str) -> DirectoryResult<Subject> {
        self.enter().await?;
        self.subjects
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    async fn find_by_username(&self, username: &str) -> DirectoryResult<Subject> {
        self.enter().await?;
        self.subjects
            .read()
            .await
            .values()
            .find(|s| s.username == username)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    async fn insert(&self, mut subject: Subject) -> DirectoryResult<Subject> {
        self.enter().await?;
        let mut subjects = self.subjects.write().await;

        if subject.id.is_empty() {
            subject.id = uuid::Uuid::new_v4().to_string();
        }
        if subjects.contains_key(&subject.id) {
            return Err(DirectoryError::Conflict(format!("id {}", subject.id)));
        }
        if username_taken(&subjects, &subject.username, &subject.id) {
            return Err(DirectoryError::Conflict(format!(
                "username {}",
                subject.username
            )));
        }

        let now = Utc::now();
        subject.created_at.get_or_insert(now);
        subject.updated_at = Some(now);
        subjects.insert(subject.id.clone(), subject.clone());
        Ok(subject)
    }

    async fn update_fields(&self, id: &str, patch: &SubjectPatch) -> DirectoryResult<Subject> {
        self.enter().await?;
        let mut subjects = self.subjects.write().await;

        if let Some(username) = &patch.username {
            if username_taken(&subjects, username, id) {
                return Err(DirectoryError::Conflict(format!("username {username}")));
            }
        }

        let subject = subjects.get_mut(id).ok_or(DirectoryError::NotFound)?;
        subject.apply(patch, Utc::now());
        Ok(subject.clone())
    }

    async fn health_check(&self) -> DirectoryResult<()> {
        self.enter().await
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
