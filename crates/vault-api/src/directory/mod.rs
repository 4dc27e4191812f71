//! 주체 디렉터리 (Subject Directory).
//!
//! 주체 레코드를 식별자/사용자 이름으로 조회하고 삽입/수정하는 저장소 인터페이스입니다.
//! 인증 게이트와 자격 증명 교환 흐름은 이 trait에만 의존합니다.
//!
//! # 구현
//!
//! - [`InMemorySubjectDirectory`]: 테스트와 로컬 개발용
//! - [`PgSubjectDirectory`]: PostgreSQL (`subjects` 테이블)
//! - [`TimeoutDirectory`]: 모든 호출에 시간 제한을 두는 래퍼

use async_trait::async_trait;
use thiserror::Error;
use vault_core::{Subject, SubjectPatch};

pub mod memory;
pub mod postgres;
pub mod timeout;

pub use memory::InMemorySubjectDirectory;
pub use postgres::PgSubjectDirectory;
pub use timeout::TimeoutDirectory;

/// 디렉터리 작업 에러.
///
/// `Unavailable`은 "없음"과 구분됩니다. 저장소 장애나 시간 초과를 "주체 없음"으로
/// 보고하면 안 됩니다.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("주체를 찾을 수 없습니다")]
    NotFound,
    #[error("고유 제약 충돌: {0}")]
    Conflict(String),
    #[error("디렉터리 사용 불가: {0}")]
    Unavailable(String),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

impl From<sqlx::Error> for DirectoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DirectoryError::NotFound,
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                DirectoryError::Conflict(db_err.message().to_string())
            }
            _ => DirectoryError::Unavailable(err.to_string()),
        }
    }
}

/// 주체 저장소.
#[async_trait]
pub trait SubjectDirectory: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DirectoryResult<Subject>;

    /// 사용자 이름은 대소문자를 구분하여 정확히 일치해야 합니다.
    async fn find_by_username(&self, username: &str) -> DirectoryResult<Subject>;

    /// 새 주체를 저장하고 저장된 레코드를 반환합니다.
    ///
    /// 식별자가 비어 있으면 새로 부여합니다. 사용자 이름이 이미 있으면 `Conflict`.
    async fn insert(&self, subject: Subject) -> DirectoryResult<Subject>;

    /// 패치의 값이 있는 필드만 변경하고 변경된 레코드를 반환합니다.
    async fn update_fields(&self, id: &str, patch: &SubjectPatch) -> DirectoryResult<Subject>;

    async fn health_check(&self) -> DirectoryResult<()>;

    fn backend_name(&self) -> &'static str;
}
