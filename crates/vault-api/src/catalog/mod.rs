//! 리소스 카탈로그.
//!
//! 소유권 태그가 붙은 문서를 컬렉션별로 보관하고, [`VisibilityFilter`]를 질의에
//! 반영하여 목록을 돌려줍니다.
//!
//! - [`InMemoryResourceCatalog`]: 테스트와 로컬 개발용
//! - [`PgResourceCatalog`]: PostgreSQL (`resources` 테이블)

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::VisibilityFilter;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryResourceCatalog;
pub use postgres::PgResourceCatalog;

/// 템플릿 컬렉션 이름.
pub const TEMPLATES: &str = "templates";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("카탈로그 사용 불가: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        CatalogError::Unavailable(err.to_string())
    }
}

/// 가시성 필터를 적용한 목록 조회 인터페이스.
#[async_trait]
pub trait ResourceCatalog: Send + Sync {
    /// 컬렉션에서 필터가 허용하는 문서만 반환합니다.
    async fn list(
        &self,
        collection: &str,
        filter: &VisibilityFilter,
    ) -> Result<Vec<serde_json::Value>, CatalogError>;

    fn backend_name(&self) -> &'static str;
}
