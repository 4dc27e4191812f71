//! PostgreSQL 리소스 카탈로그.
//!
//! 모든 컬렉션이 `resources` 테이블 하나를 공유하며 `collection` 컬럼으로 구분됩니다.
//! 가시성 필터는 `WHERE` 절로 변환되어 데이터베이스에서 적용됩니다.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{CatalogError, ResourceCatalog};
use crate::auth::VisibilityFilter;

#[derive(Debug, Clone)]
pub struct PgResourceCatalog {
    pool: PgPool,
}

impl PgResourceCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `resources` 테이블이 없으면 생성합니다.
    pub async fn migrate(&self) -> Result<(), CatalogError> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS resources (
                   collection TEXT NOT NULL,
                   id TEXT NOT NULL,
                   owner_id TEXT NOT NULL,
                   published BOOLEAN NOT NULL DEFAULT FALSE,
                   document JSONB NOT NULL,
                   created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                   PRIMARY KEY (collection, id)
               )"#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_resources_owner ON resources (collection, owner_id)",
        )
        .execute(&self.pool)
        .await?;
        tracing::info!("resources table ready");
        Ok(())
    }
}

fn list_query<'a>(collection: &'a str, filter: &'a VisibilityFilter) -> QueryBuilder<'a, Postgres> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT document FROM resources WHERE collection = ");
    builder.push_bind(collection);
    push_visibility(&mut builder, filter);
    builder.push(" ORDER BY created_at, id");
    builder
}

/// 가시성 필터를 `AND ...` 조건으로 추가합니다.
fn push_visibility<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a VisibilityFilter) {
    match filter {
        VisibilityFilter::Unrestricted => {}
        VisibilityFilter::PublishedOnly => {
            builder.push(" AND published = TRUE");
        }
        VisibilityFilter::PublishedOrOwnedBy(owner_id) => {
            builder.push(" AND (published = TRUE OR owner_id = ");
            builder.push_bind(owner_id.as_str());
            builder.push(")");
        }
    }
}

#[async_trait]
impl ResourceCatalog for PgResourceCatalog {
    async fn list(
        &self,
        collection: &str,
        filter: &VisibilityFilter,
    ) -> Result<Vec<serde_json::Value>, CatalogError> {
        let mut builder = list_query(collection, filter);
        let documents = builder
            .build_query_scalar::<serde_json::Value>()
            .fetch_all(&self.pool)
            .await?;
        tracing::debug!(collection, count = documents.len(), "Catalog listing");
        Ok(documents)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
