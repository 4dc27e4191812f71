//! PostgreSQL 주체 디렉터리.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use vault_core::{Role, Subject, SubjectPatch};

use super::{DirectoryError, DirectoryResult, SubjectDirectory};

const SUBJECT_COLUMNS: &str =
    "id, username, hashed_password, profile_picture, role, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
struct SubjectRow {
    id: String,
    username: String,
    hashed_password: String,
    profile_picture: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubjectRow> for Subject {
    type Error = DirectoryError;

    fn try_from(row: SubjectRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role).ok_or_else(|| {
            DirectoryError::Unavailable(format!("stored role {:?} is not recognized", row.role))
        })?;
        Ok(Subject {
            id: row.id,
            username: row.username,
            password_hash: row.hashed_password,
            profile_picture: row.profile_picture,
            role,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgSubjectDirectory {
    pool: PgPool,
}

impl PgSubjectDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `subjects` 테이블이 없으면 생성합니다.
    pub async fn migrate(&self) -> DirectoryResult<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS subjects (
                   id TEXT PRIMARY KEY,
                   username TEXT NOT NULL UNIQUE,
                   hashed_password TEXT NOT NULL DEFAULT '',
                   profile_picture TEXT,
                   role TEXT NOT NULL DEFAULT 'user',
                   created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                   updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
               )"#,
        )
        .execute(&self.pool)
        .await?;
        tracing::info!("subjects table ready");
        Ok(())
    }

    async fn fetch_one_where(&self, column: &str, value: &str) -> DirectoryResult<Subject> {
        let sql = format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE {column} = $1");
        let row = sqlx::query_as::<_, SubjectRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => row.try_into(),
            None => Err(DirectoryError::NotFound),
        }
    }
}

#[async_trait]
impl SubjectDirectory for PgSubjectDirectory {
    async fn find_by_id(&self, id: &str) -> DirectoryResult<Subject> {
        self.fetch_one_where("id", id).await
    }

    async fn find_by_username(&self, username: &str) -> DirectoryResult<Subject> {
        self.fetch_one_where("username", username).await
    }

    async fn insert(&self, subject: Subject) -> DirectoryResult<Subject> {
        let id = if subject.id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            subject.id.clone()
        };

        let sql = format!(
            "INSERT INTO subjects (id, username, hashed_password, profile_picture, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {SUBJECT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SubjectRow>(&sql)
            .bind(&id)
            .bind(&subject.username)
            .bind(&subject.password_hash)
            .bind(&subject.profile_picture)
            .bind(subject.role.as_str())
            .fetch_one(&self.pool)
            .await?;

        metrics::counter!("vault_subjects_created_total", "backend" => "postgres").increment(1);
        row.try_into()
    }

    async fn update_fields(&self, id: &str, patch: &SubjectPatch) -> DirectoryResult<Subject> {
        let sql = format!(
            "UPDATE subjects SET \
                 username = COALESCE($2, username), \
                 profile_picture = COALESCE($3, profile_picture), \
                 role = COALESCE($4, role), \
                 updated_at = NOW() \
             WHERE id = $1 RETURNING {SUBJECT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SubjectRow>(&sql)
            .bind(id)
            .bind(&patch.username)
            .bind(&patch.profile_picture)
            .bind(patch.role.map(|r| r.as_str()))
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => row.try_into(),
            None => Err(DirectoryError::NotFound),
        }
    }

    async fn health_check(&self) -> DirectoryResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
