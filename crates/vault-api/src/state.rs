//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 `Arc`로 래핑되어 요청 간에 공유됩니다. 모든 구성 요소는 읽기 전용이거나
//! 내부적으로 동기화되어 있습니다.

use std::sync::Arc;

use axum::extract::FromRef;
use chrono::{DateTime, Utc};

use crate::auth::{AuthGate, CredentialExchange, CredentialStore, TokenCodec};
use crate::catalog::ResourceCatalog;
use crate::directory::SubjectDirectory;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 인증 게이트 (토큰 검증 + 주체 재확인)
    pub gate: AuthGate,

    /// 로그인/가입/정보 수정 흐름
    pub exchange: CredentialExchange,

    /// 주체 디렉터리 (시간 제한 래퍼 포함)
    pub directory: Arc<dyn SubjectDirectory>,

    /// 가시성 필터가 적용되는 리소스 카탈로그
    pub catalog: Arc<dyn ResourceCatalog>,

    /// 서버 시작 시간
    pub started_at: DateTime<Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    pub fn new(
        codec: Arc<TokenCodec>,
        credentials: Arc<CredentialStore>,
        directory: Arc<dyn SubjectDirectory>,
        catalog: Arc<dyn ResourceCatalog>,
    ) -> Self {
        let gate = AuthGate::new(codec, directory.clone());
        let exchange = CredentialExchange::new(gate.clone(), credentials);
        Self {
            gate,
            exchange,
            directory,
            catalog,
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 서버 업타임(초) 반환.
    pub fn uptime_secs(&self) -> i64 {
        Utc::now().signed_duration_since(self.started_at).num_seconds()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("directory", &self.directory.backend_name())
            .field("catalog", &self.catalog.backend_name())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl FromRef<Arc<AppState>> for AuthGate {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.gate.clone()
    }
}

/// 테스트용 AppState 생성 헬퍼.
///
/// 인메모리 디렉터리/카탈로그와 저비용 해시 설정을 사용합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use crate::catalog::InMemoryResourceCatalog;
    use crate::directory::InMemorySubjectDirectory;

    create_test_state_with(
        Arc::new(InMemorySubjectDirectory::new()),
        Arc::new(InMemoryResourceCatalog::new()),
    )
}

/// 주어진 디렉터리/카탈로그로 테스트용 AppState를 생성합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state_with(
    directory: Arc<dyn SubjectDirectory>,
    catalog: Arc<dyn ResourceCatalog>,
) -> AppState {
    use crate::auth::{test_codec, test_store};

    AppState::new(
        Arc::new(test_codec()),
        Arc::new(test_store()),
        directory,
        catalog,
    )
}
