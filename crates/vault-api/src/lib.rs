//! FATE Vault REST API.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Argon2id 비밀번호 해시와 HS256 세션 토큰
//! - 인증 게이트 추출기와 인가 정책
//! - 가입/로그인/갱신/정보 수정 흐름
//! - 주체 디렉터리와 리소스 카탈로그 (PostgreSQL, 인메모리)
//! - 헬스 체크, Prometheus 메트릭, OpenAPI 문서
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 인증 및 권한 관리
//! - [`directory`]: 주체 저장소
//! - [`catalog`]: 가시성 필터 목록 조회
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어
//! - [`openapi`]: OpenAPI 문서

pub mod auth;
pub mod catalog;
pub mod directory;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use auth::{
    AdminAuth, AuthGate, Authenticated, CredentialExchange, CredentialStore, OptionalAuthenticated,
    TokenCodec, VisibilityFilter,
};
pub use error::{ApiError, ApiResult, ErrorBody};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use routes::create_api_router;
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::{create_test_state, create_test_state_with};
