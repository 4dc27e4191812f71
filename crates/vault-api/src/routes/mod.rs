//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 디렉터리 연결 확인 (readiness)
//! - `/users/register` - 가입
//! - `/users/auth` - 로그인/토큰 갱신
//! - `/users/update/{id}` - 주체 정보 수정
//! - `/users/me` - 현재 사용자
//! - `/templates` - 가시성 필터가 적용된 템플릿 목록

pub mod health;
pub mod templates;
pub mod users;

pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use templates::{templates_router, TemplateDocument};
pub use users::users_router;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 모든 서브 라우터를 조합하여 하나의 라우터로 반환합니다.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health_router())
        .merge(users_router())
        .merge(templates_router())
}
