//! 템플릿 목록 endpoint.
//!
//! 인증은 선택입니다. 익명은 공개 템플릿만, 일반 사용자는 공개 템플릿과 자신의 것,
//! 관리자는 전부 봅니다.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{OptionalAuthenticated, VisibilityFilter};
use crate::catalog::TEMPLATES;
use crate::error::{ApiResult, ErrorBody};
use crate::state::AppState;

/// 저장된 템플릿 문서 (구조는 클라이언트가 정의).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct TemplateDocument(pub serde_json::Value);

/// 템플릿 목록 조회.
///
/// GET /templates
#[utoipa::path(
    get,
    path = "/templates",
    responses(
        (status = 200, description = "요청자에게 보이는 템플릿", body = [TemplateDocument]),
        (status = 401, description = "헤더가 있으나 유효하지 않음", body = ErrorBody),
        (status = 503, description = "카탈로그 접근 불가", body = ErrorBody)
    ),
    security((), ("bearer_auth" = [])),
    tag = "templates"
)]
pub async fn list_templates(
    State(state): State<Arc<AppState>>,
    OptionalAuthenticated(identity): OptionalAuthenticated,
) -> ApiResult<Json<Vec<TemplateDocument>>> {
    let filter = VisibilityFilter::for_identity(identity.as_ref());
    let documents = state.catalog.list(TEMPLATES, &filter).await?;
    tracing::debug!(?filter, count = documents.len(), "Templates listed");
    Ok(Json(documents.into_iter().map(TemplateDocument).collect()))
}

/// 템플릿 라우터 생성.
pub fn templates_router() -> Router<Arc<AppState>> {
    Router::new().route("/templates", get(list_templates))
}
