//! 사용자 계정 endpoint.
//!
//! 가입, 로그인/토큰 갱신, 정보 수정, 현재 사용자 조회를 제공합니다.
//! 실제 흐름은 [`CredentialExchange`](crate::auth::CredentialExchange)가 담당하고
//! 여기서는 요청 파싱과 상태 코드만 다룹니다.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use vault_core::{Role, SubjectProfile};

use crate::auth::{
    require_self_or_role, AuthRequest, AuthResponse, Authenticated, RegisterRequest,
    UpdateSubjectRequest,
};
use crate::error::{ApiResult, ErrorBody};
use crate::state::AppState;

/// 가입.
///
/// POST /users/register
#[utoipa::path(
    post,
    path = "/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "가입 성공", body = SubjectProfile),
        (status = 400, description = "필수 값 누락 또는 잘못된 역할", body = ErrorBody),
        (status = 409, description = "사용자 이름 중복", body = ErrorBody),
        (status = 503, description = "디렉터리 접근 불가", body = ErrorBody)
    ),
    tag = "users"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubjectProfile>)> {
    let Json(request) = payload?;
    let profile = state.exchange.register(request).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// 로그인 또는 토큰 갱신.
///
/// `Authorization` 헤더의 유효한 토큰, 본문의 `token`, 본문의 `username`/`password`
/// 순서로 시도합니다.
///
/// POST /users/auth
#[utoipa::path(
    post,
    path = "/users/auth",
    request_body(content = AuthRequest, description = "모든 필드 선택. 헤더 토큰만으로 갱신 가능"),
    responses(
        (status = 200, description = "토큰 발급", body = AuthResponse),
        (status = 400, description = "자격 증명 누락", body = ErrorBody),
        (status = 401, description = "잘못된 자격 증명 또는 토큰", body = ErrorBody),
        (status = 503, description = "디렉터리 접근 불가", body = ErrorBody)
    ),
    security((), ("bearer_auth" = [])),
    tag = "users"
)]
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<AuthResponse>> {
    let response = state
        .exchange
        .exchange(headers.get(AUTHORIZATION), &body)
        .await?;
    Ok(Json(response))
}

/// 주체 정보 수정.
///
/// POST /users/update/{id}
#[utoipa::path(
    post,
    path = "/users/update/{id}",
    params(
        ("id" = String, Path, description = "수정할 주체 식별자")
    ),
    request_body = UpdateSubjectRequest,
    responses(
        (status = 200, description = "수정 성공", body = SubjectProfile),
        (status = 400, description = "변경할 필드 없음 또는 잘못된 역할", body = ErrorBody),
        (status = 401, description = "인증 실패", body = ErrorBody),
        (status = 403, description = "권한 부족", body = ErrorBody),
        (status = 404, description = "주체 없음", body = ErrorBody),
        (status = 409, description = "사용자 이름 중복", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_subject(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    Path(id): Path<String>,
    payload: Result<Json<UpdateSubjectRequest>, JsonRejection>,
) -> ApiResult<Json<SubjectProfile>> {
    // 본문 에러보다 권한 거부가 먼저
    require_self_or_role(&identity, &id, Role::Admin)?;
    let Json(request) = payload?;
    let profile = state.exchange.update_subject(&identity, &id, request).await?;
    Ok(Json(profile))
}

/// 현재 사용자 프로필.
///
/// GET /users/me
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "현재 사용자", body = SubjectProfile),
        (status = 401, description = "인증 실패", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
) -> ApiResult<Json<SubjectProfile>> {
    let subject = state.directory.find_by_id(&identity.subject_id).await?;
    Ok(Json(subject.profile()))
}

/// 사용자 라우터 생성.
pub fn users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/auth", post(authenticate))
        .route("/users/update/{id}", post(update_subject))
        .route("/users/me", get(me))
}
