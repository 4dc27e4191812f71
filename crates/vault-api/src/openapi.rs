//! OpenAPI 문서화 설정.
//!
//! utoipa로 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! 스펙은 `/api-docs/openapi.json`에서 제공되며 `--export-openapi`로 파일로 내보낼 수 있습니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::{routing::get, Json, Router};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use vault_core::{Role, SubjectProfile};

use crate::auth::{AuthRequest, AuthResponse, RegisterRequest, UpdateSubjectRequest};
use crate::error::ErrorBody;
use crate::routes::{ComponentHealth, ComponentStatus, HealthResponse, TemplateDocument};

/// `bearer_auth` 보안 스키마 등록.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// FATE Vault API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "FATE Vault API",
        description = r#"
# FATE Vault 인증/접근 제어 API

## 인증

보호된 엔드포인트는 `Authorization: Bearer <token>` 헤더가 필요합니다.
토큰은 `POST /users/auth`로 발급되며 7일간 유효합니다.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
        contact(
            name = "FATE Vault Team",
            url = "https://github.com/user/fate-vault"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "users", description = "사용자 - 가입, 로그인, 정보 수정"),
        (name = "templates", description = "템플릿 - 가시성 필터 목록")
    ),
    modifiers(&SecurityAddon),
    components(
        schemas(
            // ===== Health =====
            HealthResponse,
            ComponentHealth,
            ComponentStatus,

            // ===== Common =====
            ErrorBody,
            Role,
            SubjectProfile,

            // ===== Users =====
            RegisterRequest,
            AuthRequest,
            AuthResponse,
            UpdateSubjectRequest,

            // ===== Templates =====
            TemplateDocument,
        )
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::health::health_ready,
        crate::routes::users::register,
        crate::routes::users::authenticate,
        crate::routes::users::update_subject,
        crate::routes::users::me,
        crate::routes::templates::list_templates,
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// OpenAPI JSON 라우터 생성.
///
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn openapi_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/api-docs/openapi.json", get(openapi_json))
}
