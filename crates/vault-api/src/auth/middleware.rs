//! 인증 게이트 (Authentication Gate).
//!
//! 보호된 라우트마다 다음 순서로 호출자를 확인합니다:
//!
//! 1. `Authorization` 헤더 존재
//! 2. `Bearer <token>` 형식
//! 3. 토큰 서명/만료 검증
//! 4. 토큰의 주체가 디렉터리에 아직 존재하는지 재확인
//!
//! 통과하면 디렉터리에서 방금 읽은 레코드로 [`VerifiedIdentity`]를 만듭니다.
//! 핸들러는 [`Authenticated`], [`OptionalAuthenticated`], [`AdminAuth`] 추출기로 받습니다.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderValue},
};
use vault_core::{Role, Subject, VerifiedIdentity};

use super::jwt::{JwtError, TokenCodec};
use super::policy::require_role;
use crate::directory::{DirectoryError, SubjectDirectory};
use crate::error::ApiError;
use crate::metrics::record_auth_outcome;

/// 게이트 거부 사유.
///
/// 메시지는 그대로 응답 본문에 쓰입니다. 토큰 실패의 세부 종류는 로그에만 남습니다.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("authorization header required")]
    MissingHeader,
    #[error("invalid authorization header format")]
    MalformedHeader,
    #[error("invalid or expired token")]
    InvalidToken(#[source] JwtError),
    #[error("user not found")]
    SubjectNotFound,
    #[error("subject directory unavailable: {0}")]
    DirectoryUnavailable(String),
}

impl GateError {
    fn outcome(&self) -> &'static str {
        match self {
            GateError::MissingHeader => "missing_header",
            GateError::MalformedHeader => "malformed_header",
            GateError::InvalidToken(_) => "invalid_token",
            GateError::SubjectNotFound => "subject_not_found",
            GateError::DirectoryUnavailable(_) => "directory_unavailable",
        }
    }
}

/// `Bearer <token>`에서 토큰 부분을 꺼냅니다.
///
/// 공백으로 나눈 결과가 정확히 두 조각이고 첫 조각이 `Bearer`여야 합니다.
/// `"Bearer "`처럼 토큰이 빈 경우는 형식 오류가 아니라 토큰 검증 단계에서 거부됩니다.
pub fn bearer_token(header: &HeaderValue) -> Result<&str, GateError> {
    let value = header.to_str().map_err(|_| GateError::MalformedHeader)?;
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => Err(GateError::MalformedHeader),
    }
}

/// 토큰 검증과 주체 재확인을 수행하는 게이트.
#[derive(Clone)]
pub struct AuthGate {
    codec: Arc<TokenCodec>,
    directory: Arc<dyn SubjectDirectory>,
}

impl AuthGate {
    pub fn new(codec: Arc<TokenCodec>, directory: Arc<dyn SubjectDirectory>) -> Self {
        Self { codec, directory }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn directory(&self) -> &Arc<dyn SubjectDirectory> {
        &self.directory
    }

    /// 토큰을 검증하고 그 주체의 현재 레코드를 가져옵니다.
    pub async fn resolve_token(&self, token: &str) -> Result<Subject, GateError> {
        let claims = self.codec.verify(token).map_err(|e| {
            tracing::debug!(kind = e.kind(), "Token rejected");
            GateError::InvalidToken(e)
        })?;

        match self.directory.find_by_id(&claims.sub).await {
            Ok(subject) => Ok(subject),
            Err(DirectoryError::NotFound) => {
                tracing::debug!(subject_id = %claims.sub, "Token subject no longer exists");
                Err(GateError::SubjectNotFound)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Subject lookup failed during authentication");
                Err(GateError::DirectoryUnavailable(e.to_string()))
            }
        }
    }

    /// `Authorization` 헤더 값으로 주체를 확인합니다.
    pub async fn resolve(&self, header: Option<&HeaderValue>) -> Result<Subject, GateError> {
        let header = header.ok_or(GateError::MissingHeader)?;
        let token = bearer_token(header)?;
        self.resolve_token(token).await
    }

    /// 요청 헤더로 호출자를 인증합니다.
    pub async fn authenticate(
        &self,
        header: Option<&HeaderValue>,
    ) -> Result<VerifiedIdentity, GateError> {
        match self.resolve(header).await {
            Ok(subject) => {
                record_auth_outcome("gate", "ok");
                Ok(VerifiedIdentity::from(&subject))
            }
            Err(e) => {
                record_auth_outcome("gate", e.outcome());
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("codec", &self.codec)
            .field("directory", &self.directory.backend_name())
            .finish()
    }
}

/// 인증이 필요한 라우트용 추출기.
///
/// ```rust,ignore
/// async fn me(Authenticated(identity): Authenticated) -> String {
///     identity.display_name
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Authenticated(pub VerifiedIdentity);

impl<S> FromRequestParts<S> for Authenticated
where
    AuthGate: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<VerifiedIdentity>() {
            return Ok(Authenticated(identity.clone()));
        }

        let gate = AuthGate::from_ref(state);
        let identity = gate.authenticate(parts.headers.get(AUTHORIZATION)).await?;
        parts.extensions.insert(identity.clone());
        Ok(Authenticated(identity))
    }
}

/// 인증이 선택인 라우트용 추출기.
///
/// 헤더가 없으면 익명(`None`)입니다. 헤더가 있는데 유효하지 않으면 거부합니다.
#[derive(Debug, Clone)]
pub struct OptionalAuthenticated(pub Option<VerifiedIdentity>);

impl<S> FromRequestParts<S> for OptionalAuthenticated
where
    AuthGate: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(OptionalAuthenticated(None));
        }
        let Authenticated(identity) = Authenticated::from_request_parts(parts, state).await?;
        Ok(OptionalAuthenticated(Some(identity)))
    }
}

/// 관리자 전용 라우트용 추출기.
#[derive(Debug, Clone)]
pub struct AdminAuth(pub VerifiedIdentity);

impl<S> FromRequestParts<S> for AdminAuth
where
    AuthGate: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Authenticated(identity) = Authenticated::from_request_parts(parts, state).await?;
        require_role(&identity, Role::Admin)?;
        Ok(AdminAuth(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::test_codec;
    use crate::directory::{InMemorySubjectDirectory, TimeoutDirectory};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        Json, Router,
    };
    use chrono::{Duration, Utc};
    use std::time::Duration as StdDuration;
    use tower::ServiceExt;

    struct Fixture {
        gate: AuthGate,
        directory: Arc<InMemorySubjectDirectory>,
    }

    fn fixture() -> Fixture {
        let directory = Arc::new(InMemorySubjectDirectory::new());
        let gate = AuthGate::new(Arc::new(test_codec()), directory.clone());
        Fixture { gate, directory }
    }

    async fn seed(directory: &InMemorySubjectDirectory, username: &str, role: Role) -> Subject {
        directory.insert(Subject::new(username, role)).await.unwrap()
    }

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).unwrap()
    }

    async fn whoami(Authenticated(identity): Authenticated) -> Json<VerifiedIdentity> {
        Json(identity)
    }

    async fn maybe(OptionalAuthenticated(identity): OptionalAuthenticated) -> String {
        identity.map(|i| i.display_name).unwrap_or_else(|| "anonymous".to_string())
    }

    async fn admin_only(AdminAuth(identity): AdminAuth) -> String {
        identity.subject_id
    }

    fn router(gate: AuthGate) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route("/maybe", get(maybe))
            .route("/admin", get(admin_only))
            .with_state(gate)
    }

    async fn call(app: Router, uri: &str, auth: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&header("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token(&header("Bearer ")).unwrap(), "");

        for bad in ["Basic abc", "bearer abc", "Bearer", "Bearer a b", "Bearer  abc", "abc"] {
            assert!(
                matches!(bearer_token(&header(bad)), Err(GateError::MalformedHeader)),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_non_visible_ascii_header_is_malformed() {
        let value = HeaderValue::from_bytes(b"Bearer \xffabc").unwrap();
        assert!(matches!(bearer_token(&value), Err(GateError::MalformedHeader)));
    }

    #[tokio::test]
    async fn test_authenticate_happy_path() {
        let fx = fixture();
        let subject = seed(&fx.directory, "fate-master", Role::Admin).await;
        let token = fx.gate.codec().issue(&subject.id, "fate-master", Role::Admin).unwrap();

        let identity = fx
            .gate
            .authenticate(Some(&header(&format!("Bearer {token}"))))
            .await
            .unwrap();
        assert_eq!(identity.subject_id, subject.id);
        assert_eq!(identity.display_name, "fate-master");
        assert!(identity.is_admin());
    }

    #[tokio::test]
    async fn test_identity_uses_current_record() {
        let fx = fixture();
        let subject = seed(&fx.directory, "old-name", Role::Admin).await;
        let token = fx.gate.codec().issue(&subject.id, "old-name", Role::Admin).unwrap();

        let patch = vault_core::SubjectPatch {
            username: Some("new-name".to_string()),
            role: Some(Role::User),
            ..Default::default()
        };
        fx.directory.update_fields(&subject.id, &patch).await.unwrap();

        let identity = fx
            .gate
            .authenticate(Some(&header(&format!("Bearer {token}"))))
            .await
            .unwrap();
        assert_eq!(identity.display_name, "new-name");
        assert_eq!(identity.role, Role::User);
    }

    #[tokio::test]
    async fn test_gate_rejections() {
        let fx = fixture();

        assert!(matches!(
            fx.gate.authenticate(None).await,
            Err(GateError::MissingHeader)
        ));
        assert!(matches!(
            fx.gate.authenticate(Some(&header("Token abc"))).await,
            Err(GateError::MalformedHeader)
        ));
        assert!(matches!(
            fx.gate.authenticate(Some(&header("Bearer garbage"))).await,
            Err(GateError::InvalidToken(JwtError::MalformedToken))
        ));
        assert!(matches!(
            fx.gate.authenticate(Some(&header("Bearer "))).await,
            Err(GateError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let fx = fixture();
        let subject = seed(&fx.directory, "gm", Role::User).await;
        let token = fx
            .gate
            .codec()
            .issue_at(&subject.id, "gm", Role::User, Utc::now() - Duration::days(7))
            .unwrap();

        assert!(matches!(
            fx.gate.authenticate(Some(&header(&format!("Bearer {token}")))).await,
            Err(GateError::InvalidToken(JwtError::Expired))
        ));
    }

    #[tokio::test]
    async fn test_deleted_subject_is_rejected() {
        let fx = fixture();
        let subject = seed(&fx.directory, "gm", Role::User).await;
        let token = fx.gate.codec().issue(&subject.id, "gm", Role::User).unwrap();
        fx.directory.remove(&subject.id).await;

        let result = fx.gate.authenticate(Some(&header(&format!("Bearer {token}")))).await;
        assert!(matches!(result, Err(GateError::SubjectNotFound)));
    }

    #[tokio::test]
    async fn test_directory_fault_is_unavailable_not_not_found() {
        let fx = fixture();
        let subject = seed(&fx.directory, "gm", Role::User).await;
        let token = fx.gate.codec().issue(&subject.id, "gm", Role::User).unwrap();
        fx.directory.set_unavailable(true);

        let result = fx.gate.authenticate(Some(&header(&format!("Bearer {token}")))).await;
        assert!(matches!(result, Err(GateError::DirectoryUnavailable(_))));
    }

    #[tokio::test]
    async fn test_extractor_status_codes() {
        let fx = fixture();
        let user = seed(&fx.directory, "player", Role::User).await;
        let admin = seed(&fx.directory, "gm", Role::Admin).await;
        let user_token = fx.gate.codec().issue(&user.id, "player", Role::User).unwrap();
        let admin_token = fx.gate.codec().issue(&admin.id, "gm", Role::Admin).unwrap();
        let user_auth = format!("Bearer {user_token}");
        let admin_auth = format!("Bearer {admin_token}");

        let (status, body) = call(router(fx.gate.clone()), "/whoami", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, r#"{"error":"authorization header required"}"#);

        let (status, body) = call(router(fx.gate.clone()), "/whoami", Some("Bearer nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, r#"{"error":"invalid or expired token"}"#);

        let (status, body) = call(router(fx.gate.clone()), "/whoami", Some(&user_auth)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(&user.id));

        let (status, body) = call(router(fx.gate.clone()), "/maybe", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");

        let (status, _) = call(router(fx.gate.clone()), "/maybe", Some("Basic xyz")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(router(fx.gate.clone()), "/admin", Some(&user_auth)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, r#"{"error":"insufficient permissions"}"#);

        let (status, body) = call(router(fx.gate.clone()), "/admin", Some(&admin_auth)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, admin.id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_directory_timeout_yields_503() {
        let slow = Arc::new(
            InMemorySubjectDirectory::new().with_latency(StdDuration::from_secs(30)),
        );
        let directory = Arc::new(TimeoutDirectory::new(slow, StdDuration::from_secs(5)));
        let gate = AuthGate::new(Arc::new(test_codec()), directory);
        let token = gate.codec().issue("u1", "gm", Role::User).unwrap();

        let (status, body) =
            call(router(gate), "/whoami", Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, r#"{"error":"service temporarily unavailable"}"#);
    }
}
