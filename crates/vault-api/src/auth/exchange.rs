//! 자격 증명 교환 흐름 (Credential Exchange Flow).
//!
//! - 로그인/토큰 갱신 (`POST /users/auth`)
//! - 가입 (`POST /users/register`)
//! - 주체 정보 수정 (`POST /users/update/{id}`)
//!
//! 사용자 이름이 없을 때와 비밀번호가 틀렸을 때 응답은 구분되지 않습니다.

use std::sync::Arc;

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use vault_core::{Role, Subject, SubjectPatch, SubjectProfile, VerifiedIdentity};

use super::middleware::{AuthGate, GateError};
use super::password::CredentialStore;
use super::policy::{require_self_or_role, Forbidden};
use crate::directory::DirectoryError;
use crate::error::{ApiError, ApiResult};
use crate::metrics::{record_auth_outcome, record_token_issued};

const INVALID_CREDENTIALS: &str = "invalid username or password";
const INVALID_ROLE: &str = "role must be either 'admin' or 'user'";

/// `POST /users/auth` 요청 본문.
///
/// 모든 필드는 선택이며 빈 문자열은 없는 것으로 취급합니다.
#[derive(Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct AuthRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    /// 갱신할 기존 토큰
    pub token: Option<String>,
}

impl AuthRequest {
    /// 원시 본문을 파싱합니다. 공백뿐인 본문은 빈 요청입니다.
    pub fn from_body(body: &[u8]) -> ApiResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| {
            tracing::debug!(error = %e, "Rejected auth request body");
            ApiError::invalid_input("invalid request body")
        })
    }
}

impl std::fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRequest")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// `POST /users/register` 요청 본문.
#[derive(Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// `admin` 또는 `user`. 생략 시 `user`
    pub role: Option<String>,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// `POST /users/update/{id}` 요청 본문.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateSubjectRequest {
    pub username: Option<String>,
    pub profile_picture: Option<String>,
    pub role: Option<String>,
}

/// 로그인/갱신 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: SubjectProfile,
    pub token: String,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// 자격 증명 교환 서비스.
#[derive(Clone)]
pub struct CredentialExchange {
    gate: AuthGate,
    credentials: Arc<CredentialStore>,
}

impl CredentialExchange {
    pub fn new(gate: AuthGate, credentials: Arc<CredentialStore>) -> Self {
        Self { gate, credentials }
    }

    fn grant(&self, subject: Subject, via: &'static str) -> ApiResult<AuthResponse> {
        let token = self
            .gate
            .codec()
            .issue(&subject.id, &subject.username, subject.role)?;
        record_auth_outcome("exchange", "ok");
        record_token_issued(via);
        tracing::info!(subject_id = %subject.id, via, "Session token issued");
        Ok(AuthResponse {
            user: subject.profile(),
            token,
        })
    }

    /// 토큰을 발급합니다.
    ///
    /// 순서: 헤더 토큰 갱신 → 본문 토큰 갱신 → 사용자 이름/비밀번호.
    /// 헤더 갱신 실패는 조용히 다음 단계로 넘어가지만 디렉터리 장애는 즉시 503입니다.
    /// 본문은 헤더 갱신이 실패한 뒤에만 파싱합니다.
    pub async fn exchange(
        &self,
        header: Option<&HeaderValue>,
        body: &[u8],
    ) -> ApiResult<AuthResponse> {
        if header.is_some() {
            match self.gate.resolve(header).await {
                Ok(subject) => return self.grant(subject, "header_renewal"),
                Err(GateError::DirectoryUnavailable(detail)) => {
                    record_auth_outcome("exchange", "directory_unavailable");
                    return Err(ApiError::ServiceUnavailable(detail));
                }
                Err(reason) => {
                    tracing::debug!(%reason, "Header renewal skipped, falling back to body");
                }
            }
        }

        let request = AuthRequest::from_body(body)?;

        if let Some(token) = present(request.token) {
            return match self.gate.resolve_token(&token).await {
                Ok(subject) => self.grant(subject, "body_renewal"),
                Err(e) => {
                    record_auth_outcome("exchange", "invalid_token");
                    Err(e.into())
                }
            };
        }

        let (Some(username), Some(password)) = (present(request.username), present(request.password))
        else {
            return Err(ApiError::invalid_input(
                "either token or username/password is required",
            ));
        };

        let subject = match self.gate.directory().find_by_username(&username).await {
            Ok(subject) => Some(subject),
            Err(DirectoryError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        let matched = self
            .credentials
            .clone()
            .check_blocking(subject.clone(), password)
            .await?;

        match (matched, subject) {
            (true, Some(subject)) => self.grant(subject, "password"),
            _ => {
                record_auth_outcome("exchange", "bad_credentials");
                tracing::info!("Password authentication failed");
                Err(ApiError::unauthenticated(INVALID_CREDENTIALS))
            }
        }
    }

    /// 새 주체를 등록하고 공개 프로필을 반환합니다.
    pub async fn register(&self, request: RegisterRequest) -> ApiResult<SubjectProfile> {
        if request.username.is_empty() || request.password.is_empty() {
            return Err(ApiError::invalid_input("username and password are required"));
        }

        let directory = self.gate.directory();
        match directory.find_by_username(&request.username).await {
            Ok(_) => return Err(ApiError::Conflict("username already exists".to_string())),
            Err(DirectoryError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let role = Role::from_input(request.role.as_deref())
            .map_err(|_| ApiError::invalid_input(INVALID_ROLE))?;

        let subject = self
            .credentials
            .clone()
            .set_password_blocking(Subject::new(request.username, role), request.password)
            .await?;
        let stored = directory.insert(subject).await?;

        tracing::info!(subject_id = %stored.id, role = %stored.role, "Subject registered");
        Ok(stored.profile())
    }

    /// 주체 정보를 수정합니다.
    ///
    /// 본인 또는 관리자만 가능하며, 역할 변경은 관리자만 가능합니다.
    pub async fn update_subject(
        &self,
        identity: &VerifiedIdentity,
        id: &str,
        request: UpdateSubjectRequest,
    ) -> ApiResult<SubjectProfile> {
        require_self_or_role(identity, id, Role::Admin)?;

        let requested_role = present(request.role);
        if requested_role.is_some() && !identity.is_admin() {
            return Err(Forbidden.into());
        }

        let directory = self.gate.directory();
        let mut patch = SubjectPatch::default();

        if let Some(username) = present(request.username) {
            match directory.find_by_username(&username).await {
                Ok(existing) if existing.id != id => {
                    return Err(ApiError::Conflict("username already exists".to_string()));
                }
                Ok(_) | Err(DirectoryError::NotFound) => {}
                Err(e) => return Err(e.into()),
            }
            patch.username = Some(username);
        }

        patch.profile_picture = present(request.profile_picture);

        if let Some(raw) = requested_role {
            let role = Role::parse(&raw).ok_or_else(|| ApiError::invalid_input(INVALID_ROLE))?;
            patch.role = Some(role);
        }

        if patch.is_empty() {
            return Err(ApiError::invalid_input("no fields to update"));
        }

        let updated = directory.update_fields(id, &patch).await?;
        tracing::info!(
            subject_id = %updated.id,
            actor = %identity.subject_id,
            role_changed = patch.role.is_some(),
            "Subject updated"
        );
        Ok(updated.profile())
    }
}

impl std::fmt::Debug for CredentialExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialExchange")
            .field("gate", &self.gate)
            .field("credentials", &self.credentials)
            .finish()
    }
}
