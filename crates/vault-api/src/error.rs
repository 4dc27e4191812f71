//! API 에러 응답 타입.
//!
//! 모든 실패 응답은 `{ "error": "<message>" }` 형식입니다.
//! 5xx 에러의 상세 내용은 로그에만 남기고 응답 본문에는 일반 문구만 담습니다.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{Forbidden, GateError, JwtError, PasswordError};
use crate::catalog::CatalogError;
use crate::directory::DirectoryError;

/// 에러 응답 본문.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// 사람이 읽을 수 있는 에러 메시지
    pub error: String,
}

/// 요청 경계의 에러 분류.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 401
    #[error("{0}")]
    Unauthenticated(String),
    /// 403
    #[error("{0}")]
    Forbidden(String),
    /// 409
    #[error("{0}")]
    Conflict(String),
    /// 400
    #[error("{0}")]
    InvalidInput(String),
    /// 404
    #[error("{0}")]
    NotFoundResource(String),
    /// 503. 필드는 로그용 상세 내용
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// 500. 필드는 로그용 상세 내용
    #[error("hashing failure: {0}")]
    HashingFailure(String),
    /// 500. 필드는 로그용 상세 내용
    #[error("internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFoundResource(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::HashingFailure(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 호출자에게 보낼 메시지.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Unauthenticated(m)
            | ApiError::Forbidden(m)
            | ApiError::Conflict(m)
            | ApiError::InvalidInput(m)
            | ApiError::NotFoundResource(m) => m.clone(),
            ApiError::ServiceUnavailable(_) => "service temporarily unavailable".to_string(),
            ApiError::HashingFailure(_) => "failed to process credentials".to_string(),
            ApiError::Internal(_) => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        }
        let body = ErrorBody {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::DirectoryUnavailable(detail) => ApiError::ServiceUnavailable(detail),
            other => ApiError::Unauthenticated(other.to_string()),
        }
    }
}

impl From<Forbidden> for ApiError {
    fn from(err: Forbidden) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound => ApiError::NotFoundResource("user not found".to_string()),
            DirectoryError::Conflict(_) => {
                ApiError::Conflict("username already exists".to_string())
            }
            DirectoryError::Unavailable(detail) => ApiError::ServiceUnavailable(detail),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::HashingFailure(err.to_string())
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::ServiceUnavailable(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}
