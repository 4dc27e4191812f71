//! 도메인 에러 타입.
//!
//! HTTP 계층과 무관한 도메인 수준의 실패를 정의합니다.
//! 요청 경계의 에러 분류(401/403/...)는 `vault-api`의 `ApiError`가 담당합니다.

use thiserror::Error;

/// 핵심 도메인 에러.
#[derive(Debug, Error)]
pub enum VaultError {
    /// 허용되지 않는 역할 문자열
    #[error("알 수 없는 역할: {0}")]
    InvalidRole(String),

    /// 설정 로드/역직렬화 실패
    #[error("설정 에러: {0}")]
    Config(String),
}

/// 도메인 작업을 위한 Result 타입.
pub type VaultResult<T> = Result<T, VaultError>;

impl From<config::ConfigError> for VaultError {
    fn from(err: config::ConfigError) -> Self {
        VaultError::Config(err.to_string())
    }
}
