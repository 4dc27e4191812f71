//! 주체(Subject) 역할.
//!
//! 역할은 `admin`, `user` 두 가지로 닫혀 있으며, 경계에서 파싱됩니다.

use serde::{Deserialize, Serialize};

use crate::error::VaultError;

/// 사용자 역할.
///
/// 저장소와 토큰에는 소문자 문자열(`"admin"`, `"user"`)로 기록됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 관리자 - 모든 리소스에 대한 권한 보유
    Admin,
    /// 일반 사용자 - 자신이 소유한 리소스만 관리
    #[default]
    User,
}

impl Role {
    /// 문자열에서 역할 파싱.
    ///
    /// 정확히 `admin` 또는 `user`만 허용합니다. 공백이나 대소문자 차이도 `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    /// 선택적 입력에서 역할 결정.
    ///
    /// 값이 없거나 빈 문자열이면 기본 역할(`User`)을 사용합니다.
    pub fn from_input(input: Option<&str>) -> Result<Self, VaultError> {
        match input {
            None | Some("") => Ok(Role::default()),
            Some(raw) => raw.parse(),
        }
    }

    /// 저장/직렬화에 사용되는 문자열 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::str::FromStr for Role {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| VaultError::InvalidRole(s.to_string()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
