//! 요청 범위의 검증된 신원.

use serde::{Deserialize, Serialize};

use super::{Role, Subject};

/// 인증 게이트를 통과한 호출자.
///
/// 요청 하나의 수명 동안만 존재하며 저장되거나 요청 간에 공유되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct VerifiedIdentity {
    pub subject_id: String,
    pub display_name: String,
    pub role: Role,
}

impl VerifiedIdentity {
    pub fn new(subject_id: impl Into<String>, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            subject_id: subject_id.into(),
            display_name: display_name.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// 주어진 소유자 식별자가 자신인지 확인.
    pub fn is_owner_of(&self, owner_id: &str) -> bool {
        self.subject_id == owner_id
    }
}

impl From<&Subject> for VerifiedIdentity {
    fn from(subject: &Subject) -> Self {
        Self::new(subject.id.clone(), subject.username.clone(), subject.role)
    }
}
