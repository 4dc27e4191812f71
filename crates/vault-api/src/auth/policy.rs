//! 인가 정책 (Authorization Policies).
//!
//! 검증된 신원에 대한 역할/소유권 검사와, 목록 조회에 쓰이는 가시성 필터를 제공합니다.
//! 정책 실패는 항상 같은 메시지의 [`Forbidden`]입니다.

use vault_core::{OwnershipTag, Role, VerifiedIdentity};

/// 권한 부족.
///
/// 어떤 검사가 실패했는지 호출자에게 드러내지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("insufficient permissions")]
pub struct Forbidden;

/// 신원의 역할이 요구 역할과 정확히 같은지 확인합니다.
pub fn require_role(identity: &VerifiedIdentity, role: Role) -> Result<(), Forbidden> {
    if identity.role == role {
        Ok(())
    } else {
        Err(Forbidden)
    }
}

/// 리소스 소유자 본인이거나 요구 역할을 가졌는지 확인합니다.
pub fn require_self_or_role(
    identity: &VerifiedIdentity,
    owner_id: &str,
    role: Role,
) -> Result<(), Forbidden> {
    if identity.is_owner_of(owner_id) {
        return Ok(());
    }
    require_role(identity, role)
}

/// 목록 조회 가시성 필터.
///
/// 카탈로그 구현이 자신의 질의에 직접 반영합니다 (SQL `WHERE`, 인메모리 술어).
/// 이미 가져온 결과를 사후에 거르는 용도가 아닙니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityFilter {
    /// 관리자: 제한 없음
    Unrestricted,
    /// 익명: 공개된 것만
    PublishedOnly,
    /// 일반 사용자: 공개되었거나 자신이 소유한 것
    PublishedOrOwnedBy(String),
}

impl VisibilityFilter {
    pub fn for_identity(identity: Option<&VerifiedIdentity>) -> Self {
        match identity {
            Some(identity) if identity.is_admin() => VisibilityFilter::Unrestricted,
            Some(identity) => VisibilityFilter::PublishedOrOwnedBy(identity.subject_id.clone()),
            None => VisibilityFilter::PublishedOnly,
        }
    }

    pub fn permits(&self, tag: &OwnershipTag) -> bool {
        match self {
            VisibilityFilter::Unrestricted => true,
            VisibilityFilter::PublishedOnly => tag.published,
            VisibilityFilter::PublishedOrOwnedBy(owner) => tag.published || &tag.owner_id == owner,
        }
    }
}
