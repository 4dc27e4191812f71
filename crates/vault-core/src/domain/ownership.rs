//! 리소스 소유권 태그.
//!
//! 캐릭터, 템플릿 등 보호 대상 리소스는 소유자 식별자와 공개 여부를 가집니다.

use serde::{Deserialize, Serialize};

use super::VerifiedIdentity;

/// 리소스 소유권 태그.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipTag {
    /// 소유 주체 식별자
    pub owner_id: String,
    /// 공개 목록 노출 여부
    #[serde(default)]
    pub published: bool,
}

impl OwnershipTag {
    pub fn new(owner_id: impl Into<String>, published: bool) -> Self {
        Self {
            owner_id: owner_id.into(),
            published,
        }
    }

    /// 목록 조회 시 요청자에게 보이는지 확인.
    ///
    /// 공개되었거나, 요청자가 소유자이거나, 관리자일 때만 보입니다.
    pub fn is_visible_to(&self, requester: Option<&VerifiedIdentity>) -> bool {
        if self.published {
            return true;
        }
        match requester {
            Some(identity) => identity.is_admin() || identity.is_owner_of(&self.owner_id),
            None => false,
        }
    }
}
