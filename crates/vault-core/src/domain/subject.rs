//! 인증 가능한 주체(사용자 계정) 모델.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

/// 주체 레코드.
///
/// `password_hash`가 비어 있으면 비밀번호로 인증할 수 없는 계정입니다.
/// 해시는 직렬화되지 않으므로 응답 본문이나 로그로 새어나가지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// 불변 식별자
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// 표시 이름 (고유)
    pub username: String,
    /// PHC 형식 비밀번호 해시
    #[serde(rename = "hashedPassword", default, skip_serializing)]
    pub password_hash: String,
    /// 프로필 이미지 (object store 키 또는 URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Subject {
    /// 아직 저장되지 않은 새 주체 생성.
    ///
    /// 식별자는 디렉터리가 삽입 시 부여합니다.
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            id: String::new(),
            username: username.into(),
            password_hash: String::new(),
            profile_picture: None,
            role,
            created_at: None,
            updated_at: None,
        }
    }

    /// 비밀번호 인증이 가능한 계정인지 확인.
    pub fn has_password(&self) -> bool {
        !self.password_hash.is_empty()
    }

    /// 비밀번호 해시가 제거된 공개 프로필.
    pub fn profile(&self) -> SubjectProfile {
        SubjectProfile::from(self.clone())
    }

    /// 패치의 값이 있는 필드만 반영합니다.
    pub fn apply(&mut self, patch: &SubjectPatch, now: DateTime<Utc>) {
        if let Some(username) = &patch.username {
            self.username = username.clone();
        }
        if let Some(picture) = &patch.profile_picture {
            self.profile_picture = Some(picture.clone());
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        self.updated_at = Some(now);
    }
}

/// 호출자에게 반환되는 주체 정보.
///
/// 비밀번호 해시 필드 자체가 없으므로 평문/해시 노출이 불가능합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SubjectProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Subject> for SubjectProfile {
    fn from(subject: Subject) -> Self {
        Self {
            id: subject.id,
            username: subject.username,
            profile_picture: subject.profile_picture,
            role: subject.role,
            created_at: subject.created_at,
            updated_at: subject.updated_at,
        }
    }
}

/// `UpdateFields`로 변경 가능한 필드 모음.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectPatch {
    pub username: Option<String>,
    pub profile_picture: Option<String>,
    pub role: Option<Role>,
}

impl SubjectPatch {
    /// 변경할 필드가 하나도 없는지 확인.
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.profile_picture.is_none() && self.role.is_none()
    }
}
