//! 인증 및 권한 부여.
//!
//! 비밀번호 해시, 세션 토큰, 인증 게이트, 인가 정책, 자격 증명 교환을 제공합니다.
//!
//! # 구성 요소
//!
//! - [`CredentialStore`]: Argon2id 비밀번호 해시 저장/검증
//! - [`TokenCodec`]: HS256 세션 토큰 발급/검증
//! - [`AuthGate`]: 헤더 → 검증된 신원 ([`Authenticated`], [`OptionalAuthenticated`], [`AdminAuth`])
//! - [`require_role`], [`require_self_or_role`], [`VisibilityFilter`]: 인가 정책
//! - [`CredentialExchange`]: 로그인/갱신/가입/정보 수정 흐름
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn protected_handler(Authenticated(identity): Authenticated) -> impl IntoResponse {
//!     format!("Hello, {}!", identity.display_name)
//! }
//! ```

mod exchange;
mod jwt;
mod middleware;
mod password;
mod policy;

pub use exchange::{
    AuthRequest, AuthResponse, CredentialExchange, RegisterRequest, UpdateSubjectRequest,
};
pub use jwt::{Claims, JwtError, TokenCodec, TOKEN_LIFETIME_DAYS};
pub use middleware::{
    bearer_token, AdminAuth, AuthGate, Authenticated, GateError, OptionalAuthenticated,
};
pub use password::{CredentialStore, PasswordError};
pub use policy::{require_role, require_self_or_role, Forbidden, VisibilityFilter};

#[cfg(any(test, feature = "test-utils"))]
pub use jwt::{test_codec, TEST_SECRET};
#[cfg(any(test, feature = "test-utils"))]
pub use password::test_store;
