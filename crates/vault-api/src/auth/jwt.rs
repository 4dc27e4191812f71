//! 세션 토큰 발급/검증 (Token Codec).
//!
//! HS256 서명 JWT를 사용하며 수명은 발급 시점부터 7일입니다.
//! 서명 키는 생성 시 한 번 주입되고 이후 변경되지 않습니다.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use vault_core::Role;

/// 토큰 수명 (일).
pub const TOKEN_LIFETIME_DAYS: i64 = 7;

/// JWT 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 주체 식별자
    pub sub: String,
    /// 표시 이름
    pub username: String,
    pub role: Role,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// 같은 초에 발급된 토큰도 서로 다르도록 하는 무작위 식별자
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    /// `now` 기준으로 7일짜리 Claims 생성.
    pub fn new(
        subject_id: impl Into<String>,
        username: impl Into<String>,
        role: Role,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: subject_id.into(),
            username: username.into(),
            role,
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp(),
            jti: Some(uuid::Uuid::new_v4().to_string()),
        }
    }

    /// `now`가 만료 시각 이상이면 만료입니다. 유예 시간은 없습니다.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// 토큰 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT 서명 키가 설정되지 않았습니다")]
    MissingSecret,
    #[error("토큰 형식이 잘못되었습니다")]
    MalformedToken,
    #[error("토큰 서명이 유효하지 않습니다")]
    InvalidSignature,
    #[error("토큰이 만료되었습니다")]
    Expired,
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
}

impl JwtError {
    /// 로그용 짧은 분류 이름.
    pub fn kind(&self) -> &'static str {
        match self {
            JwtError::MissingSecret => "missing_secret",
            JwtError::MalformedToken => "malformed",
            JwtError::InvalidSignature => "invalid_signature",
            JwtError::Expired => "expired",
            JwtError::Encoding(_) => "encoding",
        }
    }
}

/// HS256 토큰 코덱.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// 서명 키로 코덱을 생성합니다.
    ///
    /// # Errors
    /// 키가 비어 있거나 공백뿐이면 `MissingSecret`. 시작 시점에 한 번만 발생해야 합니다.
    pub fn new(secret: &SecretString) -> Result<Self, JwtError> {
        let raw = secret.expose_secret();
        if raw.trim().is_empty() {
            return Err(JwtError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // 만료는 verify_at에서 직접 검사 (주입된 시각, 유예 0)
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(raw.as_bytes()),
            decoding: DecodingKey::from_secret(raw.as_bytes()),
            validation,
        })
    }

    /// 현재 시각 기준으로 토큰을 발급합니다.
    pub fn issue(&self, subject_id: &str, username: &str, role: Role) -> Result<String, JwtError> {
        self.issue_at(subject_id, username, role, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject_id: &str,
        username: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let claims = Claims::new(subject_id, username, role, now);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(JwtError::Encoding)
    }

    /// 현재 시각 기준으로 토큰을 검증합니다.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify_at(token, Utc::now())
    }

    /// 주어진 시각 기준으로 토큰을 검증합니다.
    ///
    /// 알고리즘 검사가 서명 검사보다 먼저 수행되므로 `none`이나 다른 알고리즘의
    /// 토큰은 서명과 무관하게 `MalformedToken`입니다.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::MalformedToken,
            }
        })?;

        if data.claims.is_expired_at(now) {
            return Err(JwtError::Expired);
        }
        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &"HS256")
            .field("lifetime_days", &TOKEN_LIFETIME_DAYS)
            .finish_non_exhaustive()
    }
}

/// 테스트용 서명 키.
#[cfg(any(test, feature = "test-utils"))]
pub const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

/// 테스트용 코덱.
#[cfg(any(test, feature = "test-utils"))]
pub fn test_codec() -> TokenCodec {
    match TokenCodec::new(&SecretString::new(TEST_SECRET.into())) {
        Ok(codec) => codec,
        Err(e) => panic!("test codec: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    fn codec_with(secret: &str) -> Result<TokenCodec, JwtError> {
        TokenCodec::new(&SecretString::new(secret.into()))
    }

    /// 헤더만 바꾼 토큰 (페이로드/서명은 원본 유지).
    fn with_header(token: &str, header_json: &str) -> String {
        let mut parts = token.splitn(3, '.');
        let _ = parts.next();
        let payload = parts.next().unwrap();
        let signature = parts.next().unwrap();
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            payload,
            signature
        )
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = test_codec();
        let token = codec.issue("u1", "fate-master", Role::Admin).unwrap();

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.username, "fate-master");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, TOKEN_LIFETIME_DAYS * 24 * 60 * 60);
        assert!(claims.jti.is_some());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(codec_with(""), Err(JwtError::MissingSecret)));
        assert!(matches!(codec_with("   \t"), Err(JwtError::MissingSecret)));
    }

    #[test]
    fn test_tokens_in_same_second_differ() {
        let codec = test_codec();
        let now = Utc::now();
        let first = codec.issue_at("u1", "gm", Role::User, now).unwrap();
        let second = codec.issue_at("u1", "gm", Role::User, now).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = test_codec();
        let issued = Utc::now();
        let token = codec.issue_at("u1", "gm", Role::User, issued).unwrap();
        let claims = codec.verify_at(&token, issued).unwrap();
        let iat = DateTime::from_timestamp(claims.iat, 0).unwrap();

        let just_before = iat + Duration::days(TOKEN_LIFETIME_DAYS) - Duration::seconds(1);
        assert!(codec.verify_at(&token, just_before).is_ok());

        let at_expiry = iat + Duration::days(TOKEN_LIFETIME_DAYS);
        assert!(matches!(
            codec.verify_at(&token, at_expiry),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_expired_token_via_wall_clock() {
        let codec = test_codec();
        let long_ago = Utc::now() - Duration::days(8);
        let token = codec.issue_at("u1", "gm", Role::User, long_ago).unwrap();
        assert!(matches!(codec.verify(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let codec = test_codec();
        let token = codec.issue("u1", "gm", Role::User).unwrap();

        let other = codec_with("another-secret-key-for-testing-minimum-32-chars").unwrap();
        assert!(matches!(
            other.verify(&token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_tampered_payload_is_invalid_signature() {
        let codec = test_codec();
        let token = codec.issue("u1", "gm", Role::User).unwrap();
        let admin_token = codec.issue("u1", "gm", Role::Admin).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let admin_parts: Vec<&str> = admin_token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], admin_parts[1], parts[2]);

        assert!(matches!(
            codec.verify(&forged),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_algorithm_none_is_malformed() {
        let codec = test_codec();
        let token = codec.issue("u1", "gm", Role::Admin).unwrap();
        let forged = with_header(&token, r#"{"alg":"none","typ":"JWT"}"#);

        assert!(matches!(
            codec.verify(&forged),
            Err(JwtError::MalformedToken)
        ));
    }

    #[test]
    fn test_other_algorithm_is_malformed() {
        let codec = test_codec();
        let token = codec.issue("u1", "gm", Role::Admin).unwrap();

        for alg in ["RS256", "HS512", "ES256"] {
            let forged = with_header(&token, &format!(r#"{{"alg":"{alg}","typ":"JWT"}}"#));
            assert!(
                matches!(codec.verify(&forged), Err(JwtError::MalformedToken)),
                "alg {alg} should be rejected as malformed"
            );
        }
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = test_codec();
        for token in ["", "invalid.token.here", "a.b", "not-a-jwt"] {
            assert!(
                matches!(codec.verify(token), Err(JwtError::MalformedToken)),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_unknown_role_in_claims_is_malformed() {
        #[derive(Serialize)]
        struct RawClaims<'a> {
            sub: &'a str,
            username: &'a str,
            role: &'a str,
            iat: i64,
            exp: i64,
        }

        let now = Utc::now();
        let raw = RawClaims {
            sub: "u1",
            username: "gm",
            role: "superuser",
            iat: now.timestamp(),
            exp: (now + Duration::days(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &raw,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            test_codec().verify(&token),
            Err(JwtError::MalformedToken)
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let debug = format!("{:?}", test_codec());
        assert!(!debug.contains(TEST_SECRET));
    }
}
