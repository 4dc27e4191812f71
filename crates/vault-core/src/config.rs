//! 설정 관리.
//!
//! 기본값 → `config/default.toml` → 환경 변수 순으로 덮어씁니다.
//!
//! # 환경 변수
//!
//! - `VAULT__<SECTION>__<KEY>`: 모든 키 (예: `VAULT__AUTH__DIRECTORY_TIMEOUT_MS=3000`)
//! - `JWT_SECRET`, `DATABASE_URL`, `API_HOST`, `API_PORT`, `LOG_FORMAT`: 기존 배포와의 호환용

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use crate::error::VaultResult;

/// 애플리케이션 설정.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 데이터베이스 설정
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 인증 설정
    #[serde(default)]
    pub auth: AuthConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 전체 타임아웃 (초)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ServerConfig {
    /// 소켓 주소 반환.
    ///
    /// # Errors
    /// `host:port` 형식이 유효하지 않으면 `AddrParseError`를 반환합니다.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

fn default_request_timeout() -> u64 {
    30
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// PostgreSQL 연결 문자열. 없으면 인메모리 디렉터리로 동작합니다.
    #[serde(default)]
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 획득 타임아웃 (초)
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connection_timeout_secs: 5,
        }
    }
}

/// 인증 설정.
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// HMAC 서명 비밀 키. 비어 있으면 토큰 코덱 생성이 실패합니다.
    #[serde(default = "empty_secret", deserialize_with = "deserialize_secret")]
    pub jwt_secret: SecretString,
    /// 주체 디렉터리 호출 제한 시간 (밀리초)
    #[serde(default = "default_directory_timeout_ms")]
    pub directory_timeout_ms: u64,
    /// 비밀번호 해싱 비용
    #[serde(default)]
    pub password_cost: PasswordCostConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: empty_secret(),
            directory_timeout_ms: default_directory_timeout_ms(),
            password_cost: PasswordCostConfig::default(),
        }
    }
}

impl AuthConfig {
    /// 서명 비밀 키가 설정되어 있는지 확인.
    pub fn has_secret(&self) -> bool {
        !self.jwt_secret.expose_secret().trim().is_empty()
    }

    pub fn directory_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.directory_timeout_ms)
    }
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new().into())
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(SecretString::new(raw.into()))
}

fn default_directory_timeout_ms() -> u64 {
    5_000
}

/// Argon2id 비용 파라미터.
///
/// 기본값은 argon2 크레이트 기본값(19 MiB, 2회, 병렬도 1)과 같습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PasswordCostConfig {
    /// 메모리 비용 (KiB)
    pub memory_kib: u32,
    /// 반복 횟수
    pub iterations: u32,
    /// 병렬도
    pub parallelism: u32,
}

impl Default for PasswordCostConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    fn base_builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError>
    {
        config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 10)?
            .set_default("database.connection_timeout_secs", 5)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")
    }

    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> VaultResult<Self> {
        let builder = Self::base_builder()?
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("VAULT")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("auth.jwt_secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("server.host", std::env::var("API_HOST").ok())?
            .set_override_option("server.port", std::env::var("API_PORT").ok())?
            .set_override_option("logging.format", std::env::var("LOG_FORMAT").ok())?;

        Ok(builder.build()?.try_deserialize()?)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> VaultResult<Self> {
        Self::load("config/default.toml")
    }

    /// TOML 문자열에서 설정을 로드합니다. 환경 변수는 반영하지 않습니다.
    pub fn from_toml_str(toml: &str) -> VaultResult<Self> {
        let config = Self::base_builder()?
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}
