//! # Vault Core
//!
//! FATE Vault 신원/접근 제어 계층의 핵심 타입을 제공합니다:
//! - 주체(Subject), 역할, 검증된 신원, 리소스 소유권 태그
//! - 설정 관리
//! - 로깅 인프라
//!
//! HTTP, 저장소, 암호화 구현은 `vault-api` 크레이트에 있습니다.

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::{init_logging, LogConfig, LogFormat};
