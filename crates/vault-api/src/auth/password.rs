//! 비밀번호 해싱 (Credential Store).
//!
//! Argon2id + 무작위 솔트로 해싱하고, 저장된 PHC 문자열에 기록된 파라미터로 검증합니다.
//! 해싱/검증은 CPU를 많이 쓰므로 비동기 코드에서는 `*_blocking` 메서드를 사용합니다.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use vault_core::{PasswordCostConfig, Subject};

/// 비밀번호 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패: {0}")]
    HashingFailed(String),
    #[error("잘못된 해싱 비용 설정: {0}")]
    InvalidCost(String),
}

/// 비밀번호 해시 저장/검증기.
///
/// 생성 이후 읽기 전용이므로 `Arc`로 요청 간에 공유합니다.
pub struct CredentialStore {
    argon2: Argon2<'static>,
    /// 존재하지 않는 사용자 이름에 대해 검증 비용을 맞추기 위한 해시
    decoy_hash: String,
}

impl CredentialStore {
    /// 주어진 비용으로 저장소를 생성합니다.
    ///
    /// # Errors
    /// 비용 파라미터가 Argon2 허용 범위를 벗어나면 `InvalidCost`.
    pub fn new(cost: PasswordCostConfig) -> Result<Self, PasswordError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| PasswordError::InvalidCost(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let decoy_hash = hash_with(&argon2, "fate-vault-decoy")?;

        Ok(Self { argon2, decoy_hash })
    }

    /// 평문을 해싱하여 PHC 형식 문자열을 반환합니다.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        hash_with(&self.argon2, plaintext)
    }

    /// 평문이 저장된 해시와 일치하는지 확인합니다.
    ///
    /// 빈 해시, 형식이 잘못된 해시, 불일치는 모두 `false`입니다.
    pub fn verify(&self, plaintext: &str, stored_hash: &str) -> bool {
        if stored_hash.is_empty() {
            return false;
        }
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            tracing::warn!("Stored password hash is not a valid PHC string");
            return false;
        };
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// 주체의 비밀번호를 새 해시로 교체합니다.
    pub fn set_password(&self, subject: &mut Subject, plaintext: &str) -> Result<(), PasswordError> {
        subject.password_hash = self.hash(plaintext)?;
        Ok(())
    }

    pub fn check_password(&self, subject: &Subject, plaintext: &str) -> bool {
        subject.has_password() && self.verify(plaintext, &subject.password_hash)
    }

    /// 결과를 버리는 검증을 한 번 수행합니다.
    ///
    /// 알 수 없는 사용자 이름에 대한 응답 시간이 잘못된 비밀번호와 비슷해지도록 합니다.
    pub fn burn_verification(&self, plaintext: &str) {
        let _ = self.verify(plaintext, &self.decoy_hash);
    }

    /// [`set_password`](Self::set_password)를 블로킹 스레드 풀에서 실행합니다.
    pub async fn set_password_blocking(
        self: Arc<Self>,
        mut subject: Subject,
        plaintext: String,
    ) -> Result<Subject, PasswordError> {
        tokio::task::spawn_blocking(move || {
            self.set_password(&mut subject, &plaintext)?;
            Ok(subject)
        })
        .await
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?
    }

    /// [`check_password`](Self::check_password)를 블로킹 스레드 풀에서 실행합니다.
    ///
    /// 주체가 없으면 decoy 검증을 수행하고 `false`를 반환합니다.
    pub async fn check_blocking(
        self: Arc<Self>,
        subject: Option<Subject>,
        plaintext: String,
    ) -> Result<bool, PasswordError> {
        tokio::task::spawn_blocking(move || match subject {
            Some(subject) => self.check_password(&subject, &plaintext),
            None => {
                self.burn_verification(&plaintext);
                false
            }
        })
        .await
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params = self.argon2.params();
        f.debug_struct("CredentialStore")
            .field("memory_kib", &params.m_cost())
            .field("iterations", &params.t_cost())
            .field("parallelism", &params.p_cost())
            .finish_non_exhaustive()
    }
}

fn hash_with(argon2: &Argon2<'_>, plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
}

/// 테스트용 저비용 저장소.
#[cfg(any(test, feature = "test-utils"))]
pub fn test_store() -> CredentialStore {
    let cost = PasswordCostConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    };
    match CredentialStore::new(cost) {
        Ok(store) => store,
        Err(e) => panic!("test credential store: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use vault_core::Role;

    #[test]
    fn test_hash_and_verify() {
        let store = test_store();
        let hash = store.hash("TestPassword123!").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("m=1024,t=1,p=1"));
        assert!(store.verify("TestPassword123!", &hash));
        assert!(!store.verify("WrongPassword123!", &hash));
    }

    #[test]
    fn test_same_password_different_salts() {
        let store = test_store();
        let first = store.hash("Password1").unwrap();
        let second = store.hash("Password1").unwrap();

        assert_ne!(first, second);
        assert!(store.verify("Password1", &first));
        assert!(store.verify("Password1", &second));
    }

    #[test]
    fn test_empty_and_malformed_hash_never_verify() {
        let store = test_store();
        assert!(!store.verify("anything", ""));
        assert!(!store.verify("", ""));
        assert!(!store.verify("password", "not-a-valid-hash"));
        assert!(!store.verify("password", "$argon2id$v=19$garbage"));
    }

    #[test]
    fn test_verification_uses_encoded_parameters() {
        let cheap = test_store();
        let other = CredentialStore::new(PasswordCostConfig {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();

        let hash = other.hash("cross-cost").unwrap();
        assert!(cheap.verify("cross-cost", &hash));
    }

    #[test]
    fn test_set_and_check_password_on_subject() {
        let store = test_store();
        let mut subject = Subject::new("aspect-hunter", Role::User);

        assert!(!store.check_password(&subject, ""));

        store.set_password(&mut subject, "한글패스워드123").unwrap();
        assert!(subject.has_password());
        assert!(store.check_password(&subject, "한글패스워드123"));
        assert!(!store.check_password(&subject, "한글패스워드124"));
    }

    #[test]
    fn test_invalid_cost_rejected() {
        let result = CredentialStore::new(PasswordCostConfig {
            memory_kib: 1024,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(PasswordError::InvalidCost(_))));
    }

    #[test]
    fn test_debug_does_not_leak_decoy() {
        let store = test_store();
        let debug = format!("{:?}", store);
        assert!(debug.contains("memory_kib"));
        assert!(!debug.contains("argon2id"));
    }

    #[tokio::test]
    async fn test_blocking_helpers() {
        let store = Arc::new(test_store());
        let subject = store
            .clone()
            .set_password_blocking(Subject::new("gm", Role::Admin), "fate".to_string())
            .await
            .unwrap();
        assert!(subject.has_password());

        assert!(store
            .clone()
            .check_blocking(Some(subject.clone()), "fate".to_string())
            .await
            .unwrap());
        assert!(!store
            .clone()
            .check_blocking(Some(subject), "core".to_string())
            .await
            .unwrap());
        assert!(!store.check_blocking(None, "fate".to_string()).await.unwrap());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_hash_verifies_only_its_plaintext(password in "[a-zA-Z0-9!@#]{1,24}") {
            let store = test_store();
            let hash = store.hash(&password).unwrap();
            prop_assert!(store.verify(&password, &hash));

            let wrong = format!("{password}x");
            prop_assert!(!store.verify(&wrong, &hash));
        }
    }
}
