//! Prometheus 메트릭.
//!
//! HTTP 요청 메트릭과 인증 관련 카운터를 수집하고 `/metrics`로 노출합니다.
//! 라벨에는 주체 식별자나 사용자 이름을 넣지 않습니다.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Prometheus 레코더를 설치하고 렌더링 핸들을 반환합니다.
///
/// # Errors
/// 레코더가 이미 설치되어 있으면 에러를 반환합니다.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )?
        .install_recorder()
}

// ============================================================================
// HTTP 메트릭
// ============================================================================

pub fn record_http_request(method: &str, path: &str) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string())
        .increment(1);
}

pub fn record_http_response(method: &str, path: &str, status: u16) {
    counter!(
        "http_responses_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_http_duration(method: &str, path: &str, duration_secs: f64) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

// ============================================================================
// 인증 메트릭
// ============================================================================

/// 인증 게이트/교환 결과 카운터.
///
/// `outcome` 예: `ok`, `missing_header`, `malformed_header`, `invalid_token`,
/// `subject_not_found`, `directory_unavailable`, `bad_credentials`.
pub fn record_auth_outcome(stage: &'static str, outcome: &'static str) {
    counter!("vault_auth_attempts_total", "stage" => stage, "outcome" => outcome).increment(1);
}

/// 토큰 발급 카운터. `via`는 `header_renewal`, `body_renewal`, `password`.
pub fn record_token_issued(via: &'static str) {
    counter!("vault_tokens_issued_total", "via" => via).increment(1);
}

pub fn record_directory_timeout(operation: &'static str) {
    counter!("vault_directory_timeouts_total", "operation" => operation).increment(1);
}

// ============================================================================
// 경로 정규화
// ============================================================================

/// 라우트 템플릿을 알 수 없을 때 경로의 동적 세그먼트를 `:id`로 바꿉니다.
///
/// 예: `/users/update/123e4567-e89b-12d3-a456-426614174000` → `/users/update/:id`
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            let is_uuid = segment.len() == 36 && segment.chars().filter(|c| *c == '-').count() == 4;
            let is_numeric = !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit());
            let is_object_id =
                segment.len() == 24 && segment.chars().all(|c| c.is_ascii_hexdigit());

            if is_uuid || is_numeric || is_object_id {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
