//! FATE Vault API 서버.
//!
//! 설정을 로드하고 저장소를 연결한 뒤 Axum 서버를 시작합니다.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use vault_api::auth::{CredentialStore, TokenCodec};
use vault_api::catalog::{InMemoryResourceCatalog, PgResourceCatalog, ResourceCatalog};
use vault_api::directory::{
    InMemorySubjectDirectory, PgSubjectDirectory, SubjectDirectory, TimeoutDirectory,
};
use vault_api::metrics::setup_metrics_recorder;
use vault_api::middleware::metrics_layer;
use vault_api::openapi::openapi_router;
use vault_api::routes::create_api_router;
use vault_api::state::AppState;
use vault_core::{init_logging, AppConfig, DatabaseConfig, LogConfig};

/// Prometheus 메트릭 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 저장소 연결.
///
/// `DATABASE_URL`이 없으면 인메모리 저장소로 대체합니다 (재시작 시 데이터 소실).
async fn connect_storage(
    database: &DatabaseConfig,
) -> anyhow::Result<(Arc<dyn SubjectDirectory>, Arc<dyn ResourceCatalog>)> {
    let Some(url) = database.url.as_deref().filter(|u| !u.is_empty()) else {
        warn!("DATABASE_URL not set, using in-memory storage (data is lost on restart)");
        return Ok((
            Arc::new(InMemorySubjectDirectory::new()),
            Arc::new(InMemoryResourceCatalog::new()),
        ));
    };

    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .acquire_timeout(Duration::from_secs(database.connection_timeout_secs))
        .connect(url)
        .await
        .context("failed to connect to PostgreSQL")?;
    info!(max_connections = database.max_connections, "Database pool created");

    let directory = PgSubjectDirectory::new(pool.clone());
    directory
        .migrate()
        .await
        .context("failed to prepare subjects table")?;
    let catalog = PgResourceCatalog::new(pool);
    catalog
        .migrate()
        .await
        .context("failed to prepare resources table")?;

    Ok((Arc::new(directory), Arc::new(catalog)))
}

/// 전체 라우터 생성.
fn create_router(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    request_timeout: Duration,
) -> Router {
    // 메트릭 라우터 (별도 상태)
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    Router::new()
        .merge(metrics_router)
        .merge(create_api_router().with_state(state))
        .merge(openapi_router())
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
}

/// OpenAPI 스펙 내보내기 처리.
///
/// `--export-openapi` 플래그 또는 `EXPORT_OPENAPI` 환경변수가 설정된 경우
/// OpenAPI JSON 스펙을 stdout으로 출력하고 `true`를 반환합니다.
fn handle_export_openapi() -> anyhow::Result<bool> {
    use utoipa::OpenApi as _;
    use vault_api::openapi::ApiDoc;

    let export_flag = std::env::args().any(|arg| arg == "--export-openapi");
    let export_env = std::env::var("EXPORT_OPENAPI")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    if export_flag || export_env {
        let json = serde_json::to_string_pretty(&ApiDoc::openapi())?;
        println!("{}", json);
        return Ok(true);
    }

    Ok(false)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    if handle_export_openapi()? {
        return Ok(());
    }

    let config = AppConfig::load_default().context("failed to load configuration")?;

    init_logging(LogConfig::from(&config.logging))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    info!("Starting FATE Vault API server...");

    let metrics_handle = setup_metrics_recorder().context("failed to install metrics recorder")?;
    info!("Prometheus metrics recorder initialized");

    let addr = config
        .server
        .socket_addr()
        .with_context(|| {
            format!(
                "invalid listen address {}:{} (check API_HOST, API_PORT)",
                config.server.host, config.server.port
            )
        })?;

    // 시크릿이 없으면 토큰을 발급/검증할 수 없으므로 시작하지 않음
    if !config.auth.has_secret() {
        anyhow::bail!("JWT_SECRET must be set to a non-empty value");
    }
    let codec = TokenCodec::new(&config.auth.jwt_secret).context("failed to build token codec")?;
    let credentials = CredentialStore::new(config.auth.password_cost)
        .context("invalid password hashing cost")?;
    info!(credentials = ?credentials, "Credential store ready");

    let (directory, catalog) = connect_storage(&config.database).await?;
    let backend = directory.backend_name();
    let directory: Arc<dyn SubjectDirectory> =
        Arc::new(TimeoutDirectory::new(directory, config.auth.directory_timeout()));
    info!(
        backend,
        timeout_ms = config.auth.directory_timeout_ms,
        "Subject directory ready"
    );

    let state = Arc::new(AppState::new(
        Arc::new(codec),
        Arc::new(credentials),
        directory,
        catalog,
    ));

    let app = create_router(
        state,
        metrics_handle,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    info!(%addr, "API server listening");
    info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
