//! taskhub is a small task and account registration API.

#![forbid(unsafe_code)]
pub mod crypto;
pub mod database;
pub mod error;
mod router;
pub mod task;
pub mod telemetry;
pub mod user;

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::{get, post};
use axum::{Router, middleware as AxumMiddleware};
use error::ServerError;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

use crate::crypto::PasswordManager;
use crate::task::{PgTaskStore, TaskStore};
use crate::user::{AccountStore, PgAccountStore, Registrar};

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub accounts: Arc<dyn AccountStore>,
    pub tasks: Arc<dyn TaskStore>,
    pwd: Arc<PasswordManager>,
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Registration workflow bound to this state's store and hasher.
    pub fn registrar(&self) -> Registrar {
        Registrar::new(
            Arc::clone(&self.accounts),
            Arc::clone(&self.pwd),
            self.config.store.timeout(),
        )
    }
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(10)))
        // Remove senstive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any),
        );

    Router::new()
        // `GET /` goes to `status`.
        .route("/", get(router::status::status))
        // `POST /auth/signin` goes to `signin`.
        .route("/auth/signin", post(router::signin::handler))
        // `POST /task` goes to `task`.
        .route("/task", post(router::task::handler))
        .route("/metrics", get(telemetry::metrics))
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state(
    config: Arc<config::Configuration>,
    metrics: PrometheusHandle,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let Some(postgres) = &config.postgres else {
        return Err("missing `postgres` entry on `config.yaml` file".into());
    };

    let db = database::Database::new(
        &postgres.address,
        postgres
            .username
            .as_deref()
            .unwrap_or(database::DEFAULT_CREDENTIALS),
        postgres
            .password
            .as_deref()
            .unwrap_or(database::DEFAULT_CREDENTIALS),
        postgres
            .database
            .as_deref()
            .unwrap_or(database::DEFAULT_DATABASE_NAME),
        postgres.pool_size.unwrap_or(database::DEFAULT_POOL_SIZE),
        postgres
            .connect_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(database::DEFAULT_CONNECT_TIMEOUT),
    )
    .await?;

    // execute migrations scripts on start.
    sqlx::migrate!().run(&db.postgres).await?;

    let pwd = Arc::new(PasswordManager::new(config.argon2.clone())?);

    Ok(AppState {
        accounts: Arc::new(PgAccountStore::new(db.postgres.clone())),
        tasks: Arc::new(PgTaskStore::new(db.postgres)),
        config,
        pwd,
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use metrics_exporter_prometheus::PrometheusBuilder;

    use super::*;
    use crate::config::{Configuration, Postgres};

    fn handle() -> PrometheusHandle {
        PrometheusBuilder::new().build_recorder().handle()
    }

    #[tokio::test]
    async fn test_initialize_state_without_postgres() {
        let config = Arc::new(Configuration::default());

        let Err(err) = initialize_state(config, handle()).await else {
            panic!("state initialized without a store");
        };
        assert!(err.to_string().contains("postgres"));
    }

    #[tokio::test]
    async fn test_initialize_state_with_unreachable_store() {
        let mut config = Configuration::default();
        config.postgres = Some(Postgres {
            // Nothing listens on port 1.
            address: "127.0.0.1:1".into(),
            connect_timeout_ms: Some(200),
            ..Default::default()
        });

        let started = std::time::Instant::now();
        let result = initialize_state(Arc::new(config), handle()).await;

        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
