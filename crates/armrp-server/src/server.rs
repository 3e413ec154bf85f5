use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, put},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    config::{AppConfig, AsyncOperationsConfig},
    handlers,
    store::ResourceStore,
};

const APPLICATION_ROUTE: &str = "/planes/{plane_type}/{plane_name}/resourceGroups/{resource_group}/providers/{namespace}/applications/{name}";
const OPERATION_STATUS_ROUTE: &str = "/planes/{plane_type}/{plane_name}/providers/{namespace}/locations/{location}/operationStatuses/{operation_id}";
const OPERATION_RESULT_ROUTE: &str = "/planes/{plane_type}/{plane_name}/providers/{namespace}/locations/{location}/operationResults/{operation_id}";

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ResourceStore>,
    pub async_operations: Arc<AsyncOperationsConfig>,
    pub body_limit: usize,
}

impl AppState {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            store: Arc::new(ResourceStore::new()),
            async_operations: Arc::new(cfg.async_operations.clone()),
            body_limit: cfg.server.body_limit_bytes,
        }
    }
}

pub struct ArmrpServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(cfg: &AppConfig) -> Router {
    build_app_with_state(AppState::new(cfg))
}

pub fn build_app_with_state(state: AppState) -> Router {
    let body_limit = state.body_limit;
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route(
            APPLICATION_ROUTE,
            put(handlers::put_application)
                .get(handlers::get_application)
                .delete(handlers::delete_application)
                .fallback(handlers::application_method_not_allowed),
        )
        .route(OPERATION_STATUS_ROUTE, get(handlers::get_operation_status))
        .route(OPERATION_RESULT_ROUTE, get(handlers::get_operation_result))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|req: &axum::http::Request<_>| {
                            tracing::info_span!(
                                "http.request",
                                http.method = %req.method(),
                                http.target = %req.uri(),
                                http.status_code = tracing::field::Empty,
                            )
                        })
                        .on_response(
                            |res: &axum::http::Response<_>,
                             latency: std::time::Duration,
                             span: &tracing::Span| {
                                span.record(
                                    "http.status_code",
                                    tracing::field::display(res.status().as_u16()),
                                );
                                tracing::info!(
                                    http.status = %res.status().as_u16(),
                                    elapsed_ms = %latency.as_millis(),
                                    "request handled"
                                );
                            },
                        ),
                )
                .layer(axum::extract::DefaultBodyLimit::max(body_limit)),
        )
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> ArmrpServer {
        ArmrpServer {
            addr: self.addr,
            app: build_app(&self.config),
        }
    }
}

impl ArmrpServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
