//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all API handlers
//! - Wire up middleware (auth, tracing, request ID, timeout, body limit, metrics)
//! - Keep the `{ok, msg}` envelope on responses the middleware itself produces
//! - Serve on a listener until the shutdown broadcast fires

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ApiConfig;
use crate::http::auth::require_token;
use crate::http::handlers;
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::http::response::ApiResponse;
use crate::observability::metrics;
use crate::torrc::TorrcManager;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TorrcManager>,
    pub token: Arc<str>,
}

/// HTTP front end for the torrc manager.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around a shared manager.
    pub fn new(manager: Arc<TorrcManager>, config: &ApiConfig) -> Self {
        let state = AppState {
            manager,
            token: Arc::from(config.token.as_str()),
        };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ApiConfig, state: AppState) -> Router {
        Router::new()
            .route("/api/v1/status", get(handlers::status))
            .route("/api/v1/read", get(handlers::read))
            .route("/api/v1/get-ip", get(handlers::get_ip))
            .route("/api/v1/set-port", post(handlers::set_port))
            .route("/api/v1/set-countries", post(handlers::set_countries))
            .route("/api/v1/set-bridges", post(handlers::set_bridges))
            .route("/api/v1/disable-bridges", post(handlers::disable_bridges))
            .route("/api/v1/restart", post(handlers::restart))
            .route("/api/v1/reload", post(handlers::reload))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(middleware::map_response(envelope_errors))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The router, for driving the API without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP API listening");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// The timeout and body limit layers answer with an empty or plain-text body.
async fn envelope_errors(response: Response) -> Response {
    let status = response.status();
    let msg = match status {
        StatusCode::PAYLOAD_TOO_LARGE => "request body too large",
        StatusCode::REQUEST_TIMEOUT => "request timed out",
        _ => return response,
    };
    (status, Json(ApiResponse::error(msg))).into_response()
}

async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}
