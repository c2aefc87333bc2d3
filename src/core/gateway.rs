//! Request gateway - the HTTP-facing component.
//!
//! Routes: `GET /tools` (registry listing), `POST /call` (dispatch),
//! `GET /health`, `GET /status`, plus a root banner. Every error that
//! occurs while serving a request is recovered here and converted into the
//! response envelope; one failed request never takes the process down.
//!
//! Lifecycle: bind, serve, graceful shutdown on SIGINT/SIGTERM with a
//! forced exit if in-flight requests do not drain within the grace period.

use axum::{
    Json, Router,
    extract::{ConnectInfo, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

use super::config::Config;
use super::error::{Error, Result};
use super::rate_limit::RateLimiter;
use crate::domains::nocodb::{NocoClient, NocoError};
use crate::domains::tools::{ToolOutput, ToolRegistry, now_rfc3339};

/// How long in-flight requests get to drain after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// The gateway process: owns the configuration and drives the listener
/// lifecycle.
pub struct Gateway {
    config: Config,
}

/// Shared state injected into every request handler.
///
/// The rate-limiter map and the lazily initialized NocoDB client are the
/// only pieces of state shared across concurrent requests; both are
/// internally synchronized.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    registry: Arc<ToolRegistry>,
    limiter: Arc<RateLimiter>,
    client: Arc<OnceCell<NocoClient>>,
    started_at: Instant,
}

impl AppState {
    /// Build the shared state from configuration.
    pub fn new(config: Arc<Config>) -> Self {
        let limiter = RateLimiter::new(
            Duration::from_secs(config.rate_limit.window_secs),
            config.rate_limit.max_requests,
        );
        Self {
            config,
            registry: Arc::new(ToolRegistry::new()),
            limiter: Arc::new(limiter),
            client: Arc::new(OnceCell::new()),
            started_at: Instant::now(),
        }
    }

    /// Get the shared NocoDB client, constructing it on first use.
    ///
    /// Initialization is idempotent under concurrent first calls: exactly
    /// one client is constructed and the "initialized" log line fires once.
    pub async fn nocodb_client(&self) -> std::result::Result<&NocoClient, NocoError> {
        self.client
            .get_or_try_init(|| async {
                let client = NocoClient::new(
                    self.config.nocodb.base_url.clone(),
                    self.config.nocodb.api_token.clone(),
                )?;
                info!("NocoDB client initialized for {}", client.base_url());
                Ok(client)
            })
            .await
    }

    fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Body of a `POST /call` request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallRequest {
    /// The registered operation name.
    pub name: String,

    /// Arguments forwarded to the handler.
    #[serde(default)]
    pub arguments: Value,
}

impl Gateway {
    /// Create a gateway with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Bind the listener and serve until shutdown.
    ///
    /// Returns an error on bind failure (fatal at startup). A clean drain
    /// after a shutdown signal returns `Ok`; the forced-exit fallback
    /// terminates the process directly if draining stalls.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.http.host, self.config.http.port);
        let state = AppState::new(Arc::new(self.config));
        let app = router(state.clone());

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::bind(&addr, e))?;

        info!("Ready - listening on {} (CORS permissive)", addr);
        info!("  → Tools:  GET  /tools");
        info!("  → Call:   POST /call");
        info!("  → Health: GET  /health");
        info!("  → Status: GET  /status");

        let sweeper = tokio::spawn(sweep_loop(state.limiter.clone()));

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal(sweeper))
        .await?;

        info!("In-flight requests drained");
        Ok(())
    }
}

/// Build the gateway router with all routes and layers.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/tools", get(list_tools))
        .route("/call", post(call_tool))
        .route("/health", get(health_check))
        .route("/status", get(status_report))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Root handler - service banner with the endpoint listing.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": state.config.server.name,
        "version": state.config.server.version,
        "description": "HTTP tool gateway for NocoDB",
        "endpoints": {
            "tools": "GET /tools",
            "call": "POST /call",
            "health": "GET /health",
            "status": "GET /status"
        }
    }))
}

/// `GET /tools` - registry names, descriptions and input schemas.
async fn list_tools(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "name": state.config.server.name,
        "version": state.config.server.version,
        "tools": ToolRegistry::descriptors(),
    });
    ([(header::CACHE_CONTROL, "public, max-age=60")], Json(body))
}

/// Largest accepted `/call` body.
const MAX_CALL_BODY_BYTES: usize = 2 * 1024 * 1024;

/// `POST /call` - rate-limit check, lazy client init, dispatch.
#[instrument(skip_all, fields(tool))]
async fn call_tool(State(state): State<AppState>, request: axum::extract::Request) -> Response {
    let identity = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if !state.limiter.allow(&identity) {
        warn!("Rate limit exceeded for {}", identity);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ToolOutput::failure(
                "Rate limit exceeded: too many requests, try again later",
            )),
        )
            .into_response();
    }

    let body = match axum::body::to_bytes(request.into_body(), MAX_CALL_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ToolOutput::failure(format!("Failed to read request body: {}", e))),
            )
                .into_response();
        }
    };

    let request: ToolCallRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ToolOutput::failure(format!("Invalid request body: {}", e))),
            )
                .into_response();
        }
    };
    tracing::Span::current().record("tool", request.name.as_str());
    info!("Executing tool: {}", request.name);

    let client = match state.nocodb_client().await {
        Ok(client) => client,
        Err(e) => {
            error!("NocoDB client initialization failed: {}", e);
            return Json(ToolOutput::failure(e.to_string())).into_response();
        }
    };

    match state.registry.dispatch(&request.name, request.arguments, client).await {
        Ok(payload) => Json(ToolOutput::success(payload)).into_response(),
        Err(e) => {
            warn!("Tool {} failed: {}", request.name, e);
            Json(ToolOutput::failure(e.to_string())).into_response()
        }
    }
}

/// `GET /health` - liveness, uptime and downstream-connectivity flag.
/// Always 200 unless the process itself cannot respond.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "status": "healthy",
        "timestamp": now_rfc3339(),
        "version": state.config.server.version,
        "uptime_seconds": state.uptime_seconds(),
        "nocodb_connected": state.config.nocodb.api_token.is_some(),
        "nocodb_url": state.config.nocodb.base_url,
    }))
}

/// `GET /status` - extended diagnostic snapshot with configuration echo.
async fn status_report(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "status": "running",
        "pid": std::process::id(),
        "uptime_seconds": state.uptime_seconds(),
        "memory": { "rss_bytes": rss_bytes() },
        "rate_limiter": {
            "tracked_identities": state.limiter.tracked_identities(),
            "window_secs": state.limiter.window().as_secs(),
            "max_requests": state.limiter.quota(),
        },
        "config": {
            "nocodb_url": state.config.nocodb.base_url,
            "api_token": state.config.nocodb.api_token.as_ref().map(|_| "[REDACTED]"),
            "host": state.config.http.host,
            "port": state.config.http.port,
            "log_level": state.config.logging.level,
        },
        "timestamp": now_rfc3339(),
    }))
}

/// Unknown routes yield a failure envelope listing the valid ones.
async fn not_found() -> impl IntoResponse {
    let mut output = ToolOutput::failure("Not found");
    output.data.insert(
        "routes".to_string(),
        json!(["GET /", "GET /tools", "POST /call", "GET /health", "GET /status"]),
    );
    (StatusCode::NOT_FOUND, Json(output))
}

/// Convert a handler panic into a 500 envelope.
///
/// Full detail is logged server-side; only a generic message and a
/// timestamp go over the wire.
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "non-string panic payload".to_string()
    };
    error!("Handler panicked: {}", detail);

    let mut output = ToolOutput::failure("Internal server error");
    output
        .data
        .insert("timestamp".to_string(), json!(now_rfc3339()));
    (StatusCode::INTERNAL_SERVER_ERROR, Json(output)).into_response()
}

/// Best-effort resident set size, reported by `/status`.
fn rss_bytes() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
        Some(pages * 4096)
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Periodically evict idle rate-limit entries so the identity map stays
/// bounded.
async fn sweep_loop(limiter: Arc<RateLimiter>) {
    let mut ticker = tokio::time::interval(limiter.window());
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let removed = limiter.purge_expired();
        if removed > 0 {
            info!("Evicted {} idle rate-limit entries", removed);
        }
    }
}

/// Resolve when the process should stop accepting connections.
///
/// Triggers on SIGINT, SIGTERM, or the background sweep task dying
/// unexpectedly. Once triggered, a forced-exit timer guards against stuck
/// in-flight requests.
async fn shutdown_signal(mut sweeper: JoinHandle<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down...");
        }
        result = &mut sweeper => {
            error!("Background sweep task stopped unexpectedly ({:?}), shutting down...", result);
        }
    }

    tokio::spawn(async {
        tokio::time::sleep(SHUTDOWN_GRACE).await;
        error!(
            "Graceful shutdown timed out after {:?}, forcing exit",
            SHUTDOWN_GRACE
        );
        std::process::exit(1);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::new(Arc::new(Config::default()))
    }

    fn test_state_with(config: Config) -> AppState {
        AppState::new(Arc::new(config))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn call_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/call")
            .header("content-type", "application/json")
            .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))))
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_always_ok() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["nocodb_connected"], json!(false));
    }

    #[tokio::test]
    async fn test_tools_listing_is_cacheable() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/tools").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=60"
        );
        let body = body_json(response).await;
        assert_eq!(body["tools"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_unknown_route_lists_valid_ones() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
        assert!(body["routes"].as_array().unwrap().iter().any(|r| r == "POST /call"));
    }

    #[tokio::test]
    async fn test_call_unknown_tool_returns_failure_envelope() {
        let app = router(test_state());
        let response = app
            .oneshot(call_request(r#"{"name":"nocodb_explode","arguments":{}}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().unwrap().contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_call_without_token_returns_failure_envelope() {
        // No token configured and no per-call override: the configuration
        // error is recovered into an envelope, not a transport error.
        let app = router(test_state());
        let response = app
            .oneshot(call_request(r#"{"name":"nocodb_list_projects","arguments":{}}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().unwrap().contains("token"));
    }

    #[tokio::test]
    async fn test_call_malformed_body_is_enveloped() {
        let app = router(test_state());
        let response = app.oneshot(call_request("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_with_429() {
        let mut config = Config::default();
        config.rate_limit.max_requests = 2;
        let app = router(test_state_with(config));

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(call_request(r#"{"name":"nocodb_explode","arguments":{}}"#))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(call_request(r#"{"name":"nocodb_explode","arguments":{}}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().unwrap().contains("Rate limit"));
    }

    #[tokio::test]
    async fn test_lazy_client_initialized_exactly_once() {
        let state = test_state();
        let (a, b, c) = tokio::join!(
            state.nocodb_client(),
            state.nocodb_client(),
            state.nocodb_client()
        );
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert!(std::ptr::eq(a, b));
        assert!(std::ptr::eq(b, c));
    }

    #[tokio::test]
    async fn test_status_echoes_config_with_redacted_token() {
        let mut config = Config::default();
        config.nocodb.api_token = Some("secret".to_string());
        let app = router(test_state_with(config));
        let response = app
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["config"]["api_token"], json!("[REDACTED]"));
        assert_eq!(body["config"]["port"], json!(3001));
        assert_eq!(body["rate_limiter"]["max_requests"], json!(30));
        assert!(!body.to_string().contains("secret"));
    }
}
