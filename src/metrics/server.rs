//! HTTP monitoring endpoints
//!
//! Serves the health report, liveness and readiness probes, Prometheus
//! metrics, matchmaking stats and the live queue/game snapshot.

use crate::matchmaking::MatchmakingStats;
use crate::metrics::collector::MetricsCollector;
use crate::service::app::AppState;
use crate::service::health::{HealthCheck, HealthStatus, Probe};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Routes served by [`MonitoringServer`]
pub const ENDPOINTS: [&str; 6] = ["/health", "/ready", "/alive", "/metrics", "/stats", "/status"];

/// Monitoring server bind address
#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    pub host: String,
    pub port: u16,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Clone)]
struct MonitorState {
    metrics_collector: Arc<MetricsCollector>,
    app_state: Option<Arc<AppState>>,
}

impl MonitorState {
    fn app(&self) -> std::result::Result<&AppState, EndpointError> {
        self.app_state.as_deref().ok_or(EndpointError::NotInitialized)
    }
}

/// Failure of a JSON endpoint
#[derive(Debug)]
enum EndpointError {
    NotInitialized,
    Matchmaking(anyhow::Error),
}

impl IntoResponse for EndpointError {
    fn into_response(self) -> Response {
        let message = match self {
            EndpointError::NotInitialized => "Service not initialized".to_string(),
            EndpointError::Matchmaking(e) => {
                error!("Monitoring request failed: {}", e);
                format!("Matchmaking state unavailable: {}", e)
            }
        };
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": message })),
        )
            .into_response()
    }
}

type EndpointResult<T> = std::result::Result<T, EndpointError>;

/// HTTP server exposing health, metrics and matchmaking state
pub struct MonitoringServer {
    config: MonitoringConfig,
    state: MonitorState,
    shutdown_tx: broadcast::Sender<()>,
}

impl MonitoringServer {
    pub fn new(config: MonitoringConfig, metrics_collector: Arc<MetricsCollector>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            state: MonitorState {
                metrics_collector,
                app_state: None,
            },
            shutdown_tx,
        }
    }

    /// Attach the running service so state-backed endpoints can answer
    pub fn with_app_state(mut self, app_state: Arc<AppState>) -> Self {
        self.state.app_state = Some(app_state);
        self
    }

    /// Bind and serve until [`stop`](Self::stop) is called
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid monitoring server address")?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind monitoring server to {}", addr))?;

        info!("Monitoring endpoints listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        info!("Monitoring server stopped");
        Ok(())
    }

    /// Signal the serving task to finish
    pub fn stop(&self) {
        if self.shutdown_tx.send(()).is_err() {
            warn!("Monitoring server was not serving");
        }
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/", get(index))
            .route("/health", get(health))
            .route("/ready", get(ready))
            .route("/alive", get(alive))
            .route("/metrics", get(metrics))
            .route("/stats", get(stats))
            .route("/status", get(status))
            .with_state(self.state.clone())
    }
}

fn status_code(status: HealthStatus) -> StatusCode {
    if status.is_serving() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn index() -> impl IntoResponse {
    Json(json!({
        "service": "pug-room",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ENDPOINTS,
    }))
}

async fn health(State(state): State<MonitorState>) -> EndpointResult<Response> {
    let report = HealthCheck::check(state.app()?).await;
    debug!("Health report: {}", report.status);
    Ok((status_code(report.status), Json(report)).into_response())
}

async fn probe(state: &MonitorState, probe: Probe) -> EndpointResult<Response> {
    let result = HealthCheck::probe(state.app()?, probe).await;
    Ok((status_code(result.status), Json(result)).into_response())
}

async fn ready(State(state): State<MonitorState>) -> EndpointResult<Response> {
    probe(&state, Probe::Readiness).await
}

async fn alive(State(state): State<MonitorState>) -> EndpointResult<Response> {
    probe(&state, Probe::Liveness).await
}

async fn metrics(State(state): State<MonitorState>) -> Response {
    match state.metrics_collector.encode_text() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}

#[derive(Serialize)]
struct StatsResponse {
    uptime_seconds: u64,
    team_partition: &'static str,
    #[serde(flatten)]
    stats: MatchmakingStats,
}

async fn stats(State(state): State<MonitorState>) -> EndpointResult<Json<StatsResponse>> {
    let app = state.app()?;
    let manager = app.manager();
    let stats = manager
        .get_stats()
        .await
        .map_err(EndpointError::Matchmaking)?;

    Ok(Json(StatsResponse {
        uptime_seconds: app.uptime().as_secs(),
        team_partition: manager.partition_policy(),
        stats,
    }))
}

async fn status(State(state): State<MonitorState>) -> EndpointResult<Response> {
    let snapshot = state
        .app()?
        .manager()
        .status()
        .await
        .map_err(EndpointError::Matchmaking)?;
    Ok(Json(snapshot).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, QueueSettings};
    use crate::game::TeamPartitionPolicy;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt; // for oneshot

    fn bare_server() -> MonitoringServer {
        let collector = Arc::new(MetricsCollector::new().expect("Failed to create collector"));
        MonitoringServer::new(MonitoringConfig::default(), collector)
    }

    async fn server_with_game() -> (MonitoringServer, Arc<AppState>) {
        let mut config = AppConfig::default();
        config.matchmaking.team_partition = TeamPartitionPolicy::JoinOrder;
        config.matchmaking.default_queues = vec![
            QueueSettings {
                name: "LTpug".to_string(),
                size: 2,
            },
            QueueSettings {
                name: "LTunrated".to_string(),
                size: 10,
            },
        ];
        let app_state = Arc::new(AppState::new(config).await.unwrap());
        app_state.activate().await;

        let manager = app_state.manager();
        manager.add_player("opsayo", Some("LTpug")).await.unwrap();
        manager.add_player("lyon", Some("LTpug")).await.unwrap();
        manager.add_player("stork", None).await.unwrap();

        let server = MonitoringServer::new(
            MonitoringConfig::default(),
            app_state.metrics_collector(),
        )
        .with_app_state(app_state.clone());
        (server, app_state)
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = get(app, uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_index_lists_endpoints() {
        let app = bare_server().router();

        let (status, body) = get_json(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["endpoints"].as_array().unwrap().len(), ENDPOINTS.len());
    }

    #[tokio::test]
    async fn test_state_endpoints_without_app_state() {
        let app = bare_server().router();

        for uri in ["/health", "/ready", "/alive", "/stats", "/status"] {
            let (status, body) = get_json(&app, uri).await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{}", uri);
            assert_eq!(body["error"], "Service not initialized");
        }
    }

    #[tokio::test]
    async fn test_metrics_endpoint_serves_prometheus_text() {
        let server = bare_server();
        server.state.metrics_collector.record_game_formed("LTpug");
        let app = server.router();

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get("content-type").unwrap();
        assert!(content_type.to_str().unwrap().contains("text/plain"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("pug_room_games_formed_total"));
    }

    #[tokio::test]
    async fn test_probes_use_one_shape() {
        let (server, _app_state) = server_with_game().await;
        let app = server.router();

        let (status, ready) = get_json(&app, "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ready["probe"], "readiness");
        assert_eq!(ready["status"], "healthy");

        let (status, alive) = get_json(&app, "/alive").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(alive["probe"], "liveness");
        assert_eq!(alive["service"], ready["service"]);
    }

    #[tokio::test]
    async fn test_stopped_service_fails_probes() {
        let (server, app_state) = server_with_game().await;
        let app = server.router();
        app_state.shutdown().await.unwrap();

        let (status, alive) = get_json(&app, "/alive").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(alive["status"], "unhealthy");

        let (status, report) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report["components"][0]["detail"], "not running");
    }

    #[tokio::test]
    async fn test_health_and_stats_report_matchmaking() {
        let (server, _app_state) = server_with_game().await;
        let app = server.router();

        let (status, report) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["stats"]["active_games"], 1);
        assert_eq!(report["components"][1]["name"], "store");

        let (status, stats) = get_json(&app, "/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["team_partition"], "join_order");
        assert_eq!(stats["games_formed"], 1);
        assert_eq!(stats["players_waiting"], 2);
    }

    #[tokio::test]
    async fn test_status_endpoint_snapshot() {
        let (server, _app_state) = server_with_game().await;
        let app = server.router();

        let (status, snapshot) = get_json(&app, "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["queues"][0]["name"], "LTpug");
        assert_eq!(snapshot["queues"][0]["remaining"], 1);
        assert_eq!(snapshot["queues"][0]["players"][0], "stork");
        assert_eq!(snapshot["queues"][1]["players"][0], "stork");
        assert_eq!(snapshot["active_games"][0]["team_a"][0], "opsayo");
        assert_eq!(snapshot["active_games"][0]["team_b"][0], "lyon");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = bare_server().router();
        let (status, _) = get(&app, "/lobbies").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
