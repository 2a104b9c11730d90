//! Health reporting for the pug-room service
//!
//! A [`HealthCheck`] is the full report served on `/health` and printed by
//! `--health-check`. Liveness and readiness are cheaper probes sharing one
//! [`ProbeResult`] shape.

use crate::matchmaking::MatchmakingStats;
use crate::service::app::AppState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Health check status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Whether the service should keep receiving traffic
    pub fn is_serving(self) -> bool {
        self != HealthStatus::Unhealthy
    }

    /// Numeric form used by the `health_status` gauge
    pub fn gauge_value(self) -> u8 {
        match self {
            HealthStatus::Healthy => 2,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 0,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Which probe was asked for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Probe {
    Liveness,
    Readiness,
}

/// Answer to a liveness or readiness probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    pub probe: Probe,
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
}

/// One checked component of the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    pub name: String,
    pub status: HealthStatus,
    /// Summary when healthy, the failure otherwise
    pub detail: String,
}

/// Full health report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Worst status of all components
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub checked_at: DateTime<Utc>,
    pub components: Vec<ComponentCheck>,
    /// `None` when the stats could not be read
    pub stats: Option<MatchmakingStats>,
}

impl HealthCheck {
    /// Check every component and gather matchmaking stats
    pub async fn check(app_state: &AppState) -> Self {
        let stats = match app_state.manager().get_stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                error!("Failed to read matchmaking stats: {}", e);
                None
            }
        };

        let components = vec![
            Self::check_running(app_state).await,
            Self::check_store(app_state).await,
            ComponentCheck {
                name: "stats".to_string(),
                status: if stats.is_some() {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Degraded
                },
                detail: match &stats {
                    Some(stats) => format!(
                        "{} games formed, {} finished",
                        stats.games_formed, stats.games_finished
                    ),
                    None => "stats unavailable".to_string(),
                },
            },
        ];

        let status = components
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(HealthStatus::Healthy);
        debug!("Health check finished: {}", status);

        HealthCheck {
            status,
            service: app_state.config().service.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: app_state.uptime().as_secs(),
            checked_at: Utc::now(),
            components,
            stats,
        }
    }

    /// Answer a probe
    pub async fn probe(app_state: &AppState, probe: Probe) -> ProbeResult {
        let status = match probe {
            Probe::Liveness => Self::check_running(app_state).await.status,
            Probe::Readiness => Self::check_running(app_state)
                .await
                .status
                .max(Self::check_store(app_state).await.status),
        };

        ProbeResult {
            probe,
            status,
            service: app_state.config().service.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// The service has been started and not shut down
    pub async fn liveness(app_state: &AppState) -> ProbeResult {
        Self::probe(app_state, Probe::Liveness).await
    }

    /// Live, and committed matchmaking state can be read
    pub async fn readiness(app_state: &AppState) -> ProbeResult {
        Self::probe(app_state, Probe::Readiness).await
    }

    async fn check_running(app_state: &AppState) -> ComponentCheck {
        let running = app_state.is_running().await;
        ComponentCheck {
            name: "service".to_string(),
            status: if running {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            },
            detail: if running { "running" } else { "not running" }.to_string(),
        }
    }

    async fn check_store(app_state: &AppState) -> ComponentCheck {
        let (status, detail) = match app_state.manager().status().await {
            Ok(snapshot) => (
                HealthStatus::Healthy,
                format!(
                    "{} queues, {} active games",
                    snapshot.queues.len(),
                    snapshot.active_games.len()
                ),
            ),
            Err(e) => {
                error!("Matchmaking store check failed: {}", e);
                (HealthStatus::Unhealthy, e.to_string())
            }
        };

        ComponentCheck {
            name: "store".to_string(),
            status,
            detail,
        }
    }
}
