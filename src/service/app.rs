//! Main application state and service coordination
//!
//! This module contains the AppState that wires the store, matchmaking
//! manager, command dispatcher, event channel, monitoring server and background
//! tasks together.

use crate::commands::{AdminRegistry, CommandDispatcher};
use crate::config::AppConfig;
use crate::events::BroadcastEventPublisher;
use crate::matchmaking::MatchmakingManager;
use crate::metrics::{MetricsCollector, MonitoringConfig, MonitoringServer};
use crate::store::InMemoryMatchmakingStore;
use crate::types::MatchmakingEvent;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Core matchmaking facade
    manager: Arc<MatchmakingManager>,

    /// Chat command handling on top of the manager
    dispatcher: Arc<CommandDispatcher>,

    /// Outbound event channel for transports
    event_publisher: Arc<BroadcastEventPublisher>,

    /// Metrics collector shared with the manager
    metrics_collector: Arc<MetricsCollector>,

    /// Monitoring HTTP server, present while started
    monitoring_server: Mutex<Option<Arc<MonitoringServer>>>,

    /// Background task handles
    background_tasks: Mutex<Vec<JoinHandle<()>>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,

    started_at: Instant,
}

impl AppState {
    /// Initialize the application with all dependencies
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing pug-room matchmaking service");
        info!(
            "Configuration: service={}, team_partition={:?}, default_queues={}",
            config.service.name,
            config.matchmaking.team_partition,
            config.matchmaking.default_queues.len()
        );

        crate::config::validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let event_publisher = Arc::new(BroadcastEventPublisher::default());
        let manager =
            Self::initialize_matchmaking_system(&config, event_publisher.clone(), metrics_collector.clone())
                .await?;

        let dispatcher = Arc::new(CommandDispatcher::new(
            manager.clone(),
            AdminRegistry::new(config.commands.admins.iter().cloned()),
            config.commands.prefix.clone(),
            metrics_collector.clone(),
        ));

        Ok(Self {
            config,
            manager,
            dispatcher,
            event_publisher,
            metrics_collector,
            monitoring_server: Mutex::new(None),
            background_tasks: Mutex::new(Vec::new()),
            is_running: Arc::new(RwLock::new(false)),
            started_at: Instant::now(),
        })
    }

    /// Start the monitoring server and background tasks
    pub async fn start(self: &Arc<Self>) -> Result<(), ServiceError> {
        info!("Starting pug-room matchmaking service");

        self.activate().await;
        self.start_monitoring_server().await?;
        self.start_background_tasks().await?;

        info!("✅ Pug-room matchmaking service started successfully");
        Ok(())
    }

    /// Mark the service as running without starting any servers
    pub async fn activate(&self) {
        *self.is_running.write().await = true;
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of pug-room service");

        // Mark as not running
        *self.is_running.write().await = false;

        // Stop background tasks
        self.stop_background_tasks().await;

        // Dropping the server also releases its handle on us
        if let Some(server) = self.monitoring_server.lock().await.take() {
            server.stop();
            info!("✅ Monitoring server stopped");
        }

        let final_stats =
            self.manager
                .get_stats()
                .await
                .map_err(|e| ServiceError::BackgroundTask {
                    message: format!("Failed to get final stats: {}", e),
                })?;

        info!("Final service statistics: {:?}", final_stats);
        info!("✅ Pug-room service shutdown completed");

        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Time since the service was initialized
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Get the matchmaking manager
    pub fn manager(&self) -> Arc<MatchmakingManager> {
        self.manager.clone()
    }

    /// Get the command dispatcher
    pub fn dispatcher(&self) -> Arc<CommandDispatcher> {
        self.dispatcher.clone()
    }

    /// Subscribe to matchmaking events
    pub fn subscribe_events(&self) -> broadcast::Receiver<MatchmakingEvent> {
        self.event_publisher.subscribe()
    }

    /// Get the metrics collector
    pub fn metrics_collector(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Build the manager and register the configured queues
    async fn initialize_matchmaking_system(
        config: &AppConfig,
        event_publisher: Arc<BroadcastEventPublisher>,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Result<Arc<MatchmakingManager>, ServiceError> {
        info!("Initializing matchmaking system components");

        let manager = Arc::new(MatchmakingManager::with_components(
            Arc::new(InMemoryMatchmakingStore::new()),
            config.matchmaking.team_partition.partitioner(),
            event_publisher,
            metrics_collector,
        ));

        for queue in &config.matchmaking.default_queues {
            manager
                .create_queue(&queue.name, queue.size)
                .await
                .map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create queue '{}': {}", queue.name, e),
                })?;
        }

        Ok(manager)
    }

    /// Serve health, metrics and matchmaking state over HTTP
    async fn start_monitoring_server(self: &Arc<Self>) -> Result<(), ServiceError> {
        let config = MonitoringConfig {
            host: "0.0.0.0".to_string(),
            port: self.config.service.health_port,
        };
        info!("Starting monitoring endpoints on port {}", config.port);

        let server = Arc::new(
            MonitoringServer::new(config, self.metrics_collector.clone())
                .with_app_state(self.clone()),
        );

        let serving = server.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = serving.start().await {
                error!("Monitoring server failed: {:#}", e);
            }
        });

        *self.monitoring_server.lock().await = Some(server);
        self.background_tasks.lock().await.push(handle);

        // Give the listener a moment to bind
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(())
    }

    /// Start background maintenance tasks
    async fn start_background_tasks(&self) -> Result<(), ServiceError> {
        info!("Starting background maintenance tasks...");

        // Metrics update task
        let update_interval = self.config.metrics_update_interval();
        info!(
            "Starting metrics update task ({}s interval)...",
            update_interval.as_secs()
        );
        let metrics_task = {
            let manager = self.manager.clone();
            let metrics_collector = self.metrics_collector.clone();
            let is_running = self.is_running.clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(update_interval);
                info!("Metrics update task started");

                while *is_running.read().await {
                    interval.tick().await;

                    match manager.get_stats().await {
                        Ok(stats) => {
                            debug!(
                                "Updating metrics - queues: {}, waiting: {}, active games: {}",
                                stats.active_queues, stats.players_waiting, stats.active_games
                            );
                            metrics_collector.update_from_stats(&stats);
                        }
                        Err(e) => {
                            warn!("Failed to get matchmaking stats for metrics update: {}", e);
                        }
                    }
                }

                info!("Metrics update task stopped");
            })
        };

        // Service health metrics task
        info!("Starting health metrics task (60s interval)...");
        let health_metrics_task = {
            let manager = self.manager.clone();
            let metrics_collector = self.metrics_collector.clone();
            let is_running = self.is_running.clone();
            let started_at = self.started_at;

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(60));
                info!("Health metrics task started");

                while *is_running.read().await {
                    interval.tick().await;

                    let uptime_seconds = started_at.elapsed().as_secs() as i64;
                    metrics_collector
                        .service()
                        .uptime_seconds
                        .set(uptime_seconds);

                    let manager_healthy = manager.get_stats().await.is_ok();
                    metrics_collector.update_component_health("matchmaking_manager", manager_healthy);
                    metrics_collector.update_component_health("metrics", true);
                    metrics_collector.update_health_status(if manager_healthy { 2 } else { 0 });

                    debug!(
                        "Updated service health metrics - uptime: {}s, manager healthy: {}",
                        uptime_seconds, manager_healthy
                    );
                }

                info!("Health metrics task stopped");
            })
        };

        let mut tasks = self.background_tasks.lock().await;
        tasks.push(metrics_task);
        tasks.push(health_metrics_task);

        info!("{} background tasks running", tasks.len());
        Ok(())
    }

    /// Stop all background tasks
    async fn stop_background_tasks(&self) {
        let mut tasks = self.background_tasks.lock().await;
        let task_count = tasks.len();
        if task_count == 0 {
            info!("No background tasks to stop");
            return;
        }

        info!("Stopping {} background tasks...", task_count);

        for (i, task) in tasks.drain(..).enumerate() {
            debug!("Aborting background task {}/{}", i + 1, task_count);
            task.abort();
        }

        info!("✅ All {} background tasks stopped", task_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueueSettings;
    use crate::game::TeamPartitionPolicy;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.matchmaking.team_partition = TeamPartitionPolicy::JoinOrder;
        config.matchmaking.default_queues = vec![QueueSettings {
            name: "LTpug".to_string(),
            size: 2,
        }];
        config.commands.admins = vec!["opsayo".to_string()];
        config
    }

    #[tokio::test]
    async fn test_app_state_registers_default_queues() {
        let app_state = AppState::new(test_config()).await.unwrap();

        let queues = app_state.manager().list_queues().await.unwrap();
        assert_eq!(queues.len(), 1);
        assert_eq!(queues[0].name, "LTpug");
        assert_eq!(app_state.manager().partition_policy(), "join_order");
        assert!(!app_state.is_running().await);
    }

    #[tokio::test]
    async fn test_app_state_rejects_invalid_config() {
        let mut config = test_config();
        config.matchmaking.default_queues[0].size = 3;

        assert!(matches!(
            AppState::new(config).await,
            Err(ServiceError::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn test_dispatcher_events_reach_subscribers() {
        let app_state = AppState::new(test_config()).await.unwrap();
        let mut events = app_state.subscribe_events();
        let dispatcher = app_state.dispatcher();

        dispatcher.handle_message("opsayo", "!add").await.unwrap();
        dispatcher.handle_message("lyon", "!add").await.unwrap();

        let mut formed = None;
        while let Ok(event) = events.try_recv() {
            if let MatchmakingEvent::GameFormed(game) = event {
                formed = Some(game);
            }
        }
        let formed = formed.expect("game should have formed");
        assert_eq!(formed.queue_name, "LTpug");
        assert_eq!(formed.team_a, vec!["opsayo".to_string()]);
    }

    #[tokio::test]
    async fn test_activate_and_shutdown() {
        let app_state = AppState::new(test_config()).await.unwrap();

        app_state.activate().await;
        assert!(app_state.is_running().await);

        app_state.shutdown().await.unwrap();
        assert!(!app_state.is_running().await);
    }
}
