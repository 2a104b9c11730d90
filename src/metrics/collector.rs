//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the pug-room matchmaking
//! service using Prometheus metrics.

use crate::matchmaking::manager::MatchmakingStats;
use crate::types::GameResult;
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Encoder, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Main metrics collector for the matchmaking service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Queue-related metrics
    queue_metrics: QueueMetrics,

    /// Game-related metrics
    game_metrics: GameMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Chat commands handled, by command and status
    pub commands_total: IntCounterVec,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Queue-related metrics
#[derive(Clone)]
pub struct QueueMetrics {
    /// Number of registered queues
    pub active_queues: IntGauge,

    /// Total queues created
    pub queues_created_total: IntCounter,

    /// Total queues removed
    pub queues_removed_total: IntCounter,

    /// Queue joins by queue name
    pub queue_joins_total: IntCounterVec,

    /// Queue memberships currently held
    pub players_waiting: IntGauge,
}

/// Game-related metrics
#[derive(Clone)]
pub struct GameMetrics {
    /// Games formed by source queue
    pub games_formed_total: IntCounterVec,

    /// Games finished by result
    pub games_finished_total: IntCounterVec,

    /// Games currently unresolved
    pub active_games: IntGauge,

    /// Time from formation to result
    pub game_duration_seconds: Histogram,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Matchmaking operation durations
    pub operation_duration: HistogramVec,

    /// Operations that failed and were rolled back
    pub operation_errors_total: IntCounterVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let queue_metrics = QueueMetrics::new(&registry)?;
        let game_metrics = GameMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            queue_metrics,
            game_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get queue metrics
    pub fn queue(&self) -> &QueueMetrics {
        &self.queue_metrics
    }

    /// Get game metrics
    pub fn game(&self) -> &GameMetrics {
        &self.game_metrics
    }

    /// Get performance metrics
    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Refresh gauges from manager stats
    pub fn update_from_stats(&self, stats: &MatchmakingStats) {
        self.queue_metrics
            .active_queues
            .set(stats.active_queues as i64);
        self.queue_metrics
            .players_waiting
            .set(stats.players_waiting as i64);
        self.game_metrics.active_games.set(stats.active_games as i64);
    }

    /// Record a matchmaking operation and how long it took
    pub fn record_operation(&self, operation: &str, success: bool, duration: Duration) {
        self.performance_metrics
            .operation_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());

        if !success {
            self.performance_metrics
                .operation_errors_total
                .with_label_values(&[operation])
                .inc();
        }
    }

    /// Record a queue being created
    pub fn record_queue_created(&self) {
        self.queue_metrics.queues_created_total.inc();
        self.queue_metrics.active_queues.inc();
    }

    /// Record a queue being removed
    pub fn record_queue_removed(&self) {
        self.queue_metrics.queues_removed_total.inc();
        self.queue_metrics.active_queues.dec();
    }

    /// Record a player joining a queue
    pub fn record_queue_join(&self, queue_name: &str) {
        self.queue_metrics
            .queue_joins_total
            .with_label_values(&[queue_name])
            .inc();
    }

    /// Record a queue popping into a game
    pub fn record_game_formed(&self, queue_name: &str) {
        self.game_metrics
            .games_formed_total
            .with_label_values(&[queue_name])
            .inc();
        self.game_metrics.active_games.inc();
    }

    /// Record a game result
    pub fn record_game_finished(&self, result: GameResult, duration: Duration) {
        let result_str = match result {
            GameResult::Winner(_) => "decided",
            GameResult::Draw => "draw",
        };

        self.game_metrics
            .games_finished_total
            .with_label_values(&[result_str])
            .inc();
        self.game_metrics.active_games.dec();
        self.game_metrics
            .game_duration_seconds
            .observe(duration.as_secs_f64());
    }

    /// Record a chat command being handled
    pub fn record_command(&self, command: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        self.service_metrics
            .commands_total
            .with_label_values(&[command, status])
            .inc();
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Encode every registered metric in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let text = encoder.encode_to_string(&self.registry.gather())?;
        Ok(text)
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds = IntGauge::new("pug_room_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let commands_total = IntCounterVec::new(
            Opts::new("pug_room_commands_total", "Total chat commands handled"),
            &["command", "status"],
        )?;
        registry.register(Box::new(commands_total.clone()))?;

        let health_status = IntGauge::new(
            "pug_room_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("pug_room_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            commands_total,
            health_status,
            component_health,
        })
    }
}

impl QueueMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let active_queues = IntGauge::new("pug_room_active_queues", "Number of registered queues")?;
        registry.register(Box::new(active_queues.clone()))?;

        let queues_created_total =
            IntCounter::new("pug_room_queues_created_total", "Total queues created")?;
        registry.register(Box::new(queues_created_total.clone()))?;

        let queues_removed_total =
            IntCounter::new("pug_room_queues_removed_total", "Total queues removed")?;
        registry.register(Box::new(queues_removed_total.clone()))?;

        let queue_joins_total = IntCounterVec::new(
            Opts::new("pug_room_queue_joins_total", "Total queue joins"),
            &["queue"],
        )?;
        registry.register(Box::new(queue_joins_total.clone()))?;

        let players_waiting = IntGauge::new(
            "pug_room_players_waiting",
            "Queue memberships currently held",
        )?;
        registry.register(Box::new(players_waiting.clone()))?;

        Ok(Self {
            active_queues,
            queues_created_total,
            queues_removed_total,
            queue_joins_total,
            players_waiting,
        })
    }
}

impl GameMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let games_formed_total = IntCounterVec::new(
            Opts::new("pug_room_games_formed_total", "Total games formed"),
            &["queue"],
        )?;
        registry.register(Box::new(games_formed_total.clone()))?;

        let games_finished_total = IntCounterVec::new(
            Opts::new("pug_room_games_finished_total", "Total games finished"),
            &["result"],
        )?;
        registry.register(Box::new(games_finished_total.clone()))?;

        let active_games = IntGauge::new("pug_room_active_games", "Games awaiting a result")?;
        registry.register(Box::new(active_games.clone()))?;

        let game_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "pug_room_game_duration_seconds",
                "Time from game formation to reported result",
            )
            .buckets(vec![
                60.0, 300.0, 600.0, 900.0, 1200.0, 1800.0, 2700.0, 3600.0, 7200.0,
            ]),
        )?;
        registry.register(Box::new(game_duration_seconds.clone()))?;

        Ok(Self {
            games_formed_total,
            games_finished_total,
            active_games,
            game_duration_seconds,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "pug_room_operation_duration_seconds",
                "Matchmaking operation duration",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        let operation_errors_total = IntCounterVec::new(
            Opts::new(
                "pug_room_operation_errors_total",
                "Matchmaking operations that failed",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(operation_errors_total.clone()))?;

        Ok(Self {
            operation_duration,
            operation_errors_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Team;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        let _service = collector.service();
        let _queue = collector.queue();
        let _game = collector.game();
        let _performance = collector.performance();
    }

    #[test]
    fn test_game_lifecycle_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_queue_created();
        collector.record_queue_join("LTpug");
        collector.record_game_formed("LTpug");
        assert_eq!(collector.game().active_games.get(), 1);

        collector.record_game_finished(GameResult::Winner(Team::A), Duration::from_secs(900));
        assert_eq!(collector.game().active_games.get(), 0);
        assert_eq!(
            collector
                .game()
                .games_finished_total
                .with_label_values(&["decided"])
                .get(),
            1
        );
    }

    #[test]
    fn test_update_from_stats_sets_gauges() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        let stats = MatchmakingStats {
            active_queues: 2,
            players_waiting: 5,
            active_games: 1,
            ..MatchmakingStats::default()
        };
        collector.update_from_stats(&stats);
        collector.update_from_stats(&stats);

        assert_eq!(collector.queue().active_queues.get(), 2);
        assert_eq!(collector.queue().players_waiting.get(), 5);
        assert_eq!(collector.game().active_games.get(), 1);
    }

    #[test]
    fn test_operation_and_command_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_operation("add_player", true, Duration::from_micros(50));
        collector.record_operation("create_queue", false, Duration::from_micros(20));
        collector.record_command("add", true);
        collector.update_health_status(2);
        collector.update_component_health("store", true);

        assert_eq!(
            collector
                .performance()
                .operation_errors_total
                .with_label_values(&["create_queue"])
                .get(),
            1
        );
    }

    #[test]
    fn test_encode_text_includes_recorded_metrics() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        collector.record_game_formed("LTpug");

        let text = collector.encode_text().unwrap();
        assert!(text.contains("pug_room_games_formed_total"));
        assert!(text.contains("LTpug"));
    }
}
