//! pug-room service binary
//!
//! Runs the matchmaking service with its monitoring endpoints. With
//! `--console`, chat messages are read from stdin as `author: text` lines
//! and replies and announcements are printed to stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use pug_room::commands::render_event;
use pug_room::config::{self, AppConfig};
use pug_room::service::{AppState, HealthCheck};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{BroadcastStream, LinesStream};
use tokio_stream::StreamExt;
use tracing::{error, info, warn};

/// Pickup-game matchmaking: named queues that pop into two-team games
#[derive(Parser, Debug)]
#[command(name = "pug-room", version, about)]
struct Args {
    /// TOML configuration file; environment variables override it
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Shorthand for `--log-level debug`
    #[arg(short, long)]
    debug: bool,

    /// Override the monitoring port
    #[arg(long, value_name = "PORT")]
    http_port: Option<u16>,

    /// Read `author: message` chat lines from stdin
    #[arg(long)]
    console: bool,

    /// Validate the configuration, print it and exit
    #[arg(long, conflicts_with = "health_check")]
    dry_run: bool,

    /// Build the service, print its health report and exit non-zero if unhealthy
    #[arg(long)]
    health_check: bool,
}

impl Args {
    /// Configuration from file or environment with CLI overrides applied
    fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::from_env()?,
        };

        if let Some(level) = &self.log_level {
            config.service.log_level = level.clone();
        }
        if self.debug {
            config.service.log_level = "debug".to_string();
        }
        if let Some(port) = self.http_port {
            config.service.health_port = port;
        }

        config::validate_config(&config)?;
        Ok(config)
    }
}

fn init_logging(log_level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")
}

fn log_configuration(config: &AppConfig) {
    info!(
        "{} v{} | log level {} | monitoring port {}",
        config.service.name,
        pug_room::VERSION,
        config.service.log_level,
        config.service.health_port
    );
    info!(
        "Teams: {:?} | prefix '{}' | {} admins",
        config.matchmaking.team_partition,
        config.commands.prefix,
        config.commands.admins.len()
    );
    for queue in &config.matchmaking.default_queues {
        info!("Queue {} ({} players, {}v{})", queue.name, queue.size, queue.size / 2, queue.size / 2);
    }
}

/// Print the health report for a freshly built, unstarted service
async fn health_check(config: AppConfig) -> Result<ExitCode> {
    let app_state = AppState::new(config).await?;
    app_state.activate().await;

    let report = HealthCheck::check(&app_state).await;
    println!("{}: {}", report.service, report.status);
    for component in &report.components {
        println!("  {:<8} {:<10} {}", component.name, component.status, component.detail);
    }

    Ok(if report.status.is_serving() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

/// Dispatch stdin chat lines until stdin closes
async fn run_console(app_state: Arc<AppState>) {
    let dispatcher = app_state.dispatcher();
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());

    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Console read failed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let Some((author, content)) = line
            .split_once(':')
            .map(|(author, content)| (author.trim(), content.trim()))
            .filter(|(author, _)| !author.is_empty())
        else {
            println!("expected 'author: message'");
            continue;
        };

        match dispatcher.handle_message(author, content).await {
            Ok(Some(reply)) => println!("{}", reply),
            Ok(None) => {}
            Err(e) => error!("Message from '{}' failed: {:#}", author, e),
        }
    }

    info!("Console input closed");
}

/// Print every matchmaking event as an announcement
async fn run_announcer(app_state: Arc<AppState>) {
    let mut events = BroadcastStream::new(app_state.subscribe_events());

    while let Some(event) = events.next().await {
        match event {
            Ok(event) => println!("[announce] {}", render_event(&event)),
            Err(e) => warn!("Announcements lagged: {}", e),
        }
    }
}

async fn serve(config: AppConfig, console: bool) -> Result<()> {
    let shutdown_timeout = config.shutdown_timeout();
    let app_state = Arc::new(AppState::new(config).await?);
    app_state.start().await?;

    let mut transports: Vec<JoinHandle<()>> = Vec::new();
    if console {
        info!("Console mode: type 'author: message', e.g. 'opsayo: !add'");
        transports.push(tokio::spawn(run_announcer(app_state.clone())));
        transports.push(tokio::spawn(run_console(app_state.clone())));
    }

    info!("pug-room is running, Ctrl+C to stop");
    shutdown_signal().await;

    for transport in transports {
        transport.abort();
    }

    match tokio::time::timeout(shutdown_timeout, app_state.shutdown()).await {
        Ok(Ok(())) => info!("Shutdown complete"),
        Ok(Err(e)) => warn!("Shutdown finished with errors: {}", e),
        Err(_) => warn!("Shutdown timed out after {:?}", shutdown_timeout),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }
    log_configuration(&config);

    let outcome = if args.dry_run {
        info!("Configuration is valid");
        Ok(ExitCode::SUCCESS)
    } else if args.health_check {
        health_check(config).await
    } else {
        serve(config, args.console).await.map(|()| ExitCode::SUCCESS)
    };

    outcome.unwrap_or_else(|e| {
        error!("{:#}", e);
        ExitCode::FAILURE
    })
}
