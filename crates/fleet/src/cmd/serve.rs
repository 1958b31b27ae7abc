//! Serve command - Run the fleet relay
//!
//! Runs both halves of the relay in one process, joined by an in-memory
//! topic:
//!
//! - producer API (`GET`/`PUT /location`) driving route replays
//! - location subscriber feeding the consumer-side cache
//! - consumer API (`GET /location`) and the TCP live push channel

use std::fmt::Display;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use fleet_broker::{MemoryBroker, TopicName};
use fleet_config::Config;
use fleet_producer::{ProducerServer, Publisher, RouteSpec, route_source_from_config};
use fleet_protocol::{Location, latest_position};
use fleet_tap::{ConsumerServer, LiveBroadcaster, LiveServer, LocationSubscriber};

/// Config files tried in order when `--config` is not given
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["configs/fleet.toml", "fleet.toml"];

/// How long each service gets to stop after cancellation
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Serve command arguments
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Filled from the global `--config` flag
    #[arg(skip)]
    pub config: Option<PathBuf>,
}

/// Configuration plus the file it came from
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    /// `None` when running on defaults
    pub path: Option<PathBuf>,
}

/// Load configuration
///
/// An explicit path must exist. Without one, the default paths are tried
/// and built-in defaults are used if none exists.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        let config = Config::from_file(path).context("failed to load configuration")?;
        return Ok(LoadedConfig {
            config,
            path: Some(path.to_path_buf()),
        });
    }

    for candidate in DEFAULT_CONFIG_PATHS {
        let path = Path::new(candidate);
        if path.exists() {
            let config = Config::from_file(path).context("failed to load configuration")?;
            return Ok(LoadedConfig {
                config,
                path: Some(path.to_path_buf()),
            });
        }
    }

    Ok(LoadedConfig {
        config: Config::default(),
        path: None,
    })
}

/// Run the serve command
pub async fn run(loaded: LoadedConfig) -> Result<()> {
    let config_path = loaded
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(defaults)".to_string());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        config = %config_path,
        "fleet relay starting"
    );

    if let Err(e) = run_relay(loaded.config).await {
        error!(error = %e, "relay error");
        return Err(e);
    }

    info!("fleet relay shutdown complete");
    Ok(())
}

/// Compose and run every service until a signal or a service failure
async fn run_relay(config: Config) -> Result<()> {
    // Create cancellation token for coordinated shutdown
    let cancel = CancellationToken::new();

    let topic = TopicName::new(config.broker.topic.as_str());
    let broker = Arc::new(MemoryBroker::new(&config.broker));

    // Consumer side: subscriber owns the cache writer, broadcaster reads it
    let (writer, reader) = latest_position();
    let broadcaster = Arc::new(LiveBroadcaster::new(reader, &config.consumer));
    let subscriber = LocationSubscriber::new(writer, broadcaster.clone());
    let subscriber_metrics = subscriber.metrics();
    let consumer = broker.subscribe(&topic, &config.broker.group);

    let live_server = LiveServer::bind(&config.consumer.live_address(), Arc::clone(&broadcaster))
        .await
        .context("failed to start live push channel")?;

    let mut tasks = vec![
        (
            "subscriber",
            spawn_service("subscriber", cancel.clone(), subscriber.run(consumer, cancel.clone())),
        ),
        ("live channel", spawn_service("live channel", cancel.clone(), live_server.run(cancel.clone()))),
        (
            "consumer API",
            spawn_service(
                "consumer API",
                cancel.clone(),
                ConsumerServer::new(&config.consumer, Arc::clone(&broadcaster), subscriber_metrics)
                    .run(cancel.clone()),
            ),
        ),
    ];
    let maintenance = broadcaster.spawn_maintenance(cancel.clone());

    // Producer side
    let routes = route_source_from_config(&config.route).context("invalid route source")?;
    let route = RouteSpec::from_config(&config.route).context("invalid route")?;
    let publisher = Arc::new(Publisher::new(
        routes,
        broker.clone(),
        topic.clone(),
        config.producer.interval,
        Location::new(config.producer.seed.as_str()),
    ));

    tasks.push((
        "producer API",
        spawn_service(
            "producer API",
            cancel.clone(),
            ProducerServer::new(&config.producer, Arc::clone(&publisher), route.clone())
                .run(cancel.clone()),
        ),
    ));

    if config.producer.replay_on_start {
        let replay = publisher.spawn_replay(route);
        tokio::spawn(async move {
            match replay.await {
                Ok(Ok(report)) => info!(published = report.published, "startup replay finished"),
                Ok(Err(e)) => warn!(error = %e, "startup replay failed"),
                Err(e) => warn!(error = %e, "startup replay task panicked"),
            }
        });
    }

    info!(
        topic = %topic,
        group = %config.broker.group,
        producer = %config.producer.bind_address(),
        consumer = %config.consumer.bind_address(),
        live = %config.consumer.live_address(),
        "fleet relay running"
    );

    // Wait for a shutdown signal, or for a service to fail and cancel the rest
    let failed = tokio::select! {
        _ = wait_for_shutdown() => {
            info!("shutdown signal received, stopping relay...");
            false
        }
        _ = cancel.cancelled() => true,
    };

    // Signal all components to stop via cancellation token
    cancel.cancel();

    for (name, task) in tasks {
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(service = name, error = %e, "service panicked during shutdown"),
            Err(_) => warn!(service = name, "service did not stop within timeout"),
        }
    }
    maintenance.abort();

    let stats = broadcaster.stats();
    let replays = publisher.metrics();
    info!(
        published = replays.published,
        pushes = stats.push_count,
        pulls = stats.pull_count,
        "relay stopped"
    );

    if failed {
        anyhow::bail!("relay stopped after a service failure");
    }
    Ok(())
}

/// Spawn a long-running service; its failure cancels every other service
fn spawn_service<F, E>(name: &'static str, cancel: CancellationToken, service: F) -> JoinHandle<()>
where
    F: Future<Output = std::result::Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = service.await {
            error!(service = name, error = %e, "service failed");
            cancel.cancel();
        }
    })
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/fleet.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn test_explicit_config_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.toml");
        std::fs::write(&path, "[producer]\nport = 9090\n\n[broker]\ntopic = \"trucks\"\n").unwrap();

        let loaded = load_config(Some(&path)).unwrap();

        assert_eq!(loaded.config.producer.port, 9090);
        assert_eq!(loaded.config.broker.topic, "trucks");
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_invalid_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.toml");
        std::fs::write(&path, "[producer]\ninterval = \"0s\"\n").unwrap();

        assert!(load_config(Some(&path)).is_err());
    }
}
