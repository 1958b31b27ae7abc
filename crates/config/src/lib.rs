//! Fleet Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use fleet_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[producer]\nport = 9090").unwrap();
//! assert_eq!(config.producer.port, 9090);
//! ```
//!
//! # Example Minimal Config
//!
//! ```toml
//! [route]
//! origin = "12.9784,77.6408"
//! destination = "12.9308,77.5839"
//! ```
//!
//! # Example Full Config
//!
//! See `configs/fleet.toml` for all available options.

mod broker;
mod consumer;
mod error;
mod logging;
mod producer;
mod route;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use broker::{BrokerConfig, StartOffset};
pub use consumer::ConsumerConfig;
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use producer::ProducerConfig;
pub use route::{RouteConfig, TravelMode};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Broker topic shared by producer and consumer
    pub broker: BrokerConfig,

    /// Producer side (route replay + producer HTTP API)
    pub producer: ProducerConfig,

    /// Default route replayed by the producer
    pub route: RouteConfig,

    /// Consumer side (cache, pull API, live push channel)
    pub consumer: ConsumerConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Checks for:
    /// - Seed and route points parse as coordinates
    /// - Non-empty topic and consumer group
    /// - Positive pacing interval
    /// - Port conflicts between the producer and consumer listeners
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::str::FromStr;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.broker.topic, "fleet-location");
        assert_eq!(config.broker.group, "user-group");
        assert_eq!(config.producer.seed, "12.9784, 77.6408");
        assert_eq!(config.producer.interval, Duration::from_secs(1));
        assert_eq!(config.route.mode, TravelMode::Driving);
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[log]
level = "debug"
format = "json"

[broker]
topic = "vehicle-7"
group = "dashboards"
start = "latest"
retention = 500

[producer]
port = 9000
interval = "250ms"
seed = "0.0, 0.0"
replay_on_start = true

[route]
origin = "12.9784,77.6408"
destination = "12.9308,77.5839"
waypoints = ["12.95,77.60"]
mode = "walking"
points_per_leg = 4

[consumer]
port = 9001
live_port = 9002
max_listeners = 10
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.broker.topic, "vehicle-7");
        assert_eq!(config.broker.start, StartOffset::Latest);
        assert_eq!(config.broker.retention, 500);
        assert_eq!(config.producer.port, 9000);
        assert_eq!(config.producer.interval, Duration::from_millis(250));
        assert!(config.producer.replay_on_start);
        assert_eq!(config.route.waypoints.len(), 1);
        assert_eq!(config.route.mode, TravelMode::Walking);
        assert_eq!(config.route.points_per_leg, 4);
        assert_eq!(config.consumer.live_port, 9002);
        assert_eq!(config.consumer.max_listeners, 10);
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("invalid { toml");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation_runs_on_parse() {
        let result = Config::from_str("[producer]\nseed = \"not a coordinate\"");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[broker]\ntopic = \"from-file\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.broker.topic, "from-file");
    }

    #[test]
    fn test_from_missing_file() {
        let result = Config::from_file("/nonexistent/fleet.toml");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let config = Config::from_str(include_str!("../../../configs/fleet.toml")).unwrap();
        let defaults = Config::default();

        assert_eq!(config.broker.topic, defaults.broker.topic);
        assert_eq!(config.broker.retention, defaults.broker.retention);
        assert_eq!(config.producer.port, defaults.producer.port);
        assert_eq!(config.producer.interval, defaults.producer.interval);
        assert_eq!(config.producer.seed, defaults.producer.seed);
        assert_eq!(config.route.points_per_leg, defaults.route.points_per_leg);
        assert_eq!(config.consumer.live_port, defaults.consumer.live_port);
        assert_eq!(config.log.output, LogOutput::Stdout);
    }
}
