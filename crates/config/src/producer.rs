//! Producer configuration
//!
//! Settings for the route replay loop and the producer HTTP API.

use std::time::Duration;

use serde::Deserialize;

/// Producer configuration
///
/// # Example
///
/// ```toml
/// [producer]
/// host = "0.0.0.0"                            # default
/// port = 8080                                 # default
/// interval = "1s"                             # default, delay between publishes
/// seed = "12.9784, 77.6408"                   # default, reported before any replay
/// cors_origin = "http://localhost:3000"       # default
/// replay_on_start = false                     # default
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Host to bind the producer API to
    /// Default: "0.0.0.0"
    pub host: String,

    /// Port for the producer API
    /// Default: 8080
    pub port: u16,

    /// Pacing interval between two publishes of a replay
    /// Default: 1s
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Last known position reported before the first replay, returned verbatim
    /// Default: "12.9784, 77.6408"
    pub seed: String,

    /// Browser origin allowed to call the producer API
    /// Default: "http://localhost:3000"
    pub cors_origin: String,

    /// Replay the default route once when the server starts
    /// Default: false
    pub replay_on_start: bool,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            interval: Duration::from_secs(1),
            seed: fleet_protocol::DEFAULT_SEED_LOCATION.into(),
            cors_origin: "http://localhost:3000".into(),
            replay_on_start: false,
        }
    }
}

impl ProducerConfig {
    /// Address the producer API binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProducerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.seed, "12.9784, 77.6408");
        assert_eq!(config.cors_origin, "http://localhost:3000");
        assert!(!config.replay_on_start);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_humantime_interval() {
        let config: ProducerConfig = toml::from_str("interval = \"1500ms\"").unwrap();
        assert_eq!(config.interval, Duration::from_millis(1500));
    }
}
