//! `[log]` section
//!
//! Level, format and destination of the relay's own logs, plus per-target
//! overrides rendered into a single `EnvFilter` directive string.
//!
//! ```toml
//! [log]
//! level = "info"
//! format = "json"
//! output = "/var/log/fleet/relay.log"
//! http_requests = true
//!
//! [log.targets]
//! fleet_tap = "debug"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Target of the HTTP request spans emitted by both APIs
const HTTP_TRACE_TARGET: &str = "tower_http";

/// Verbosity threshold
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    /// Per-listener sends, duplicate deliveries, every published point
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive spelling understood by `EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Line format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    /// One JSON object per event, for log shippers
    Json,
}

/// Where log lines go
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Any other string is a file path, opened for append
    #[serde(untagged)]
    File(String),
}

impl LogOutput {
    /// Whether lines go to a terminal stream and may carry ANSI colours
    pub fn is_console(&self) -> bool {
        !matches!(self, Self::File(_))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,

    /// Log one span per HTTP request on the producer and consumer APIs
    pub http_requests: bool,

    /// Level overrides keyed by target, e.g. `fleet_broker = "trace"`
    pub targets: BTreeMap<String, LogLevel>,
}

impl LogConfig {
    /// Build the filter directive string
    ///
    /// `level` replaces the configured base level when given (the CLI
    /// `--log-level` flag). Per-target overrides always apply. HTTP request
    /// spans are held at `warn` unless `http_requests` is set or a target
    /// override names them.
    pub fn filter_directives(&self, level: Option<&str>) -> String {
        let mut directives = vec![level.unwrap_or(self.level.as_str()).to_string()];

        if !self.targets.contains_key(HTTP_TRACE_TARGET) {
            let http = if self.http_requests {
                LogLevel::Debug
            } else {
                LogLevel::Warn
            };
            directives.push(format!("{}={}", HTTP_TRACE_TARGET, http));
        }

        directives.extend(
            self.targets
                .iter()
                .map(|(target, level)| format!("{}={}", target, level)),
        );

        directives.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: LogConfig = toml::from_str("").unwrap();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Console);
        assert_eq!(config.output, LogOutput::Stdout);
        assert!(!config.http_requests);
        assert!(config.targets.is_empty());
    }

    #[test]
    fn test_file_output_and_targets() {
        let toml = r#"
level = "warn"
format = "json"
output = "/var/log/fleet/relay.log"

[targets]
fleet_tap = "debug"
fleet_broker = "trace"
"#;
        let config: LogConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.output, LogOutput::File("/var/log/fleet/relay.log".into()));
        assert!(!config.output.is_console());
        assert_eq!(config.targets["fleet_broker"], LogLevel::Trace);
    }

    #[test]
    fn test_filter_directives() {
        let mut config = LogConfig::default();
        assert_eq!(config.filter_directives(None), "info,tower_http=warn");
        assert_eq!(config.filter_directives(Some("debug")), "debug,tower_http=warn");

        config.http_requests = true;
        config.targets.insert("fleet_tap".into(), LogLevel::Trace);
        assert_eq!(
            config.filter_directives(None),
            "info,tower_http=debug,fleet_tap=trace"
        );
    }

    #[test]
    fn test_target_override_wins_over_http_switch() {
        let mut config = LogConfig::default();
        config.targets.insert("tower_http".into(), LogLevel::Error);
        assert_eq!(config.filter_directives(None), "info,tower_http=error");
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!(" debug ".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert!("loud".parse::<LogLevel>().is_err());
        assert!(LogLevel::Trace < LogLevel::Error);
    }
}
