//! Configuration validation
//!
//! Validates config consistency:
//! - Seed and every route point parse as `lat,lng` coordinates
//! - Topic and consumer group are non-empty
//! - Pacing interval, retention and listener limits are positive
//! - The three listeners (producer API, pull API, push channel) use distinct ports
//! - Log target overrides name a plain target

use std::collections::HashMap;

use fleet_protocol::Coordinate;

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_broker(config)?;
    validate_producer(config)?;
    validate_route(config)?;
    validate_consumer(config)?;
    validate_ports(config)?;
    validate_log(config)?;
    Ok(())
}

fn validate_broker(config: &Config) -> Result<()> {
    if config.broker.topic.trim().is_empty() {
        return Err(ConfigError::missing_field("broker", "topic"));
    }
    if config.broker.group.trim().is_empty() {
        return Err(ConfigError::missing_field("broker", "group"));
    }
    if config.broker.retention == 0 {
        return Err(ConfigError::invalid_value(
            "broker",
            "retention",
            "must keep at least one record",
        ));
    }
    Ok(())
}

fn validate_producer(config: &Config) -> Result<()> {
    if config.producer.interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "producer",
            "interval",
            "must be greater than zero",
        ));
    }
    check_coordinate("producer", "seed", &config.producer.seed)
}

fn validate_route(config: &Config) -> Result<()> {
    let route = &config.route;

    // A fixed point list replaces the simulated path entirely
    if !route.points.is_empty() {
        for (i, point) in route.points.iter().enumerate() {
            check_coordinate("route", &format!("points[{}]", i), point)?;
        }
        return Ok(());
    }

    check_coordinate("route", "origin", &route.origin)?;
    check_coordinate("route", "destination", &route.destination)?;
    for (i, waypoint) in route.waypoints.iter().enumerate() {
        check_coordinate("route", &format!("waypoints[{}]", i), waypoint)?;
    }

    if route.points_per_leg == 0 {
        return Err(ConfigError::invalid_value(
            "route",
            "points_per_leg",
            "must be at least 1",
        ));
    }

    Ok(())
}

fn validate_consumer(config: &Config) -> Result<()> {
    if config.consumer.max_listeners == 0 {
        return Err(ConfigError::invalid_value(
            "consumer",
            "max_listeners",
            "must be at least 1",
        ));
    }
    if config.consumer.listener_buffer == 0 {
        return Err(ConfigError::invalid_value(
            "consumer",
            "listener_buffer",
            "must be at least 1",
        ));
    }
    Ok(())
}

fn validate_ports(config: &Config) -> Result<()> {
    let mut ports: HashMap<u16, Vec<&str>> = HashMap::new();
    ports
        .entry(config.producer.port)
        .or_default()
        .push("producer");
    ports
        .entry(config.consumer.port)
        .or_default()
        .push("consumer");
    ports
        .entry(config.consumer.live_port)
        .or_default()
        .push("consumer.live");

    // Port 0 asks the OS for an ephemeral port, so it never conflicts
    for (port, listeners) in ports {
        if port != 0 && listeners.len() > 1 {
            return Err(ConfigError::duplicate_port(port, listeners.join(", ")));
        }
    }

    Ok(())
}

fn validate_log(config: &Config) -> Result<()> {
    for target in config.log.targets.keys() {
        if target.trim().is_empty() || target.contains([',', '=', '[', ']']) {
            return Err(ConfigError::invalid_value(
                "log",
                format!("targets.{}", target),
                "target must be a module path such as fleet_tap",
            ));
        }
    }
    Ok(())
}

fn check_coordinate(section: &'static str, field: &str, value: &str) -> Result<()> {
    value
        .parse::<Coordinate>()
        .map(|_| ())
        .map_err(|e| ConfigError::invalid_value(section, field, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_empty_topic_rejected() {
        let result = Config::from_str("[broker]\ntopic = \"\"");
        assert!(matches!(
            result,
            Err(ConfigError::MissingField {
                section: "broker",
                field: "topic"
            })
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = Config::from_str("[producer]\ninterval = \"0s\"");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_bad_waypoint_names_index() {
        let toml = r#"
[route]
waypoints = ["12.95,77.60", "oops"]
"#;
        let err = Config::from_str(toml).unwrap_err();
        assert!(err.to_string().contains("waypoints[1]"));
    }

    #[test]
    fn test_out_of_range_origin_rejected() {
        let err = Config::from_str("[route]\norigin = \"95.0,77.6\"").unwrap_err();
        assert!(err.to_string().contains("origin"));
        assert!(err.to_string().contains("latitude"));
    }

    #[test]
    fn test_fixed_points_skip_simulation_checks() {
        let toml = r#"
[route]
origin = "ignored"
points = ["1.0,2.0", "1.5,2.5"]
"#;
        assert!(Config::from_str(toml).is_ok());
    }

    #[test]
    fn test_bad_fixed_point_rejected() {
        let err = Config::from_str("[route]\npoints = [\"1.0\"]").unwrap_err();
        assert!(err.to_string().contains("points[0]"));
    }

    #[test]
    fn test_duplicate_port_rejected() {
        let toml = r#"
[producer]
port = 9000

[consumer]
live_port = 9000
"#;
        let result = Config::from_str(toml);
        assert!(matches!(
            result,
            Err(ConfigError::DuplicatePort { port: 9000, .. })
        ));
    }

    #[test]
    fn test_ephemeral_ports_allowed() {
        let toml = r#"
[producer]
port = 0

[consumer]
port = 0
live_port = 0
"#;
        assert!(Config::from_str(toml).is_ok());
    }

    #[test]
    fn test_zero_listeners_rejected() {
        let result = Config::from_str("[consumer]\nmax_listeners = 0");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_log_target_overrides() {
        let ok = Config::from_str("[log.targets]\nfleet_tap = \"debug\"");
        assert!(ok.is_ok());

        let err = Config::from_str("[log.targets]\n\"fleet_tap=trace\" = \"debug\"").unwrap_err();
        assert!(err.to_string().contains("targets.fleet_tap=trace"));
    }
}
