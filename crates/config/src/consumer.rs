//! Consumer configuration
//!
//! Settings for the pull API and the live push channel.

use serde::Deserialize;

/// Consumer configuration
///
/// # Example
///
/// ```toml
/// [consumer]
/// host = "0.0.0.0"        # default
/// port = 8081             # default, pull API
/// live_port = 8082        # default, push channel
/// max_listeners = 100     # default
/// listener_buffer = 256   # default, queued updates per listener
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Host to bind both consumer listeners to
    /// Default: "0.0.0.0"
    pub host: String,

    /// Port for the consumer pull API
    /// Default: 8081
    pub port: u16,

    /// Port for the live push channel
    /// Default: 8082
    pub live_port: u16,

    /// Maximum number of concurrently connected live listeners
    /// Default: 100
    pub max_listeners: usize,

    /// Updates queued per listener before further pushes to it are dropped
    /// Default: 256
    pub listener_buffer: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8081,
            live_port: 8082,
            max_listeners: 100,
            listener_buffer: 256,
        }
    }
}

impl ConsumerConfig {
    /// Address the pull API binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Address the live push channel binds to
    pub fn live_address(&self) -> String {
        format!("{}:{}", self.host, self.live_port)
    }
}
