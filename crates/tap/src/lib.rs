//! Fleet Tap - Consumer side of the fleet relay
//!
//! Consumes the position topic into an in-memory cache and fans every
//! update out to live listeners over a TCP push channel, while answering
//! pull queries from the same cache.
//!
//! - Subscriber is the only writer of the consumer-side latest position
//! - Broadcaster holds a read handle only, never a reference back
//! - Push is fire-and-forget per listener; a slow listener drops updates
//!   for itself without holding up the others
//! - Disconnected listeners are cleaned up automatically
//!
//! # Architecture
//!
//! ```text
//! TopicConsumer ──next──→ LocationSubscriber
//!                              │
//!                              ├──set──→ PositionWriter ─ ─ ─ → PositionReader
//!                              │                                     │
//!                              └──push──→ LiveBroadcaster ◄──────────┘
//!                                             │            pull ◄── GET /location
//!                                             ▼
//!                                         ListenerSet (per-listener channels)
//!                                             │
//!                                             ▼
//!                                         LiveServer (TCP) ──→ listeners
//! ```

mod broadcaster;
pub mod codec;
mod error;
pub mod http;
pub mod listener;
mod pull;
pub mod server;
mod subscriber;

pub use broadcaster::{BroadcastStats, Fanout, LiveBroadcaster};
pub use codec::{ClientCommand, CommandCodec, MAX_COMMAND_LENGTH};
pub use error::{Result, TapError};
pub use http::ConsumerServer;
pub use listener::{BroadcastReport, ListenerSet};
pub use pull::{NO_DATA_YET, PROCESSING_FAILED, PullResponse};
pub use server::{LiveServer, PULL_COMMAND};
pub use subscriber::{
    Applied, LocationSubscriber, SubscriberMetrics, SubscriberMetricsSnapshot,
};
