//! Multi-consumer frame distribution
//!
//! The distribution engine fans ingested frames out to independently-paced
//! consumers. Backpressure is resolved by shedding staleness: every
//! subscription has a small bounded backlog, and when it overflows the
//! oldest packet is dropped so the newest data always gets through. The
//! producer never blocks on a slow consumer.

pub mod backlog;
pub mod engine;
pub mod error;
pub mod subscription;

pub use backlog::Backlog;
pub use engine::{ChannelKind, StreamEngine, StreamingState};
pub use error::StreamError;
pub use subscription::{Subscription, SubscriptionStats};
