//! Frame distribution engine
//!
//! Fans each ingested frame out to zero or more outbound channels while the
//! streaming flag is set. Three channel kinds exist, each encoding the frame
//! once per frame and offering the shared encoding to every attached
//! subscription:
//!
//! ```text
//!                         StreamEngine
//!                     ┌──────────────────┐
//!   hardware frame ──►│ state: Idle ⇄    │
//!                     │        Streaming │
//!                     └───────┬──────────┘
//!             ┌───────────────┼───────────────┐
//!             ▼               ▼               ▼
//!          [Raw]         [Compressed]     [Preview]
//!        mono16 once      PNG once       fast PNG once
//!             │               │               │
//!        subscriptions   subscriptions   subscriptions
//!        (backlog 2,     (backlog 2,     (backlog 2,
//!         drop oldest)    drop oldest)    drop oldest)
//! ```
//!
//! Encoding happens at most once per channel kind per frame, and only when
//! at least one attached subscription wants that frame; the resulting
//! `EncodedImage` payload is refcounted, so offering it to N subscriptions
//! shares one allocation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::device::config::CameraConfig;
use crate::frame::{FrameCodec, PngCompression, RawFrame};

use super::error::StreamError;
use super::subscription::{Subscription, SubscriptionInner};

/// Streaming on/off flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamingState {
    /// Not distributing frames
    Idle,
    /// Distributing every ingested frame
    Streaming,
}

/// The three outbound channel kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Uncompressed mono16 frames
    Raw,
    /// Full-quality PNG frames
    Compressed,
    /// Lower-effort PNG frames for preview consumers
    Preview,
}

impl ChannelKind {
    /// All channel kinds
    pub const ALL: [ChannelKind; 3] = [
        ChannelKind::Raw,
        ChannelKind::Compressed,
        ChannelKind::Preview,
    ];

    fn index(&self) -> usize {
        match self {
            ChannelKind::Raw => 0,
            ChannelKind::Compressed => 1,
            ChannelKind::Preview => 2,
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChannelKind::Raw => "raw",
            ChannelKind::Compressed => "compressed",
            ChannelKind::Preview => "preview",
        };
        f.write_str(name)
    }
}

/// One outbound channel's attached subscriptions
struct Channel {
    kind: ChannelKind,
    subs: Mutex<Vec<Arc<SubscriptionInner>>>,
}

impl Channel {
    fn new(kind: ChannelKind) -> Self {
        Self {
            kind,
            subs: Mutex::new(Vec::new()),
        }
    }

    fn detach(&self, inner: &Arc<SubscriptionInner>) {
        let mut subs = self.subs.lock().unwrap();
        subs.retain(|s| !Arc::ptr_eq(s, inner));
    }
}

/// Multi-consumer frame distribution engine
pub struct StreamEngine {
    state: Mutex<StreamingState>,
    channels: [Arc<Channel>; 3],
    backlog: usize,
    full_compression: PngCompression,
    preview_compression: PngCompression,
    max_downsample: u32,
    next_id: AtomicU64,
}

impl StreamEngine {
    /// Create an engine in the `Idle` state
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            state: Mutex::new(StreamingState::Idle),
            channels: [
                Arc::new(Channel::new(ChannelKind::Raw)),
                Arc::new(Channel::new(ChannelKind::Compressed)),
                Arc::new(Channel::new(ChannelKind::Preview)),
            ],
            backlog: config.backlog,
            full_compression: config.full_compression,
            preview_compression: config.preview_compression,
            max_downsample: config.max_downsample,
            next_id: AtomicU64::new(1),
        }
    }

    /// Begin distributing frames
    ///
    /// Fails with `AlreadyStreaming` (state unchanged) when already on.
    pub fn start(&self) -> Result<(), StreamError> {
        let mut state = self.state.lock().unwrap();
        if *state == StreamingState::Streaming {
            return Err(StreamError::AlreadyStreaming);
        }
        *state = StreamingState::Streaming;
        tracing::info!("Streaming started");
        Ok(())
    }

    /// Stop distributing frames
    ///
    /// Fails with `NotStreaming` (state unchanged) when already off.
    /// Frames mid-encode at this moment may still reach already-attached
    /// subscriptions; nothing new is offered once idle.
    pub fn stop(&self) -> Result<(), StreamError> {
        let mut state = self.state.lock().unwrap();
        if *state == StreamingState::Idle {
            return Err(StreamError::NotStreaming);
        }
        *state = StreamingState::Idle;
        tracing::info!("Streaming stopped");
        Ok(())
    }

    /// Current streaming state
    pub fn state(&self) -> StreamingState {
        *self.state.lock().unwrap()
    }

    /// Whether the engine is distributing frames
    pub fn is_streaming(&self) -> bool {
        self.state() == StreamingState::Streaming
    }

    /// Attach a consumer to a channel with the default backlog capacity
    pub fn attach(&self, kind: ChannelKind) -> Subscription {
        self.attach_with_capacity(kind, self.backlog)
    }

    /// Attach a consumer to a channel with a specific backlog capacity
    pub fn attach_with_capacity(&self, kind: ChannelKind, capacity: usize) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::new(SubscriptionInner::new(
            id,
            kind,
            capacity,
            self.max_downsample,
        ));

        let channel = self.channels[kind.index()].clone();
        channel.subs.lock().unwrap().push(inner.clone());

        tracing::info!(
            channel = %kind,
            subscription = id,
            capacity,
            subscribers = channel.subs.lock().unwrap().len(),
            "Subscriber attached"
        );

        let detach_channel = channel.clone();
        Subscription::new(
            inner,
            Box::new(move |inner| {
                detach_channel.detach(inner);
                tracing::debug!(
                    channel = %detach_channel.kind,
                    subscription = inner.id,
                    "Subscriber detached"
                );
            }),
        )
    }

    /// Number of consumers attached to a channel
    pub fn subscriber_count(&self, kind: ChannelKind) -> usize {
        self.channels[kind.index()].subs.lock().unwrap().len()
    }

    /// Fan one frame out to every eligible subscription
    ///
    /// No-op while idle. Called from the hardware-callback thread: per
    /// subscription this is bounded, constant-time queue manipulation.
    pub fn distribute(&self, frame: &RawFrame, codec: &FrameCodec) {
        if !self.is_streaming() {
            return;
        }

        for channel in &self.channels {
            let eligible: Vec<Arc<SubscriptionInner>> = {
                let subs = channel.subs.lock().unwrap();
                subs.iter()
                    .filter(|s| s.wants(frame.seqno))
                    .cloned()
                    .collect()
            };
            if eligible.is_empty() {
                continue;
            }

            // Encode once per channel kind; every subscription shares it.
            let encoded = match channel.kind {
                ChannelKind::Raw => codec.encode_raw(frame),
                ChannelKind::Compressed => codec.encode_png(frame, self.full_compression),
                ChannelKind::Preview => codec.encode_png(frame, self.preview_compression),
            };
            let image = match encoded {
                Ok(image) => image,
                Err(err) => {
                    // Fatal to this frame on this channel only
                    tracing::warn!(
                        channel = %channel.kind,
                        seqno = frame.seqno,
                        error = %err,
                        "Dropping frame: encoding failed"
                    );
                    continue;
                }
            };

            for sub in eligible {
                if sub.offer(image.clone()) {
                    tracing::debug!(
                        channel = %channel.kind,
                        subscription = sub.id,
                        seqno = frame.seqno,
                        "Backlog full, shed oldest packet"
                    );
                }
            }
        }
    }

    /// Close every subscription so blocked consumers drain and finish
    pub fn shutdown(&self) {
        for channel in &self.channels {
            let subs = channel.subs.lock().unwrap();
            for sub in subs.iter() {
                sub.close();
            }
        }
    }
}
