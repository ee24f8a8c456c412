//! Consumer subscription handles
//!
//! A `Subscription` is one consumer's attachment to an outbound channel:
//! a bounded backlog drained at the consumer's own pace, plus an optional
//! per-consumer downsample factor. Offering a packet is bounded, constant-
//! time queue manipulation; a slow consumer only ever sheds its own stale
//! packets and never affects the producer or other consumers.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::frame::EncodedImage;

use super::backlog::Backlog;
use super::engine::ChannelKind;

/// Snapshot of one subscription's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionStats {
    /// Packets currently queued
    pub queued: usize,
    /// Packets handed to the consumer
    pub delivered: u64,
    /// Packets shed to overflow
    pub dropped: u64,
    /// Current downsample factor (1 = every frame)
    pub downsample: u32,
}

/// Shared state between the engine (producer side) and the handle
pub(super) struct SubscriptionInner {
    pub(super) id: u64,
    pub(super) kind: ChannelKind,
    queue: Mutex<Backlog>,
    notify: Notify,
    downsample: AtomicU32,
    max_downsample: u32,
    delivered: AtomicU64,
    closed: AtomicBool,
}

impl SubscriptionInner {
    pub(super) fn new(id: u64, kind: ChannelKind, capacity: usize, max_downsample: u32) -> Self {
        Self {
            id,
            kind,
            queue: Mutex::new(Backlog::new(capacity)),
            notify: Notify::new(),
            downsample: AtomicU32::new(1),
            max_downsample,
            delivered: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Whether this subscription wants the frame with the given seqno
    pub(super) fn wants(&self, seqno: u64) -> bool {
        let n = self.downsample.load(Ordering::Relaxed).max(1) as u64;
        n <= 1 || seqno % n == 0
    }

    /// Queue a packet and wake the consumer
    ///
    /// Returns true if the oldest queued packet was shed to make room.
    pub(super) fn offer(&self, image: EncodedImage) -> bool {
        let dropped = self.queue.lock().unwrap().push(image);
        self.notify.notify_one();
        dropped
    }

    /// Mark the subscription closed and wake any waiting consumer
    pub(super) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
        self.notify.notify_one();
    }

    fn take(&self) -> Option<EncodedImage> {
        let image = self.queue.lock().unwrap().pop();
        if image.is_some() {
            self.delivered.fetch_add(1, Ordering::Relaxed);
        }
        image
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn stats(&self) -> SubscriptionStats {
        let queue = self.queue.lock().unwrap();
        SubscriptionStats {
            queued: queue.len(),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: queue.dropped(),
            downsample: self.downsample.load(Ordering::Relaxed),
        }
    }
}

/// One consumer's attachment to an outbound channel
///
/// Detaches from the channel on drop.
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
    detach: Box<dyn Fn(&Arc<SubscriptionInner>) + Send + Sync>,
}

impl Subscription {
    pub(super) fn new(
        inner: Arc<SubscriptionInner>,
        detach: Box<dyn Fn(&Arc<SubscriptionInner>) + Send + Sync>,
    ) -> Self {
        Self { inner, detach }
    }

    /// The channel this subscription is attached to
    pub fn kind(&self) -> ChannelKind {
        self.inner.kind
    }

    /// Wait for the next packet
    ///
    /// Packets arrive in hardware sequence order. Returns `None` once the
    /// session has shut down and the backlog is drained.
    pub async fn recv(&mut self) -> Option<EncodedImage> {
        loop {
            if let Some(image) = self.inner.take() {
                return Some(image);
            }
            if self.inner.is_closed() {
                return None;
            }
            self.inner.notify.notified().await;
        }
    }

    /// Take the next packet without waiting
    pub fn try_recv(&mut self) -> Option<EncodedImage> {
        self.inner.take()
    }

    /// Request delivery of only every Nth frame
    ///
    /// 0 and 1 both mean every frame. The factor is clamped to the
    /// session's maximum and only affects this consumer.
    pub fn set_downsample(&self, n: u32) {
        let n = n.max(1).min(self.inner.max_downsample);
        self.inner.downsample.store(n, Ordering::Relaxed);
    }

    /// Current downsample factor
    pub fn downsample(&self) -> u32 {
        self.inner.downsample.load(Ordering::Relaxed)
    }

    /// Current counters for this subscription
    pub fn stats(&self) -> SubscriptionStats {
        self.inner.stats()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        (self.detach)(&self.inner);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .finish()
    }
}
