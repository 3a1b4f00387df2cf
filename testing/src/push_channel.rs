//! In-memory push channel with room membership and scriptable
//! connectivity.
//!
//! Delivery mirrors the production channel: created/updated/deleted
//! notifications are global broadcasts, roster notifications are
//! delivered only to feeds whose channel joined that event's room.
//! Tests can also script a disconnect/reconnect cycle.

use futures::StreamExt;
use mingle_core::EventId;
use mingle_runtime::feed::{ChannelFuture, FeedItem, FeedStream, Notification, PushChannel};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

struct ChannelState {
    joined: Mutex<HashSet<EventId>>,
    joins: AtomicUsize,
    leaves: AtomicUsize,
}

/// A scriptable in-memory [`PushChannel`].
///
/// Clones share the same room membership and feed, like clones of a real
/// socket handle.
#[derive(Clone)]
pub struct InMemoryPushChannel {
    tx: broadcast::Sender<FeedItem>,
    state: Arc<ChannelState>,
}

impl InMemoryPushChannel {
    /// Creates a disconnected-from-nothing, connected channel.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            state: Arc::new(ChannelState {
                joined: Mutex::new(HashSet::new()),
                joins: AtomicUsize::new(0),
                leaves: AtomicUsize::new(0),
            }),
        }
    }

    /// Emits a notification as the server would.
    ///
    /// Roster notifications are dropped at delivery time for feeds whose
    /// channel has not joined the room; everything else is global.
    pub fn emit(&self, notification: Notification) {
        let _ = self.tx.send(FeedItem::Notification(notification));
    }

    /// Scripts a connection loss.
    pub fn drop_connection(&self) {
        let _ = self.tx.send(FeedItem::ConnectionLost);
    }

    /// Scripts a reconnect.
    pub fn reconnect(&self) {
        let _ = self.tx.send(FeedItem::Reconnected);
    }

    /// Whether the channel currently has the room joined.
    #[must_use]
    pub fn is_joined(&self, id: &EventId) -> bool {
        self.state
            .joined
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    /// Total join requests the channel has received.
    #[must_use]
    pub fn join_count(&self) -> usize {
        self.state.joins.load(Ordering::SeqCst)
    }

    /// Total leave requests the channel has received.
    #[must_use]
    pub fn leave_count(&self) -> usize {
        self.state.leaves.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryPushChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl PushChannel for InMemoryPushChannel {
    fn join(&self, id: &EventId) -> ChannelFuture<'_, ()> {
        let id = id.clone();
        Box::pin(async move {
            self.state
                .joined
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(id);
            self.state.joins.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn leave(&self, id: &EventId) -> ChannelFuture<'_, ()> {
        let id = id.clone();
        Box::pin(async move {
            self.state
                .joined
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id);
            self.state.leaves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn feed(&self) -> ChannelFuture<'_, FeedStream> {
        let rx = self.tx.subscribe();
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let stream = tokio_stream(rx).filter_map(move |item| {
                let state = Arc::clone(&state);
                async move {
                    match &item {
                        FeedItem::Notification(Notification::UpdateAttendees {
                            event_id, ..
                        }) => {
                            let joined = state
                                .joined
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .contains(event_id);
                            joined.then_some(item)
                        }
                        _ => Some(item),
                    }
                }
            });
            Ok(Box::pin(stream) as FeedStream)
        })
    }
}

/// Adapts a broadcast receiver into a stream, skipping lagged gaps.
fn tokio_stream(mut rx: broadcast::Receiver<FeedItem>) -> impl futures::Stream<Item = FeedItem> {
    async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(item) => yield item,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
