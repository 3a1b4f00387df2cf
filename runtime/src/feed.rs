//! The change-feed subscriber: asynchronous broadcast notifications from
//! the push channel, translated 1:1 into mutations.
//!
//! The push channel delivers at-least-once and without ordering across
//! topics; the engine's idempotent mutation variants absorb both. On
//! connection loss every per-event subscription is considered gone: the
//! subscriber marks connectivity degraded, and on reconnect it rejoins
//! every tracked room and raises a reload signal, because missed
//! notifications cannot be recovered any other way.

use crate::engine::{ConnectionStatus, Engine};
use crate::rooms::RoomLifecycle;
use futures::{Stream, StreamExt};
use mingle_core::{EngineError, Event, EventId, MutationEvent, Participant};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::watch;

/// A broadcast notification from the push channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    /// Another client created an event.
    NewEvent(Event),
    /// Another client edited an event; the payload is the full result.
    UpdateEvent(Event),
    /// A roster changed on a joined room.
    #[serde(rename_all = "camelCase")]
    UpdateAttendees {
        /// The affected event
        event_id: EventId,
        /// The full new roster
        attendees: Vec<Participant>,
    },
    /// An event was deleted.
    ///
    /// A struct variant: the internal `type` tag cannot sit alongside a
    /// bare string payload.
    #[serde(rename_all = "camelCase")]
    DeleteEvent {
        /// The removed event
        event_id: EventId,
    },
}

impl Notification {
    /// Translates the notification into its mutation.
    #[must_use]
    pub fn into_mutation(self) -> MutationEvent {
        match self {
            Self::NewEvent(event) => MutationEvent::Created(event),
            Self::UpdateEvent(event) => MutationEvent::Replaced(event),
            Self::UpdateAttendees {
                event_id,
                attendees,
            } => MutationEvent::AttendanceChanged {
                id: event_id,
                roster: attendees,
            },
            Self::DeleteEvent { event_id } => MutationEvent::Deleted(event_id),
        }
    }
}

/// One item on the feed: a notification or a connectivity transition.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedItem {
    /// A broadcast notification.
    Notification(Notification),
    /// The channel dropped; subscriptions are lost.
    ConnectionLost,
    /// The channel is back; rooms must be rejoined and state reloaded.
    Reconnected,
}

/// Stream of feed items from a push channel.
pub type FeedStream = Pin<Box<dyn Stream<Item = FeedItem> + Send>>;

/// Boxed future returned by [`PushChannel`] methods.
pub type ChannelFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, EngineError>> + Send + 'a>>;

/// The push channel: per-event topic membership plus a notification
/// stream.
///
/// Transport details (reconnect backoff, framing) live behind this trait;
/// the engine only relies on the delivery contract: at-least-once,
/// unordered across topics.
pub trait PushChannel: Send + Sync {
    /// Joins the topic for one event id.
    fn join(&self, id: &EventId) -> ChannelFuture<'_, ()>;

    /// Leaves the topic for one event id.
    fn leave(&self, id: &EventId) -> ChannelFuture<'_, ()>;

    /// Opens the feed of notifications and connectivity transitions.
    fn feed(&self) -> ChannelFuture<'_, FeedStream>;
}

/// Consumes the push-channel feed and drives the engine.
pub struct FeedSubscriber {
    engine: Engine,
    channel: Arc<dyn PushChannel>,
    rooms: Arc<RoomLifecycle>,
    reload_tx: watch::Sender<u64>,
}

impl FeedSubscriber {
    /// Creates a subscriber over the given channel and room tracker.
    #[must_use]
    pub fn new(engine: Engine, channel: Arc<dyn PushChannel>, rooms: Arc<RoomLifecycle>) -> Self {
        let (reload_tx, _) = watch::channel(0);
        Self {
            engine,
            channel,
            rooms,
            reload_tx,
        }
    }

    /// Subscribes to the reload signal.
    ///
    /// The counter increments after every reconnect; the owner of the
    /// gateway should respond with a bulk reload
    /// ([`Gateway::load_all`](crate::gateway::Gateway::load_all)).
    #[must_use]
    pub fn reload_signal(&self) -> watch::Receiver<u64> {
        self.reload_tx.subscribe()
    }

    /// Runs the feed loop until the stream ends.
    ///
    /// # Errors
    ///
    /// Returns the error from opening the feed; items on an open feed
    /// never abort the loop.
    #[tracing::instrument(skip(self))]
    pub async fn run(self) -> Result<(), EngineError> {
        let mut feed = self.channel.feed().await?;
        while let Some(item) = feed.next().await {
            self.handle(item).await;
        }
        tracing::info!("change feed ended");
        Ok(())
    }

    /// Spawns the feed loop as a task.
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<(), EngineError>> {
        tokio::spawn(self.run())
    }

    async fn handle(&self, item: FeedItem) {
        match item {
            FeedItem::Notification(notification) => {
                metrics::counter!("feed.notifications").increment(1);
                self.engine.apply(notification.into_mutation()).await;
            }
            FeedItem::ConnectionLost => {
                metrics::counter!("feed.disconnects").increment(1);
                tracing::warn!("push channel lost; remote mutations are being missed");
                self.engine.set_connection_status(ConnectionStatus::Degraded);
            }
            FeedItem::Reconnected => {
                tracing::info!("push channel restored; rejoining rooms");
                if let Err(error) = self.rooms.rejoin_all().await {
                    // Leave status degraded; the next reconnect retries.
                    tracing::error!(%error, "failed to rejoin rooms after reconnect");
                    return;
                }
                self.engine.set_connection_status(ConnectionStatus::Connected);
                self.reload_tx.send_modify(|n| *n += 1);
            }
        }
    }
}

impl std::fmt::Debug for FeedSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSubscriber").finish_non_exhaustive()
    }
}
