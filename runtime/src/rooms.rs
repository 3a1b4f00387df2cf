//! Reference-counted room membership per event id.
//!
//! Several renderers (a card, a detail pane, a calendar cell) may show the
//! same event at once. The join request goes out only on the 0→1
//! transition and the leave request only on 1→0, so simultaneous
//! renderers cannot churn the room. Counts survive a disconnect: they
//! describe what is rendered, not what the channel currently knows, which
//! is exactly the set to rejoin on reconnect.

use crate::feed::PushChannel;
use mingle_core::{EngineError, EventId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Tracks how many renderers reference each event's room.
pub struct RoomLifecycle {
    channel: Arc<dyn PushChannel>,
    counts: Mutex<HashMap<EventId, usize>>,
}

impl RoomLifecycle {
    /// Creates a tracker over the given push channel.
    #[must_use]
    pub fn new(channel: Arc<dyn PushChannel>) -> Self {
        Self {
            channel,
            counts: Mutex::new(HashMap::new()),
        }
    }

    /// Registers one renderer of the event; joins the room on 0→1.
    ///
    /// # Errors
    ///
    /// Propagates the channel's join failure. The count is not bumped on
    /// failure, so a later retain retries the join.
    #[tracing::instrument(skip(self), fields(event_id = %id))]
    pub async fn retain(&self, id: &EventId) -> Result<(), EngineError> {
        let mut counts = self.counts.lock().await;
        match counts.get_mut(id) {
            Some(count) => *count += 1,
            None => {
                self.channel.join(id).await?;
                counts.insert(id.clone(), 1);
                metrics::counter!("rooms.joined").increment(1);
                tracing::debug!("joined room");
            }
        }
        Ok(())
    }

    /// Releases one renderer of the event; leaves the room on 1→0.
    ///
    /// A release without a matching retain is a logged no-op rather than
    /// an error, since a renderer may unmount after its event was already
    /// deleted remotely.
    ///
    /// # Errors
    ///
    /// Propagates the channel's leave failure; the count still drops, so
    /// a lost leave at worst keeps one extra room joined until the next
    /// reconnect resets the channel side.
    #[tracing::instrument(skip(self), fields(event_id = %id))]
    pub async fn release(&self, id: &EventId) -> Result<(), EngineError> {
        let mut counts = self.counts.lock().await;
        let Some(count) = counts.get_mut(id) else {
            tracing::warn!("release without retain");
            return Ok(());
        };
        *count -= 1;
        if *count == 0 {
            counts.remove(id);
            metrics::counter!("rooms.left").increment(1);
            tracing::debug!("left room");
            self.channel.leave(id).await?;
        }
        Ok(())
    }

    /// Re-joins every room with at least one renderer.
    ///
    /// Called after a reconnect, when the channel has forgotten all
    /// subscriptions.
    ///
    /// # Errors
    ///
    /// Returns the first join failure; remaining rooms are still
    /// attempted on the next reconnect.
    pub async fn rejoin_all(&self) -> Result<(), EngineError> {
        let counts = self.counts.lock().await;
        for id in counts.keys() {
            self.channel.join(id).await?;
        }
        tracing::info!(rooms = counts.len(), "rejoined all tracked rooms");
        Ok(())
    }

    /// The ids of every room with at least one renderer.
    pub async fn tracked(&self) -> Vec<EventId> {
        self.counts.lock().await.keys().cloned().collect()
    }

    /// The renderer count for one event. Zero when untracked.
    pub async fn ref_count(&self, id: &EventId) -> usize {
        self.counts.lock().await.get(id).copied().unwrap_or(0)
    }
}

impl std::fmt::Debug for RoomLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomLifecycle").finish_non_exhaustive()
    }
}
