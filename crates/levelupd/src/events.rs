//! Change notification feed
//!
//! Stands in for the managed pub/sub-over-database-changes feature the
//! hosted backend provided: after every committed mutation the daemon
//! publishes a [`ChangeEvent`] on a broadcast channel. Subscribers re-fetch
//! what they care about; the progression engine itself stays synchronous
//! and knows nothing about events.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Which table a committed mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedTable {
    Profiles,
    Habits,
    Completions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub user_id: Uuid,
    pub table: ChangedTable,
}

/// Broadcast wrapper. Publishing with no subscribers is fine.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, user_id: Uuid, table: ChangedTable) {
        // A send error only means nobody is listening right now.
        let _ = self.tx.send(ChangeEvent { user_id, table });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_see_published_events() {
        let feed = ChangeFeed::default();
        let mut rx = feed.subscribe();
        let user_id = Uuid::new_v4();

        feed.publish(user_id, ChangedTable::Completions);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.user_id, user_id);
        assert_eq!(event.table, ChangedTable::Completions);
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let feed = ChangeFeed::default();
        feed.publish(Uuid::new_v4(), ChangedTable::Profiles);
    }
}
