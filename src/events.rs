use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

const FEED_CAPACITY: usize = 256;

/// Invalidation signal. Carries which aggregate changed and how, never the
/// changed row itself. Subscribers re-query on receipt.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeEvent {
    pub resource: &'static str,
    pub action: &'static str,
    pub id: Option<Uuid>,
}

#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    /// Best-effort broadcast. A send with no live subscribers is not an error.
    pub fn publish(&self, resource: &'static str, action: &'static str, id: Option<Uuid>) {
        let _ = self.tx.send(ChangeEvent {
            resource,
            action,
            id,
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
