use serde::Serialize;
use tokio::sync::broadcast;
use utoipa::ToSchema;

/// Names the collection a committed write touched. Subscribers refetch the
/// snapshot they care about; events carry ids, not payloads, so a lagging
/// subscriber never acts on stale data.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "collection")]
pub enum ChangeEvent {
    #[serde(rename = "users")]
    Users { id: String },
    #[serde(rename = "schedules")]
    Schedules { user_id: String },
    #[serde(rename = "swapRequests")]
    SwapRequests { id: String },
    #[serde(rename = "leaveRequests")]
    LeaveRequests { id: String },
}

/// Live-subscription channel shared by the store and both engines.
/// Dropping the receiver unsubscribes.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        ChangeFeed { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// A send with no live subscribers is not an error.
    pub(crate) fn publish(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        ChangeFeed::new(256)
    }
}
