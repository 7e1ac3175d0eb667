use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

pub const MEMBER_REGISTERED: &str = "member:registered";
pub const MEMBER_APPROVED: &str = "member:approved";
pub const MEMBER_REJECTED: &str = "member:rejected";

const CHANNEL_CAPACITY: usize = 100;

/// Event pushed to WebSocket listeners.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberEvent {
    pub event: String,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    /// Member the event is about; member sockets only see their own events.
    pub member_id: Uuid,
}

/// Fire-and-forget sink for member lifecycle events. Implementations log
/// delivery problems and never report them to the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, event: &str, member_id: Uuid, data: serde_json::Value);
}

#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<MemberEvent>,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MemberEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn publish(&self, event: &str, member_id: Uuid, data: serde_json::Value) {
        let message = MemberEvent {
            event: event.to_string(),
            data,
            timestamp: Utc::now(),
            member_id,
        };

        match self.sender.send(message) {
            Ok(listeners) => tracing::info!(
                "Published {} for member {} to {} listener(s)",
                event,
                member_id,
                listeners
            ),
            Err(_) => tracing::debug!("No listeners for {}, dropping event", event),
        }
    }
}
