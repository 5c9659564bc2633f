//! Session event broadcaster for real-time status streaming.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// What happened.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    Imported,
    FileAttached,
    FileRemoved,
    PositionPlaced,
    OrderSaved,
    SaveFailed,
    SessionCompleted,
    SessionAbandoned,
    SettingsSaved,
}

impl std::fmt::Display for SessionEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEventKind::Imported => write!(f, "Imported"),
            SessionEventKind::FileAttached => write!(f, "File attached"),
            SessionEventKind::FileRemoved => write!(f, "File removed"),
            SessionEventKind::PositionPlaced => write!(f, "Position placed"),
            SessionEventKind::OrderSaved => write!(f, "Order saved"),
            SessionEventKind::SaveFailed => write!(f, "Save failed"),
            SessionEventKind::SessionCompleted => write!(f, "Session completed"),
            SessionEventKind::SessionAbandoned => write!(f, "Session abandoned"),
            SessionEventKind::SettingsSaved => write!(f, "Settings saved"),
        }
    }
}

/// One event on the session stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEvent {
    /// Unique event identifier.
    pub id: String,
    pub kind: SessionEventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Human-readable description.
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl SessionEvent {
    pub fn new(kind: SessionEventKind, message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            session_id: None,
            order_id: None,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn for_session(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    pub fn for_order(mut self, order_id: &str) -> Self {
        self.order_id = Some(order_id.to_string());
        self
    }
}

/// Broadcasts session events to any number of subscribers.
#[derive(Clone)]
pub struct SessionEventBroadcaster {
    sender: Arc<broadcast::Sender<SessionEvent>>,
}

impl SessionEventBroadcaster {
    /// Creates a broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends an event to all subscribers.
    pub fn send(&self, event: SessionEvent) {
        // No active receivers is fine.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SessionEventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_without_subscribers_is_fine() {
        let broadcaster = SessionEventBroadcaster::new(4);
        broadcaster.send(SessionEvent::new(SessionEventKind::Imported, "nobody listens"));
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[test]
    fn test_send_receive() {
        let broadcaster = SessionEventBroadcaster::new(4);
        let mut rx = broadcaster.subscribe();

        broadcaster.send(
            SessionEvent::new(SessionEventKind::OrderSaved, "Saved 2 files")
                .for_session("s-1")
                .for_order("o-1"),
        );

        let received = rx.try_recv().unwrap();
        assert_eq!(received.kind, SessionEventKind::OrderSaved);
        assert_eq!(received.session_id.as_deref(), Some("s-1"));
        assert_eq!(received.order_id.as_deref(), Some("o-1"));
        assert_eq!(received.message, "Saved 2 files");
    }

    #[test]
    fn test_clones_share_channel() {
        let broadcaster = SessionEventBroadcaster::default();
        let clone = broadcaster.clone();
        let mut rx = broadcaster.subscribe();

        clone.send(SessionEvent::new(SessionEventKind::SessionCompleted, "done"));
        assert_eq!(rx.try_recv().unwrap().kind, SessionEventKind::SessionCompleted);
    }

    #[test]
    fn test_event_serializes_camel_case() {
        let event = SessionEvent::new(SessionEventKind::SaveFailed, "boom").for_order("o-9");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "save_failed");
        assert_eq!(json["orderId"], "o-9");
        assert!(json.get("sessionId").is_none());
    }
}
