//! Notification side-channel events.
//!
//! Notification delivery is best-effort: whatever happens while creating one is
//! reported here as a typed event instead of being returned to the caller of
//! the triggering follow/like/comment.

use armed_db::entities::notification::NotificationType;
use serde::Serialize;
use std::sync::Mutex;
use uuid::Uuid;

/// Why the recipient of a LIKE/COMMENT notification could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    TrackMissing,
    ProjectMissing,
    OwnerMissing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    Created {
        notification_id: Uuid,
        kind: NotificationType,
        recipient_id: Uuid,
        actor_id: Uuid,
        target_id: Option<Uuid>,
    },
    /// Actor and recipient are the same user; nothing stored.
    SelfSuppressed {
        kind: NotificationType,
        actor_id: Uuid,
    },
    RecipientUnresolved {
        kind: NotificationType,
        actor_id: Uuid,
        track_id: Uuid,
        reason: UnresolvedReason,
    },
    /// The notification write failed. The triggering action already succeeded.
    DeliveryFailed {
        kind: NotificationType,
        actor_id: Uuid,
        /// Known up front only for FOLLOW
        recipient_id: Option<Uuid>,
        target_id: Option<Uuid>,
        error: String,
    },
}

impl NotificationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            NotificationEvent::Created { .. } => "created",
            NotificationEvent::SelfSuppressed { .. } => "self_suppressed",
            NotificationEvent::RecipientUnresolved { .. } => "recipient_unresolved",
            NotificationEvent::DeliveryFailed { .. } => "delivery_failed",
        }
    }
}

/// Receiver for notification events. Injected into the notifier.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &NotificationEvent);
}

/// Default sink: one structured `tracing` record per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &NotificationEvent) {
        match event {
            NotificationEvent::Created {
                notification_id,
                kind,
                recipient_id,
                actor_id,
                ..
            } => tracing::info!(
                event = event.name(),
                %notification_id,
                %kind,
                %recipient_id,
                %actor_id,
                "notification created"
            ),
            NotificationEvent::SelfSuppressed { kind, actor_id } => tracing::debug!(
                event = event.name(),
                %kind,
                %actor_id,
                "self-notification skipped"
            ),
            NotificationEvent::RecipientUnresolved {
                kind,
                actor_id,
                track_id,
                reason,
            } => tracing::warn!(
                event = event.name(),
                %kind,
                %actor_id,
                %track_id,
                ?reason,
                "notification recipient could not be resolved"
            ),
            NotificationEvent::DeliveryFailed {
                kind,
                actor_id,
                recipient_id,
                target_id,
                error,
            } => tracing::error!(
                event = event.name(),
                %kind,
                %actor_id,
                ?recipient_id,
                ?target_id,
                %error,
                "notification delivery failed"
            ),
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<NotificationEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events emitted so far.
    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|e| e.name() == name).count()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &NotificationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
