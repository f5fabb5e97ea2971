//! Notification Dispatcher boundary
//!
//! The engine only emits transition events; delivery belongs to an external
//! collaborator. Dispatch is fire-and-forget through an unbounded channel
//! drained by a spawned task, so a slow or failed consumer can never block
//! or fail a transition. The default consumer just logs.

use tokio::sync::mpsc;
use tracing::{debug, info};

use expropia_models::TransitionNotification;

#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::UnboundedSender<TransitionNotification>,
}

impl NotificationDispatcher {
    /// Dispatcher backed by a logging consumer task.
    pub fn spawn_logging() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<TransitionNotification>();

        tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                info!(
                    case_id = %notification.case_id,
                    to_stage = %notification.to_stage,
                    kind = %notification.kind,
                    department = %notification.target_department,
                    "Transition notification dispatched"
                );
            }
        });

        Self { tx }
    }

    /// Dispatcher writing into a caller-owned channel; used by tests and by
    /// integrations that bridge to a real delivery system.
    pub fn with_channel(tx: mpsc::UnboundedSender<TransitionNotification>) -> Self {
        Self { tx }
    }

    /// Never fails from the caller's point of view. A closed channel only
    /// means the consumer is gone, which is its problem, not the engine's.
    pub fn dispatch(&self, notification: TransitionNotification) {
        if self.tx.send(notification).is_err() {
            debug!("Notification consumer dropped; event discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use expropia_models::TransitionKind;
    use uuid::Uuid;

    fn notification() -> TransitionNotification {
        TransitionNotification {
            case_id: Uuid::new_v4(),
            from_stage: Some("REVIEW".to_string()),
            to_stage: "LEGAL".to_string(),
            kind: TransitionKind::Forward,
            reason: "review complete".to_string(),
            actor_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            target_department: "JURIDICO".to_string(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_reaches_consumer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = NotificationDispatcher::with_channel(tx);

        let sent = notification();
        dispatcher.dispatch(sent.clone());

        let received = rx.recv().await.unwrap();
        assert_eq!(received, sent);
    }

    #[tokio::test]
    async fn test_dispatch_survives_dropped_consumer() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let dispatcher = NotificationDispatcher::with_channel(tx);

        // Must not panic or error
        dispatcher.dispatch(notification());
    }
}
