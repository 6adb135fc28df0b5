//! In-process fan-out of order changes to the kitchen, display and cashier
//! monitors.
//!
//! ```text
//! order_service (create / status / payment / reset)
//!       │ OrderEvent
//!       ▼
//! LiveOrderHub ── broadcast ──▶ one WebSocket session per monitor
//!                                 (filters by status, resends snapshot)
//! ```

use serde::Serialize;
use tokio::sync::broadcast;

use crate::{domain::status::OrderStatus, models::Order};

/// Broadcast capacity; a monitor that falls further behind resyncs from storage.
const BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum OrderEvent {
    Created(Box<Order>),
    Updated {
        order: Box<Order>,
        previous: OrderStatus,
    },
    /// Orders were bulk-deleted by a reset.
    Cleared,
    /// The server is stopping; sessions close their socket.
    Shutdown,
}

impl OrderEvent {
    /// Whether a monitor showing `statuses` has to redraw.
    pub fn touches(&self, statuses: &[OrderStatus]) -> bool {
        match self {
            OrderEvent::Created(order) => statuses.contains(&order.status),
            OrderEvent::Updated { order, previous } => {
                statuses.contains(&order.status) || statuses.contains(previous)
            }
            OrderEvent::Cleared => true,
            OrderEvent::Shutdown => false,
        }
    }

    /// Why a snapshot is resent, or `None` when the event ends the session.
    pub fn reason(&self) -> Option<FeedReason> {
        match self {
            OrderEvent::Created(_) => Some(FeedReason::Created),
            OrderEvent::Updated { .. } => Some(FeedReason::Updated),
            OrderEvent::Cleared => Some(FeedReason::Cleared),
            OrderEvent::Shutdown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedReason {
    Initial,
    Created,
    Updated,
    Cleared,
    Resync,
}

/// Message pushed to monitors: always the full ordered list, so clients
/// simply redraw.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    Snapshot {
        reason: FeedReason,
        statuses: Vec<OrderStatus>,
        orders: Vec<Order>,
    },
    Error {
        message: String,
    },
}

#[derive(Clone)]
pub struct LiveOrderHub {
    tx: broadcast::Sender<OrderEvent>,
}

impl Default for LiveOrderHub {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }
}

impl LiveOrderHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, event: OrderEvent) {
        // send only fails when no monitor is connected
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.tx.subscribe()
    }

    /// Asks every open feed session to close.
    pub fn close_all(&self) {
        tracing::info!(sessions = self.subscriber_count(), "closing live feeds");
        self.publish(OrderEvent::Shutdown);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::status::PaymentStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn order(status: OrderStatus) -> Order {
        Order {
            id: Uuid::new_v4(),
            ticket_number: "0042".into(),
            items: Vec::new(),
            total_price: 400,
            status,
            payment_status: PaymentStatus::Unpaid,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn status_change_touches_both_columns() {
        let event = OrderEvent::Updated {
            order: Box::new(order(OrderStatus::Ready)),
            previous: OrderStatus::Cooking,
        };
        assert!(event.touches(&[OrderStatus::Cooking]));
        assert!(event.touches(&[OrderStatus::Ready]));
        assert!(!event.touches(&[OrderStatus::Done]));
    }

    #[test]
    fn new_order_only_touches_its_status() {
        let event = OrderEvent::Created(Box::new(order(OrderStatus::Cooking)));
        assert!(event.touches(&[OrderStatus::Cooking, OrderStatus::Ready]));
        assert!(!event.touches(&[OrderStatus::Ready]));
        assert!(OrderEvent::Cleared.touches(&[OrderStatus::Done]));
    }

    #[tokio::test]
    async fn every_subscriber_receives_events() {
        let hub = LiveOrderHub::new();
        let mut kitchen = hub.subscribe();
        let mut display = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        hub.publish(OrderEvent::Created(Box::new(order(OrderStatus::Cooking))));

        for rx in [&mut kitchen, &mut display] {
            match rx.recv().await.unwrap() {
                OrderEvent::Created(o) => assert_eq!(o.ticket_number, "0042"),
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[test]
    fn publish_without_monitors_is_harmless() {
        let hub = LiveOrderHub::new();
        hub.publish(OrderEvent::Cleared);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn close_all_ends_sessions_without_redraw() {
        let hub = LiveOrderHub::new();
        let mut kitchen = hub.subscribe();
        hub.close_all();

        let event = kitchen.recv().await.unwrap();
        assert!(matches!(event, OrderEvent::Shutdown));
        assert_eq!(event.reason(), None);
        assert!(!event.touches(&OrderStatus::ALL));
        assert_eq!(OrderEvent::Cleared.reason(), Some(FeedReason::Cleared));
    }

    #[test]
    fn snapshot_serializes_with_type_tag() {
        let msg = FeedMessage::Snapshot {
            reason: FeedReason::Initial,
            statuses: vec![OrderStatus::Cooking],
            orders: vec![order(OrderStatus::Cooking)],
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "snapshot");
        assert_eq!(json["reason"], "initial");
        assert_eq!(json["statuses"][0], "調理中");
        assert_eq!(json["orders"][0]["ticketNumber"], "0042");
    }
}
