use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::OrderStatus;

/// Domain events emitted by the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order lifecycle
    OrderPlaced {
        order_id: Uuid,
        user_id: Uuid,
        total: Decimal,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    OrderAssigned {
        order_id: Uuid,
        delivery_crew_id: Uuid,
    },
    OrderDeleted(Uuid),

    // Cart
    CartUpdated {
        user_id: Uuid,
        menu_item_id: Uuid,
        quantity: i32,
    },
    CartCleared {
        user_id: Uuid,
    },

    // Catalog
    CategoryCreated(Uuid),
    MenuItemCreated(Uuid),
    MenuItemDeleted(Uuid),

    // Bookings
    BookingCreated(Uuid),

    // Accounts
    UserRegistered(Uuid),
    RoleGranted {
        user_id: Uuid,
        role: String,
    },
    RoleRevoked {
        user_id: Uuid,
        role: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, returning an error if the channel is closed or full.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging on failure. Event delivery is best-effort
    /// and must never fail the request that produced it.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!(?event, error = %e, "Dropped domain event");
        }
    }
}

/// Consumes domain events off the channel and logs them. This is the
/// single sink; outbound integrations would hang off this loop.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderPlaced {
                order_id,
                user_id,
                total,
            } => {
                info!(%order_id, %user_id, %total, "Order placed");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(%order_id, %old_status, %new_status, "Order status changed");
            }
            Event::OrderAssigned {
                order_id,
                delivery_crew_id,
            } => {
                info!(%order_id, %delivery_crew_id, "Order assigned to delivery crew");
            }
            other => {
                info!(event = ?other, "Domain event");
            }
        }
    }
    info!("Event channel closed; consumer exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_consumer() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        let user_id = Uuid::new_v4();
        sender
            .send(Event::CartCleared { user_id })
            .await
            .expect("send should succeed");

        match rx.recv().await {
            Some(Event::CartCleared { user_id: got }) => assert_eq!(got, user_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or error out.
        sender
            .send_or_log(Event::BookingCreated(Uuid::new_v4()))
            .await;
    }
}
