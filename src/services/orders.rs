use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::policy::OrderScope;
use crate::entities::{
    cart_item, order, order_item, CartItem, Order, OrderItem, OrderItemModel, OrderModel,
    OrderStatus, User,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Order plus its immutable line items, serialized as one document.
#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
}

/// Partial update applied by managers (any field) or the assigned
/// delivery crew (status only, enforced by policy in the handler).
#[derive(Debug, Default, Deserialize)]
pub struct UpdateOrderInput {
    pub delivery_crew_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub total: Option<Decimal>,
    pub placed_at: Option<DateTime<Utc>>,
}

impl UpdateOrderInput {
    /// True when the request touches nothing but `status`.
    pub fn only_status(&self) -> bool {
        self.delivery_crew_id.is_none() && self.total.is_none() && self.placed_at.is_none()
    }
}

/// Order lifecycle: checkout, role-scoped listing, status/assignment
/// updates, deletion.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Converts the user's cart into an order.
    ///
    /// Runs as one transaction: read cart, insert order and order items,
    /// delete cart rows. An empty cart aborts with a validation error and
    /// no side effects; any failure rolls the whole checkout back. A
    /// concurrent checkout for the same user serializes behind this one
    /// and then finds an empty cart.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn place_order(&self, user_id: Uuid) -> Result<OrderWithItems, ServiceError> {
        let txn = self.db.begin().await?;

        let cart_entries = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .all(&txn)
            .await?;

        if cart_entries.is_empty() {
            return Err(ServiceError::ValidationError(
                "no items in cart".to_string(),
            ));
        }

        let total: Decimal = cart_entries.iter().map(|entry| entry.price).sum();
        let order_id = Uuid::new_v4();

        let order_model = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(user_id),
            delivery_crew_id: Set(None),
            status: Set(OrderStatus::Placed),
            total: Set(total),
            placed_at: Set(Utc::now()),
        };
        let created = order_model.insert(&txn).await?;

        let mut items = Vec::with_capacity(cart_entries.len());
        for entry in &cart_entries {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                menu_item_id: Set(entry.menu_item_id),
                quantity: Set(entry.quantity),
                unit_price: Set(entry.unit_price),
                price: Set(entry.price),
            };
            items.push(item.insert(&txn).await?);
        }

        CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderPlaced {
                order_id,
                user_id,
                total,
            })
            .await;

        info!(%order_id, %total, item_count = items.len(), "Order placed");
        Ok(OrderWithItems {
            order: created,
            items,
        })
    }

    /// Lists orders visible under the caller's scope, newest first.
    pub async fn list_orders(&self, scope: OrderScope) -> Result<Vec<OrderWithItems>, ServiceError> {
        let mut query = Order::find();
        query = match scope {
            OrderScope::All => query,
            OrderScope::AssignedTo(crew_id) => {
                query.filter(order::Column::DeliveryCrewId.eq(crew_id))
            }
            OrderScope::OwnedBy(user_id) => query.filter(order::Column::UserId.eq(user_id)),
        };

        let rows = query
            .order_by_desc(order::Column::PlacedAt)
            .find_with_related(OrderItem)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(order, items)| OrderWithItems { order, items })
            .collect())
    }

    pub async fn get_order(&self, id: Uuid) -> Result<OrderWithItems, ServiceError> {
        let order = Order::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {id} not found")))?;

        let items = order.find_related(OrderItem).all(&*self.db).await?;

        Ok(OrderWithItems { order, items })
    }

    /// Applies a partial update. Absent fields keep their stored values;
    /// a delivery crew assignment must reference an existing user.
    #[instrument(skip(self, input))]
    pub async fn update_order(
        &self,
        id: Uuid,
        input: UpdateOrderInput,
    ) -> Result<OrderWithItems, ServiceError> {
        let existing = Order::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {id} not found")))?;

        if let Some(total) = input.total {
            if total < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "total must not be negative".to_string(),
                ));
            }
        }

        if let Some(crew_id) = input.delivery_crew_id {
            User::find_by_id(crew_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!("user {crew_id} does not exist"))
                })?;
        }

        let old_status = existing.status;
        let old_crew = existing.delivery_crew_id;

        let mut model: order::ActiveModel = existing.into();
        if let Some(crew_id) = input.delivery_crew_id {
            model.delivery_crew_id = Set(Some(crew_id));
        }
        if let Some(status) = input.status {
            model.status = Set(status);
        }
        if let Some(total) = input.total {
            model.total = Set(total);
        }
        if let Some(placed_at) = input.placed_at {
            model.placed_at = Set(placed_at);
        }

        let updated = model.update(&*self.db).await?;

        if let Some(new_status) = input.status {
            if new_status != old_status {
                self.event_sender
                    .send_or_log(Event::OrderStatusChanged {
                        order_id: id,
                        old_status,
                        new_status,
                    })
                    .await;
            }
        }
        if let Some(crew_id) = input.delivery_crew_id {
            if old_crew != Some(crew_id) {
                self.event_sender
                    .send_or_log(Event::OrderAssigned {
                        order_id: id,
                        delivery_crew_id: crew_id,
                    })
                    .await;
            }
        }

        let items = updated.find_related(OrderItem).all(&*self.db).await?;
        Ok(OrderWithItems {
            order: updated,
            items,
        })
    }

    /// Deletes the order and its items in one transaction.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let existing = Order::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {id} not found")))?;

        OrderItem::delete_many()
            .filter(order_item::Column::OrderId.eq(id))
            .exec(&txn)
            .await?;
        existing.delete(&txn).await?;

        txn.commit().await?;

        self.event_sender.send_or_log(Event::OrderDeleted(id)).await;

        info!(order_id = %id, "Order deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn only_status_reflects_touched_fields() {
        let status_only = UpdateOrderInput {
            status: Some(OrderStatus::Delivered),
            ..Default::default()
        };
        assert!(status_only.only_status());

        let with_total = UpdateOrderInput {
            status: Some(OrderStatus::Delivered),
            total: Some(dec!(99.00)),
            ..Default::default()
        };
        assert!(!with_total.only_status());

        let with_crew = UpdateOrderInput {
            delivery_crew_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(!with_crew.only_status());
    }

    #[test]
    fn update_input_deserializes_partially() {
        let input: UpdateOrderInput = serde_json::from_str(r#"{"status": "in_progress"}"#).unwrap();
        assert_eq!(input.status, Some(OrderStatus::InProgress));
        assert!(input.delivery_crew_id.is_none());
        assert!(input.total.is_none());
        assert!(input.placed_at.is_none());
    }

    #[test]
    fn cart_totals_sum_entry_prices() {
        let prices = [dec!(20.00), dec!(5.25), dec!(3.75)];
        let total: Decimal = prices.iter().copied().sum();
        assert_eq!(total, dec!(29.00));
    }
}
