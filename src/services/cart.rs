use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::entities::{cart_item, CartItem, CartItemModel, MenuItem};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Per-user shopping cart over pending menu item lines.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<CartItemModel>, ServiceError> {
        let items = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .all(&*self.db)
            .await?;
        Ok(items)
    }

    /// Puts a menu item in the user's cart.
    ///
    /// The current menu item price is snapshotted as `unit_price`. If the
    /// item is already in the cart its row is overwritten with the new
    /// quantity and prices; this is an idempotent upsert, not an
    /// additive increment.
    #[instrument(skip(self, input), fields(user_id = %user_id, menu_item_id = %input.menu_item_id))]
    pub async fn add_item(
        &self,
        user_id: Uuid,
        input: AddToCartInput,
    ) -> Result<CartItemModel, ServiceError> {
        input.validate()?;

        let menu_item = MenuItem::find_by_id(input.menu_item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "menu item {} does not exist",
                    input.menu_item_id
                ))
            })?;

        let unit_price = menu_item.price;
        let price = unit_price * Decimal::from(input.quantity);

        let existing = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::MenuItemId.eq(input.menu_item_id))
            .one(&*self.db)
            .await?;

        let saved = match existing {
            Some(entry) => {
                let mut entry: cart_item::ActiveModel = entry.into();
                entry.quantity = Set(input.quantity);
                entry.unit_price = Set(unit_price);
                entry.price = Set(price);
                entry.update(&*self.db).await?
            }
            None => {
                let entry = cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    menu_item_id: Set(input.menu_item_id),
                    quantity: Set(input.quantity),
                    unit_price: Set(unit_price),
                    price: Set(price),
                };
                entry.insert(&*self.db).await?
            }
        };

        self.event_sender
            .send_or_log(Event::CartUpdated {
                user_id,
                menu_item_id: input.menu_item_id,
                quantity: input.quantity,
            })
            .await;

        info!(quantity = input.quantity, %price, "Cart item upserted");
        Ok(saved)
    }

    /// Removes every line from the user's cart. Succeeds on an already
    /// empty cart.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;

        self.event_sender
            .send_or_log(Event::CartCleared { user_id })
            .await;

        info!(removed = result.rows_affected, "Cart cleared");
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddToCartInput {
    pub menu_item_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
}
