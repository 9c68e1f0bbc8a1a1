use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::entities::{booking, menu, Booking, BookingModel, Menu, MenuModel};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Table reservations plus the standalone restaurant menu that ships
/// with the booking module.
#[derive(Clone)]
pub struct BookingService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl BookingService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    pub async fn list_bookings(&self) -> Result<Vec<BookingModel>, ServiceError> {
        let bookings = Booking::find()
            .order_by_asc(booking::Column::ReservationDate)
            .order_by_asc(booking::Column::ReservationSlot)
            .all(&*self.db)
            .await?;
        Ok(bookings)
    }

    /// Creates a reservation after checking the date is not in the past
    /// and the slot is free. The unique index on (date, slot) closes the
    /// race between the check and the insert; either way no partial
    /// booking is ever persisted.
    #[instrument(skip(self, input), fields(date = %input.reservation_date, slot = input.reservation_slot))]
    pub async fn create_booking(
        &self,
        input: CreateBookingInput,
    ) -> Result<BookingModel, ServiceError> {
        input.validate()?;

        let today = Utc::now().date_naive();
        if input.reservation_date < today {
            return Err(ServiceError::ValidationError(
                "cannot make reservations for past dates".to_string(),
            ));
        }

        let taken = Booking::find()
            .filter(booking::Column::ReservationDate.eq(input.reservation_date))
            .filter(booking::Column::ReservationSlot.eq(input.reservation_slot))
            .one(&*self.db)
            .await?;
        if taken.is_some() {
            return Err(ServiceError::ValidationError(
                "this time slot is already booked for the selected date".to_string(),
            ));
        }

        let model = booking::ActiveModel {
            id: Set(Uuid::new_v4()),
            first_name: Set(input.first_name),
            reservation_date: Set(input.reservation_date),
            reservation_slot: Set(input.reservation_slot),
        };

        let created = model.insert(&*self.db).await.map_err(|e| {
            ServiceError::conflict_on_unique(
                e,
                "this time slot is already booked for the selected date",
            )
        })?;

        self.event_sender
            .send_or_log(Event::BookingCreated(created.id))
            .await;

        info!(booking_id = %created.id, "Created booking");
        Ok(created)
    }

    // Standalone menu CRUD, mirroring the catalog shapes against the
    // unrelated `menus` table.

    pub async fn list_menu(&self) -> Result<Vec<MenuModel>, ServiceError> {
        let entries = Menu::find()
            .order_by_asc(menu::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(entries)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_menu_entry(
        &self,
        input: CreateMenuInput,
    ) -> Result<MenuModel, ServiceError> {
        input.validate()?;
        if input.price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price must be greater than zero".to_string(),
            ));
        }

        let model = menu::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            price: Set(input.price),
        };

        Ok(model.insert(&*self.db).await?)
    }

    pub async fn get_menu_entry(&self, id: Uuid) -> Result<MenuModel, ServiceError> {
        Menu::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("menu entry {id} not found")))
    }

    #[instrument(skip(self, input))]
    pub async fn update_menu_entry(
        &self,
        id: Uuid,
        input: UpdateMenuInput,
    ) -> Result<MenuModel, ServiceError> {
        let existing = self.get_menu_entry(id).await?;

        if let Some(price) = input.price {
            if price <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "price must be greater than zero".to_string(),
                ));
            }
        }

        let mut model: menu::ActiveModel = existing.into();
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(price) = input.price {
            model.price = Set(price);
        }

        Ok(model.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_menu_entry(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_menu_entry(id).await?;
        existing.delete(&*self.db).await?;
        info!(menu_id = %id, "Deleted menu entry");
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingInput {
    #[validate(length(min = 1, max = 200, message = "first_name is required"))]
    pub first_name: String,
    pub reservation_date: NaiveDate,
    #[validate(range(min = 0, message = "reservation_slot must not be negative"))]
    pub reservation_slot: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMenuInput {
    #[validate(length(min = 1, max = 255, message = "name is required"))]
    pub name: String,
    pub price: Decimal,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMenuInput {
    pub name: Option<String>,
    pub price: Option<Decimal>,
}
