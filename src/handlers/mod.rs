pub mod bookings;
pub mod cart;
pub mod catalog;
pub mod common;
pub mod orders;
pub mod staff;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{BookingService, CartService, CatalogService, OrderService, StaffService};

/// Services layer used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub cart: Arc<CartService>,
    pub orders: Arc<OrderService>,
    pub staff: Arc<StaffService>,
    pub bookings: Arc<BookingService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(db.clone(), event_sender.clone())),
            cart: Arc::new(CartService::new(db.clone(), event_sender.clone())),
            orders: Arc::new(OrderService::new(db.clone(), event_sender.clone())),
            staff: Arc::new(StaffService::new(db.clone(), event_sender.clone())),
            bookings: Arc::new(BookingService::new(db, event_sender)),
        }
    }
}
