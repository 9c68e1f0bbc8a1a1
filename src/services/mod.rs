pub mod bookings;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod staff;

pub use bookings::BookingService;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use orders::OrderService;
pub use staff::StaffService;
