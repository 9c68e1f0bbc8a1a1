pub mod booking;
pub mod cart_item;
pub mod category;
pub mod menu;
pub mod menu_item;
pub mod order;
pub mod order_item;
pub mod user;
pub mod user_role;

// Re-export entities under their domain names
pub use booking::{Entity as Booking, Model as BookingModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use menu::{Entity as Menu, Model as MenuModel};
pub use menu_item::{Entity as MenuItem, Model as MenuItemModel};
pub use order::{Entity as Order, Model as OrderModel, OrderStatus};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use user::{Entity as User, Model as UserModel};
pub use user_role::{Entity as UserRole, Model as UserRoleModel};
