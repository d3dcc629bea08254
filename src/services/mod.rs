pub mod carts;
pub mod inventory;
pub mod orders;

pub use carts::{CartService, CartStore, DashMapCartStore};
pub use inventory::{HttpInventoryClient, InventoryClient, NoopInventoryClient};
pub use orders::OrderService;
