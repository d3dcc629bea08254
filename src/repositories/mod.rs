pub mod memory;
pub mod orders;

pub use memory::InMemoryOrderRepository;
pub use orders::{CreatedOrder, OrderRepository, OrderWithItems, SqlOrderRepository};
