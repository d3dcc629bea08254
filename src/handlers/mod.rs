pub mod carts;
pub mod orders;

use std::sync::Arc;

pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<crate::services::OrderService>,
    pub carts: Arc<crate::services::CartService>,
}
