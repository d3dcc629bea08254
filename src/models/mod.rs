pub mod cart;
pub mod line_item;
pub mod order;
pub mod pricing;
pub mod status;

pub use cart::Cart;
pub use line_item::LineItem;
pub use order::{OrderRequest, OrderType, OrderValidationError};
pub use pricing::{compute_totals, PricingResult};
pub use status::{OrderStatus, TransitionContext, TransitionError};
