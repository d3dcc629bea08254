use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};

use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    models::{Cart, LineItem, PricingResult},
};

/// Durable session slot for carts. One cart per session key; mutations write
/// through synchronously so a reload does not lose state. Best-effort, not
/// transactional.
pub trait CartStore: Send + Sync {
    fn load(&self, session_id: &str) -> Option<Cart>;
    fn save(&self, session_id: &str, cart: &Cart) -> anyhow::Result<()>;
    fn remove(&self, session_id: &str) -> anyhow::Result<()>;
}

/// In-process store backing a single service instance.
#[derive(Debug, Default)]
pub struct DashMapCartStore {
    carts: DashMap<String, Cart>,
}

impl DashMapCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStore for DashMapCartStore {
    fn load(&self, session_id: &str) -> Option<Cart> {
        self.carts.get(session_id).map(|c| c.value().clone())
    }

    fn save(&self, session_id: &str, cart: &Cart) -> anyhow::Result<()> {
        self.carts.insert(session_id.to_string(), cart.clone());
        Ok(())
    }

    fn remove(&self, session_id: &str) -> anyhow::Result<()> {
        self.carts.remove(session_id);
        Ok(())
    }
}

/// Session-scoped cart operations: hydrate from the store, mutate in memory,
/// write through. Store failures are logged and the in-memory result is
/// still returned to the caller.
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn CartStore>,
    event_sender: EventSender,
}

impl CartService {
    pub fn new(store: Arc<dyn CartStore>, event_sender: EventSender) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    pub fn get_cart(&self, session_id: &str) -> Cart {
        self.store.load(session_id).unwrap_or_default()
    }

    fn write_through(&self, session_id: &str, cart: &Cart) {
        if let Err(e) = self.store.save(session_id, cart) {
            error!(session_id, error = %e, "Cart write-through failed");
        }
    }

    /// Adds one item, merging quantities on duplicate variant codes. A
    /// non-positive quantity is a no-op; the unchanged cart is returned.
    #[instrument(skip(self, item), fields(session_id, variant_code = %item.variant_code))]
    pub async fn add_item(&self, session_id: &str, item: LineItem) -> Cart {
        let mut cart = self.get_cart(session_id);
        let variant_code = item.variant_code.clone();

        if cart.add_item(item) {
            self.write_through(session_id, &cart);
            self.event_sender
                .send_or_log(Event::CartItemAdded {
                    session_id: session_id.to_string(),
                    variant_code,
                })
                .await;
        }
        cart
    }

    /// Adds several variants in one call. Entries that fail (non-positive
    /// quantity) are logged and skipped; the rest of the batch still applies.
    #[instrument(skip(self, items), fields(session_id))]
    pub async fn add_multiple(&self, session_id: &str, items: Vec<LineItem>) -> Cart {
        let mut cart = self.get_cart(session_id);
        let mut applied = 0usize;

        for item in items {
            let variant_code = item.variant_code.clone();
            if cart.add_item(item) {
                applied += 1;
            } else {
                warn!(session_id, variant_code, "Skipped cart entry in batch add");
            }
        }

        if applied > 0 {
            self.write_through(session_id, &cart);
        }
        info!(session_id, applied, "Batch add applied");
        cart
    }

    /// Replaces the quantity of an existing entry, clamping below 1 to 1.
    pub fn set_quantity(
        &self,
        session_id: &str,
        variant_code: &str,
        quantity: i32,
    ) -> Result<Cart, ServiceError> {
        let mut cart = self.get_cart(session_id);
        if !cart.set_quantity(variant_code, quantity) {
            return Err(ServiceError::NotFound(format!(
                "Variant {} is not in the cart",
                variant_code
            )));
        }
        self.write_through(session_id, &cart);
        Ok(cart)
    }

    /// Removes an entry; removing an absent variant code is a no-op.
    pub fn remove_item(&self, session_id: &str, variant_code: &str) -> Cart {
        let mut cart = self.get_cart(session_id);
        if cart.remove_item(variant_code) {
            self.write_through(session_id, &cart);
        }
        cart
    }

    /// Empties the cart and drops the session slot. Used on logout and after
    /// checkout completes.
    #[instrument(skip(self), fields(session_id))]
    pub async fn clear(&self, session_id: &str) {
        if let Err(e) = self.store.remove(session_id) {
            error!(session_id, error = %e, "Cart clear failed");
        }
        self.event_sender
            .send_or_log(Event::CartCleared(session_id.to_string()))
            .await;
    }

    /// Derived totals for the current cart contents.
    pub fn totals(&self, session_id: &str, discount_percent: Decimal) -> PricingResult {
        self.get_cart(session_id).totals(discount_percent)
    }
}
