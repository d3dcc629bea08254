//! Cart flows from first add through checkout-time totals.

use std::sync::Arc;

use orderflow_api::{
    errors::ServiceError,
    events::EventSender,
    models::LineItem,
    services::{CartService, DashMapCartStore},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn service() -> CartService {
    let (sender, mut receiver) = EventSender::channel(64);
    tokio::spawn(async move { while receiver.recv().await.is_some() {} });
    CartService::new(Arc::new(DashMapCartStore::new()), sender)
}

fn item(code: &str, price: Decimal, quantity: i32) -> LineItem {
    LineItem {
        variant_code: code.into(),
        product_id: Uuid::new_v4(),
        unit_price: price,
        quantity,
        color_or_weight: "grey".into(),
    }
}

#[tokio::test]
async fn duplicate_variants_merge_instead_of_duplicating() {
    let svc = service();
    svc.add_item("s1", item("CEM-40", dec!(1000), 2)).await;
    svc.add_item("s1", item("CEM-40", dec!(1000), 3)).await;

    let cart = svc.get_cart("s1");
    assert_eq!(cart.len(), 1);
    assert_eq!(cart.get("CEM-40").unwrap().quantity, 5);
}

#[tokio::test]
async fn shopping_session_survives_a_page_reload() {
    let svc = service();
    svc.add_item("browser-session", item("A", dec!(100), 1)).await;
    svc.add_multiple(
        "browser-session",
        vec![item("B", dec!(200), 2), item("C", dec!(300), 1)],
    )
    .await;
    svc.remove_item("browser-session", "B");

    // A later request hydrates from the store.
    let cart = svc.get_cart("browser-session");
    assert_eq!(cart.len(), 2);
    assert!(cart.get("B").is_none());
    assert_eq!(cart.get("C").unwrap().quantity, 1);
}

#[tokio::test]
async fn quantity_edits_clamp_to_a_minimum_of_one() {
    let svc = service();
    svc.add_item("s1", item("A", dec!(100), 4)).await;

    let cart = svc.set_quantity("s1", "A", 0).unwrap();
    assert_eq!(cart.get("A").unwrap().quantity, 1);

    let cart = svc.set_quantity("s1", "A", 7).unwrap();
    assert_eq!(cart.get("A").unwrap().quantity, 7);
}

#[tokio::test]
async fn editing_an_absent_variant_is_not_found() {
    let svc = service();
    let err = svc.set_quantity("s1", "NOPE", 2).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn totals_apply_the_discount_to_the_whole_cart() {
    let svc = service();
    svc.add_item("s1", item("A", dec!(1000), 2)).await;
    svc.add_item("s1", item("B", dec!(500), 1)).await;

    let totals = svc.totals("s1", dec!(10));
    assert_eq!(totals.subtotal, dec!(2500));
    assert_eq!(totals.discount_percent, dec!(10));
    assert_eq!(totals.discount_amount, dec!(250));
    assert_eq!(totals.net_total, dec!(2250));

    // Out-of-range discounts clamp instead of failing.
    assert_eq!(svc.totals("s1", dec!(150)).net_total, dec!(0));
    assert_eq!(svc.totals("s1", dec!(-5)).net_total, dec!(2500));
}

#[tokio::test]
async fn checkout_clears_the_session() {
    let svc = service();
    svc.add_item("s1", item("A", dec!(100), 1)).await;
    svc.clear("s1").await;

    assert!(svc.get_cart("s1").is_empty());
    assert_eq!(svc.totals("s1", dec!(0)).subtotal, dec!(0));
}
