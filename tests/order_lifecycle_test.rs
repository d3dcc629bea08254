//! End-to-end lifecycle tests for the order workflow, backed by the
//! in-memory repository.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use assert_matches::assert_matches;
use async_trait::async_trait;
use orderflow_api::{
    errors::{codes, ServiceError},
    events::EventSender,
    models::{LineItem, OrderStatus, OrderType, TransitionContext},
    repositories::{InMemoryOrderRepository, OrderRepository},
    services::{InventoryClient, OrderService},
};
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Inventory double that records every decrement and can be switched to
/// reject calls.
#[derive(Default)]
struct RecordingInventoryClient {
    calls: Mutex<Vec<(Uuid, i32)>>,
    fail: AtomicBool,
}

#[async_trait]
impl InventoryClient for RecordingInventoryClient {
    async fn decrement_reserved(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        self.calls.lock().unwrap().push((product_id, quantity));
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::ExternalServiceError(
                "inventory unreachable".into(),
            ));
        }
        Ok(())
    }
}

struct Harness {
    service: OrderService,
    repo: Arc<InMemoryOrderRepository>,
    inventory: Arc<RecordingInventoryClient>,
}

fn harness() -> Harness {
    let repo = Arc::new(InMemoryOrderRepository::new());
    let inventory = Arc::new(RecordingInventoryClient::default());
    let (sender, mut receiver) = EventSender::channel(64);
    tokio::spawn(async move { while receiver.recv().await.is_some() {} });

    Harness {
        service: OrderService::new(repo.clone(), inventory.clone(), sender),
        repo,
        inventory,
    }
}

fn line_items() -> Vec<LineItem> {
    vec![
        LineItem {
            variant_code: "CEM-40".into(),
            product_id: Uuid::new_v4(),
            unit_price: dec!(1000),
            quantity: 2,
            color_or_weight: "40kg".into(),
        },
        LineItem {
            variant_code: "CEM-25".into(),
            product_id: Uuid::new_v4(),
            unit_price: dec!(500),
            quantity: 1,
            color_or_weight: "25kg".into(),
        },
    ]
}

async fn create_order(h: &Harness) -> Uuid {
    h.service
        .create_order(
            Uuid::new_v4(),
            Uuid::new_v4(),
            line_items(),
            OrderType::Order,
            None,
        )
        .await
        .expect("order creation should succeed")
        .order_id
}

fn invoice_ctx() -> TransitionContext {
    TransitionContext {
        payment_term: Some("net_30".into()),
        billing_company: Some("Acme Ltd".into()),
    }
}

#[tokio::test]
async fn full_lifecycle_reaches_paid_invoice() {
    let h = harness();
    let order_id = create_order(&h).await;

    for (target, ctx) in [
        (OrderStatus::Approved, TransitionContext::default()),
        (OrderStatus::GenerateInvoice, invoice_ctx()),
        (OrderStatus::HandoverDelivery, TransitionContext::default()),
        (OrderStatus::Delivered, TransitionContext::default()),
        (OrderStatus::PaidInvoice, TransitionContext::default()),
    ] {
        let updated = h
            .service
            .update_status(order_id, target, ctx)
            .await
            .unwrap_or_else(|e| panic!("transition to {} failed: {}", target, e));
        assert_eq!(updated.status, target);
    }

    // Invoice generation should have decremented every line item once.
    assert_eq!(h.inventory.calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn created_order_total_matches_line_totals() {
    let h = harness();
    let created = h
        .service
        .create_order(
            Uuid::new_v4(),
            Uuid::new_v4(),
            line_items(),
            OrderType::Quotation,
            None,
        )
        .await
        .unwrap();

    assert_eq!(created.total, dec!(2500));
    let order = h.service.get_order(created.order_id).await.unwrap().order;
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.version, 1);
}

#[tokio::test]
async fn rejected_order_is_terminal() {
    let h = harness();
    let order_id = create_order(&h).await;

    h.service
        .update_status(order_id, OrderStatus::Rejected, TransitionContext::default())
        .await
        .unwrap();

    let err = h
        .service
        .update_status(order_id, OrderStatus::Approved, TransitionContext::default())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict { code: Some(c), .. }
        if c == codes::TERMINAL_STATUS);
}

#[tokio::test]
async fn skipping_approval_is_rejected() {
    let h = harness();
    let order_id = create_order(&h).await;

    let err = h
        .service
        .update_status(order_id, OrderStatus::GenerateInvoice, invoice_ctx())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict { code: Some(c), .. }
        if c == codes::INVALID_TRANSITION);
}

#[tokio::test]
async fn inventory_failure_does_not_roll_back_the_invoice() {
    let h = harness();
    let order_id = create_order(&h).await;

    h.service
        .update_status(order_id, OrderStatus::Approved, TransitionContext::default())
        .await
        .unwrap();

    h.inventory.fail.store(true, Ordering::SeqCst);
    let updated = h
        .service
        .update_status(order_id, OrderStatus::GenerateInvoice, invoice_ctx())
        .await
        .expect("transition must commit even when the decrement fails");
    assert_eq!(updated.status, OrderStatus::GenerateInvoice);
    assert_eq!(h.inventory.calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn stale_version_is_a_conflict() {
    let h = harness();
    let order_id = create_order(&h).await;

    // First writer wins with the current version.
    h.repo
        .update_order_status(
            order_id,
            OrderStatus::Approved,
            &TransitionContext::default(),
            1,
        )
        .await
        .unwrap();

    // Second writer still holds version 1.
    let err = h
        .repo
        .update_order_status(
            order_id,
            OrderStatus::Rejected,
            &TransitionContext::default(),
            1,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict { code: Some(c), .. }
        if c == codes::VERSION_CONFLICT);

    let order = h.service.get_order(order_id).await.unwrap().order;
    assert_eq!(order.status, OrderStatus::Approved);
}

#[tokio::test]
async fn upstream_rejection_keeps_its_message() {
    let h = harness();
    h.repo.fail_next_create("Customer has exceeded credit limit");

    let err = h
        .service
        .create_order(
            Uuid::new_v4(),
            Uuid::new_v4(),
            line_items(),
            OrderType::Order,
            None,
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::UpstreamError(msg)
        if msg == "Customer has exceeded credit limit");
    assert_eq!(h.repo.order_count(), 0);
}

#[tokio::test]
async fn assignment_claims_are_exclusive() {
    let h = harness();
    let order_id = create_order(&h).await;

    let first_manager = Uuid::new_v4();
    h.service
        .assign_resource_manager(order_id, first_manager)
        .await
        .unwrap();

    let err = h
        .service
        .assign_resource_manager(order_id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict { code: Some(c), .. }
        if c == codes::ORDER_ALREADY_ASSIGNED);

    let listed = h
        .service
        .list_by_resource_manager(first_manager)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, order_id);
}

#[tokio::test]
async fn missing_order_is_not_found() {
    let h = harness();
    let err = h.service.get_order(Uuid::new_v4()).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn assigning_a_missing_order_is_not_found_not_a_conflict() {
    let h = harness();

    // Straight at the repository seam, bypassing the service pre-check.
    let err = h
        .repo
        .assign_resource_manager(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn sales_rep_listing_is_scoped() {
    let h = harness();
    let rep_a = Uuid::new_v4();
    let rep_b = Uuid::new_v4();

    for rep in [rep_a, rep_a, rep_b] {
        h.service
            .create_order(Uuid::new_v4(), rep, line_items(), OrderType::Order, None)
            .await
            .unwrap();
    }

    assert_eq!(h.service.list_by_sales_rep(rep_a).await.unwrap().len(), 2);
    assert_eq!(h.service.list_by_sales_rep(rep_b).await.unwrap().len(), 1);
}
