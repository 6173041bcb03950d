//! Integration tests for checkout over HTTP.

#![allow(clippy::unwrap_used)]

use axum::http::Method;
use chrono::NaiveDate;
use pickngo_cart::{CartConfig, CartView, CheckoutError, CurrentUser, Notice, RestClient};
use pickngo_core::{CartItemId, TransactionId};
use pickngo_integration_tests::{CartRow, MockBackend, unreachable_base_url};
use serde_json::json;

fn id(n: i64) -> CartItemId {
    CartItemId::new(n)
}

fn purchase_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn three_rows() -> MockBackend {
    MockBackend::with_carts(vec![
        CartRow::new(1, "Mug", 10.0, 2, "alice").at_branch("A"),
        CartRow::new(2, "Tea", 3.5, 1, "alice").at_branch("B"),
        CartRow::new(3, "Pen", 1.25, 4, "alice").at_branch("A"),
    ])
}

fn methods_and_paths(backend: &MockBackend) -> Vec<(Method, String)> {
    backend
        .requests()
        .into_iter()
        .map(|r| (r.method, r.path))
        .collect()
}

// ============================================================================
// Successful checkout
// ============================================================================

#[tokio::test]
async fn test_checkout_single_row() {
    let backend =
        MockBackend::with_carts(vec![CartRow::new(1, "Mug", 10.0, 2, "alice").at_branch("A")]);
    let server = backend.spawn().await.expect("server starts");
    let view = server.view("alice");
    view.load().await.unwrap();
    view.toggle_selection(id(1)).await;

    let receipt = view.checkout_on(purchase_date()).await.expect("checkout succeeds");

    assert_eq!(receipt.notice(), Notice::CheckoutSuccessful);
    assert_eq!(receipt.transactions.len(), 1);
    assert_eq!(receipt.transactions[0].cart_item, id(1));
    assert_eq!(receipt.transactions[0].transaction, Some(TransactionId::new(1)));
    assert!(receipt.deletion.is_complete());
    assert!(receipt.deletion.reloaded);

    assert_eq!(
        server.backend.transactions(),
        vec![json!({
            "product_name": "Mug",
            "quantity": 2,
            "total": 20.0,
            "customer_name": "alice",
            "date": "2026-10-17",
            "branch_name": "A",
        })]
    );
    assert!(server.backend.carts().is_empty());
    assert!(view.items().await.is_empty());
    assert!(view.selection().await.is_empty());
    assert_eq!(view.total_price().await.display(), "$0.00");
}

#[tokio::test]
async fn test_checkout_accepts_reply_without_numeric_id() {
    let backend = three_rows();
    backend.reply_with_document_ids(true);
    let server = backend.spawn().await.expect("server starts");
    let view = server.view("alice");
    view.load().await.unwrap();
    view.toggle_selection(id(1)).await;
    view.toggle_selection(id(2)).await;

    let receipt = view.checkout_on(purchase_date()).await.expect("checkout succeeds");

    assert_eq!(receipt.notice(), Notice::CheckoutSuccessful);
    assert_eq!(receipt.transactions.len(), 2);
    assert!(receipt.transactions.iter().all(|t| t.transaction.is_none()));
    assert_eq!(server.backend.transactions().len(), 2);
    assert_eq!(receipt.deletion.deleted, vec![id(1), id(2)]);
    let remaining: Vec<_> = view.items().await.iter().map(|item| item.id).collect();
    assert_eq!(remaining, vec![id(3)]);
}

#[tokio::test]
async fn test_checkout_request_order() {
    let server = three_rows().spawn().await.expect("server starts");
    let view = server.view("alice");
    view.load().await.unwrap();
    view.toggle_selection(id(3)).await;
    view.toggle_selection(id(1)).await;

    view.checkout_on(purchase_date()).await.expect("checkout succeeds");

    assert_eq!(
        methods_and_paths(&server.backend),
        vec![
            (Method::GET, "/api/carts".to_string()),
            (Method::POST, "/api/transactions".to_string()),
            (Method::POST, "/api/transactions".to_string()),
            (Method::DELETE, "/api/carts/1".to_string()),
            (Method::DELETE, "/api/carts/3".to_string()),
            (Method::GET, "/api/carts".to_string()),
        ]
    );

    // Transactions follow cart order, not click order
    let products: Vec<_> = server
        .backend
        .transactions()
        .iter()
        .map(|t| t["product_name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(products, vec!["Mug", "Pen"]);

    let remaining: Vec<_> = view.items().await.iter().map(|item| item.id).collect();
    assert_eq!(remaining, vec![id(2)]);
}

#[tokio::test]
async fn test_checkout_with_select_all() {
    let server = three_rows().spawn().await.expect("server starts");
    let view = server.view("alice");
    view.load().await.unwrap();
    assert!(view.select_all().await);

    let receipt = view.checkout_on(purchase_date()).await.unwrap();

    assert_eq!(receipt.transactions.len(), 3);
    let totals: Vec<_> = server
        .backend
        .transactions()
        .iter()
        .map(|t| t["total"].as_f64().unwrap())
        .collect();
    assert_eq!(totals, vec![20.0, 3.5, 5.0]);
    assert!(view.items().await.is_empty());
    assert!(!view.all_selected().await);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_checkout_with_nothing_selected_sends_nothing() {
    let server = three_rows().spawn().await.expect("server starts");
    let view = server.view("alice");
    view.load().await.unwrap();

    let err = view.checkout_on(purchase_date()).await.unwrap_err();

    assert!(matches!(err, CheckoutError::NothingSelected));
    assert_eq!(err.notice().message(), "Please select items to checkout.");
    assert_eq!(server.backend.requests().len(), 1);
}

#[tokio::test]
async fn test_checkout_stops_at_first_rejected_transaction() {
    let backend = three_rows();
    backend.fail_transactions_for("Tea");
    let server = backend.spawn().await.expect("server starts");
    let view = server.view("alice");
    view.load().await.unwrap();
    view.select_all().await;

    let err = view.checkout_on(purchase_date()).await.unwrap_err();

    let CheckoutError::TransactionFailed { item, ref source, .. } = err else {
        panic!("expected a transaction failure, got {err:?}");
    };
    assert_eq!(item, id(2));
    assert_eq!(source.status(), Some(400));
    assert_eq!(err.notice(), Notice::ItemFailed);
    assert_eq!(
        err.notice().message(),
        "Failed to process an item. Please try again."
    );

    // Mug stays committed; Pen is never attempted and nothing is deleted
    assert_eq!(err.committed().len(), 1);
    assert_eq!(err.committed()[0].cart_item, id(1));
    assert_eq!(server.backend.transactions().len(), 1);
    assert_eq!(server.backend.carts().len(), 3);
    assert!(
        server
            .backend
            .requests()
            .iter()
            .all(|r| r.method != Method::DELETE)
    );

    // The view is left as it was so the user can retry
    assert_eq!(view.items().await.len(), 3);
    assert!(view.all_selected().await);
}

#[tokio::test]
async fn test_checkout_interrupted_by_transport_failure() {
    let server = three_rows().spawn().await.expect("server starts");
    let dead = unreachable_base_url().await.expect("probe binds");
    let transactions = RestClient::new(&CartConfig::for_base_url(&dead).unwrap()).unwrap();
    let view = CartView::new(
        CurrentUser::from_name("alice").unwrap(),
        server.client(),
        transactions,
    );
    view.load().await.unwrap();
    view.toggle_selection(id(1)).await;

    let err = view.checkout_on(purchase_date()).await.unwrap_err();

    assert_eq!(err.notice(), Notice::CheckoutInterrupted);
    assert_eq!(
        err.notice().message(),
        "An error occurred during checkout. Please try again."
    );
    assert!(err.committed().is_empty());
    assert_eq!(server.backend.carts().len(), 3);
}

#[tokio::test]
async fn test_failed_delete_after_purchase_is_reported() {
    let backend = three_rows();
    backend.fail_delete(2);
    let server = backend.spawn().await.expect("server starts");
    let view = server.view("alice");
    view.load().await.unwrap();
    view.select_all().await;

    let receipt = view.checkout_on(purchase_date()).await.expect("checkout succeeds");

    assert_eq!(receipt.notice(), Notice::CheckoutSuccessful);
    assert_eq!(receipt.transactions.len(), 3);
    assert_eq!(receipt.deletion.deleted, vec![id(1), id(3)]);
    assert_eq!(receipt.deletion.failed.len(), 1);
    assert_eq!(receipt.deletion.failed[0].id, id(2));
    assert!(!receipt.deletion.is_complete());

    // Every delete is still attempted, and the reload shows what is left
    assert!(receipt.deletion.reloaded);
    let remaining: Vec<_> = view.items().await.iter().map(|item| item.id).collect();
    assert_eq!(remaining, vec![id(2)]);
}
