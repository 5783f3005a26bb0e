//! Integration tests for checkout and order history.

#![allow(clippy::unwrap_used)]

use aurelia_core::{Cart, Order};
use aurelia_integration_tests::{TestServer, data, error_message};
use aurelia_storefront::db::orders::ORDERS;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
struct OrderList {
    items: Vec<Order>,
}

async fn add(server: &TestServer, cart_id: &str, product_id: &str, quantity: i64) {
    let response = server
        .post(
            "/api/cart",
            &json!({ "cartId": cart_id, "productId": product_id, "quantity": quantity }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_places_order_and_clears_cart() {
    let server = TestServer::start().await;
    // prod-025 costs 9.99
    add(&server, "c1", "prod-025", 2).await;

    let receipt: Value = data(
        server
            .post("/api/checkout", &json!({ "cartId": "c1", "userId": "u1" }))
            .await,
    )
    .await;
    assert_eq!(receipt["total"], json!(19.98));
    let order_id = receipt["orderId"].as_str().unwrap().to_string();

    let cart: Cart = data(server.get("/api/cart/c1").await).await;
    assert!(cart.items.is_empty());

    let orders: OrderList = data(server.get("/api/orders/u1").await).await;
    assert_eq!(orders.items.len(), 1);
    let order = &orders.items[0];
    assert_eq!(order.id.as_str(), order_id);
    assert_eq!(order.total.to_string(), "$19.98");
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.items[0].title, "Enamel Camp Mug");
}

#[tokio::test]
async fn test_checkout_empty_cart_creates_no_order() {
    let server = TestServer::start().await;
    data::<Cart>(server.get("/api/cart/empty").await).await;

    let response = server
        .post("/api/checkout", &json!({ "cartId": "empty", "userId": "u1" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "Cart is empty");
    assert!(ORDERS.index(server.db()).is_empty().await.unwrap());
}

#[tokio::test]
async fn test_checkout_unknown_cart_is_404() {
    let server = TestServer::start().await;
    let response = server
        .post("/api/checkout", &json!({ "cartId": "ghost", "userId": "u1" }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_message(response).await, "Cart not found");
}

#[tokio::test]
async fn test_cart_is_reusable_after_checkout() {
    let server = TestServer::start().await;
    add(&server, "c1", "prod-001", 1).await;
    data::<Value>(
        server
            .post("/api/checkout", &json!({ "cartId": "c1", "userId": "u1" }))
            .await,
    )
    .await;

    add(&server, "c1", "prod-002", 1).await;
    data::<Value>(
        server
            .post("/api/checkout", &json!({ "cartId": "c1", "userId": "u1" }))
            .await,
    )
    .await;

    let orders: OrderList = data(server.get("/api/orders/u1").await).await;
    assert_eq!(orders.items.len(), 2);
    assert!(orders.items[0].timestamp >= orders.items[1].timestamp);
}

// =============================================================================
// Order History
// =============================================================================

#[tokio::test]
async fn test_orders_are_scoped_to_user() {
    let server = TestServer::start().await;
    add(&server, "c1", "prod-001", 1).await;
    data::<Value>(
        server
            .post("/api/checkout", &json!({ "cartId": "c1", "userId": "alice" }))
            .await,
    )
    .await;

    let bob: OrderList = data(server.get("/api/orders/bob").await).await;
    assert!(bob.items.is_empty());
    let alice: OrderList = data(server.get("/api/orders/alice").await).await;
    assert_eq!(alice.items.len(), 1);
}
