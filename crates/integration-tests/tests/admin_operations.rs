//! Back-office operations and how they show up on the storefront.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use rentacam_core::AdminRole;
use rentacam_integration_tests::{PASSWORD, TestContext, eventually};

#[tokio::test]
async fn test_approved_products_reach_the_storefront() {
    let ctx = TestContext::start().await;
    let admin = ctx.admin_client("ops@rentacam.example", AdminRole::Admin).await;

    let item: Value = admin
        .post(ctx.admin("/api/inventory"))
        .json(&json!({ "name": "Canon R6", "stock": 3, "category": "cameras" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(item["id"], "RACIN0001");

    // Stock above the inventory level is rejected
    let too_much = admin
        .post(ctx.admin("/api/products"))
        .json(&json!({
            "name": "Canon R6",
            "price": "40.00",
            "category": "cameras",
            "stock": 5,
            "inventoryId": "RACIN0001"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(too_much.status(), StatusCode::BAD_REQUEST);

    let created = admin
        .post(ctx.admin("/api/products"))
        .json(&json!({
            "name": "Canon R6",
            "price": "40.00",
            "category": "cameras",
            "stock": 2,
            "inventoryId": "RACIN0001"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let product: Value = created.json().await.unwrap();
    let product_id = product["id"].as_str().unwrap().to_string();
    assert_eq!(product["approved"], false);

    let listed: Vec<Value> = reqwest::get(ctx.storefront("/api/products"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed.is_empty());

    let approved = admin
        .post(ctx.admin(&format!("/api/products/{product_id}/approval")))
        .json(&json!({ "approved": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(approved.status(), StatusCode::OK);

    let listed: Vec<Value> = reqwest::get(ctx.storefront("/api/products"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["name"], "Canon R6");
}

#[tokio::test]
async fn test_new_order_notifies_staff_and_updates_dashboard() {
    let ctx = TestContext::start().await;
    ctx.seed_product("p1", "Sony A7 IV", "45.00", 2).await;
    let admin = ctx.admin_client("ops@rentacam.example", AdminRole::Admin).await;

    let (customer, _) = ctx.register_customer("ana@example.com", "Ana Silva").await;
    customer
        .post(ctx.storefront("/api/cart/items"))
        .json(&json!({ "productId": "p1", "quantity": 1 }))
        .send()
        .await
        .unwrap();
    let order: Value = customer
        .post(ctx.storefront("/api/checkout"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order_id = order["id"].as_str().unwrap().to_string();

    let notification = eventually(|| async {
        let notifications: Vec<Value> = admin
            .get(ctx.admin("/api/notifications"))
            .send()
            .await
            .ok()?
            .json()
            .await
            .ok()?;
        notifications
            .into_iter()
            .find(|n| n["type"] == "new_order" && n["orderId"] == order_id.as_str())
    })
    .await;
    assert!(notification.is_some(), "no new_order notification was raised");

    let dashboard = eventually(|| async {
        let stats: Value = admin
            .get(ctx.admin("/api/dashboard"))
            .send()
            .await
            .ok()?
            .json()
            .await
            .ok()?;
        (stats["orders"]["totalOrders"] == 1).then_some(stats)
    })
    .await
    .unwrap();
    assert_eq!(dashboard["orders"]["pending"], 1);

    let updated: Value = admin
        .patch(ctx.admin(&format!("/api/orders/{order_id}/status")))
        .json(&json!({ "status": "completed", "paymentStatus": "paid" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["status"], "completed");

    // The customer sees the new status
    let mine: Value = customer
        .get(ctx.storefront(&format!("/api/orders/{order_id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine["paymentStatus"], "paid");
}

#[tokio::test]
async fn test_suspended_customer_is_locked_out() {
    let ctx = TestContext::start().await;
    ctx.seed_product("p1", "Sony A7 IV", "45.00", 2).await;
    let admin = ctx.admin_client("ops@rentacam.example", AdminRole::Admin).await;

    let (customer, registered) = ctx.register_customer("eve@example.com", "Eve").await;
    let customer_id = registered["customer"]["id"].as_str().unwrap().to_string();
    customer
        .post(ctx.storefront("/api/cart/items"))
        .json(&json!({ "productId": "p1", "quantity": 1 }))
        .send()
        .await
        .unwrap();

    let suspended = admin
        .post(ctx.admin(&format!("/api/customers/{customer_id}/status")))
        .json(&json!({ "accountStatus": "suspended" }))
        .send()
        .await
        .unwrap();
    assert_eq!(suspended.status(), StatusCode::OK);

    // The existing session can no longer order
    let checkout = customer
        .post(ctx.storefront("/api/checkout"))
        .send()
        .await
        .unwrap();
    assert_eq!(checkout.status(), StatusCode::FORBIDDEN);

    let login = TestContext::client()
        .post(ctx.storefront("/api/auth/login"))
        .json(&json!({ "email": "eve@example.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_viewer_is_read_only() {
    let ctx = TestContext::start().await;
    let viewer = ctx.admin_client("viewer@rentacam.example", AdminRole::Viewer).await;

    let list = viewer.get(ctx.admin("/api/inventory")).send().await.unwrap();
    assert_eq!(list.status(), StatusCode::OK);

    let write = viewer
        .post(ctx.admin("/api/inventory"))
        .json(&json!({ "name": "Tripod", "stock": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(write.status(), StatusCode::FORBIDDEN);

    let anonymous = TestContext::client()
        .get(ctx.admin("/api/inventory"))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}
