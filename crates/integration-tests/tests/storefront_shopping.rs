//! Customer journeys against the storefront API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use rentacam_core::models::collections;
use rentacam_integration_tests::{PASSWORD, TestContext};

#[tokio::test]
async fn test_register_browse_rent_and_check_out() {
    let ctx = TestContext::start().await;
    ctx.seed_product("p1", "Sony A7 IV", "45.00", 2).await;
    ctx.store
        .set(
            collections::PRODUCTS,
            "p2",
            json!({ "name": "Hidden Lens", "price": "10.00", "approved": false }),
        )
        .await
        .unwrap();

    let (client, registered) = ctx.register_customer("ana@example.com", "Ana Silva").await;
    assert_eq!(registered["customer"]["email"], "ana@example.com");
    assert_eq!(registered["customer"]["accountStatus"], "active");

    let me: Value = client
        .get(ctx.storefront("/api/auth/me"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["email"], "ana@example.com");

    // Only approved products are visible
    let products: Vec<Value> = client
        .get(ctx.storefront("/api/products"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["id"], "p1");
    let hidden = client
        .get(ctx.storefront("/api/products/p2"))
        .send()
        .await
        .unwrap();
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);

    // More than the inventory holds is refused
    let too_many = client
        .post(ctx.storefront("/api/cart/items"))
        .json(&json!({ "productId": "p1", "quantity": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(too_many.status(), StatusCode::BAD_REQUEST);
    let error: Value = too_many.json().await.unwrap();
    assert_eq!(error["field"], "quantity");

    let cart: Value = client
        .post(ctx.storefront("/api/cart/items"))
        .json(&json!({ "productId": "p1", "quantity": 1, "rentalDays": 2 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["itemCount"], 1);
    assert_eq!(cart["subtotal"], "90.00");

    let wishlist: Value = client
        .post(ctx.storefront("/api/wishlist/p1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(wishlist["wishlist"], json!(["p1"]));

    let placed = client
        .post(ctx.storefront("/api/checkout"))
        .send()
        .await
        .unwrap();
    assert_eq!(placed.status(), StatusCode::CREATED);
    let order: Value = placed.json().await.unwrap();
    assert_eq!(order["status"], "pending");
    assert_eq!(order["paymentStatus"], "pending");
    assert_eq!(order["userEmail"], "ana@example.com");

    let cart: Value = client
        .get(ctx.storefront("/api/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["lines"], json!([]));

    let orders: Vec<Value> = client
        .get(ctx.storefront("/api/orders"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], order["id"]);

    // Nothing left to buy
    let empty = client
        .post(ctx.storefront("/api/checkout"))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sign_out_and_back_in() {
    let ctx = TestContext::start().await;
    let (client, _) = ctx.register_customer("ben@example.com", "Ben Okafor").await;

    let logout = client
        .post(ctx.storefront("/api/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);

    let me = client
        .get(ctx.storefront("/api/auth/me"))
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::UNAUTHORIZED);

    let wrong = client
        .post(ctx.storefront("/api/auth/login"))
        .json(&json!({ "email": "ben@example.com", "password": "not-the-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    // Emails are matched case-insensitively
    let login = client
        .post(ctx.storefront("/api/auth/login"))
        .json(&json!({ "email": "BEN@example.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);

    let me = client
        .get(ctx.storefront("/api/auth/me"))
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_duplicate_registration_is_a_conflict() {
    let ctx = TestContext::start().await;
    ctx.register_customer("cleo@example.com", "Cleo").await;

    let again = TestContext::client()
        .post(ctx.storefront("/api/auth/register"))
        .json(&json!({ "email": "Cleo@Example.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_profile_and_id_verification() {
    let ctx = TestContext::start().await;
    let (client, _) = ctx.register_customer("dara@example.com", "Dara").await;

    let profile: Value = client
        .patch(ctx.storefront("/api/account"))
        .json(&json!({
            "fullName": "Dara Quinn",
            "address": { "street": "1 Main St", "city": "Lisbon", "country": "PT" }
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["fullName"], "Dara Quinn");
    assert_eq!(profile["address"]["city"], "Lisbon");

    let submitted: Value = client
        .post(ctx.storefront("/api/account/id-verification"))
        .json(&json!({ "type": "passport", "number": "X1234567" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(submitted["idVerification"]["type"], "passport");
    assert_eq!(submitted["idVerification"]["verified"], false);

    let anonymous = TestContext::client()
        .get(ctx.storefront("/api/account"))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}
