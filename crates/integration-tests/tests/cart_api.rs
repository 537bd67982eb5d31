//! End-to-end tests for the cart endpoints, order history and stock admin.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use cartwright_integration_tests::TestApp;

fn quantities(cart: &Value) -> Vec<(i64, i64)> {
    cart.as_array()
        .unwrap()
        .iter()
        .map(|line| (line["id"].as_i64().unwrap(), line["qty"].as_i64().unwrap()))
        .collect()
}

#[tokio::test]
async fn test_get_cart_returns_product_records_with_qty() {
    let app = TestApp::new();
    let user = app.customer("ada@example.com").await;
    let p1 = app.product("Backpack", 110, 4).await;

    app.put(
        &format!("/users/{user}/cart"),
        &json!({ "items": [{ "productId": p1.as_i32(), "qty": 2 }] }),
    )
    .await;

    let resp = app.get(&format!("/users/{user}/cart")).await;
    assert_eq!(resp.status, StatusCode::OK);

    let line = &resp.body[0];
    assert_eq!(line["id"], p1.as_i32());
    assert_eq!(line["title"], "Backpack");
    assert_eq!(line["stock"], 4);
    assert_eq!(line["qty"], 2);
}

#[tokio::test]
async fn test_put_replaces_and_is_idempotent() {
    let app = TestApp::new();
    let user = app.customer("ada@example.com").await;
    let p1 = app.product("P1", 1, 9).await;
    let p2 = app.product("P2", 2, 9).await;
    let uri = format!("/users/{user}/cart");

    app.put(&uri, &json!({ "items": [{ "productId": p1.as_i32(), "qty": 5 }] }))
        .await;

    let body = json!({ "items": [
        { "productId": p2.as_i32(), "qty": 1 },
        { "productId": p2.as_i32(), "qty": 2 },
        { "productId": "junk", "qty": 1 },
    ] });
    let first = app.put(&uri, &body).await;
    let second = app.put(&uri, &body).await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body, second.body);
    assert_eq!(quantities(&second.body), vec![(i64::from(p2.as_i32()), 3)]);
}

#[tokio::test]
async fn test_merge_adds_to_existing_lines() {
    let app = TestApp::new();
    let user = app.customer("ada@example.com").await;
    let p1 = app.product("P1", 1, 9).await;
    let p2 = app.product("P2", 2, 9).await;

    app.put(
        &format!("/users/{user}/cart"),
        &json!({ "items": [{ "productId": p1.as_i32(), "qty": 1 }] }),
    )
    .await;

    let resp = app
        .post(
            &format!("/users/{user}/cart/merge"),
            &json!({ "items": [
                { "productId": p1.as_i32(), "qty": 2 },
                { "productId": p2.as_i32(), "qty": 1 },
            ] }),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        quantities(&resp.body),
        vec![(i64::from(p1.as_i32()), 3), (i64::from(p2.as_i32()), 1)]
    );
}

#[tokio::test]
async fn test_delete_clears_cart() {
    let app = TestApp::new();
    let user = app.customer("ada@example.com").await;
    let p1 = app.product("P1", 1, 9).await;
    let uri = format!("/users/{user}/cart");

    app.put(&uri, &json!({ "items": [{ "productId": p1.as_i32(), "qty": 1 }] }))
        .await;

    let resp = app.delete(&uri).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!({ "success": true }));
    assert_eq!(app.get(&uri).await.body, json!([]));
}

#[tokio::test]
async fn test_cart_routes_reject_bad_user_ids_and_unknown_products() {
    let app = TestApp::new();
    let user = app.customer("ada@example.com").await;
    let p1 = app.product("P1", 1, 9).await;

    let resp = app.get("/users/404/cart").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["success"], false);

    for uri in ["/users/not-a-number/cart", "/users/0/cart", "/users/-3/orders"] {
        let resp = app.get(uri).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(resp.body["error"], "Invalid user id", "{uri}");
    }

    app.put(
        &format!("/users/{user}/cart"),
        &json!({ "items": [{ "productId": p1.as_i32(), "qty": 1 }] }),
    )
    .await;
    let resp = app
        .put(
            &format!("/users/{user}/cart"),
            &json!({ "items": [{ "productId": 404, "qty": 1 }] }),
        )
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["error"], "Product not found");
    assert_eq!(app.store.cart(user).await, vec![(p1, 1)]);
}

#[tokio::test]
async fn test_order_history_newest_first() {
    let app = TestApp::new();
    let user = app.customer("ada@example.com").await;
    let p1 = app.product("P1", 3, 9).await;

    for qty in [1, 2] {
        let resp = app
            .post(
                "/checkout",
                &json!({
                    "userId": user.as_i32(),
                    "cartItems": [{ "id": p1.as_i32(), "qty": qty }],
                    "totalAmount": 3 * qty,
                }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED);
    }

    let resp = app.get(&format!("/users/{user}/orders")).await;
    assert_eq!(resp.status, StatusCode::OK);

    let orders = resp.body.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["items"][0]["quantity"], 2);
    assert_eq!(orders[1]["items"][0]["quantity"], 1);

    assert_eq!(app.get("/users/404/orders").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_stock_set_and_restock() {
    let app = TestApp::new();
    let p1 = app.product("P1", 1, 2).await;

    let resp = app
        .request(
            axum::http::Method::PATCH,
            &format!("/admin/products/{p1}"),
            Some(&json!({ "stock": 7 })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["stock"], 7);

    let resp = app
        .request(
            axum::http::Method::PATCH,
            &format!("/admin/products/{p1}"),
            Some(&json!({ "stock": -1 })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .post(&format!("/admin/products/{p1}/restock"), &json!({ "qty": 3 }))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["stock"], 10);
    assert_eq!(app.store.stock(p1).await, Some(10));

    let resp = app
        .post("/admin/products/404/restock", &json!({ "qty": 3 }))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();
    assert_eq!(app.get("/health").await.status, StatusCode::OK);
    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);
}
