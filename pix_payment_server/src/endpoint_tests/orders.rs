use actix_web::{http::StatusCode, test, test::TestRequest, App};
use pix_payment_engine::{test_utils::StubGateway, MemoryStore};
use serde_json::json;

use super::{
    helpers::{configure, error_message, post_json, send},
    mocks::{MockGateway, SharedMock},
};

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let app = test::init_service(App::new().configure(configure(MemoryStore::new(), StubGateway::new()))).await;
    let res = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn create_order() {
    let _ = env_logger::try_init().ok();
    let db = MemoryStore::new();
    let app = test::init_service(App::new().configure(configure(db.clone(), StubGateway::new()))).await;
    let req = post_json("/api/orders", json!({"items": [{"id": "p-1", "price": "10,00", "quantity": 2}]}));
    let (status, body) = send(&app, req.to_request()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total"], json!(20.0));
    assert_eq!(body["status"], "PENDING");
    assert!(body["orderId"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(db.len().await, 1);
}

#[actix_web::test]
async fn create_order_with_localized_prices() {
    let _ = env_logger::try_init().ok();
    let app = test::init_service(App::new().configure(configure(MemoryStore::new(), StubGateway::new()))).await;
    let items = json!({"items": [{"price": "R$ 1.234,56"}, {"price": 10.5, "quantity": 2}], "email": "a@b.com"});
    let (status, body) = send(&app, post_json("/api/orders", items).to_request()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total"], json!(1255.56));
}

#[actix_web::test]
async fn invalid_orders() {
    let _ = env_logger::try_init().ok();
    let db = MemoryStore::new();
    let app = test::init_service(App::new().configure(configure(db.clone(), StubGateway::new()))).await;
    for items in [
        json!({"items": []}),
        json!({"items": [{"price": "abc"}]}),
        json!({"items": [{"price": "-1,00"}]}),
        json!({"items": [{"price": "10.505"}]}),
        json!({"items": [{"price": "10", "quantity": 0}]}),
    ] {
        let (status, body) = send(&app, post_json("/api/orders", items.clone()).to_request()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{items}");
        assert!(!error_message(&body).is_empty());
    }
    assert!(db.is_empty().await);
}

#[actix_web::test]
async fn malformed_json_body() {
    let _ = env_logger::try_init().ok();
    let app = test::init_service(App::new().configure(configure(MemoryStore::new(), StubGateway::new()))).await;
    let req = TestRequest::post()
        .uri("/api/orders")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"items\": [")
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).starts_with("Could not read request body"));
}

#[actix_web::test]
async fn fetch_unknown_order() {
    let _ = env_logger::try_init().ok();
    let app = test::init_service(App::new().configure(configure(MemoryStore::new(), StubGateway::new()))).await;
    let (status, body) = send(&app, TestRequest::get().uri("/api/orders/nope").to_request()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(error_message(&body).contains("nope"));
}

#[actix_web::test]
async fn fetch_new_order_does_not_call_the_gateway() {
    let _ = env_logger::try_init().ok();
    // No expectations: any gateway call panics
    let gateway = SharedMock::new(MockGateway::new());
    let app = test::init_service(App::new().configure(configure(MemoryStore::new(), gateway))).await;
    let (_, created) = send(&app, post_json("/api/orders", json!({"items": [{"price": 5}]})).to_request()).await;
    let id = created["orderId"].as_str().unwrap();
    let (status, body) = send(&app, TestRequest::get().uri(&format!("/api/orders/{id}")).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["total"], json!(5.0));
    assert_eq!(body["items"][0]["quantity"], 1);
    assert!(body["paymentHandle"].is_null());
}

#[actix_web::test]
async fn polling_reconciles_approved_payments() {
    let _ = env_logger::try_init().ok();
    let gateway = StubGateway::new();
    let app = test::init_service(App::new().configure(configure(MemoryStore::new(), gateway.clone()))).await;
    let (_, created) = send(&app, post_json("/api/orders", json!({"items": [{"price": "10,00"}]})).to_request()).await;
    let id = created["orderId"].as_str().unwrap().to_string();
    let (status, payment) = send(&app, post_json("/api/payments/pix", json!({"orderId": id})).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    let uri = format!("/api/orders/{id}");

    let (_, order) = send(&app, TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["paymentHandle"], payment["paymentHandle"]);
    assert_eq!(order["qrPayload"], payment["qrPayload"]);

    gateway.approve(&payment["paymentHandle"].as_str().unwrap().into());
    let (_, order) = send(&app, TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(order["status"], "PAID");
    assert!(order["paidAt"].is_string());
    let calls = gateway.status_calls();

    // Paid orders are served from the store
    let (_, order) = send(&app, TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(order["status"], "PAID");
    assert_eq!(gateway.status_calls(), calls);
}

#[actix_web::test]
async fn polling_survives_gateway_failures() {
    let _ = env_logger::try_init().ok();
    let gateway = StubGateway::new();
    let app = test::init_service(App::new().configure(configure(MemoryStore::new(), gateway.clone()))).await;
    let (_, created) = send(&app, post_json("/api/orders", json!({"items": [{"price": "10,00"}]})).to_request()).await;
    let id = created["orderId"].as_str().unwrap().to_string();
    send(&app, post_json("/api/payments/pix", json!({"orderId": id})).to_request()).await;
    gateway.set_delay(Some(std::time::Duration::from_secs(2)));
    let (status, order) = send(&app, TestRequest::get().uri(&format!("/api/orders/{id}")).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "PENDING");
}
