use actix_web::{http::StatusCode, test, test::TestRequest, App};
use pix_payment_engine::{
    db_types::{OrderStatusType, PaymentHandle, PaymentStatus},
    test_utils::StubGateway,
    traits::{GatewayError, OrderStore, PixPayment},
    MemoryStore,
};
use serde_json::json;

use super::{
    helpers::{configure, error_message, post_json, seed_order, send},
    mocks::{MockGateway, SharedMock},
};

#[actix_web::test]
async fn request_pix_payment() {
    let _ = env_logger::try_init().ok();
    let db = MemoryStore::new();
    let gateway = StubGateway::new();
    let id = seed_order(&db, "10,00", 2).await;
    let app = test::init_service(App::new().configure(configure(db.clone(), gateway.clone()))).await;
    let req = post_json("/api/payments/pix", json!({"orderId": id, "payer": {"email": " buyer@example.com "}}));
    let (status, body) = send(&app, req.to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paymentHandle"], "1000001");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["qrImageBase64"], "AQID");
    assert!(body["qrPayload"].as_str().unwrap().contains(id.as_str()));

    let requests = gateway.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount.value(), 2000);
    assert_eq!(requests[0].external_reference, id);
    assert_eq!(requests[0].payer_email, "buyer@example.com");
    assert_eq!(requests[0].description, format!("Pedido - {}", id.short()));
    let order = db.fetch_order(&id).await.unwrap().unwrap();
    assert_eq!(order.email.as_deref(), Some("buyer@example.com"));
    assert_eq!(order.payment_handle(), Some(&PaymentHandle::from("1000001")));
}

#[actix_web::test]
async fn repeated_requests_return_the_same_payment() {
    let _ = env_logger::try_init().ok();
    let db = MemoryStore::new();
    let gateway = StubGateway::new();
    let id = seed_order(&db, "5", 1).await;
    let app = test::init_service(App::new().configure(configure(db, gateway.clone()))).await;
    let (_, first) = send(&app, post_json("/api/payments/pix", json!({"orderId": id})).to_request()).await;
    let (status, second) =
        send(&app, post_json("/api/payments/pix", json!({"orderId": id, "payerEmail": "x@y.com"})).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(gateway.create_calls(), 1);
    assert_eq!(gateway.requests()[0].payer_email, "test_user_123456@testuser.com");
}

#[actix_web::test]
async fn payment_for_unknown_order() {
    let _ = env_logger::try_init().ok();
    let gateway = SharedMock::new(MockGateway::new());
    let app = test::init_service(App::new().configure(configure(MemoryStore::new(), gateway))).await;
    let (status, body) = send(&app, post_json("/api/payments/pix", json!({"orderId": "missing"})).to_request()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(error_message(&body).contains("missing"));
}

#[actix_web::test]
async fn payment_for_zero_total() {
    let _ = env_logger::try_init().ok();
    let db = MemoryStore::new();
    let id = seed_order(&db, "0,00", 1).await;
    let gateway = SharedMock::new(MockGateway::new());
    let app = test::init_service(App::new().configure(configure(db, gateway))).await;
    let (status, body) = send(&app, post_json("/api/payments/pix", json!({"orderId": id})).to_request()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("cannot be paid"));
}

#[actix_web::test]
async fn gateway_failures_are_bad_gateway() {
    let _ = env_logger::try_init().ok();
    let db = MemoryStore::new();
    let id = seed_order(&db, "10,00", 1).await;
    let mut mock = MockGateway::new();
    mock.expect_create_pix_payment()
        .times(1)
        .returning(|_| Err(GatewayError::Rejected { status: 400, message: "payer.email is invalid".into() }));
    let app = test::init_service(App::new().configure(configure(db.clone(), SharedMock::new(mock)))).await;
    let (status, body) = send(&app, post_json("/api/payments/pix", json!({"orderId": id})).to_request()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(error_message(&body).contains("payer.email is invalid"));
    let order = db.fetch_order(&id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);
    assert!(order.payment.is_none());
}

#[actix_web::test]
async fn gateway_response_is_stored() {
    let _ = env_logger::try_init().ok();
    let db = MemoryStore::new();
    let id = seed_order(&db, "12,34", 1).await;
    let mut mock = MockGateway::new();
    mock.expect_create_pix_payment().times(1).returning(|req| {
        assert_eq!(req.amount.value(), 1234);
        Ok(PixPayment {
            payment_id: PaymentHandle::from("555"),
            status: PaymentStatus::Pending,
            qr_payload: "000201".into(),
            qr_image_base64: None,
        })
    });
    let app = test::init_service(App::new().configure(configure(db.clone(), SharedMock::new(mock)))).await;
    let (status, body) = send(&app, post_json("/api/payments/pix", json!({"orderId": id})).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"paymentHandle": "555", "qrPayload": "000201", "status": "pending"}));
    let order = db.fetch_order(&id).await.unwrap().unwrap();
    assert_eq!(order.payment.unwrap().presentation.qr_payload, "000201");
}

#[actix_web::test]
async fn paid_orders_cannot_be_paid_again() {
    let _ = env_logger::try_init().ok();
    let db = MemoryStore::new();
    let id = seed_order(&db, "10,00", 1).await;
    let app = test::init_service(App::new().configure(configure(db, StubGateway::new()))).await;
    let (status, body) = send(&app, post_json("/api/test/approve", json!({"orderId": id})).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PAID");
    let (status, body) = send(&app, post_json("/api/payments/pix", json!({"orderId": id})).to_request()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("PAID"));
}

#[actix_web::test]
async fn test_approval_endpoint() {
    let _ = env_logger::try_init().ok();
    let db = MemoryStore::new();
    let id = seed_order(&db, "10,00", 1).await;
    let app = test::init_service(App::new().configure(configure(db.clone(), StubGateway::new()))).await;
    let (status, body) = send(&app, post_json("/api/test/approve", json!({"orderId": id})).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "PAID", "message": "Order manually approved for testing"}));
    let (status, body) = send(&app, post_json("/api/test/approve", json!({"orderId": id})).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "PAID", "message": "Order is already PAID"}));
    let order = db.fetch_order(&id).await.unwrap().unwrap();
    assert!(order.paid_at.is_some());

    let (status, _) = send(&app, post_json("/api/test/approve", json!({"orderId": "missing"})).to_request()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, TestRequest::get().uri("/api/test/approve").to_request()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
