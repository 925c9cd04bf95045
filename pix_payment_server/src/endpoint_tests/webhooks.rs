use actix_web::{http::StatusCode, test, test::TestRequest, App};
use pix_payment_engine::{
    db_types::{OrderId, OrderStatusType, PaymentHandle, PaymentStatus},
    test_utils::StubGateway,
    traits::{GatewayError, OrderStore, PaymentStatusReport},
    MemoryStore,
};
use serde_json::json;

use super::{
    helpers::{configure, post_json, seed_order, send},
    mocks::{MockGateway, SharedMock},
};

const WEBHOOK: &str = "/api/webhooks/mercadopago";

#[actix_web::test]
async fn end_to_end_payment_via_webhook() {
    let _ = env_logger::try_init().ok();
    let gateway = StubGateway::new();
    let app = test::init_service(App::new().configure(configure(MemoryStore::new(), gateway.clone()))).await;
    let items = json!({"items": [{"price": "10,00", "quantity": 2}]});
    let (_, created) = send(&app, post_json("/api/orders", items).to_request()).await;
    assert_eq!(created["total"], json!(20.0));
    let id = created["orderId"].as_str().unwrap().to_string();
    let (_, payment) = send(&app, post_json("/api/payments/pix", json!({"orderId": id})).to_request()).await;
    let handle = payment["paymentHandle"].as_str().unwrap().to_string();
    assert!(payment["qrPayload"].is_string());

    gateway.approve(&PaymentHandle::from(handle.as_str()));
    let notification = json!({"action": "payment.updated", "type": "payment", "data": {"id": handle}});
    let (status, _) = send(&app, post_json(WEBHOOK, notification.clone()).to_request()).await;
    assert_eq!(status, StatusCode::OK);

    let calls = gateway.status_calls();
    let (_, order) = send(&app, TestRequest::get().uri(&format!("/api/orders/{id}")).to_request()).await;
    assert_eq!(order["status"], "PAID");
    assert!(order["paidAt"].is_string());
    assert_eq!(gateway.status_calls(), calls);

    // Mercado Pago re-delivers notifications
    let (status, _) = send(&app, post_json(WEBHOOK, notification).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    let (_, again) = send(&app, TestRequest::get().uri(&format!("/api/orders/{id}")).to_request()).await;
    assert_eq!(again["paidAt"], order["paidAt"]);
}

#[actix_web::test]
async fn payment_reference_in_query_string() {
    let _ = env_logger::try_init().ok();
    let db = MemoryStore::new();
    let id = seed_order(&db, "10,00", 1).await;
    let mut mock = MockGateway::new();
    let order_id = id.clone();
    mock.expect_payment_status().withf(|handle| handle.as_str() == "42").times(1).returning(move |handle| {
        Ok(PaymentStatusReport::new(handle.clone(), PaymentStatus::Approved).with_external_reference(order_id.clone()))
    });
    let app = test::init_service(App::new().configure(configure(db.clone(), SharedMock::new(mock)))).await;
    let req = TestRequest::post().uri(&format!("{WEBHOOK}?topic=payment&id=42")).to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(db.fetch_order(&id).await.unwrap().unwrap().status, OrderStatusType::Paid);
}

#[actix_web::test]
async fn body_reference_beats_query_reference() {
    let _ = env_logger::try_init().ok();
    let mut mock = MockGateway::new();
    mock.expect_payment_status()
        .withf(|handle| handle.as_str() == "from-body")
        .times(1)
        .returning(|handle| Ok(PaymentStatusReport::new(handle.clone(), PaymentStatus::Pending)));
    let app = test::init_service(App::new().configure(configure(MemoryStore::new(), SharedMock::new(mock)))).await;
    let req = post_json(&format!("{WEBHOOK}?data.id=from-query"), json!({"type": "payment", "data": {"id": "from-body"}}));
    let (status, _) = send(&app, req.to_request()).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn ignored_notifications_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    // No expectations: none of these may reach the gateway
    let app = test::init_service(
        App::new().configure(configure(MemoryStore::new(), SharedMock::new(MockGateway::new()))),
    )
    .await;
    let cases = [
        TestRequest::post().uri(WEBHOOK).set_payload("not json"),
        TestRequest::post().uri(WEBHOOK).set_json(json!({})),
        TestRequest::post().uri(&format!("{WEBHOOK}?topic=merchant_order&id=9")),
        TestRequest::post().uri(WEBHOOK).set_json(json!({"type": "plan", "data": {"id": 9}})),
    ];
    for req in cases {
        let (status, _) = send(&app, req.to_request()).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[actix_web::test]
async fn malformed_payment_references_never_reach_the_gateway() {
    let _ = env_logger::try_init().ok();
    let mut mock = MockGateway::new();
    mock.expect_payment_status().never();
    let app = test::init_service(App::new().configure(configure(MemoryStore::new(), SharedMock::new(mock)))).await;
    for reference in ["1/../../v1/merchant_orders/5", "1?x=", "..", "12 34"] {
        let body = json!({"type": "payment", "data": {"id": reference}});
        let (status, _) = send(&app, post_json(WEBHOOK, body).to_request()).await;
        assert_eq!(status, StatusCode::OK);
    }
    let req = TestRequest::post().uri(&format!("{WEBHOOK}?topic=payment&id=1%2F..%2Fv1%2Fusers%2Fme"));
    let (status, _) = send(&app, req.to_request()).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn failures_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let db = MemoryStore::new();
    let id = seed_order(&db, "10,00", 1).await;
    let missing = OrderId::from("not-an-order");
    let mut mock = MockGateway::new();
    mock.expect_payment_status()
        .withf(|handle| handle.as_str() == "1")
        .returning(|_| Err(GatewayError::Transport("connection refused".into())));
    mock.expect_payment_status()
        .withf(|handle| handle.as_str() == "2")
        .returning(move |handle| {
            Ok(PaymentStatusReport::new(handle.clone(), PaymentStatus::Approved).with_external_reference(missing.clone()))
        });
    mock.expect_payment_status()
        .withf(|handle| handle.as_str() == "3")
        .returning(|handle| Ok(PaymentStatusReport::new(handle.clone(), PaymentStatus::Approved)));
    let app = test::init_service(App::new().configure(configure(db.clone(), SharedMock::new(mock)))).await;
    for payment in ["1", "2", "3"] {
        let req = post_json(WEBHOOK, json!({"type": "payment", "data": {"id": payment}}));
        let (status, _) = send(&app, req.to_request()).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(db.fetch_order(&id).await.unwrap().unwrap().status, OrderStatusType::Pending);
}

#[actix_web::test]
async fn amount_mismatch_does_not_pay() {
    let _ = env_logger::try_init().ok();
    let db = MemoryStore::new();
    let id = seed_order(&db, "10,00", 1).await;
    let order_id = id.clone();
    let mut mock = MockGateway::new();
    mock.expect_payment_status().returning(move |handle| {
        Ok(PaymentStatusReport::new(handle.clone(), PaymentStatus::Approved)
            .with_external_reference(order_id.clone())
            .with_amount(pgw_common::Cents::from(100)))
    });
    let app = test::init_service(App::new().configure(configure(db.clone(), SharedMock::new(mock)))).await;
    let (status, _) =
        send(&app, post_json(WEBHOOK, json!({"type": "payment", "data": {"id": 7}})).to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(db.fetch_order(&id).await.unwrap().unwrap().status, OrderStatusType::Pending);
}
