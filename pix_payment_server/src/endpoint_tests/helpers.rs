use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test,
    test::TestRequest,
};
use log::debug;
use pix_payment_engine::{
    db_types::{NewLineItem, OrderId},
    events::EventProducers,
    test_utils::StubGateway,
    traits::{OrderStore, PaymentGateway},
    OrderFlowApi,
    OrderFlowConfig,
};
use serde_json::Value;

use crate::server::configure_app;

pub fn configure<B, G>(db: B, gateway: G) -> impl FnOnce(&mut actix_web::web::ServiceConfig)
where
    B: OrderStore + Clone + 'static,
    G: PaymentGateway + Clone + 'static,
{
    let config = OrderFlowConfig { gateway_timeout: std::time::Duration::from_millis(500), ..Default::default() };
    configure_app(db, gateway, EventProducers::default(), config)
}

/// Sends the request and returns the status with the body parsed as JSON (`Value::Null` for an empty body).
pub async fn send<S, R, B>(app: &S, req: R) -> (StatusCode, Value)
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    debug!("Making request");
    let res = test::call_service(app, req).await;
    let status = res.status();
    let body = test::read_body(res).await;
    let json = if body.is_empty() { Value::Null } else { serde_json::from_slice(&body).unwrap_or(Value::Null) };
    (status, json)
}

pub fn post_json(path: &str, body: Value) -> TestRequest {
    TestRequest::post().uri(path).set_json(body)
}

pub fn error_message(body: &Value) -> &str {
    body["error"].as_str().unwrap_or_default()
}

/// Stores a pending order with a single line item, bypassing HTTP.
pub async fn seed_order<B: OrderStore + Clone>(db: &B, price: &str, quantity: i64) -> OrderId {
    let api = OrderFlowApi::new(db.clone(), StubGateway::new(), EventProducers::default(), OrderFlowConfig::default());
    api.create_order(vec![NewLineItem::new("p-1", price, quantity)], None).await.unwrap().id
}
