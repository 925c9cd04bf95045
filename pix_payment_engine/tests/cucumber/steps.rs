use std::{collections::HashMap, time::Duration};

use cucumber::{then, when};
use pgw_common::Cents;
use pix_payment_engine::{
    db_types::{NewLineItem, OrderStatusType},
    order_objects::{GatewayNotification, NotificationOutcome},
    traits::{GatewayError, OrderStore},
};

use crate::cucumber::PixWorld;

#[when(expr = "the customer places order {word} for {int} x {word} at {string}")]
async fn place_order(world: &mut PixWorld, alias: String, quantity: i64, product: String, price: String) {
    let items = vec![NewLineItem::new(&product, price.as_str(), quantity)];
    let result = world.system().flow.create_order(items, None).await;
    match result {
        Ok(order) => {
            world.orders.insert(alias, order.id.clone());
            world.last_order = Some(order);
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[when(expr = "the customer requests a PIX payment for order {word}")]
async fn request_payment(world: &mut PixWorld, alias: String) {
    let order_id = world.order_id(&alias);
    let result = world.system().flow.request_pix_payment(&order_id, None).await;
    match result {
        Ok(_) => world.last_error = None,
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[when(expr = "the gateway is unavailable")]
async fn gateway_down(world: &mut PixWorld) {
    let error = Some(GatewayError::Transport("connection refused".into()));
    world.system().gateway.fail_creates_with(error.clone());
    world.system().gateway.fail_status_with(error);
}

#[when(expr = "the gateway recovers")]
async fn gateway_up(world: &mut PixWorld) {
    world.system().gateway.fail_creates_with(None);
    world.system().gateway.fail_status_with(None);
}

#[when(expr = "the gateway approves the payment for order {word}")]
async fn approve_payment(world: &mut PixWorld, alias: String) {
    let order = fetch(world, &alias).await;
    let handle = order.payment_handle().expect("The order has no payment");
    world.system().gateway.approve(handle);
}

#[when(expr = "the gateway sends {int} payment notification(s) for order {word}")]
async fn send_notifications(world: &mut PixWorld, count: usize, alias: String) {
    let order = fetch(world, &alias).await;
    let handle = order.payment_handle().expect("The order has no payment").clone();
    for _ in 0..count {
        let body = format!(r#"{{"action": "payment.updated", "type": "payment", "data": {{"id": "{handle}"}}}}"#);
        let notification = GatewayNotification::from_parts(body.as_bytes(), &HashMap::new());
        let outcome = world.system().notifications.handle_notification(notification).await;
        assert!(!matches!(outcome, NotificationOutcome::Failed(_)), "Notification failed: {outcome:?}");
    }
}

#[when(expr = "the storefront polls order {word}")]
async fn poll_order(world: &mut PixWorld, alias: String) {
    let order_id = world.order_id(&alias);
    let order = world.system().status.get_order_with_freshness(&order_id).await.expect("Error polling order");
    world.last_order = Some(order);
}

#[when(expr = "unpaid orders older than {int}ms are expired")]
async fn expire_orders(world: &mut PixWorld, ms: i64) {
    world.system().flow.expire_unpaid_orders(chrono::Duration::milliseconds(ms)).await.expect("Error expiring orders");
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut PixWorld, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

async fn fetch(world: &PixWorld, alias: &str) -> pix_payment_engine::db_types::Order {
    let order_id = world.order_id(alias);
    world.system().db.fetch_order(&order_id).await.expect("Error fetching order").expect("Order does not exist")
}

#[then(expr = "order {word} has a total of {string}")]
async fn check_total(world: &mut PixWorld, alias: String, total: String) {
    let order = fetch(world, &alias).await;
    let expected = total.parse::<Cents>().expect("Not a valid amount");
    assert_eq!(order.total, expected);
}

#[then(expr = "order {word} is {word}")]
async fn check_status(world: &mut PixWorld, alias: String, status: String) {
    let order = fetch(world, &alias).await;
    let expected = status.parse::<OrderStatusType>().expect("Not a valid order status");
    assert_eq!(order.status, expected);
    match expected {
        OrderStatusType::Pending => assert!(order.paid_at.is_none() && order.cancelled_at.is_none()),
        OrderStatusType::Paid => assert!(order.paid_at.is_some() && order.cancelled_at.is_none()),
        OrderStatusType::Cancelled => assert!(order.cancelled_at.is_some() && order.paid_at.is_none()),
    }
}

#[then(expr = "order {word} has a PIX payment")]
async fn check_has_payment(world: &mut PixWorld, alias: String) {
    let order = fetch(world, &alias).await;
    let payment = order.payment.expect("The order has no payment");
    assert!(!payment.presentation.qr_payload.is_empty());
}

#[then(expr = "order {word} has no PIX payment")]
async fn check_has_no_payment(world: &mut PixWorld, alias: String) {
    let order = fetch(world, &alias).await;
    assert!(order.payment.is_none());
}

#[then(expr = "the gateway created {int} payment(s)")]
async fn check_create_calls(world: &mut PixWorld, count: usize) {
    assert_eq!(world.system().gateway.create_calls(), count);
}

#[then(expr = "the request fails with {string}")]
async fn check_error(world: &mut PixWorld, message: String) {
    let error = world.last_error.as_deref().expect("The last request did not fail");
    assert!(error.contains(&message), "Expected an error containing '{message}', got '{error}'");
}

#[then(expr = "the polled order is {word}")]
async fn check_polled(world: &mut PixWorld, status: String) {
    let order = world.last_order.as_ref().expect("No order has been polled");
    assert_eq!(order.status.to_string(), status);
}
