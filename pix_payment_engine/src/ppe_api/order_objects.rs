use std::collections::HashMap;

use pgw_common::Cents;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    db_types::{Order, OrderId, OrderStatusType, PaymentDetails, PaymentHandle, PaymentStatus},
    traits::PaymentStatusReport,
};

/// What a channel learned about a payment, as fed into the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSignal {
    pub status: PaymentStatus,
    /// The amount the gateway says was paid, when it reports one.
    pub amount: Option<Cents>,
}

impl PaymentSignal {
    pub fn approved() -> Self {
        Self { status: PaymentStatus::Approved, amount: None }
    }
}

impl From<&PaymentStatusReport> for PaymentSignal {
    fn from(report: &PaymentStatusReport) -> Self {
        Self { status: report.status.clone(), amount: report.amount }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResult {
    /// True only for the one call that moved the order to `PAID`.
    pub applied: bool,
    pub current_status: OrderStatusType,
    #[serde(skip)]
    pub order: Order,
}

impl ReconcileResult {
    pub fn applied(order: Order) -> Self {
        Self { applied: true, current_status: order.status, order }
    }

    pub fn unchanged(order: Order) -> Self {
        Self { applied: false, current_status: order.status, order }
    }
}

/// The payment data handed back to the payer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixPaymentResult {
    pub order_id: OrderId,
    pub payment_handle: PaymentHandle,
    pub qr_payload: String,
    pub qr_image_base64: Option<String>,
    pub gateway_status: PaymentStatus,
}

impl PixPaymentResult {
    pub fn new(order_id: OrderId, payment: &PaymentDetails) -> Self {
        Self {
            order_id,
            payment_handle: payment.handle.clone(),
            qr_payload: payment.presentation.qr_payload.clone(),
            qr_image_base64: payment.presentation.qr_image.as_ref().map(base64::encode),
            gateway_status: payment.gateway_status.clone(),
        }
    }
}

/// A payment notification, as delivered by the gateway.
///
/// The gateway is inconsistent about where it puts things, so both the body and the query string are searched. The
/// body takes precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayNotification {
    pub payment_reference: Option<PaymentHandle>,
    pub topic: Option<String>,
}

impl GatewayNotification {
    /// Builds a notification from the raw request body and its query parameters.
    ///
    /// The payment reference is taken from body `data.id` (a string or a number), then query `data.id`, then query
    /// `id`. The topic is taken from body `type`, then query `topic`, then query `type`. A body that is not JSON is
    /// treated as empty.
    pub fn from_parts(body: &[u8], query: &HashMap<String, String>) -> Self {
        let body = serde_json::from_slice::<Value>(body).unwrap_or(Value::Null);
        let query_value = |key: &str| query.get(key).map(|s| s.trim()).filter(|s| !s.is_empty()).map(String::from);
        let body_reference = match body.pointer("/data/id") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let payment_reference = body_reference
            .or_else(|| query_value("data.id"))
            .or_else(|| query_value("id"))
            .map(PaymentHandle::from);
        let body_topic = body.get("type").and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty());
        let topic = body_topic.map(String::from).or_else(|| query_value("topic")).or_else(|| query_value("type"));
        Self { payment_reference, topic }
    }

    /// Notifications without a topic are assumed to be about a payment.
    pub fn is_payment_topic(&self) -> bool {
        self.topic.as_deref().map_or(true, |t| t.eq_ignore_ascii_case("payment"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Nothing was done. The reason is for logging only.
    Ignored(String),
    Reconciled(ReconcileResult),
    /// Something went wrong. The notification is acknowledged anyway and a later poll or notification will retry.
    Failed(String),
}
