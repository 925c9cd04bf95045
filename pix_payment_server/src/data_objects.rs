use chrono::{DateTime, Utc};
use pgw_common::Cents;
use pix_payment_engine::{
    db_types::{LineItem, NewLineItem, Order, OrderId, OrderStatusType, PaymentHandle, PaymentStatus},
    order_objects::PixPaymentResult,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderRequest {
    pub items: Vec<NewLineItem>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderResponse {
    pub order_id: OrderId,
    pub total: Cents,
    pub status: OrderStatusType,
}

impl From<&Order> for NewOrderResponse {
    fn from(order: &Order) -> Self {
        Self { order_id: order.id.clone(), total: order.total, status: order.status }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayerInfo {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixPaymentRequestBody {
    pub order_id: OrderId,
    #[serde(default)]
    pub payer: Option<PayerInfo>,
    #[serde(default)]
    pub payer_email: Option<String>,
}

impl PixPaymentRequestBody {
    /// `payer.email` wins over `payerEmail`.
    pub fn payer_email(&self) -> Option<String> {
        self.payer.as_ref().and_then(|p| p.email.clone()).or_else(|| self.payer_email.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PixPaymentResponse {
    pub payment_handle: PaymentHandle,
    pub qr_payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_image_base64: Option<String>,
    pub status: PaymentStatus,
}

impl From<PixPaymentResult> for PixPaymentResponse {
    fn from(result: PixPaymentResult) -> Self {
        Self {
            payment_handle: result.payment_handle,
            qr_payload: result.qr_payload,
            qr_image_base64: result.qr_image_base64,
            status: result.gateway_status,
        }
    }
}

/// The public view of an order. Payment data is flattened, as the storefront expects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub items: Vec<LineItem>,
    pub total: Cents,
    pub email: Option<String>,
    pub status: OrderStatusType,
    pub payment_handle: Option<PaymentHandle>,
    pub qr_payload: Option<String>,
    pub qr_image_base64: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let (payment_handle, qr_payload, qr_image_base64) = match order.payment {
            Some(p) => {
                let image = p.presentation.qr_image.as_ref().map(base64::encode);
                (Some(p.handle), Some(p.presentation.qr_payload), image)
            },
            None => (None, None, None),
        };
        Self {
            id: order.id,
            items: order.items,
            total: order.total,
            email: order.email,
            status: order.status,
            payment_handle,
            qr_payload,
            qr_image_base64,
            created_at: order.created_at,
            updated_at: order.updated_at,
            paid_at: order.paid_at,
            cancelled_at: order.cancelled_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub order_id: OrderId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub status: OrderStatusType,
    pub message: String,
}
