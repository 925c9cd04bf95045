use std::{future::Future, time::Duration};

use pgw_common::Cents;
use thiserror::Error;

use crate::db_types::{OrderId, PaymentHandle, PaymentStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixPaymentRequest {
    pub amount: Cents,
    /// Always the order id.
    pub external_reference: OrderId,
    pub payer_email: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixPayment {
    pub payment_id: PaymentHandle,
    pub status: PaymentStatus,
    pub qr_payload: String,
    pub qr_image_base64: Option<String>,
}

/// The gateway's authoritative view of a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentStatusReport {
    pub payment_id: PaymentHandle,
    pub status: PaymentStatus,
    pub external_reference: Option<OrderId>,
    pub amount: Option<Cents>,
}

impl PaymentStatusReport {
    pub fn new(payment_id: PaymentHandle, status: PaymentStatus) -> Self {
        Self { payment_id, status, external_reference: None, amount: None }
    }

    pub fn with_external_reference(mut self, order_id: OrderId) -> Self {
        self.external_reference = Some(order_id);
        self
    }

    pub fn with_amount(mut self, amount: Cents) -> Self {
        self.amount = Some(amount);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Could not reach the payment gateway: {0}")]
    Transport(String),
    #[error("The payment gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("The payment gateway sent a response we could not interpret: {0}")]
    InvalidResponse(String),
    #[error("The payment gateway did not respond within {0:?}")]
    Timeout(Duration),
}

/// The external payment provider.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Creates a PIX payment intent and returns the data the payer needs to pay it.
    async fn create_pix_payment(&self, request: PixPaymentRequest) -> Result<PixPayment, GatewayError>;

    /// Fetches the current status of a payment.
    async fn payment_status(&self, payment_id: &PaymentHandle) -> Result<PaymentStatusReport, GatewayError>;
}

/// Bounds a gateway call by `limit`. Expiry of the limit is reported as [`GatewayError::Timeout`].
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, GatewayError>
where F: Future<Output = Result<T, GatewayError>> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout(limit)),
    }
}
