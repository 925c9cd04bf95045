use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use pgw_common::Cents;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;
use uuid::Uuid;

use crate::helpers::base64_bytes;

//--------------------------------------        OrderId        ---------------------------------------------------------
/// The order identifier. It is also the `external_reference` sent to the payment gateway, so an order and its
/// payment intent map one-to-one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first eight characters of the id; enough for a human to identify an order on a payment receipt.
    pub fn short(&self) -> &str {
        self.0.char_indices().nth(8).map(|(i, _)| &self.0[..i]).unwrap_or(&self.0)
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------     PaymentHandle     ---------------------------------------------------------
/// The payment gateway's identifier for a payment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct PaymentHandle(pub String);

impl PaymentHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Gateway payment ids are made of ASCII letters, digits, `-` and `_`. Anything else cannot name a payment and
    /// must not be forwarded to the gateway.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }
}

impl From<String> for PaymentHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PaymentHandle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for PaymentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order has been created and is waiting for a payment.
    Pending,
    /// The gateway confirmed a payment for the full order amount.
    Paid,
    /// The order remained unpaid past the configured timeout and was cancelled.
    Cancelled,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "PENDING"),
            OrderStatusType::Paid => write!(f, "PAID"),
            OrderStatusType::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "CANCELLED" => Ok(Self::Cancelled),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to PENDING");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------     PaymentStatus     ---------------------------------------------------------
/// The status of a payment as reported by the gateway.
///
/// Only [`PaymentStatus::Approved`] has any effect on an order. Statuses the engine does not know about are preserved
/// verbatim so they can be logged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Approved,
    Pending,
    InProcess,
    Authorized,
    Rejected,
    Cancelled,
    Refunded,
    Other(String),
}

impl PaymentStatus {
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Approved => "approved",
            Self::Pending => "pending",
            Self::InProcess => "in_process",
            Self::Authorized => "authorized",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for PaymentStatus {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "approved" => Self::Approved,
            "pending" => Self::Pending,
            "in_process" => Self::InProcess,
            "authorized" => Self::Authorized,
            "rejected" => Self::Rejected,
            "cancelled" => Self::Cancelled,
            "refunded" => Self::Refunded,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<PaymentStatus> for String {
    fn from(value: PaymentStatus) -> Self {
        value.as_str().to_string()
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//--------------------------------------      Line items      ---------------------------------------------------------
/// A price as it arrives from the storefront: either a JSON number or a (possibly currency-formatted) string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(serde_json::Number),
    Text(String),
}

impl TryFrom<&PriceInput> for Cents {
    type Error = pgw_common::CentsConversionError;

    fn try_from(value: &PriceInput) -> Result<Self, Self::Error> {
        match value {
            PriceInput::Number(n) => n.to_string().parse(),
            PriceInput::Text(s) => s.parse(),
        }
    }
}

impl From<&str> for PriceInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// An unvalidated line item, exactly as submitted with a new order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    #[serde(default, alias = "id", alias = "product_id")]
    pub product_id: String,
    #[serde(alias = "price", alias = "unit_price")]
    pub unit_price: PriceInput,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl NewLineItem {
    pub fn new<P: Into<PriceInput>>(product_id: &str, unit_price: P, quantity: i64) -> Self {
        Self { product_id: product_id.to_string(), unit_price: unit_price.into(), quantity: Some(quantity) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub unit_price: Cents,
    pub quantity: u32,
}

impl LineItem {
    pub fn line_total(&self) -> Option<Cents> {
        self.unit_price.checked_mul(i64::from(self.quantity))
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
/// A validated order, ready to be stored. The total is fixed here and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub id: OrderId,
    pub items: Vec<LineItem>,
    pub total: Cents,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------   Payment details    ---------------------------------------------------------
/// What the payer needs in order to pay: the PIX copy-and-paste payload and, when the gateway renders one, the QR
/// code image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationData {
    pub qr_payload: String,
    #[serde(rename = "qrImageBase64", with = "base64_bytes", default)]
    pub qr_image: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub handle: PaymentHandle,
    pub presentation: PresentationData,
    /// The status the gateway reported when the payment was created.
    pub gateway_status: PaymentStatus,
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<LineItem>,
    pub total: Cents,
    pub email: Option<String>,
    pub status: OrderStatusType,
    pub payment: Option<PaymentDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn from_new_order(order: NewOrder) -> Self {
        Self {
            id: order.id,
            items: order.items,
            total: order.total,
            email: order.email,
            status: OrderStatusType::Pending,
            payment: None,
            created_at: order.created_at,
            updated_at: order.created_at,
            paid_at: None,
            cancelled_at: None,
        }
    }

    pub fn payment_handle(&self) -> Option<&PaymentHandle> {
        self.payment.as_ref().map(|p| &p.handle)
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatusType::Pending
    }
}
