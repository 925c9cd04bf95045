use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderId, OrderStatusType, PaymentDetails};

/// The payment data written onto an order once the gateway has created a payment for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentAttachment {
    pub details: PaymentDetails,
    /// The payer email supplied with the payment request, if any. It overwrites the stored email.
    pub email: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachPaymentResult {
    /// The order had no payment yet. It now carries the attached one.
    Attached(Order),
    /// Another writer got there first. The order is returned with the payment that won.
    AlreadyAttached(Order),
}

impl AttachPaymentResult {
    pub fn into_order(self) -> Order {
        match self {
            Self::Attached(order) | Self::AlreadyAttached(order) => order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusTransition {
    /// The status was `from` and is now `to`.
    Transitioned(Order),
    /// The status was not `from`. The order is returned exactly as stored.
    Unchanged(Order),
}

impl StatusTransition {
    pub fn applied(&self) -> bool {
        matches!(self, Self::Transitioned(_))
    }

    pub fn order(&self) -> &Order {
        match self {
            Self::Transitioned(order) | Self::Unchanged(order) => order,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            Self::Transitioned(order) | Self::Unchanged(order) => order,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Order store error: {0}")]
    DatabaseError(String),
    #[error("An order with id {0} already exists")]
    OrderAlreadyExists(OrderId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
}

/// Storage backend for orders.
///
/// Implementations must make [`attach_payment`](OrderStore::attach_payment) and
/// [`transition_status`](OrderStore::transition_status) atomic with respect to each other and to themselves: two
/// concurrent calls on the same order must never both succeed.
#[allow(async_fn_in_trait)]
pub trait OrderStore {
    /// A description of where the orders live, for logging.
    fn url(&self) -> &str;

    /// Stores a fresh order in `PENDING` status.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// Writes the payment handle and presentation data if, and only if, the order does not have a payment yet.
    ///
    /// The attachment's email, when present, is written in both outcomes.
    async fn attach_payment(
        &self,
        order_id: &OrderId,
        attachment: PaymentAttachment,
    ) -> Result<AttachPaymentResult, StoreError>;

    /// Compare-and-swap on the order status.
    ///
    /// If the current status is `from`, it becomes `to`, `updated_at` becomes `at`, and the matching terminal
    /// timestamp (`paid_at` or `cancelled_at`) is set to `at`, all in one atomic write.
    async fn transition_status(
        &self,
        order_id: &OrderId,
        from: OrderStatusType,
        to: OrderStatusType,
        at: DateTime<Utc>,
    ) -> Result<StatusTransition, StoreError>;

    /// All `PENDING` orders created strictly before `cutoff`, oldest first.
    async fn fetch_pending_orders_created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, StoreError>;
}
