use thiserror::Error;

use crate::{
    db_types::OrderId,
    traits::{GatewayError, StoreError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid request: {0}")]
    ValidationError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {order_id} cannot be paid: {reason}")]
    InvalidState { order_id: OrderId, reason: String },
    #[error("Payment gateway error: {0}")]
    GatewayError(#[from] GatewayError),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl OrderFlowError {
    pub fn invalid_state<S: Into<String>>(order_id: &OrderId, reason: S) -> Self {
        Self::InvalidState { order_id: order_id.clone(), reason: reason.into() }
    }
}

impl From<StoreError> for OrderFlowError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OrderNotFound(id) => Self::OrderNotFound(id),
            other => Self::DatabaseError(other.to_string()),
        }
    }
}
