//! # Collaborator contracts of the reconciliation engine.
//!
//! * [`OrderStore`] is the storage interface. It is the single source of truth for order status, and its
//!   [`OrderStore::transition_status`] compare-and-swap is the only way a status ever changes.
//! * [`PaymentGateway`] is the external payment provider: it creates PIX payments and reports their status.
mod order_store;
mod payment_gateway;

pub use order_store::{AttachPaymentResult, OrderStore, PaymentAttachment, StatusTransition, StoreError};
pub use payment_gateway::{
    with_timeout,
    GatewayError,
    PaymentGateway,
    PaymentStatusReport,
    PixPayment,
    PixPaymentRequest,
};
