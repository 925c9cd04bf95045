//! PIX Payment Engine
//!
//! The engine owns order state for a storefront that is paid through PIX via an external payment gateway. It issues
//! payment requests and converges every order to a final status, using two independent signals that may race, arrive
//! twice or arrive out of order: the gateway's asynchronous notifications and client-driven polling.
//!
//! The library is divided into these main sections:
//! 1. Storage ([`traits::OrderStore`]), with an in-memory backend ([`MemoryStore`]) and a SQLite backend
//!    ([`SqliteDatabase`]). Status changes only ever happen through the store's compare-and-swap, which is what makes
//!    every transition happen at most once.
//! 2. The payment gateway contract ([`traits::PaymentGateway`]). The engine never talks HTTP itself.
//! 3. The public API ([`mod@ppe_api`]): [`OrderFlowApi`] for checkout, [`Reconciler`] for the state machine,
//!    [`NotificationApi`] for webhooks and [`OrderStatusApi`] for polling reads.
//!
//! The engine also publishes events when an order is paid or annulled. Use [`events::EventHooks`] to subscribe.
pub mod db_types;
pub mod events;
pub mod helpers;
mod memory;
mod ppe_api;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use memory::MemoryStore;
pub use ppe_api::{
    errors::OrderFlowError,
    notification_api::NotificationApi,
    order_flow_api::{
        OrderFlowApi,
        OrderFlowConfig,
        DEFAULT_DESCRIPTION_PREFIX,
        DEFAULT_GATEWAY_TIMEOUT,
        DEFAULT_PAYER_EMAIL_PLACEHOLDER,
    },
    order_objects,
    order_status_api::OrderStatusApi,
    reconciler::Reconciler,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDatabase, SqliteDatabaseError};
