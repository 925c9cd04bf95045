//! # PIX payment engine public API
//!
//! The API is split by caller, so that each surface only depends on what it uses:
//!
//! * [`order_flow_api`] creates orders, requests PIX payments for them, and cancels orders that were never paid.
//! * [`reconciler`] is the order state machine. It is the only code that moves an order to `PAID`, and it does so
//!   exactly once, however many times or through whichever channel an approval arrives.
//! * [`notification_api`] handles asynchronous payment notifications from the gateway.
//! * [`order_status_api`] serves order reads, re-checking the gateway for orders that are still waiting for payment.
//!
//! Every API is created from a store backend implementing [`OrderStore`](crate::traits::OrderStore) and, where it
//! talks to the gateway, a [`PaymentGateway`](crate::traits::PaymentGateway):
//!
//! ```rust,ignore
//! use pix_payment_engine::{events::EventProducers, OrderFlowApi, OrderFlowConfig, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/pix_orders.db", 5).await?;
//! let api = OrderFlowApi::new(db, gateway, EventProducers::default(), OrderFlowConfig::default());
//! let order = api.create_order(items, None).await?;
//! let payment = api.request_pix_payment(&order.id, Some("comprador@exemplo.com.br".into())).await?;
//! ```
pub mod errors;
pub mod notification_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod order_status_api;
pub mod reconciler;
