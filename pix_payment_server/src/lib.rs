//! # PIX payment server
//! This crate hosts the HTTP server for the PIX checkout. It is responsible for:
//! Accepting new orders from the storefront and fixing their totals.
//! Issuing PIX payment requests through Mercado Pago and handing the QR code back to the payer.
//! Receiving Mercado Pago payment notifications and reconciling them against orders.
//! Cancelling orders that are never paid.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /api/orders`: Creates an order.
//! * `POST /api/payments/pix`: Issues (or returns the existing) PIX payment for an order.
//! * `GET /api/orders/{order_id}`: Fetches an order, checking the gateway for news if it is still pending.
//! * `POST /api/webhooks/mercadopago`: Mercado Pago payment notifications. Always answers 200 OK.
//! * `POST /api/test/approve`: Marks an order as paid. Only present with the `test_endpoints` feature.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
