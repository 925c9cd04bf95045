//! A thin client for the parts of the Mercado Pago REST API that a PIX checkout needs: creating a PIX payment and
//! reading a payment back.
mod api;
mod config;
mod error;

mod data_objects;

pub use api::MercadoPagoApi;
pub use config::MercadoPagoConfig;
pub use data_objects::{MpPayer, MpPayment, NewPixPayment, PointOfInteraction, TransactionData};
pub use error::MercadoPagoApiError;
