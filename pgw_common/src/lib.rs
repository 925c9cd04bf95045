mod cents;

pub mod helpers;
pub mod op;
mod secret;

pub use cents::{Cents, CentsConversionError, BRL_CURRENCY_CODE, BRL_SYMBOL};
pub use secret::Secret;
