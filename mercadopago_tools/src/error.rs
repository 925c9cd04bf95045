use thiserror::Error;

#[derive(Debug, Error)]
pub enum MercadoPagoApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not send request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Invalid payment id: {0:?}")]
    InvalidPaymentId(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}

impl From<reqwest::Error> for MercadoPagoApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::JsonError(e.to_string())
        } else {
            Self::RestRequestError(e.to_string())
        }
    }
}
