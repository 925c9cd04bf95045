use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{config::MercadoPagoConfig, MercadoPagoApiError, MpPayment, NewPixPayment};

pub const IDEMPOTENCY_KEY_HEADER: &str = "X-Idempotency-Key";

#[derive(Clone)]
pub struct MercadoPagoApi {
    config: MercadoPagoConfig,
    client: Arc<Client>,
}

impl MercadoPagoApi {
    pub fn new(config: MercadoPagoConfig) -> Result<Self, MercadoPagoApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.access_token.reveal()))
            .map_err(|e| MercadoPagoApiError::Initialization(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| MercadoPagoApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &MercadoPagoConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<B>,
    ) -> Result<T, MercadoPagoApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| MercadoPagoApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let text = response.text().await.map_err(|e| MercadoPagoApiError::RestResponseError(e.to_string()))?;
            Err(MercadoPagoApiError::QueryError { status, message: error_message(&text) })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Creates a PIX payment. The idempotency key makes retries of the same request return the same payment.
    pub async fn create_pix_payment(
        &self,
        payment: &NewPixPayment,
        idempotency_key: &str,
    ) -> Result<MpPayment, MercadoPagoApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let key = HeaderValue::from_str(idempotency_key)
            .map_err(|e| MercadoPagoApiError::RestRequestError(format!("Invalid idempotency key. {e}")))?;
        headers.insert(IDEMPOTENCY_KEY_HEADER, key);
        debug!("Creating PIX payment for {}", payment.external_reference);
        let result = self.rest_query::<MpPayment, _>(Method::POST, "/v1/payments", headers, Some(payment)).await?;
        info!("Created PIX payment {} for {} ({})", result.id, payment.external_reference, result.status);
        Ok(result)
    }

    pub async fn get_payment(&self, payment_id: &str) -> Result<MpPayment, MercadoPagoApiError> {
        if !is_valid_payment_id(payment_id) {
            return Err(MercadoPagoApiError::InvalidPaymentId(payment_id.to_string()));
        }
        let path = format!("/v1/payments/{payment_id}");
        debug!("Fetching payment {payment_id}");
        let result = self.rest_query::<MpPayment, ()>(Method::GET, &path, HeaderMap::new(), None).await?;
        debug!("Payment {payment_id} is {}", result.status);
        Ok(result)
    }
}

/// The id is interpolated into the request path, so it may only hold characters that cannot change the path.
fn is_valid_payment_id(payment_id: &str) -> bool {
    !payment_id.is_empty() && payment_id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Mercado Pago error bodies look like `{"message": "...", "error": "bad_request", "status": 400, "cause": [...]}`.
/// Falls back to the raw body when it is not in that shape.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}
