use std::time::Duration;

use log::*;
use pgw_common::{helpers::parse_seconds, Secret};

pub const DEFAULT_MP_API_URL: &str = "https://api.mercadopago.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct MercadoPagoConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub api_url: String,
    pub access_token: Secret<String>,
    /// Applied to every HTTP request made by the client.
    pub timeout: Duration,
}

impl Default for MercadoPagoConfig {
    fn default() -> Self {
        Self { api_url: DEFAULT_MP_API_URL.to_string(), access_token: Secret::default(), timeout: DEFAULT_TIMEOUT }
    }
}

impl MercadoPagoConfig {
    pub fn new(api_url: &str, access_token: Secret<String>, timeout: Duration) -> Self {
        Self { api_url: api_url.trim_end_matches('/').to_string(), access_token, timeout }
    }

    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("PGW_MP_API_URL").unwrap_or_else(|_| {
            info!("🪛️ PGW_MP_API_URL not set, using {DEFAULT_MP_API_URL}");
            DEFAULT_MP_API_URL.to_string()
        });
        let access_token = Secret::new(std::env::var("PGW_MP_ACCESS_TOKEN").unwrap_or_else(|_| {
            warn!("🪛️ PGW_MP_ACCESS_TOKEN not set. Every request to Mercado Pago will be rejected.");
            String::default()
        }));
        let timeout = std::env::var("PGW_GATEWAY_TIMEOUT")
            .ok()
            .and_then(|s| {
                let timeout = parse_seconds(&s);
                if timeout.is_none() {
                    warn!("🪛️ Invalid PGW_GATEWAY_TIMEOUT '{s}'. Expected a positive number of seconds.");
                }
                timeout
            })
            .unwrap_or(DEFAULT_TIMEOUT);
        Self::new(&api_url, access_token, timeout)
    }
}
