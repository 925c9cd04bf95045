use std::{env, time::Duration as StdDuration};

use chrono::Duration;
use log::*;
use mercadopago_tools::MercadoPagoConfig;
use pgw_common::helpers::parse_seconds;
use pix_payment_engine::{OrderFlowConfig, DEFAULT_GATEWAY_TIMEOUT};

const DEFAULT_PGW_HOST: &str = "127.0.0.1";
const DEFAULT_PGW_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/pix_orders.db";
const DEFAULT_UNPAID_ORDER_TIMEOUT: Duration = Duration::hours(24);
const DEFAULT_EXPIRY_CHECK_INTERVAL: StdDuration = StdDuration::from_secs(60);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Mercado Pago client configuration. The client timeout equals `order_flow.gateway_timeout`.
    pub mercadopago: MercadoPagoConfig,
    /// Gateway timeout, payer email placeholder and payment description prefix.
    pub order_flow: OrderFlowConfig,
    /// The time before an unpaid order is cancelled.
    pub unpaid_order_timeout: Duration,
    /// How often the expiry worker looks for unpaid orders.
    pub expiry_check_interval: StdDuration,
    /// If set, browsers may only call the API from this origin. Otherwise any origin is allowed.
    pub cors_allowed_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PGW_HOST.to_string(),
            port: DEFAULT_PGW_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            mercadopago: MercadoPagoConfig::default(),
            order_flow: OrderFlowConfig::default(),
            unpaid_order_timeout: DEFAULT_UNPAID_ORDER_TIMEOUT,
            expiry_check_interval: DEFAULT_EXPIRY_CHECK_INTERVAL,
            cors_allowed_origin: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PGW_HOST").ok().unwrap_or_else(|| DEFAULT_PGW_HOST.into());
        let port = env::var("PGW_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for PGW_PORT. {e} Using the default, {DEFAULT_PGW_PORT}, instead."
                    );
                    DEFAULT_PGW_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PGW_PORT);
        let database_url = env::var("PGW_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ PGW_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let mercadopago = MercadoPagoConfig::new_from_env_or_default();
        let order_flow = configure_order_flow(mercadopago.timeout);
        let unpaid_order_timeout = configure_unpaid_order_timeout();
        let expiry_check_interval = env::var("PGW_EXPIRY_CHECK_INTERVAL")
            .ok()
            .and_then(|s| {
                let interval = parse_seconds(&s);
                if interval.is_none() {
                    warn!("🪛️ Invalid configuration value for PGW_EXPIRY_CHECK_INTERVAL: '{s}'.");
                }
                interval
            })
            .unwrap_or(DEFAULT_EXPIRY_CHECK_INTERVAL);
        let cors_allowed_origin = env::var("PGW_CORS_ALLOWED_ORIGIN").ok().filter(|s| !s.trim().is_empty());
        match &cors_allowed_origin {
            Some(origin) => info!("🪛️ Browser requests are only allowed from {origin}"),
            None => info!("🪛️ PGW_CORS_ALLOWED_ORIGIN is not set. Browser requests are allowed from any origin."),
        }
        Self {
            host,
            port,
            database_url,
            mercadopago,
            order_flow,
            unpaid_order_timeout,
            expiry_check_interval,
            cors_allowed_origin,
        }
    }
}

fn configure_order_flow(gateway_timeout: StdDuration) -> OrderFlowConfig {
    let defaults = OrderFlowConfig::default();
    if gateway_timeout != DEFAULT_GATEWAY_TIMEOUT {
        info!("🪛️ Gateway calls time out after {}s", gateway_timeout.as_secs_f64());
    }
    let payer_email_placeholder = env::var("PGW_PAYER_EMAIL_PLACEHOLDER")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(defaults.payer_email_placeholder);
    let description_prefix = env::var("PGW_ORDER_DESCRIPTION_PREFIX")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(defaults.description_prefix);
    OrderFlowConfig { gateway_timeout, payer_email_placeholder, description_prefix }
}

fn configure_unpaid_order_timeout() -> Duration {
    env::var("PGW_UNPAID_ORDER_TIMEOUT")
        .map_err(|_| {
            info!(
                "🪛️ PGW_UNPAID_ORDER_TIMEOUT is not set. Using the default value of {} hrs.",
                DEFAULT_UNPAID_ORDER_TIMEOUT.num_hours()
            )
        })
        .and_then(|s| parse_hours(&s).map_err(|e| warn!("🪛️ Invalid configuration value for PGW_UNPAID_ORDER_TIMEOUT. {e}")))
        .ok()
        .unwrap_or(DEFAULT_UNPAID_ORDER_TIMEOUT)
}

fn parse_hours(s: &str) -> Result<Duration, String> {
    match s.trim().parse::<i64>() {
        Ok(h) if h > 0 => Ok(Duration::hours(h)),
        Ok(h) => Err(format!("{h} is not a positive number of hours")),
        Err(e) => Err(format!("'{s}' is not a number of hours. {e}")),
    }
}
