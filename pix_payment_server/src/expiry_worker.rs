use std::time::Duration as StdDuration;

use chrono::Duration;
use log::*;
use pix_payment_engine::{db_types::Order, OrderFlowApi, SqliteDatabase};
use tokio::task::JoinHandle;

use crate::integrations::mercadopago::MercadoPagoGateway;

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every `interval`, pending orders older than `unpaid_expiry` get a last status check at the gateway and are
/// cancelled if they are still unpaid.
pub fn start_expiry_worker(
    api: OrderFlowApi<SqliteDatabase, MercadoPagoGateway>,
    unpaid_expiry: Duration,
    interval: StdDuration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Unpaid order expiry worker started. Orders expire after {} hrs", unpaid_expiry.num_hours());
        loop {
            timer.tick().await;
            debug!("🕰️ Running unpaid order expiry job");
            match api.expire_unpaid_orders(unpaid_expiry).await {
                Ok(expired) if expired.is_empty() => trace!("🕰️ No orders expired"),
                Ok(expired) => {
                    info!("🕰️ {} orders expired", expired.len());
                    debug!("🕰️ Expired unpaid orders: {}", order_list(&expired));
                },
                Err(e) => {
                    error!("🕰️ Error running unpaid order expiry job: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] total: {} created: {}", o.id, o.total, o.created_at))
        .collect::<Vec<String>>()
        .join(", ")
}
