use std::{fmt::Debug, time::Duration};

use log::*;

use crate::{
    db_types::{Order, OrderId, PaymentStatus},
    order_objects::{PaymentSignal, ReconcileResult},
    ppe_api::reconciler::Reconciler,
    traits::{with_timeout, OrderStore, PaymentGateway},
    OrderFlowError,
};

/// Serves order reads for the storefront.
///
/// A read of an order that is still waiting for its payment doubles as a poll: the gateway is asked for the payment
/// status and the answer is fed to the [`Reconciler`]. This covers notifications that were lost or delayed.
pub struct OrderStatusApi<B, G> {
    gateway: G,
    reconciler: Reconciler<B>,
    gateway_timeout: Duration,
}

impl<B, G> Debug for OrderStatusApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderStatusApi")
    }
}

impl<B, G> OrderStatusApi<B, G> {
    pub fn new(reconciler: Reconciler<B>, gateway: G, gateway_timeout: Duration) -> Self {
        Self { gateway, reconciler, gateway_timeout }
    }
}

impl<B, G> OrderStatusApi<B, G>
where
    B: OrderStore,
    G: PaymentGateway,
{
    /// Returns the order, after opportunistically reconciling it against the gateway.
    ///
    /// Gateway and reconciliation failures never fail the read; the last known state is returned instead.
    pub async fn get_order_with_freshness(&self, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        let order = self
            .reconciler
            .db()
            .fetch_order(order_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        if !order.is_pending() || order.payment.is_none() {
            return Ok(order);
        }
        match poll_and_reconcile(&self.gateway, &self.reconciler, &order, self.gateway_timeout).await {
            Ok(Some(polled)) => Ok(polled.result.order),
            Ok(None) => Ok(order),
            Err(e) => {
                warn!("🔄️🔍️ Could not refresh the status of order [{order_id}]. Returning the stored state. {e}");
                Ok(order)
            },
        }
    }
}

/// Asks the gateway for the status of the order's payment and reconciles the answer.
///
/// Returns `None` when there was nothing to reconcile: the order has no payment, or the gateway's report belongs to a
/// different order.
pub(crate) async fn poll_and_reconcile<B, G>(
    gateway: &G,
    reconciler: &Reconciler<B>,
    order: &Order,
    gateway_timeout: Duration,
) -> Result<Option<PolledStatus>, OrderFlowError>
where
    B: OrderStore,
    G: PaymentGateway,
{
    let Some(handle) = order.payment_handle() else {
        return Ok(None);
    };
    let report = with_timeout(gateway_timeout, gateway.payment_status(handle)).await?;
    trace!("🔄️🔍️ Gateway reports payment {handle} for order [{}] as '{}'", order.id, report.status);
    if let Some(reference) = report.external_reference.as_ref().filter(|r| **r != order.id) {
        warn!(
            "🔄️🔍️ Payment {handle} is attached to order [{}], but the gateway says it belongs to [{reference}]. \
             Ignoring the report.",
            order.id
        );
        return Ok(None);
    }
    let result = reconciler.reconcile(&order.id, &PaymentSignal::from(&report)).await?;
    Ok(Some(PolledStatus { gateway_status: report.status, result }))
}

/// What a poll found: the status the gateway reported, and what reconciliation made of it.
pub(crate) struct PolledStatus {
    pub gateway_status: PaymentStatus,
    pub result: ReconcileResult,
}
