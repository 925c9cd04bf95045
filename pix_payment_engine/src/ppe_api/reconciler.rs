use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{OrderId, OrderStatusType},
    events::{EventProducers, OrderPaidEvent},
    order_objects::{PaymentSignal, ReconcileResult},
    traits::{OrderStore, StatusTransition},
    OrderFlowError,
};

/// The order state machine.
///
/// `Reconciler` takes payment signals from any channel (webhook, poll, expiry sweep) and converges the order status.
/// It never checks-then-writes: the transition to `PAID` is a compare-and-swap in the store, so when several signals
/// race, exactly one of them reports `applied` and publishes [`OrderPaidEvent`].
#[derive(Clone)]
pub struct Reconciler<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for Reconciler<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reconciler")
    }
}

impl<B> Reconciler<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> Reconciler<B>
where B: OrderStore
{
    pub async fn reconcile(&self, order_id: &OrderId, signal: &PaymentSignal) -> Result<ReconcileResult, OrderFlowError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        match order.status {
            OrderStatusType::Paid => {
                debug!("🔄️ Order [{order_id}] is already paid. Signal '{}' is a no-op", signal.status);
                Ok(ReconcileResult::unchanged(order))
            },
            OrderStatusType::Cancelled => {
                if signal.status.is_approved() {
                    error!(
                        "🔄️ Order [{order_id}] was cancelled, but the gateway reports an approved payment for it. \
                         This needs to be refunded or handled manually."
                    );
                }
                Ok(ReconcileResult::unchanged(order))
            },
            OrderStatusType::Pending if !signal.status.is_approved() => {
                trace!("🔄️ Order [{order_id}] stays pending. Gateway status is '{}'", signal.status);
                Ok(ReconcileResult::unchanged(order))
            },
            OrderStatusType::Pending => {
                if let Some(amount) = signal.amount.filter(|amount| *amount != order.total) {
                    error!(
                        "🔄️ Order [{order_id}] has a total of {}, but the gateway reports an approved payment of \
                         {amount}. The order will not be marked as paid.",
                        order.total
                    );
                    return Ok(ReconcileResult::unchanged(order));
                }
                self.mark_paid(order_id).await
            },
        }
    }

    /// Marks a pending order as paid without asking the gateway. Only available in test builds.
    #[cfg(any(test, feature = "test_endpoints"))]
    pub async fn force_approve(&self, order_id: &OrderId) -> Result<ReconcileResult, OrderFlowError> {
        warn!("🔄️ Forcing approval of order [{order_id}]");
        self.reconcile(order_id, &PaymentSignal::approved()).await
    }

    async fn mark_paid(&self, order_id: &OrderId) -> Result<ReconcileResult, OrderFlowError> {
        let transition =
            self.db.transition_status(order_id, OrderStatusType::Pending, OrderStatusType::Paid, Utc::now()).await?;
        match transition {
            StatusTransition::Transitioned(order) => {
                info!("🔄️✅️ Order [{order_id}] is paid. {}", order.total);
                self.producers.publish_order_paid(OrderPaidEvent::new(order.clone())).await;
                Ok(ReconcileResult::applied(order))
            },
            StatusTransition::Unchanged(order) => {
                debug!("🔄️ Order [{order_id}] was moved to {} by another caller first", order.status);
                if order.status == OrderStatusType::Cancelled {
                    error!(
                        "🔄️ Order [{order_id}] was cancelled while an approved payment was being applied. This needs to \
                         be refunded or handled manually."
                    );
                }
                Ok(ReconcileResult::unchanged(order))
            },
        }
    }
}
