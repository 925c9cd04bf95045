use std::{fmt::Debug, time::Duration};

use log::*;

use crate::{
    order_objects::{GatewayNotification, NotificationOutcome, PaymentSignal},
    ppe_api::reconciler::Reconciler,
    traits::{with_timeout, OrderStore, PaymentGateway},
};

/// Handles asynchronous payment notifications (webhooks) from the gateway.
///
/// The content of a notification is never trusted. It only names a payment; the authoritative status is always read
/// back from the gateway before anything is reconciled.
pub struct NotificationApi<B, G> {
    gateway: G,
    reconciler: Reconciler<B>,
    gateway_timeout: Duration,
}

impl<B, G> Debug for NotificationApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationApi")
    }
}

impl<B, G> NotificationApi<B, G> {
    pub fn new(reconciler: Reconciler<B>, gateway: G, gateway_timeout: Duration) -> Self {
        Self { gateway, reconciler, gateway_timeout }
    }
}

impl<B, G> NotificationApi<B, G>
where
    B: OrderStore,
    G: PaymentGateway,
{
    /// Processes a notification. This never fails: problems are logged and reported in the outcome, and the gateway
    /// (or a later poll) will retry.
    pub async fn handle_notification(&self, notification: GatewayNotification) -> NotificationOutcome {
        debug!("🔔️ Payment notification received: {notification:?}");
        let Some(reference) = notification.payment_reference.as_ref() else {
            return ignored("the notification does not name a payment");
        };
        if !reference.is_well_formed() {
            warn!("🔔️ Notification names a malformed payment reference {reference:?}. Ignoring it");
            return ignored("the payment reference is malformed");
        }
        if !notification.is_payment_topic() {
            return ignored(format!("topic '{}' is not a payment", notification.topic.as_deref().unwrap_or_default()));
        }
        let report = match with_timeout(self.gateway_timeout, self.gateway.payment_status(reference)).await {
            Ok(report) => report,
            Err(e) => {
                warn!("🔔️ Could not confirm the status of payment {reference}: {e}");
                return NotificationOutcome::Failed(e.to_string());
            },
        };
        if !report.status.is_approved() {
            return ignored(format!("payment {reference} is '{}'", report.status));
        }
        let Some(order_id) = report.external_reference.as_ref() else {
            warn!("🔔️ Payment {reference} is approved but carries no order reference");
            return ignored(format!("payment {reference} has no external reference"));
        };
        match self.reconciler.reconcile(order_id, &PaymentSignal::from(&report)).await {
            Ok(result) => {
                info!(
                    "🔔️ Notification for payment {reference} reconciled. Order [{order_id}] is {} (applied: {})",
                    result.current_status, result.applied
                );
                NotificationOutcome::Reconciled(result)
            },
            Err(e) => {
                warn!("🔔️ Could not reconcile order [{order_id}] for payment {reference}: {e}");
                NotificationOutcome::Failed(e.to_string())
            },
        }
    }
}

fn ignored<S: Into<String>>(reason: S) -> NotificationOutcome {
    let reason = reason.into();
    debug!("🔔️ Notification ignored: {reason}");
    NotificationOutcome::Ignored(reason)
}
