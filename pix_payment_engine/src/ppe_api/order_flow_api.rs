use std::{fmt::Debug, time::Duration};

use chrono::Utc;
use log::*;
use pgw_common::Cents;

use crate::{
    db_types::{LineItem, NewLineItem, NewOrder, Order, OrderId, OrderStatusType, PaymentDetails, PresentationData},
    events::{EventProducers, OrderAnnulledEvent},
    helpers::{base64_bytes::decode_image, normalize_email},
    order_objects::PixPaymentResult,
    ppe_api::{order_status_api::poll_and_reconcile, reconciler::Reconciler},
    traits::{
        with_timeout,
        AttachPaymentResult,
        GatewayError,
        OrderStore,
        PaymentAttachment,
        PaymentGateway,
        PixPaymentRequest,
        StatusTransition,
    },
    OrderFlowError,
};

pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PAYER_EMAIL_PLACEHOLDER: &str = "test_user_123456@testuser.com";
pub const DEFAULT_DESCRIPTION_PREFIX: &str = "Pedido";

#[derive(Debug, Clone)]
pub struct OrderFlowConfig {
    /// Upper bound on every gateway call made by the engine.
    pub gateway_timeout: Duration,
    /// Sent as the payer email when neither the request nor the order has one. The gateway refuses PIX payments
    /// without a payer email.
    pub payer_email_placeholder: String,
    /// The payment description shown to the payer is `"{prefix} - {first 8 chars of the order id}"`.
    pub description_prefix: String,
}

impl Default for OrderFlowConfig {
    fn default() -> Self {
        Self {
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            payer_email_placeholder: DEFAULT_PAYER_EMAIL_PLACEHOLDER.to_string(),
            description_prefix: DEFAULT_DESCRIPTION_PREFIX.to_string(),
        }
    }
}

/// `OrderFlowApi` is the primary API for the storefront checkout: it creates orders, issues PIX payment requests for
/// them and cancels the ones that are never paid.
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    reconciler: Reconciler<B>,
    producers: EventProducers,
    config: OrderFlowConfig,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B: Clone, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers, config: OrderFlowConfig) -> Self {
        let reconciler = Reconciler::new(db.clone(), producers.clone());
        Self { db, gateway, reconciler, producers, config }
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn config(&self) -> &OrderFlowConfig {
        &self.config
    }

    pub fn reconciler(&self) -> &Reconciler<B> {
        &self.reconciler
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: OrderStore,
    G: PaymentGateway,
{
    /// Validates the line items, fixes the order total and stores a new `PENDING` order.
    ///
    /// Unit prices may be JSON numbers or strings in either plain (`"10.50"`) or Brazilian (`"R$ 1.234,56"`) format.
    /// A missing quantity counts as 1.
    pub async fn create_order(&self, items: Vec<NewLineItem>, email: Option<String>) -> Result<Order, OrderFlowError> {
        if items.is_empty() {
            return Err(OrderFlowError::ValidationError("An order must contain at least one item".into()));
        }
        let items = items.iter().enumerate().map(|(i, item)| validate_line_item(i, item)).collect::<Result<Vec<_>, _>>()?;
        let total = items.iter().try_fold(Cents::default(), |total, item| {
            item.line_total()
                .and_then(|line| total.checked_add(line))
                .ok_or_else(|| OrderFlowError::ValidationError("The order total is too large".into()))
        })?;
        let order = NewOrder {
            id: OrderId::random(),
            items,
            total,
            email: normalize_email(email.as_deref()),
            created_at: Utc::now(),
        };
        let order = self.db.insert_order(order).await?;
        info!("🔄️📦️ Order [{}] created with {} items. Total: {}", order.id, order.items.len(), order.total);
        Ok(order)
    }

    /// Returns the PIX payment for the order, creating it at the gateway if the order does not have one yet.
    ///
    /// Repeated calls return the stored payment without contacting the gateway. If two requests race, both receive
    /// the payment that was stored first.
    pub async fn request_pix_payment(
        &self,
        order_id: &OrderId,
        payer_email: Option<String>,
    ) -> Result<PixPaymentResult, OrderFlowError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        if !order.total.is_positive() {
            return Err(OrderFlowError::invalid_state(order_id, format!("the order total is {}", order.total)));
        }
        if order.status != OrderStatusType::Pending {
            return Err(OrderFlowError::invalid_state(order_id, format!("the order is {}", order.status)));
        }
        if let Some(payment) = &order.payment {
            debug!("🔄️💰️ Order [{order_id}] already has payment {}. Returning it.", payment.handle);
            return Ok(PixPaymentResult::new(order.id.clone(), payment));
        }
        let payer_email = normalize_email(payer_email.as_deref());
        let request = PixPaymentRequest {
            amount: order.total,
            external_reference: order.id.clone(),
            payer_email: payer_email
                .clone()
                .or_else(|| order.email.clone())
                .unwrap_or_else(|| self.config.payer_email_placeholder.clone()),
            description: format!("{} - {}", self.config.description_prefix, order.id.short()),
        };
        debug!("🔄️💰️ Requesting a PIX payment of {} for order [{order_id}]", request.amount);
        let payment = with_timeout(self.config.gateway_timeout, self.gateway.create_pix_payment(request))
            .await
            .map_err(|e| {
                warn!("🔄️💰️ The gateway could not create a payment for order [{order_id}]: {e}");
                e
            })?;
        let handle = payment.payment_id.clone();
        let attachment = PaymentAttachment {
            details: PaymentDetails {
                handle: payment.payment_id,
                presentation: PresentationData {
                    qr_payload: payment.qr_payload,
                    qr_image: decode_image(payment.qr_image_base64.as_deref()),
                },
                gateway_status: payment.status,
            },
            email: payer_email,
            at: Utc::now(),
        };
        let order = match self.db.attach_payment(order_id, attachment).await? {
            AttachPaymentResult::Attached(order) => {
                info!("🔄️💰️ PIX payment {handle} created for order [{order_id}]");
                order
            },
            AttachPaymentResult::AlreadyAttached(order) => {
                warn!(
                    "🔄️💰️ Order [{order_id}] received a payment from a concurrent request. Payment {handle} is orphaned \
                     at the gateway and will never be used."
                );
                order
            },
        };
        let payment = order.payment.as_ref().ok_or_else(|| {
            OrderFlowError::DatabaseError(format!("Order {order_id} has no payment straight after attaching one"))
        })?;
        Ok(PixPaymentResult::new(order.id.clone(), payment))
    }

    /// Cancels every `PENDING` order created more than `timeout` ago.
    ///
    /// Orders with a payment get a final status check first, so that a payment that was approved but never reported
    /// marks the order as paid instead. If the gateway cannot be reached the order is left alone until the next
    /// sweep. Returns the orders that were cancelled.
    pub async fn expire_unpaid_orders(&self, timeout: chrono::Duration) -> Result<Vec<Order>, OrderFlowError> {
        let cutoff = Utc::now() - timeout;
        let stale = self.db.fetch_pending_orders_created_before(cutoff).await?;
        if stale.is_empty() {
            trace!("🕰️ No unpaid orders older than {cutoff}");
            return Ok(vec![]);
        }
        debug!("🕰️ {} unpaid orders are older than {cutoff}", stale.len());
        let mut cancelled = Vec::with_capacity(stale.len());
        for order in stale {
            match self.expire_order(&order).await {
                Ok(Some(order)) => cancelled.push(order),
                Ok(None) => {},
                Err(e) => warn!("🕰️ Could not expire order [{}]: {e}", order.id),
            }
        }
        Ok(cancelled)
    }

    async fn expire_order(&self, order: &Order) -> Result<Option<Order>, OrderFlowError> {
        let order_id = &order.id;
        match poll_and_reconcile(&self.gateway, &self.reconciler, order, self.config.gateway_timeout).await {
            Ok(Some(polled)) if polled.result.current_status != OrderStatusType::Pending => {
                debug!("🕰️ Order [{order_id}] is {} after a final status check", polled.result.current_status);
                return Ok(None);
            },
            Ok(Some(polled)) if polled.gateway_status.is_approved() => {
                warn!(
                    "🕰️ Order [{order_id}] has an approved payment that could not be applied. It is left pending for \
                     manual follow-up instead of being cancelled."
                );
                return Ok(None);
            },
            Ok(_) => {},
            Err(OrderFlowError::GatewayError(GatewayError::Rejected { status, message })) => {
                debug!("🕰️ The gateway rejected the final status check for order [{order_id}] ({status}): {message}");
            },
            Err(e) => {
                info!("🕰️ Final status check for order [{order_id}] failed. Will try again on the next sweep. {e}");
                return Ok(None);
            },
        }
        let transition = self
            .db
            .transition_status(order_id, OrderStatusType::Pending, OrderStatusType::Cancelled, Utc::now())
            .await?;
        match transition {
            StatusTransition::Transitioned(order) => {
                info!("🕰️ Order [{order_id}] was not paid in time and has been cancelled");
                self.producers.publish_order_annulled(OrderAnnulledEvent::new(order.clone())).await;
                Ok(Some(order))
            },
            StatusTransition::Unchanged(order) => {
                debug!("🕰️ Order [{order_id}] became {} before it could be cancelled", order.status);
                Ok(None)
            },
        }
    }
}

fn validate_line_item(index: usize, item: &NewLineItem) -> Result<LineItem, OrderFlowError> {
    let position = index + 1;
    let unit_price = Cents::try_from(&item.unit_price)
        .map_err(|e| OrderFlowError::ValidationError(format!("Item {position} has an invalid price. {e}")))?;
    if unit_price.is_negative() {
        return Err(OrderFlowError::ValidationError(format!("Item {position} has a negative price")));
    }
    let quantity = item.quantity.unwrap_or(1);
    if quantity < 1 {
        return Err(OrderFlowError::ValidationError(format!("Item {position} must have a quantity of at least 1")));
    }
    let quantity = u32::try_from(quantity)
        .map_err(|_| OrderFlowError::ValidationError(format!("Item {position} has an excessive quantity")))?;
    Ok(LineItem { product_id: item.product_id.clone(), unit_price, quantity })
}
