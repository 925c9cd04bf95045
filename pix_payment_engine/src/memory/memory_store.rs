use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use log::*;
use tokio::sync::RwLock;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    traits::{AttachPaymentResult, OrderStore, PaymentAttachment, StatusTransition, StoreError},
};

/// A thread-safe in-memory order store.
///
/// Orders live in an `Arc<RwLock<HashMap<OrderId, Order>>>`. Each conditional write reads and updates the record
/// inside a single write-lock section, so concurrent writers on the same order are serialised.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

impl OrderStore for MemoryStore {
    fn url(&self) -> &str {
        "memory://"
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(StoreError::OrderAlreadyExists(order.id));
        }
        let order = Order::from_new_order(order);
        orders.insert(order.id.clone(), order.clone());
        debug!("🗃️ Order [{}] saved in memory with total {}", order.id, order.total);
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders.get(order_id).cloned())
    }

    async fn attach_payment(
        &self,
        order_id: &OrderId,
        attachment: PaymentAttachment,
    ) -> Result<AttachPaymentResult, StoreError> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(order_id).ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        if let Some(email) = attachment.email {
            order.email = Some(email);
            order.updated_at = attachment.at;
        }
        if order.payment.is_some() {
            return Ok(AttachPaymentResult::AlreadyAttached(order.clone()));
        }
        order.payment = Some(attachment.details);
        order.updated_at = attachment.at;
        Ok(AttachPaymentResult::Attached(order.clone()))
    }

    async fn transition_status(
        &self,
        order_id: &OrderId,
        from: OrderStatusType,
        to: OrderStatusType,
        at: DateTime<Utc>,
    ) -> Result<StatusTransition, StoreError> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(order_id).ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        if order.status != from {
            return Ok(StatusTransition::Unchanged(order.clone()));
        }
        order.status = to;
        order.updated_at = at;
        match to {
            OrderStatusType::Paid => order.paid_at = Some(at),
            OrderStatusType::Cancelled => order.cancelled_at = Some(at),
            OrderStatusType::Pending => {},
        }
        trace!("🗃️ Order [{order_id}] moved from {from} to {to}");
        Ok(StatusTransition::Transitioned(order.clone()))
    }

    async fn fetch_pending_orders_created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().await;
        let mut result = orders
            .values()
            .filter(|o| o.status == OrderStatusType::Pending && o.created_at < cutoff)
            .cloned()
            .collect::<Vec<_>>();
        result.sort_by_key(|o| o.created_at);
        Ok(result)
    }
}
