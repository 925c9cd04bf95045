//! `SqliteDatabase` is the durable [`OrderStore`] backend.
//!
//! Every conditional write is a single `UPDATE ... WHERE` statement; whether it matched a row decides the outcome.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate, SqlitePool};

use super::{
    db::{db_url, new_pool, orders},
    SqliteDatabaseError,
};
use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    traits::{AttachPaymentResult, OrderStore, PaymentAttachment, StatusTransition, StoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({})", self.url)
    }
}

impl OrderStore for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let id = order.id.clone();
        let order = orders::insert_order(order, &mut conn).await?.ok_or(StoreError::OrderAlreadyExists(id))?;
        debug!("🗃️ Order [{}] saved with total {}", order.id, order.total);
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn attach_payment(
        &self,
        order_id: &OrderId,
        attachment: PaymentAttachment,
    ) -> Result<AttachPaymentResult, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = match orders::attach_payment_if_absent(order_id, &attachment, &mut tx).await? {
            Some(order) => {
                debug!("🗃️ Payment {} attached to order [{order_id}]", attachment.details.handle);
                AttachPaymentResult::Attached(order)
            },
            None => {
                let order = match attachment.email.as_deref() {
                    Some(email) => orders::update_email(order_id, email, attachment.at, &mut tx).await?,
                    None => orders::fetch_order_by_order_id(order_id, &mut tx).await?,
                };
                let order = order.ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
                debug!("🗃️ Order [{order_id}] already has a payment. Attachment of {} skipped", attachment.details.handle);
                AttachPaymentResult::AlreadyAttached(order)
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn transition_status(
        &self,
        order_id: &OrderId,
        from: OrderStatusType,
        to: OrderStatusType,
        at: DateTime<Utc>,
    ) -> Result<StatusTransition, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = match orders::update_status_if(order_id, from, to, at, &mut tx).await? {
            Some(order) => StatusTransition::Transitioned(order),
            None => {
                let order = orders::fetch_order_by_order_id(order_id, &mut tx)
                    .await?
                    .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
                StatusTransition::Unchanged(order)
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_pending_orders_created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_pending_orders_created_before(cutoff, &mut conn).await?;
        Ok(orders)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL in `PGW_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date using the migrations embedded in the binary.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), SqliteDatabaseError> {
        self.pool.close().await;
        Ok(())
    }
}
