use chrono::{DateTime, Utc};
use log::*;
use pgw_common::Cents;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{
        LineItem,
        NewOrder,
        Order,
        OrderId,
        OrderStatusType,
        PaymentDetails,
        PaymentHandle,
        PaymentStatus,
        PresentationData,
    },
    sqlite::SqliteDatabaseError,
    traits::PaymentAttachment,
};

/// The `orders` table as stored. Line items are kept as a JSON array.
#[derive(Debug, Clone, FromRow)]
struct OrderRow {
    order_id: String,
    items: String,
    total: i64,
    email: Option<String>,
    status: String,
    payment_handle: Option<String>,
    qr_payload: Option<String>,
    qr_image: Option<Vec<u8>>,
    gateway_status: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = SqliteDatabaseError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let items = serde_json::from_str::<Vec<LineItem>>(&row.items)
            .map_err(|e| SqliteDatabaseError::CorruptRecord(format!("order {} has invalid items: {e}", row.order_id)))?;
        let status = row.status.parse::<OrderStatusType>().map_err(|e| {
            SqliteDatabaseError::CorruptRecord(format!("order {} has an invalid status: {e}", row.order_id))
        })?;
        let payment = row.payment_handle.map(|handle| PaymentDetails {
            handle: PaymentHandle::from(handle),
            presentation: PresentationData { qr_payload: row.qr_payload.unwrap_or_default(), qr_image: row.qr_image },
            gateway_status: row.gateway_status.map(PaymentStatus::from).unwrap_or(PaymentStatus::Pending),
        });
        Ok(Order {
            id: OrderId::from(row.order_id),
            items,
            total: Cents::from(row.total),
            email: row.email,
            status,
            payment,
            created_at: row.created_at,
            updated_at: row.updated_at,
            paid_at: row.paid_at,
            cancelled_at: row.cancelled_at,
        })
    }
}

fn into_order(row: Option<OrderRow>) -> Result<Option<Order>, SqliteDatabaseError> {
    row.map(Order::try_from).transpose()
}

/// Every statement here matches at most one row. Reading all of them steps the statement to completion, so an
/// autocommit write is committed before the connection goes back to the pool.
fn first_row(rows: Vec<OrderRow>) -> Option<OrderRow> {
    rows.into_iter().next()
}

/// Inserts a new order. Returns `None` if an order with the same id already exists.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Option<Order>, SqliteDatabaseError> {
    let items = serde_json::to_string(&order.items)
        .map_err(|e| SqliteDatabaseError::CorruptRecord(format!("could not serialize line items: {e}")))?;
    let rows: Vec<OrderRow> = sqlx::query_as(
        r#"
            INSERT INTO orders (order_id, items, total, email, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'PENDING', $5, $5)
            ON CONFLICT (order_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order.id.as_str())
    .bind(items)
    .bind(order.total.value())
    .bind(order.email)
    .bind(order.created_at)
    .fetch_all(conn)
    .await?;
    into_order(first_row(rows))
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let rows: Vec<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    into_order(first_row(rows))
}

/// Writes the payment data, but only onto an order that does not have a payment handle yet.
///
/// Returns the updated order, or `None` if the condition did not hold (or the order does not exist).
pub(crate) async fn attach_payment_if_absent(
    order_id: &OrderId,
    attachment: &PaymentAttachment,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let details = &attachment.details;
    let rows: Vec<OrderRow> = sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_handle = $1,
                qr_payload = $2,
                qr_image = $3,
                gateway_status = $4,
                email = COALESCE($5, email),
                updated_at = $6
            WHERE order_id = $7 AND payment_handle IS NULL
            RETURNING *;
        "#,
    )
    .bind(details.handle.as_str())
    .bind(details.presentation.qr_payload.as_str())
    .bind(details.presentation.qr_image.as_deref())
    .bind(details.gateway_status.as_str())
    .bind(attachment.email.as_deref())
    .bind(attachment.at)
    .bind(order_id.as_str())
    .fetch_all(conn)
    .await?;
    into_order(first_row(rows))
}

pub(crate) async fn update_email(
    order_id: &OrderId,
    email: &str,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let rows: Vec<OrderRow> =
        sqlx::query_as("UPDATE orders SET email = $1, updated_at = $2 WHERE order_id = $3 RETURNING *")
            .bind(email)
            .bind(at)
            .bind(order_id.as_str())
            .fetch_all(conn)
            .await?;
    into_order(first_row(rows))
}

/// Compare-and-swap on the order status. Returns `None` if the order was not in status `from`.
pub(crate) async fn update_status_if(
    order_id: &OrderId,
    from: OrderStatusType,
    to: OrderStatusType,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let paid_at = (to == OrderStatusType::Paid).then_some(at);
    let cancelled_at = (to == OrderStatusType::Cancelled).then_some(at);
    let rows: Vec<OrderRow> = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = $1,
                updated_at = $2,
                paid_at = COALESCE($3, paid_at),
                cancelled_at = COALESCE($4, cancelled_at)
            WHERE order_id = $5 AND status = $6
            RETURNING *;
        "#,
    )
    .bind(to.to_string())
    .bind(at)
    .bind(paid_at)
    .bind(cancelled_at)
    .bind(order_id.as_str())
    .bind(from.to_string())
    .fetch_all(conn)
    .await?;
    let row = first_row(rows);
    trace!("🗃️ Status update {from} -> {to} for order {order_id} applied: {}", row.is_some());
    into_order(row)
}

/// Fetches `PENDING` orders created before `cutoff`, oldest first.
pub async fn fetch_pending_orders_created_before(
    cutoff: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteDatabaseError> {
    let rows: Vec<OrderRow> =
        sqlx::query_as("SELECT * FROM orders WHERE status = 'PENDING' AND created_at < $1 ORDER BY created_at ASC")
            .bind(cutoff)
            .fetch_all(conn)
            .await?;
    rows.into_iter().map(Order::try_from).collect()
}
