use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    cbk_api::order_objects::OrderQueryFilter,
    db_types::{NewOrder, Order, OrderStatusType, Platform},
    traits::LedgerError,
};

/// Inserts the order into the database, returning `false` in the second parameter if an order with the same
/// `(platform, external_order_id)` already exists. In that case the stored order is returned untouched.
pub async fn idempotent_insert(order: NewOrder, conn: &mut SqliteConnection) -> Result<(Order, bool), LedgerError> {
    let platform = order.platform;
    let external_id = order.external_order_id.clone();
    match insert_order(order, conn).await? {
        Some(order) => {
            debug!("🗃️ Order [{platform} {external_id}] inserted with id {}", order.id);
            Ok((order, true))
        },
        None => {
            trace!("🗃️ Order [{platform} {external_id}] already exists");
            let existing = fetch_order_by_external_id(platform, &external_id, conn)
                .await?
                .ok_or_else(|| LedgerError::OrderNotFound(platform, external_id))?;
            Ok((existing, false))
        },
    }
}

/// Inserts a new order. An order that arrives already `Completed` is flagged as credited, since its cashback goes
/// straight to the available bucket.
///
/// Returns `None` when the uniqueness constraint on `(platform, external_order_id)` rejects the
/// row. This is not atomic with anything else; embed it in a transaction and pass `&mut *tx` if you need that.
async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Option<Order>, LedgerError> {
    let completed_at = order.completed_at();
    let credited = order.status == OrderStatusType::Completed;
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                platform,
                external_order_id,
                user_id,
                external_item_id,
                product_name,
                product_image,
                product_price,
                quantity,
                total_amount,
                commission_rate,
                commission_amount,
                cashback_rate,
                cashback_amount,
                status,
                cashback_credited,
                purchased_at,
                completed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (platform, external_order_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order.platform.as_str())
    .bind(order.external_order_id)
    .bind(order.user_id.0)
    .bind(order.external_item_id)
    .bind(order.product_name)
    .bind(order.product_image)
    .bind(order.product_price.value())
    .bind(order.quantity)
    .bind(order.total_amount.value())
    .bind(order.commission_rate.bps())
    .bind(order.commission_amount.value())
    .bind(order.cashback_rate.bps())
    .bind(order.cashback_amount.value())
    .bind(order.status.to_string())
    .bind(credited)
    .bind(order.purchased_at)
    .bind(completed_at)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_external_id(
    platform: Platform,
    external_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE platform = $1 AND external_order_id = $2")
        .bind(platform.as_str())
        .bind(external_order_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Sets the status of order `id` to `new_status`, but only if it is currently `expected`.
///
/// `completed_at` is set when the new status is `Completed` and cleared otherwise. Returns the updated order, or
/// `None` if the stored status was not `expected`.
pub async fn compare_and_set_status(
    id: i64,
    expected: OrderStatusType,
    new_status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let completed_at: Option<DateTime<Utc>> = (new_status == OrderStatusType::Completed).then(Utc::now);
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, completed_at = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND status = $4
            RETURNING *;
        "#,
    )
    .bind(new_status.to_string())
    .bind(completed_at)
    .bind(id)
    .bind(expected.to_string())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Flags the order as credited. Returns `false` if it was already flagged, in which case nothing changes.
pub async fn mark_cashback_credited(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET cashback_credited = TRUE, updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND \
         cashback_credited = FALSE",
    )
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `purchased_at` in ascending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id.0);
    }
    if let Some(platform) = query.platform {
        where_clause.push("platform = ");
        where_clause.push_bind_unseparated(platform.as_str());
    }
    if let Some(since) = query.since {
        where_clause.push("purchased_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("purchased_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        for (i, status) in statuses.iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status.to_string());
        }
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY purchased_at ASC, id ASC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {}", orders.len());
    Ok(orders)
}
