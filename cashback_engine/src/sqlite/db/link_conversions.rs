use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{LinkConversion, NewLinkConversion, Platform};

pub async fn insert_link_conversion(
    conversion: NewLinkConversion,
    conn: &mut SqliteConnection,
) -> Result<LinkConversion, sqlx::Error> {
    let record: LinkConversion = sqlx::query_as(
        r#"
            INSERT INTO link_conversions (user_id, platform, original_url, affiliate_url, product_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(conversion.user_id.0)
    .bind(conversion.platform.as_str())
    .bind(conversion.original_url)
    .bind(conversion.affiliate_url)
    .bind(conversion.product_id)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Link conversion #{} saved for {}", record.id, record.user_id);
    Ok(record)
}

/// The most recent conversion of the given product. Ties on `created_at` go to the later insert.
pub async fn latest_for_product(
    platform: Platform,
    product_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<LinkConversion>, sqlx::Error> {
    let record = sqlx::query_as(
        r#"
            SELECT * FROM link_conversions
            WHERE platform = $1 AND product_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
        "#,
    )
    .bind(platform.as_str())
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}
