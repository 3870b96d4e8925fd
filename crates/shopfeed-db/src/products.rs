//! Database operations for the `products` table.

use serde_json::json;
use shopfeed_core::ProductRecord;
use sqlx::PgPool;

use crate::writer::ProductSink;
use crate::DbError;

/// Inserts a batch of product records inside one transaction.
///
/// Returns the number of rows written. The transaction is all-or-nothing:
/// if any row fails, none of the batch is committed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert or the commit fails.
pub async fn insert_product_batch(
    pool: &PgPool,
    records: &[ProductRecord],
) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;
    for record in records {
        let images = json!(record.images);
        let variants = record
            .variants
            .as_ref()
            .map(|v| json!(v))
            .unwrap_or_else(|| json!([]));
        let reviews = record
            .reviews
            .as_ref()
            .map(|r| json!(r))
            .unwrap_or_else(|| json!([]));
        let seo = record.seo.as_ref().map(|s| json!(s));

        sqlx::query(
            "INSERT INTO products \
                 (title, description, price, images, variants, sku, stock, category, \
                  source, source_url, imported_at, reviews, seo) \
             VALUES ($1, $2, $3, $4::jsonb, $5::jsonb, $6, $7, $8, \
                     $9, $10, $11, $12::jsonb, $13::jsonb)",
        )
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.price)
        .bind(images)
        .bind(variants)
        .bind(record.sku.as_deref())
        .bind(record.stock)
        .bind(record.category.as_deref())
        .bind(record.metadata.source.as_str())
        .bind(record.metadata.source_url.as_deref())
        .bind(record.metadata.imported_at)
        .bind(reviews)
        .bind(seo)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(records.len() as u64)
}

/// Postgres-backed sink for the bulk writer.
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ProductSink for PgProductStore {
    async fn insert_batch(&self, records: &[ProductRecord]) -> Result<u64, DbError> {
        insert_product_batch(&self.pool, records).await
    }
}
