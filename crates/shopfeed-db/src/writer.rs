//! Batched persistence of imported products.

use std::future::Future;

use shopfeed_core::ProductRecord;
use shopfeed_enrich::EnrichClient;

use crate::DbError;

const DEFAULT_BATCH_SIZE: usize = 50;

/// Storage backend for the bulk writer. Implemented by
/// [`PgProductStore`](crate::PgProductStore) in production and by in-memory
/// sinks in tests.
pub trait ProductSink {
    /// Persists one batch atomically and returns the number of rows written.
    fn insert_batch(
        &self,
        records: &[ProductRecord],
    ) -> impl Future<Output = Result<u64, DbError>> + Send;
}

/// Summary of a bulk write.
#[derive(Debug, PartialEq, Eq)]
pub struct WriteReport {
    pub written: u64,
    pub batches: usize,
}

/// Writes validated records to a sink in fixed-size batches.
///
/// Batches are independent transactions: a mid-run failure leaves earlier
/// batches committed and surfaces the error for the rest.
pub struct BulkWriter {
    batch_size: usize,
}

impl Default for BulkWriter {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl BulkWriter {
    #[must_use]
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// Validates, optionally SEO-enriches, and persists `records`.
    ///
    /// When an enrichment client is supplied, each batch gets an SEO pass
    /// (title, description, keywords) immediately before it is written.
    /// Enrichment follows the same mid-run semantics as the sink: a provider
    /// failure while preparing a batch leaves earlier batches committed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidRecord`] naming the first record that fails
    /// validation, [`DbError::Enrich`] on provider failure, and the sink's
    /// error when a batch cannot be written.
    pub async fn write<S: ProductSink>(
        &self,
        sink: &S,
        enricher: Option<&EnrichClient>,
        mut records: Vec<ProductRecord>,
    ) -> Result<WriteReport, DbError> {
        for record in &records {
            record
                .validate()
                .map_err(|reason| DbError::InvalidRecord { reason })?;
        }

        let mut written = 0;
        let mut batches = 0;
        for chunk in records.chunks_mut(self.batch_size) {
            if let Some(enricher) = enricher {
                for record in chunk.iter_mut() {
                    let category = record.category.as_deref().unwrap_or("general");
                    let seo = enricher
                        .optimize_for_seo(&record.title, &record.description, category)
                        .await?;
                    record.seo = Some(seo);
                }
            }
            written += sink.insert_batch(chunk).await?;
            batches += 1;
            tracing::debug!(batch = batches, rows = chunk.len(), "wrote product batch");
        }
        Ok(WriteReport { written, batches })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shopfeed_core::{Marketplace, ProductMetadata};
    use std::sync::Mutex;

    struct MockSink {
        batch_sizes: Mutex<Vec<usize>>,
        fail_on_batch: Option<usize>,
    }

    impl MockSink {
        fn new(fail_on_batch: Option<usize>) -> Self {
            Self {
                batch_sizes: Mutex::new(Vec::new()),
                fail_on_batch,
            }
        }
    }

    impl ProductSink for MockSink {
        async fn insert_batch(&self, records: &[ProductRecord]) -> Result<u64, DbError> {
            let mut sizes = self.batch_sizes.lock().unwrap();
            let batch_number = sizes.len() + 1;
            if self.fail_on_batch == Some(batch_number) {
                return Err(DbError::NotFound);
            }
            sizes.push(records.len());
            Ok(records.len() as u64)
        }
    }

    fn record(n: usize) -> ProductRecord {
        ProductRecord {
            title: format!("Widget {n}"),
            description: "A widget.".to_owned(),
            price: Decimal::new(1999, 2),
            images: vec!["https://cdn/w.jpg".to_owned()],
            variants: None,
            sku: None,
            stock: None,
            category: None,
            metadata: ProductMetadata::remote(
                Marketplace::Amazon,
                "https://www.amazon.com/dp/B000000001",
            ),
            reviews: None,
            seo: None,
        }
    }

    fn records(count: usize) -> Vec<ProductRecord> {
        (0..count).map(record).collect()
    }

    #[tokio::test]
    async fn splits_into_fixed_size_batches() {
        let sink = MockSink::new(None);
        let report = BulkWriter::default()
            .write(&sink, None, records(120))
            .await
            .unwrap();
        assert_eq!(
            report,
            WriteReport {
                written: 120,
                batches: 3
            }
        );
        assert_eq!(*sink.batch_sizes.lock().unwrap(), vec![50, 50, 20]);
    }

    #[tokio::test]
    async fn empty_input_writes_nothing() {
        let sink = MockSink::new(None);
        let report = BulkWriter::default()
            .write(&sink, None, Vec::new())
            .await
            .unwrap();
        assert_eq!(
            report,
            WriteReport {
                written: 0,
                batches: 0
            }
        );
    }

    #[tokio::test]
    async fn failed_batch_keeps_earlier_batches_committed() {
        let sink = MockSink::new(Some(2));
        let err = BulkWriter::default()
            .write(&sink, None, records(120))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
        // Only the first batch landed before the failure.
        assert_eq!(*sink.batch_sizes.lock().unwrap(), vec![50]);
    }

    #[tokio::test]
    async fn invalid_record_is_rejected_before_any_write() {
        let sink = MockSink::new(None);
        let mut bad = records(3);
        bad[1].price = Decimal::ZERO;
        let err = BulkWriter::default()
            .write(&sink, None, bad)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidRecord { .. }));
        assert!(sink.batch_sizes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn custom_batch_size_is_respected() {
        let sink = MockSink::new(None);
        let report = BulkWriter::new(7)
            .write(&sink, None, records(15))
            .await
            .unwrap();
        assert_eq!(report.batches, 3);
        assert_eq!(*sink.batch_sizes.lock().unwrap(), vec![7, 7, 1]);
    }
}
