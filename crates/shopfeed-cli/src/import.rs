//! Import command handlers.
//!
//! These are called from `main` after configuration is loaded. Each handler
//! builds its own importer and writer, runs the import, and prints a short
//! summary. Failures carrying a remediation checklist print it before the
//! error propagates.

use std::path::Path;

use shopfeed_core::{AppConfig, ProductRecord};
use shopfeed_db::{BulkWriter, PgProductStore};
use shopfeed_enrich::EnrichClient;
use shopfeed_import::{ImportError, Importer};

fn build_enricher(config: &AppConfig) -> anyhow::Result<Option<EnrichClient>> {
    let Some(api_key) = config.ai_api_key.as_deref() else {
        tracing::info!("no AI key configured; importing without enrichment");
        return Ok(None);
    };
    let client = EnrichClient::with_base_url(
        api_key,
        &config.ai_model,
        config.http_timeout_secs,
        &config.ai_base_url,
    )
    .map_err(|e| anyhow::anyhow!("failed to build enrichment client: {e}"))?;
    Ok(Some(client))
}

fn print_remediation(error: &ImportError) {
    if let Some(checklist) = error.remediation() {
        eprintln!("import failed: {error}\n\nTroubleshooting:\n{checklist}");
    } else {
        eprintln!("import failed: {error}");
    }
}

async fn persist(
    config: &AppConfig,
    enricher: Option<&EnrichClient>,
    records: Vec<ProductRecord>,
) -> anyhow::Result<()> {
    let count = records.len();
    let pool = shopfeed_db::connect_pool(
        &config.database_url,
        shopfeed_db::PoolConfig::from_app_config(config),
    )
    .await?;
    let store = PgProductStore::new(pool);
    let report = BulkWriter::new(config.batch_size)
        .write(&store, enricher, records)
        .await?;
    println!(
        "saved {} of {count} products in {} batches",
        report.written, report.batches
    );
    Ok(())
}

fn print_dry_run(records: &[ProductRecord]) -> anyhow::Result<()> {
    for record in records {
        println!("{}", serde_json::to_string_pretty(record)?);
    }
    println!("dry-run: {} products parsed, nothing written", records.len());
    Ok(())
}

pub(crate) async fn run_import_url(
    config: &AppConfig,
    url: &str,
    dry_run: bool,
) -> anyhow::Result<()> {
    let enricher = build_enricher(config)?;
    let importer = Importer::from_config(config, enricher.clone())
        .map_err(|e| anyhow::anyhow!("failed to build importer: {e}"))?;

    let record = match importer.import_url(url).await {
        Ok(record) => record,
        Err(error) => {
            print_remediation(&error);
            return Err(error.into());
        }
    };

    if dry_run {
        return print_dry_run(std::slice::from_ref(&record));
    }
    persist(config, enricher.as_ref(), vec![record]).await
}

pub(crate) async fn run_import_catalog(
    config: &AppConfig,
    url: &str,
    dry_run: bool,
) -> anyhow::Result<()> {
    let enricher = build_enricher(config)?;
    let importer = Importer::from_config(config, enricher.clone())
        .map_err(|e| anyhow::anyhow!("failed to build importer: {e}"))?;

    let report = match importer.import_catalog(url).await {
        Ok(report) => report,
        Err(error) => {
            print_remediation(&error);
            return Err(error.into());
        }
    };
    println!(
        "catalog: {} links discovered, {} imported, {} failed",
        report.discovered,
        report.products.len(),
        report.failed
    );

    if dry_run {
        return print_dry_run(&report.products);
    }
    persist(config, enricher.as_ref(), report.products).await
}

pub(crate) async fn run_import_csv(
    config: &AppConfig,
    path: &Path,
    dry_run: bool,
) -> anyhow::Result<()> {
    let records = match shopfeed_import::import_csv_file(path, config.price_locale) {
        Ok(records) => records,
        Err(error) => {
            print_remediation(&error);
            return Err(error.into());
        }
    };
    println!("parsed {} products from {}", records.len(), path.display());

    if dry_run {
        return print_dry_run(&records);
    }
    let enricher = build_enricher(config)?;
    persist(config, enricher.as_ref(), records).await
}
