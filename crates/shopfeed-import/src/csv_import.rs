//! Bulk import from CSV files.
//!
//! Column matching is by header name, case-insensitive, with a couple of
//! aliases so exports from common tools work unchanged. Image cells hold a
//! comma-separated URL list; a `variants` cell may hold embedded JSON.

use std::io::Read;
use std::path::Path;

use shopfeed_core::{Marketplace, PriceLocale, ProductRecord};

use crate::error::ImportError;
use crate::normalize::normalize_product;
use crate::types::{RawProduct, RawVariant};

struct ColumnMap {
    title: usize,
    description: Option<usize>,
    price: usize,
    images: usize,
    sku: Option<usize>,
    stock: Option<usize>,
    category: Option<usize>,
    variants: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, ImportError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.contains(&h.trim().to_ascii_lowercase().as_str()))
        };
        let require = |names: &[&str]| {
            find(names).ok_or_else(|| ImportError::CsvRecord {
                line: 1,
                reason: format!("missing required column \"{}\"", names[0]),
            })
        };
        Ok(Self {
            title: require(&["title", "name"])?,
            description: find(&["description"]),
            price: require(&["price"])?,
            images: require(&["images", "image"])?,
            sku: find(&["sku"]),
            stock: find(&["stock", "quantity"]),
            category: find(&["category"]),
            variants: find(&["variants"]),
        })
    }

    fn get<'a>(record: &'a csv::StringRecord, index: Option<usize>) -> Option<&'a str> {
        index
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

fn row_to_raw(
    record: &csv::StringRecord,
    columns: &ColumnMap,
    line: u64,
) -> Result<RawProduct, ImportError> {
    let images = ColumnMap::get(record, Some(columns.images))
        .map(|cell| {
            cell.split(',')
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    let variants: Vec<RawVariant> = match ColumnMap::get(record, columns.variants) {
        Some(cell) => {
            serde_json::from_str(cell).map_err(|e| ImportError::CsvRecord {
                line,
                reason: format!("variants cell is not valid JSON: {e}"),
            })?
        }
        None => Vec::new(),
    };

    let stock = match ColumnMap::get(record, columns.stock) {
        Some(cell) => Some(cell.parse().map_err(|_| ImportError::CsvRecord {
            line,
            reason: format!("stock value {cell:?} is not a whole number"),
        })?),
        None => None,
    };

    Ok(RawProduct {
        title: ColumnMap::get(record, Some(columns.title))
            .unwrap_or_default()
            .to_owned(),
        description: ColumnMap::get(record, columns.description)
            .unwrap_or_default()
            .to_owned(),
        price_text: ColumnMap::get(record, Some(columns.price))
            .unwrap_or_default()
            .to_owned(),
        images,
        variants,
        reviews: Vec::new(),
        sku: ColumnMap::get(record, columns.sku).map(str::to_owned),
        stock,
        category: ColumnMap::get(record, columns.category).map(str::to_owned),
    })
}

/// Parses a CSV document into validated product records.
///
/// # Errors
///
/// Returns [`ImportError::CsvRecord`] naming the offending line when a
/// required column is absent or a row fails validation, and
/// [`ImportError::Csv`] on malformed CSV.
pub fn parse_csv_products<R: Read>(
    reader: R,
    locale: PriceLocale,
) -> Result<Vec<ProductRecord>, ImportError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let columns = ColumnMap::from_headers(csv_reader.headers()?)?;

    let mut products = Vec::new();
    for (index, result) in csv_reader.records().enumerate() {
        let record = result?;
        // Header is line 1, first data row is line 2.
        let line = index as u64 + 2;
        let raw = row_to_raw(&record, &columns, line)?;
        let product = normalize_product(&raw, Marketplace::Csv, None, locale).map_err(|e| {
            ImportError::CsvRecord {
                line,
                reason: e.to_string(),
            }
        })?;
        products.push(product);
    }
    Ok(products)
}

/// Reads and parses a CSV file from disk.
///
/// # Errors
///
/// As [`parse_csv_products`], plus [`ImportError::Csv`] when the file
/// cannot be opened.
pub fn import_csv_file(
    path: impl AsRef<Path>,
    locale: PriceLocale,
) -> Result<Vec<ProductRecord>, ImportError> {
    let file = std::fs::File::open(path.as_ref()).map_err(csv::Error::from)?;
    parse_csv_products(file, locale)
}
