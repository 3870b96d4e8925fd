//! Field normalization: raw extracted values into a validated record.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use shopfeed_core::{
    Marketplace, PriceLocale, ProductMetadata, ProductRecord, ProductReview, ProductVariant,
};

use crate::error::{ExtractField, ImportError};
use crate::types::{RawProduct, RawReview};

const DEFAULT_DESCRIPTION: &str = "Description not available";

/// Parses a displayed price string into a decimal amount.
///
/// Currency symbols and other non-numeric characters are stripped first.
/// In [`PriceLocale::PointDecimal`] mode a comma followed by one or two
/// trailing digits is read as a decimal comma and every other comma as a
/// thousands separator, while a point is always the decimal mark. That
/// reads "1.234,56" as 1.234 (the point wins), which matches how imports
/// have always behaved; [`PriceLocale::CommaDecimal`] flips the convention
/// for stores that render European formats throughout.
///
/// # Errors
///
/// Returns [`ImportError::InvalidPrice`] when no digits survive stripping.
pub fn parse_price(raw: &str, locale: PriceLocale) -> Result<Decimal, ImportError> {
    let stripped: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    let pointed = match locale {
        PriceLocale::PointDecimal => {
            let mut out = String::with_capacity(stripped.len());
            let chars: Vec<char> = stripped.chars().collect();
            for (i, c) in chars.iter().enumerate() {
                if *c == ',' {
                    let trailing = chars[i + 1..]
                        .iter()
                        .take_while(|c| c.is_ascii_digit())
                        .count();
                    let at_end = chars.len() == i + 1 + trailing;
                    if at_end && (1..=2).contains(&trailing) {
                        out.push('.');
                    }
                    // thousands separator otherwise, dropped
                } else {
                    out.push(*c);
                }
            }
            out
        }
        PriceLocale::CommaDecimal => stripped
            .chars()
            .filter(|c| *c != '.')
            .map(|c| if c == ',' { '.' } else { c })
            .collect(),
    };

    // Longest leading run of digits with at most one decimal point.
    let mut prefix = String::new();
    let mut seen_point = false;
    for c in pointed.chars() {
        match c {
            '0'..='9' => prefix.push(c),
            '.' if !seen_point => {
                seen_point = true;
                prefix.push(c);
            }
            _ => break,
        }
    }
    let prefix = prefix.trim_end_matches('.');
    let prefix = if prefix.starts_with('.') {
        format!("0{prefix}")
    } else {
        prefix.to_owned()
    };

    if prefix.is_empty() || !prefix.chars().any(|c| c.is_ascii_digit()) {
        return Err(ImportError::InvalidPrice {
            raw: raw.to_owned(),
        });
    }
    Decimal::from_str(&prefix).map_err(|_| ImportError::InvalidPrice {
        raw: raw.to_owned(),
    })
}

fn resize_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\._[A-Z0-9]+_\.").unwrap_or_else(|_| unreachable!()))
}

/// Removes a CDN resize suffix such as `._SL1500_.` from an image URL,
/// leaving the full-resolution form.
#[must_use]
pub fn strip_resize_suffix(url: &str) -> String {
    resize_suffix_re().replace_all(url, ".").into_owned()
}

/// Strips resize suffixes and drops duplicates, keeping first-seen order.
#[must_use]
pub fn dedup_images(images: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for image in images {
        let cleaned = strip_resize_suffix(image.trim());
        if cleaned.is_empty() {
            continue;
        }
        if seen.insert(cleaned.clone()) {
            out.push(cleaned);
        }
    }
    out
}

fn normalize_review(raw: &RawReview) -> Option<ProductReview> {
    if !(1..=5).contains(&raw.rating) {
        return None;
    }
    Some(ProductReview {
        rating: raw.rating,
        comment: raw.comment.clone(),
        author: raw.author.clone(),
        date: raw.date.clone().unwrap_or_default(),
        verified: raw.verified,
        helpful: raw.helpful,
    })
}

/// Turns an adapter's raw extraction into a validated [`ProductRecord`].
///
/// # Errors
///
/// Returns [`ImportError::MissingField`] when the title, a positive price,
/// or at least one image is absent, and [`ImportError::InvalidPrice`] when
/// price text is present but unparseable.
pub fn normalize_product(
    raw: &RawProduct,
    site: Marketplace,
    source_url: Option<&str>,
    locale: PriceLocale,
) -> Result<ProductRecord, ImportError> {
    let title = raw.title.trim();
    if title.is_empty() {
        return Err(ImportError::MissingField {
            site,
            field: ExtractField::Title,
        });
    }

    let price_text = raw.price_text.trim();
    if price_text.is_empty() {
        return Err(ImportError::MissingField {
            site,
            field: ExtractField::Price,
        });
    }
    let price = parse_price(price_text, locale)?;
    if price <= Decimal::ZERO {
        return Err(ImportError::MissingField {
            site,
            field: ExtractField::Price,
        });
    }

    let images = dedup_images(&raw.images);
    if images.is_empty() {
        return Err(ImportError::MissingField {
            site,
            field: ExtractField::Images,
        });
    }

    let description = match raw.description.trim() {
        "" => DEFAULT_DESCRIPTION.to_owned(),
        d => d.to_owned(),
    };

    let variants: Vec<ProductVariant> = raw
        .variants
        .iter()
        .map(|v| {
            // Variants missing their own price inherit the parent price.
            let variant_price = v
                .price_text
                .as_deref()
                .and_then(|t| parse_price(t, locale).ok())
                .filter(|p| *p > Decimal::ZERO)
                .unwrap_or(price);
            ProductVariant {
                title: v.title.clone(),
                price: variant_price,
                sku: v.sku.clone(),
                stock: v.stock,
                options: v.options.clone(),
            }
        })
        .collect();

    let reviews: Vec<ProductReview> = raw.reviews.iter().filter_map(normalize_review).collect();

    let metadata = match source_url {
        Some(url) => ProductMetadata::remote(site, url),
        None => ProductMetadata::csv(),
    };

    Ok(ProductRecord {
        title: title.to_owned(),
        description,
        price,
        images,
        variants: if variants.is_empty() {
            None
        } else {
            Some(variants)
        },
        sku: raw.sku.clone(),
        stock: raw.stock,
        category: raw.category.clone(),
        metadata,
        reviews: if reviews.is_empty() {
            None
        } else {
            Some(reviews)
        },
        seo: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawVariant;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // ---- parse_price, point-decimal locale -----------------------------

    #[test]
    fn dollar_with_thousands_separator() {
        assert_eq!(
            parse_price("$1,234.56", PriceLocale::PointDecimal).unwrap(),
            dec("1234.56")
        );
    }

    #[test]
    fn euro_with_decimal_comma() {
        assert_eq!(
            parse_price("\u{20ac}99,99", PriceLocale::PointDecimal).unwrap(),
            dec("99.99")
        );
    }

    #[test]
    fn european_thousands_format_keeps_point_as_decimal() {
        assert_eq!(
            parse_price("1.234,56", PriceLocale::PointDecimal).unwrap(),
            dec("1.234")
        );
    }

    #[test]
    fn bare_integer() {
        assert_eq!(
            parse_price("19", PriceLocale::PointDecimal).unwrap(),
            dec("19")
        );
    }

    #[test]
    fn price_with_currency_words() {
        assert_eq!(
            parse_price("USD 49.90", PriceLocale::PointDecimal).unwrap(),
            dec("49.90")
        );
    }

    #[test]
    fn no_digits_is_invalid() {
        let err = parse_price("free!", PriceLocale::PointDecimal).unwrap_err();
        assert!(matches!(err, ImportError::InvalidPrice { .. }));
    }

    // ---- parse_price, comma-decimal locale -----------------------------

    #[test]
    fn comma_locale_reads_european_thousands() {
        assert_eq!(
            parse_price("1.234,56", PriceLocale::CommaDecimal).unwrap(),
            dec("1234.56")
        );
    }

    #[test]
    fn comma_locale_reads_decimal_comma() {
        assert_eq!(
            parse_price("\u{20ac}99,99", PriceLocale::CommaDecimal).unwrap(),
            dec("99.99")
        );
    }

    // ---- images --------------------------------------------------------

    #[test]
    fn dedup_keeps_first_seen_order() {
        let images = vec![
            "https://cdn/a.jpg".to_owned(),
            "https://cdn/a.jpg".to_owned(),
            "https://cdn/b.jpg".to_owned(),
        ];
        assert_eq!(
            dedup_images(&images),
            vec!["https://cdn/a.jpg", "https://cdn/b.jpg"]
        );
    }

    #[test]
    fn resize_suffix_is_stripped_and_merged() {
        let images = vec![
            "https://cdn/img._SL1500_.jpg".to_owned(),
            "https://cdn/img.jpg".to_owned(),
        ];
        assert_eq!(dedup_images(&images), vec!["https://cdn/img.jpg"]);
    }

    // ---- normalize_product ---------------------------------------------

    fn raw_widget() -> RawProduct {
        RawProduct {
            title: "Test Widget".to_owned(),
            description: String::new(),
            price_text: "$19.99".to_owned(),
            images: vec!["https://cdn/w.jpg".to_owned()],
            ..RawProduct::default()
        }
    }

    #[test]
    fn blank_description_gets_placeholder() {
        let record = normalize_product(
            &raw_widget(),
            Marketplace::Amazon,
            Some("https://www.amazon.com/dp/B000000001"),
            PriceLocale::PointDecimal,
        )
        .unwrap();
        assert_eq!(record.description, DEFAULT_DESCRIPTION);
        assert_eq!(record.price, dec("19.99"));
    }

    #[test]
    fn missing_title_is_rejected() {
        let mut raw = raw_widget();
        raw.title = "  ".to_owned();
        let err = normalize_product(
            &raw,
            Marketplace::Amazon,
            Some("https://www.amazon.com/dp/B000000001"),
            PriceLocale::PointDecimal,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ImportError::MissingField {
                field: ExtractField::Title,
                ..
            }
        ));
    }

    #[test]
    fn missing_images_is_rejected() {
        let mut raw = raw_widget();
        raw.images.clear();
        let err = normalize_product(
            &raw,
            Marketplace::Amazon,
            Some("https://www.amazon.com/dp/B000000001"),
            PriceLocale::PointDecimal,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ImportError::MissingField {
                field: ExtractField::Images,
                ..
            }
        ));
    }

    #[test]
    fn zero_price_is_rejected() {
        let mut raw = raw_widget();
        raw.price_text = "$0.00".to_owned();
        let err = normalize_product(
            &raw,
            Marketplace::Amazon,
            Some("https://www.amazon.com/dp/B000000001"),
            PriceLocale::PointDecimal,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ImportError::MissingField {
                field: ExtractField::Price,
                ..
            }
        ));
    }

    #[test]
    fn variant_without_price_inherits_parent_price() {
        let mut raw = raw_widget();
        raw.variants = vec![RawVariant {
            title: "Blue".to_owned(),
            ..RawVariant::default()
        }];
        let record = normalize_product(
            &raw,
            Marketplace::Amazon,
            Some("https://www.amazon.com/dp/B000000001"),
            PriceLocale::PointDecimal,
        )
        .unwrap();
        let variants = record.variants.unwrap();
        assert_eq!(variants[0].price, dec("19.99"));
    }

    #[test]
    fn out_of_range_reviews_are_dropped() {
        let mut raw = raw_widget();
        raw.reviews = vec![
            RawReview {
                rating: 5,
                comment: "great".to_owned(),
                author: "a".to_owned(),
                date: None,
                verified: true,
                helpful: 0,
            },
            RawReview {
                rating: 0,
                comment: "bogus".to_owned(),
                author: "b".to_owned(),
                date: None,
                verified: false,
                helpful: 0,
            },
        ];
        let record = normalize_product(
            &raw,
            Marketplace::Amazon,
            Some("https://www.amazon.com/dp/B000000001"),
            PriceLocale::PointDecimal,
        )
        .unwrap();
        let reviews = record.reviews.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].rating, 5);
    }

    #[test]
    fn csv_source_needs_no_url() {
        let record = normalize_product(
            &raw_widget(),
            Marketplace::Csv,
            None,
            PriceLocale::PointDecimal,
        )
        .unwrap();
        assert_eq!(record.metadata.source, Marketplace::Csv);
        assert!(record.metadata.source_url.is_none());
    }
}
