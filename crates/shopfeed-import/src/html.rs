//! Small helpers over the `scraper` crate shared by the HTML site adapters.

use scraper::{ElementRef, Html, Selector};

/// Collapses an element's text into single-space-separated form.
#[must_use]
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tries each selector in order and returns the first non-empty element
/// text. Selectors that fail to parse are skipped.
#[must_use]
pub fn select_first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in document.select(&selector) {
            let text = element_text(element);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Collects a non-empty attribute value from every element matching
/// `selector`, in document order.
#[must_use]
pub fn collect_attr(document: &Html, selector: &str, attr: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|e| e.value().attr(attr))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Finds elements whose `class`, `id`, or `data-*` attribute value contains
/// `fragment` (case-insensitive) and yields their collapsed text, in
/// document order. Catches pages where a known marker moved to an
/// unfamiliar element.
#[must_use]
pub fn texts_by_attr_value(document: &Html, fragment: &str) -> Vec<String> {
    let fragment = fragment.to_ascii_lowercase();
    let Ok(all) = Selector::parse("*") else {
        return Vec::new();
    };
    document
        .select(&all)
        .filter(|element| {
            element.value().attrs().any(|(name, value)| {
                (name == "class" || name == "id" || name.starts_with("data-"))
                    && value.to_ascii_lowercase().contains(&fragment)
            })
        })
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_text_collapses_whitespace() {
        let doc = Html::parse_document("<p>  Hello \n  <b>world</b>  </p>");
        let text = select_first_text(&doc, &["p"]);
        assert_eq!(text.as_deref(), Some("Hello world"));
    }

    #[test]
    fn select_first_text_skips_empty_and_bad_selectors() {
        let doc = Html::parse_document("<div class='a'></div><div class='b'>found</div>");
        let text = select_first_text(&doc, &["[[broken", ".a", ".b"]);
        assert_eq!(text.as_deref(), Some("found"));
    }

    #[test]
    fn collect_attr_keeps_document_order() {
        let doc = Html::parse_document("<img src='1.jpg'><img src=''><img src='2.jpg'>");
        assert_eq!(collect_attr(&doc, "img", "src"), vec!["1.jpg", "2.jpg"]);
    }

    #[test]
    fn texts_by_attr_value_matches_class_and_data_attributes() {
        let doc = Html::parse_document(
            "<span class='product-Title-text'>Widget One</span>\
             <div data-testid='item-title'>Widget Two</div>\
             <p class='price'>ignored</p>",
        );
        assert_eq!(
            texts_by_attr_value(&doc, "title"),
            vec!["Widget One", "Widget Two"]
        );
    }
}
