//! Opinion link extraction from a term listing page.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use slipwatch_core::Listing;
use url::Url;

/// Slip opinion documents are named after their docket number, e.g. `12-682_j4ek.pdf`.
static OPINION_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}-\d+.*\.pdf").expect("opinion link pattern"));

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector"));

/// Every slip-opinion link on `html`, in page order.
///
/// Relative hrefs are resolved against `document_base`. Links with no text
/// are skipped, since the link text is the document identity.
pub fn parse_listing(html: &str, document_base: &Url) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let mut listings = Vec::new();

    for element in document.select(&ANCHOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if !OPINION_HREF.is_match(href) {
            continue;
        }
        let Ok(location) = document_base.join(href.trim()) else {
            continue;
        };
        let name = element
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            continue;
        }
        listings.push(Listing::new(name, location.to_string()));
    }

    listings
}
