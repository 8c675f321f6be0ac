//! Tier 2: broad "product-like container" queries against the whole document.

use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::extractor::model::{RawFieldMap, RecordContext, Tier};
use crate::extractor::profile::SiteProfile;
use crate::extractor::session::ExtractionSession;
use crate::extractor::text::{CURRENCY_AMOUNT, RATING, starts_with_currency, visible_lines};
use crate::extractor::tiers::field_map;

/// Tried in order; the first query with any match wins.
pub const CONTAINER_QUERIES: [&str; 8] = [
    r#"div[class*="product"]"#,
    r#"div[class*="item"]"#,
    r#"div[class*="card"]"#,
    "div[data-id]",
    r#"div[class*="search"]"#,
    r#"div[class*="result"]"#,
    "article",
    "section",
];

pub const MAX_CONTAINERS: usize = 10;

/// Containers with less text than this are layout, not listings.
const MIN_CONTAINER_TEXT: usize = 10;

static CONTAINERS: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    CONTAINER_QUERIES
        .iter()
        .filter_map(|query| Selector::parse(query).ok().map(|selector| (*query, selector)))
        .collect()
});

/// Returns the number of accepted records.
pub fn extract(
    session: &mut ExtractionSession,
    profile: &SiteProfile,
    document: &Html,
    search_query: Option<&str>,
) -> usize {
    let Some((query, containers)) = CONTAINERS.iter().find_map(|(query, selector)| {
        let matches: Vec<ElementRef<'_>> = document.select(selector).take(MAX_CONTAINERS).collect();
        (!matches.is_empty()).then_some((*query, matches))
    }) else {
        debug!(site = profile.key, "no generic container matched");
        return 0;
    };

    info!(
        site = profile.key,
        query,
        containers = containers.len(),
        "falling back to generic containers"
    );

    let mut accepted = 0;
    for (position, container) in containers.into_iter().enumerate() {
        let lines = visible_lines(container);
        if lines.iter().map(|line| line.chars().count()).sum::<usize>() < MIN_CONTAINER_TEXT {
            continue;
        }

        let mut fields = field_map(container, profile);
        fill_from_text(&mut fields, &lines);

        let ctx = RecordContext {
            index: position + 1,
            search_query,
            tier: Tier::Generic,
            scraped_at: Utc::now(),
        };
        if session.accept(profile, fields, &ctx) {
            accepted += 1;
        }
    }
    accepted
}

/// Fill name, current price and rating from the container's own text where
/// the profile's selectors found nothing.
pub fn fill_from_text(fields: &mut RawFieldMap, lines: &[String]) {
    if fields.name.is_none() {
        fields.name = lines
            .iter()
            .find(|line| {
                line.chars().count() >= 3 && !starts_with_currency(line) && !line.starts_with('(')
            })
            .cloned();
    }

    let text = lines.join(" ");
    if fields.current_price.is_none() {
        fields.current_price = CURRENCY_AMOUNT.find(&text).map(|m| m.as_str().to_string());
    }
    if fields.rating.is_none() {
        fields.rating = RATING.captures(&text).map(|caps| caps[1].to_string());
    }
}
