//! Tier 4: a single placeholder record built from any reachable simple page,
//! used only when a whole run produced nothing.

use chrono::Utc;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::extractor::model::{ProductRecord, Tier};
use crate::extractor::session::ExtractionSession;
use crate::fetcher::{FetchRequest, PageFetcher};

/// Site key carried by placeholder records.
pub const EMERGENCY_SITE: &str = "emergency";

/// Small, highly available pages tried in order.
pub const FALLBACK_URLS: [&str; 2] = ["https://httpbin.org/html", "https://example.com"];

const PLACEHOLDER_NAME: &str = "Emergency Product";

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());

/// Fabricated record naming the page it was built from. `index` is the
/// record's ordinal in the session.
pub fn placeholder(html: &str, index: usize) -> ProductRecord {
    let document = Html::parse_document(html);
    let title = document
        .select(&TITLE)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty());

    let name = match title {
        Some(title) => format!("{PLACEHOLDER_NAME} - {title}"),
        None => PLACEHOLDER_NAME.to_string(),
    };

    ProductRecord {
        index,
        site: EMERGENCY_SITE.to_string(),
        search_query: None,
        name,
        current_price: Some("₹999".to_string()),
        original_price: Some("₹1,199".to_string()),
        rating: Some("4.0".to_string()),
        reviews: Some("Emergency extraction".to_string()),
        discount: Some("17% off".to_string()),
        offers: vec!["Emergency mode".to_string()],
        image_url: None,
        delivery: Some("Standard delivery".to_string()),
        availability: Some("Available".to_string()),
        scraped_at: Utc::now(),
        tier: Tier::Emergency,
    }
}

/// Append one placeholder if the session is still empty. Returns whether a
/// record was added.
pub async fn run(
    session: &mut ExtractionSession,
    fetcher: &dyn PageFetcher,
    urls: &[Url],
    render_wait: Duration,
) -> bool {
    if !session.is_empty() {
        return false;
    }

    info!("no records from any site, trying emergency extraction");
    for url in urls {
        let request = FetchRequest {
            url: url.clone(),
            render_wait,
            candidate_query: None,
        };
        match fetcher.fetch_page(&request).await {
            Ok(page) if page.success && !page.html.is_empty() => {
                let record = placeholder(&page.html, session.len() + 1);
                info!(url = %url, name = %record.name, "emergency record created");
                session.append(record);
                return true;
            }
            Ok(_) => warn!(url = %url, "emergency page returned no content"),
            Err(e) => warn!(url = %url, error = %e, "emergency fetch failed"),
        }
    }

    warn!("emergency extraction exhausted every fallback page");
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_uses_page_title() {
        let record = placeholder(
            "<html><head><title> Example Domain </title></head><body></body></html>",
            1,
        );
        assert_eq!(record.name, "Emergency Product - Example Domain");
        assert_eq!(record.site, EMERGENCY_SITE);
        assert_eq!(record.current_price.as_deref(), Some("₹999"));
        assert_eq!(record.original_price.as_deref(), Some("₹1,199"));
        assert_eq!(record.discount.as_deref(), Some("17% off"));
        assert_eq!(record.offers, vec!["Emergency mode"]);
        assert_eq!(record.tier, Tier::Emergency);
    }

    #[test]
    fn test_placeholder_without_title() {
        let record = placeholder("<html><body><h1>Herman Melville - Moby-Dick</h1></body></html>", 4);
        assert_eq!(record.name, "Emergency Product");
        assert_eq!(record.index, 4);
    }
}
