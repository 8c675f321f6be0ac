use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rendering of an absent field in sink rows.
pub const UNKNOWN: &str = "unknown";

/// Escalation level that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Structured,
    Generic,
    HeuristicText,
    Emergency,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Structured => "structured",
            Tier::Generic => "generic",
            Tier::HeuristicText => "heuristic_text",
            Tier::Emergency => "emergency",
        };
        f.write_str(name)
    }
}

/// Best-effort, uncleaned values for one candidate element. `None` means the
/// field could not be found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFieldMap {
    pub name: Option<String>,
    pub current_price: Option<String>,
    pub original_price: Option<String>,
    pub rating: Option<String>,
    pub reviews: Option<String>,
    pub discount: Option<String>,
    pub offers: Vec<String>,
    pub image_url: Option<String>,
    pub delivery: Option<String>,
    pub availability: Option<String>,
}

/// Where a record came from; supplied by the tier that built the field map.
#[derive(Debug, Clone)]
pub struct RecordContext<'a> {
    pub index: usize,
    pub search_query: Option<&'a str>,
    pub tier: Tier,
    pub scraped_at: DateTime<Utc>,
}

/// A validated product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub index: usize,
    pub site: String,
    pub search_query: Option<String>,
    pub name: String,
    pub current_price: Option<String>,
    pub original_price: Option<String>,
    pub rating: Option<String>,
    pub reviews: Option<String>,
    pub discount: Option<String>,
    pub offers: Vec<String>,
    pub image_url: Option<String>,
    pub delivery: Option<String>,
    pub availability: Option<String>,
    pub scraped_at: DateTime<Utc>,
    pub tier: Tier,
}

impl ProductRecord {
    /// Field values as a raw map, so a record can be fed back through cleaning.
    pub fn to_raw(&self) -> RawFieldMap {
        RawFieldMap {
            name: Some(self.name.clone()),
            current_price: self.current_price.clone(),
            original_price: self.original_price.clone(),
            rating: self.rating.clone(),
            reviews: self.reviews.clone(),
            discount: self.discount.clone(),
            offers: self.offers.clone(),
            image_url: self.image_url.clone(),
            delivery: self.delivery.clone(),
            availability: self.availability.clone(),
        }
    }

    pub fn to_row(&self) -> ProductRow {
        let text = |value: &Option<String>| value.clone().unwrap_or_else(|| UNKNOWN.to_string());

        ProductRow {
            index: self.index,
            search_query: text(&self.search_query),
            name: self.name.clone(),
            current_price: text(&self.current_price),
            original_price: text(&self.original_price),
            rating: text(&self.rating),
            reviews: text(&self.reviews),
            discount: text(&self.discount),
            offers: self.offers.join("; "),
            image_url: text(&self.image_url),
            delivery: text(&self.delivery),
            availability: text(&self.availability),
            site: self.site.clone(),
            scraped_at: self.scraped_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Flat, sink-facing shape of a record. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRow {
    pub index: usize,
    pub search_query: String,
    pub name: String,
    pub current_price: String,
    pub original_price: String,
    pub rating: String,
    pub reviews: String,
    pub discount: String,
    pub offers: String,
    pub image_url: String,
    pub delivery: String,
    pub availability: String,
    pub site: String,
    pub scraped_at: String,
}

impl ProductRow {
    pub const COLUMNS: [&'static str; 14] = [
        "index",
        "search_query",
        "name",
        "current_price",
        "original_price",
        "rating",
        "reviews",
        "discount",
        "offers",
        "image_url",
        "delivery",
        "availability",
        "site",
        "scraped_at",
    ];
}
