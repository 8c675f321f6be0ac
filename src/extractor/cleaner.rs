use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::extractor::model::RawFieldMap;
use crate::extractor::profile::SiteProfile;
use crate::extractor::text::{CURRENCY_SYMBOLS, truncate_chars};

/// Labels that listing pages glue in front of product titles.
const NAME_PREFIXES: [&str; 2] = ["Add to Compare", "Sponsored"];

const MAX_NAME_CHARS: usize = 100;

const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".webp", ".gif"];

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d,]*").unwrap());
static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());
static COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d,]*").unwrap());

/// Canonicalize every field. Applying this to its own output changes nothing.
pub fn clean(raw: RawFieldMap, profile: &SiteProfile) -> RawFieldMap {
    let origin = profile.origin();

    RawFieldMap {
        name: raw.name.as_deref().and_then(clean_name),
        current_price: raw
            .current_price
            .as_deref()
            .and_then(|price| clean_price(price, profile.currency)),
        original_price: raw
            .original_price
            .as_deref()
            .and_then(|price| clean_price(price, profile.currency)),
        rating: raw.rating.as_deref().and_then(clean_rating),
        reviews: raw.reviews.as_deref().and_then(clean_reviews),
        discount: raw.discount.as_deref().and_then(clean_text),
        offers: clean_offers(raw.offers),
        image_url: raw
            .image_url
            .as_deref()
            .and_then(|url| clean_image_url(url, &origin)),
        delivery: raw.delivery.as_deref().and_then(clean_text),
        availability: raw.availability.as_deref().and_then(clean_text),
    }
}

/// Collapse whitespace; empty text becomes `None`.
pub fn clean_text(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

pub fn clean_name(name: &str) -> Option<String> {
    let mut name = clean_text(name)?;
    while let Some(rest) = NAME_PREFIXES
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
    {
        name = rest
            .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '|' | ':' | '·'))
            .to_string();
    }
    clean_text(&truncate_chars(&name, MAX_NAME_CHARS))
}

/// Currency symbol plus the first run of digits and commas, e.g.
/// `"₹ 12,999 (incl. taxes)"` becomes `"₹12,999"`. The symbol found in the
/// text wins over `default_currency`.
pub fn clean_price(price: &str, default_currency: char) -> Option<String> {
    let amount = AMOUNT.find(price)?.as_str().trim_end_matches(',');
    let currency = price
        .chars()
        .find(|c| CURRENCY_SYMBOLS.contains(c))
        .unwrap_or(default_currency);
    Some(format!("{currency}{amount}"))
}

pub fn clean_rating(rating: &str) -> Option<String> {
    NUMBER.find(rating).map(|m| m.as_str().to_string())
}

/// First integer in the text, thousands separators removed.
pub fn clean_reviews(reviews: &str) -> Option<String> {
    COUNT.find(reviews).map(|m| m.as_str().replace(',', ""))
}

fn clean_offers(offers: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(offers.len());
    for offer in offers.iter().filter_map(|offer| clean_text(offer)) {
        if !cleaned.contains(&offer) {
            cleaned.push(offer);
        }
    }
    cleaned
}

/// Absolute image URL: protocol-relative and root-relative links are resolved
/// against the site origin, and sizing query strings are dropped from plain
/// image files.
pub fn clean_image_url(url: &str, origin: &Url) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    let absolute = if let Some(rest) = url.strip_prefix("//") {
        format!("https://{rest}")
    } else if url.starts_with('/') {
        origin.join(url).map(String::from).unwrap_or_else(|_| url.to_string())
    } else {
        url.to_string()
    };

    if let Some((base, _query)) = absolute.split_once('?') {
        let lower = base.to_lowercase();
        if IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            return Some(base.to_string());
        }
    }
    Some(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::profile::ProfileRegistry;

    fn origin() -> Url {
        Url::parse("https://www.flipkart.com/").unwrap()
    }

    #[test]
    fn test_clean_price() {
        assert_eq!(clean_price("₹ 12,999 (incl. taxes)", '₹').as_deref(), Some("₹12,999"));
        assert_eq!(clean_price("no price", '₹'), None);
        assert_eq!(clean_price("1,499.", '₹').as_deref(), Some("₹1,499"));
        assert_eq!(clean_price("$ 24", '₹').as_deref(), Some("$24"));
        assert_eq!(clean_price("₹12,999", '₹').as_deref(), Some("₹12,999"));
    }

    #[test]
    fn test_clean_rating_and_reviews() {
        assert_eq!(clean_rating("4.3 out of 5 stars").as_deref(), Some("4.3"));
        assert_eq!(clean_rating("Be the first"), None);
        assert_eq!(clean_reviews("(12,840)").as_deref(), Some("12840"));
        assert_eq!(clean_reviews("230 ratings").as_deref(), Some("230"));
        assert_eq!(clean_reviews("no reviews yet"), None);
    }

    #[test]
    fn test_clean_name_strips_prefixes() {
        assert_eq!(
            clean_name("Sponsored  Sponsored - boAt Rockerz 450").as_deref(),
            Some("boAt Rockerz 450")
        );
        assert_eq!(
            clean_name("Add to CompareSamsung Galaxy M35 5G").as_deref(),
            Some("Samsung Galaxy M35 5G")
        );
        assert_eq!(clean_name("Sponsored"), None);
        assert_eq!(clean_name("   "), None);
    }

    #[test]
    fn test_clean_name_truncates() {
        let long = "Phone ".repeat(40);
        let cleaned = clean_name(&long).unwrap();
        assert!(cleaned.chars().count() <= MAX_NAME_CHARS);
        assert_eq!(clean_name(&cleaned).as_deref(), Some(cleaned.as_str()));
    }

    #[test]
    fn test_clean_image_url() {
        let origin = origin();
        assert_eq!(
            clean_image_url("//rukminim2.flixcart.com/image/a.jpeg?q=70", &origin).as_deref(),
            Some("https://rukminim2.flixcart.com/image/a.jpeg")
        );
        assert_eq!(
            clean_image_url("/img/b.png", &origin).as_deref(),
            Some("https://www.flipkart.com/img/b.png")
        );
        assert_eq!(
            clean_image_url("https://cdn.example.com/render?id=9", &origin).as_deref(),
            Some("https://cdn.example.com/render?id=9")
        );
        assert_eq!(clean_image_url("  ", &origin), None);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let registry = ProfileRegistry::builtin().unwrap();
        let profile = registry.get("flipkart").unwrap();
        let raw = RawFieldMap {
            name: Some("  Sponsored Noise ColorFit   Pulse 2 Smartwatch ".to_string()),
            current_price: Some("₹ 1,499 (incl. taxes)".to_string()),
            original_price: Some("M.R.P: ₹3,999".to_string()),
            rating: Some("4.1 out of 5".to_string()),
            reviews: Some("1,02,311 Ratings".to_string()),
            discount: Some(" 62% off ".to_string()),
            offers: vec!["Bank Offer".to_string(), " Bank Offer".to_string(), "".to_string()],
            image_url: Some("//rukminim2.flixcart.com/x.webp?q=70".to_string()),
            delivery: Some("Free  delivery".to_string()),
            availability: None,
        };

        let once = clean(raw, &profile);
        let twice = clean(once.clone(), &profile);

        assert_eq!(once, twice);
        assert_eq!(once.name.as_deref(), Some("Noise ColorFit Pulse 2 Smartwatch"));
        assert_eq!(once.reviews.as_deref(), Some("102311"));
        assert_eq!(once.offers, vec!["Bank Offer"]);
    }
}

#[cfg(all(test, feature = "fuzz"))]
mod fuzz {
    use super::*;
    use crate::extractor::profile::ProfileRegistry;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_clean_never_changes_clean_output(
            name in ".{0,120}",
            price in ".{0,30}",
            rating in ".{0,20}",
            reviews in ".{0,20}",
            image in "(//|/|https://)?[a-z/.?=]{0,30}",
        ) {
            let registry = ProfileRegistry::builtin().unwrap();
            let profile = registry.get("amazon").unwrap();
            let raw = RawFieldMap {
                name: Some(name),
                current_price: Some(price),
                rating: Some(rating),
                reviews: Some(reviews),
                image_url: Some(image),
                ..RawFieldMap::default()
            };
            let once = clean(raw, &profile);
            prop_assert_eq!(clean(once.clone(), &profile), once);
        }
    }
}
