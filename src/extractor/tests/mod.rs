use scraper::{Html, Selector};
use std::fs;
use url::Url;

use crate::extractor::model::{RecordContext, Tier};
use crate::extractor::normalize_and_validate;
use crate::extractor::profile::ProfileRegistry;
use crate::extractor::session::ExtractionSession;
use crate::fetcher::FetchedPage;

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("src/extractor/tests/fixtures/{name}"))
        .expect("Failed to read test fixture")
}

fn page(name: &str) -> FetchedPage {
    FetchedPage::new(
        Url::parse("https://shop.example.com/search?q=test").unwrap(),
        fixture(name),
    )
}

#[test]
fn test_structured_amazon_listing() {
    let registry = ProfileRegistry::builtin().unwrap();
    let profile = registry.get("amazon").unwrap();
    let mut session = ExtractionSession::new();

    let outcome = session.extract_page(&profile, &page("amazon_search.html"), Some("mobile phones"));

    assert_eq!(outcome.tier, Some(Tier::Structured));
    // "Redmi 13C" is under amazon's minimum and "Add to Cart" is boilerplate.
    assert_eq!(outcome.accepted, 2);

    let records = session.records();
    let first = &records[0];
    assert_eq!(first.index, 1);
    assert_eq!(first.site, "amazon");
    assert_eq!(first.search_query.as_deref(), Some("mobile phones"));
    assert_eq!(
        first.name,
        "Samsung Galaxy M35 5G (Moonlight Blue, 6GB RAM, 128GB Storage)"
    );
    assert_eq!(first.current_price.as_deref(), Some("₹14,999"));
    assert_eq!(first.original_price.as_deref(), Some("₹24,499"));
    assert_eq!(first.rating.as_deref(), Some("4.1"));
    assert_eq!(first.reviews.as_deref(), Some("2311"));
    assert_eq!(first.discount.as_deref(), Some("Limited time deal"));
    assert_eq!(first.offers, vec!["Save ₹750 with coupon"]);
    assert_eq!(
        first.image_url.as_deref(),
        Some("https://m.media-amazon.com/images/I/71AbC._AC_UY218_.jpg")
    );
    assert_eq!(first.delivery.as_deref(), Some("FREE delivery Sat, 15 Mar"));

    let second = &records[1];
    assert_eq!(second.index, 3);
    assert_eq!(second.reviews.as_deref(), Some("18402"));
    assert_eq!(second.discount, None);
    assert_eq!(
        second.image_url.as_deref(),
        Some("https://m.media-amazon.com/images/I/61XyZ.jpg")
    );
    assert_eq!(second.availability.as_deref(), Some("Only 3 left in stock."));
}

#[test]
fn test_structured_sathya_uses_name_and_list_price_strategies() {
    let registry = ProfileRegistry::builtin().unwrap();
    let profile = registry.get("sathya").unwrap();
    let mut session = ExtractionSession::new();

    let outcome = session.extract_page(&profile, &page("sathya_search.html"), Some("vivo mobile"));

    assert_eq!(outcome.tier, Some(Tier::Structured));
    let records = session.records();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].name, "Vivo Y28s 5G (Twinkling Purple, 6GB RAM, 128GB)");
    assert_eq!(records[0].current_price.as_deref(), Some("₹13,999"));
    assert_eq!(records[0].original_price.as_deref(), Some("₹17,999"));
    assert_eq!(
        records[0].image_url.as_deref(),
        Some("https://www.sathya.store/uploads/y28s.webp")
    );

    assert_eq!(records[1].name, "Vivo T3 Lite 5g");
    assert_eq!(records[1].current_price.as_deref(), Some("₹10,499"));
    assert_eq!(records[1].original_price.as_deref(), Some("₹12,999"));
}

#[test]
fn test_supplied_fragments_take_precedence() {
    let registry = ProfileRegistry::builtin().unwrap();
    let profile = registry.get("sathya").unwrap();
    let document = Html::parse_document(&fixture("sathya_search.html"));
    let selector = Selector::parse("div.product-box").unwrap();
    let fragments: Vec<String> = document.select(&selector).map(|e| e.html()).collect();
    assert_eq!(fragments.len(), 2);

    let page = FetchedPage::new(Url::parse("https://www.sathya.store/").unwrap(), "")
        .with_fragments(fragments);
    assert_eq!(page.fragment_count(), 2);

    let mut session = ExtractionSession::new();
    let outcome = session.extract_page(&profile, &page, None);

    assert_eq!(outcome.tier, Some(Tier::Structured));
    assert_eq!(outcome.accepted, 2);
    assert_eq!(session.records()[1].name, "Vivo T3 Lite 5g");
    assert_eq!(session.records()[1].search_query, None);
}

#[test]
fn test_empty_fragment_list_falls_back_to_document() {
    let registry = ProfileRegistry::builtin().unwrap();
    let profile = registry.get("sathya").unwrap();
    let page = page("sathya_search.html").with_fragments(Vec::new());

    let mut session = ExtractionSession::new();
    let outcome = session.extract_page(&profile, &page, None);

    assert_eq!(outcome.tier, Some(Tier::Structured));
    assert_eq!(outcome.accepted, 2);
}

#[test]
fn test_only_generic_tier_contributes_when_candidate_query_misses() {
    let registry = ProfileRegistry::builtin().unwrap();
    let profile = registry.get("flipkart").unwrap();
    let mut session = ExtractionSession::new();

    let outcome = session.extract_page(&profile, &page("generic_only.html"), Some("earbuds"));

    assert_eq!(outcome.tier, Some(Tier::Generic));
    assert_eq!(outcome.accepted, 2);
    assert!(session.records().iter().all(|r| r.tier == Tier::Generic));

    let first = &session.records()[0];
    assert_eq!(first.name, "Boat Airdopes 141 Bluetooth Earbuds");
    assert_eq!(first.current_price.as_deref(), Some("₹1,099"));
    assert_eq!(first.rating.as_deref(), Some("4.1"));
    assert_eq!(first.discount.as_deref(), Some("(43% off)"));
    assert_eq!(session.records()[1].current_price.as_deref(), Some("₹899"));
}

#[test]
fn test_heuristic_tier_chunks_plain_text() {
    let registry = ProfileRegistry::builtin().unwrap();
    let profile = registry.get("flipkart").unwrap();
    let mut session = ExtractionSession::new();

    let outcome = session.extract_page(&profile, &page("text_only.html"), None);

    assert_eq!(outcome.tier, Some(Tier::HeuristicText));
    let records = session.records();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].name, "Wireless Mouse");
    assert_eq!(records[0].current_price.as_deref(), Some("₹799"));
    assert_eq!(records[0].rating.as_deref(), Some("4.2"));
    assert_eq!(records[0].reviews.as_deref(), Some("230"));

    assert_eq!(records[1].name, "Logitech K120 Wired Keyboard");
    assert_eq!(records[1].current_price.as_deref(), Some("₹1,299"));
    assert_eq!(records[1].reviews, None);
}

#[test]
fn test_heuristic_tier_joins_inline_markup() {
    let registry = ProfileRegistry::builtin().unwrap();
    let profile = registry.get("flipkart").unwrap();
    let mut session = ExtractionSession::new();

    let outcome = session.extract_page(&profile, &page("inline_text.html"), Some("mouse"));

    assert_eq!(outcome.tier, Some(Tier::HeuristicText));
    let records = session.records();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].name, "Logitech M235 Wireless Mouse");
    assert_eq!(records[0].current_price.as_deref(), Some("₹799"));
    assert_eq!(records[0].rating.as_deref(), Some("4.2"));
    assert_eq!(records[0].reviews.as_deref(), Some("230"));

    assert_eq!(records[1].name, "Logitech K120 Wired Keyboard");
    assert_eq!(records[1].current_price.as_deref(), Some("₹1,299"));
    assert_eq!(records[1].rating.as_deref(), Some("4.5"));
}

#[test]
fn test_supplied_and_isolated_candidates_resolve_alike() {
    let registry = ProfileRegistry::builtin().unwrap();
    let profile = registry.get("meesho").unwrap();
    // The card's own class matches the first name selector.
    let card = r#"<div class="product-card title-strip"><h3>Banarasi Silk Saree with Blouse</h3><span class="price">₹649</span><span class="rating">4.3</span></div>"#;
    let url = Url::parse("https://www.meesho.com/search?q=saree").unwrap();

    let mut isolated = ExtractionSession::new();
    let document = FetchedPage::new(url.clone(), format!("<html><body>{card}</body></html>"));
    isolated.extract_page(&profile, &document, None);

    let mut supplied = ExtractionSession::new();
    let fragments = FetchedPage::new(url, "").with_fragments(vec![card.to_string()]);
    supplied.extract_page(&profile, &fragments, None);

    assert_eq!(isolated.len(), 1);
    assert_eq!(supplied.len(), 1);
    assert_eq!(isolated.records()[0].name, "Banarasi Silk Saree with Blouse");
    assert_eq!(supplied.records()[0].name, isolated.records()[0].name);
    assert_eq!(supplied.records()[0].current_price, isolated.records()[0].current_price);
    assert_eq!(supplied.records()[0].rating, isolated.records()[0].rating);
}

#[test]
fn test_page_with_nothing_yields_no_records() {
    let registry = ProfileRegistry::builtin().unwrap();
    let profile = registry.get("flipkart").unwrap();
    let mut session = ExtractionSession::new();

    let outcome = session.extract_page(&profile, &page("empty.html"), None);

    assert_eq!(outcome.tier, None);
    assert_eq!(outcome.accepted, 0);
    assert!(session.is_empty());
    assert!(!session.has_produced("flipkart"));
}

#[test]
fn test_failed_fetch_is_not_parsed() {
    let registry = ProfileRegistry::builtin().unwrap();
    let profile = registry.get("amazon").unwrap();
    let mut session = ExtractionSession::new();

    let mut failed = page("amazon_search.html");
    failed.success = false;
    let outcome = session.extract_page(&profile, &failed, None);

    assert_eq!(outcome.accepted, 0);
    assert!(session.is_empty());
}

#[test]
fn test_tiers_append_after_earlier_sites() {
    let registry = ProfileRegistry::builtin().unwrap();
    let mut session = ExtractionSession::new();

    session.extract_page(&registry.get("amazon").unwrap(), &page("amazon_search.html"), None);
    session.extract_page(&registry.get("flipkart").unwrap(), &page("text_only.html"), None);

    let sites: Vec<&str> = session.records().iter().map(|r| r.site.as_str()).collect();
    assert_eq!(sites, vec!["amazon", "amazon", "flipkart", "flipkart"]);
    assert_eq!(session.count_for("amazon"), 2);
    assert_eq!(session.count_for("flipkart"), 2);
}

#[test]
fn test_accepted_records_survive_normalization_unchanged() {
    let registry = ProfileRegistry::builtin().unwrap();
    let mut session = ExtractionSession::new();
    for (site, fixture) in [
        ("amazon", "amazon_search.html"),
        ("sathya", "sathya_search.html"),
        ("flipkart", "generic_only.html"),
        ("meesho", "text_only.html"),
    ] {
        session.extract_page(&registry.get(site).unwrap(), &page(fixture), Some("q"));
    }
    assert!(session.len() >= 6);

    for record in session.records() {
        let profile = registry.get(&record.site).unwrap();
        let ctx = RecordContext {
            index: record.index,
            search_query: record.search_query.as_deref(),
            tier: record.tier,
            scraped_at: record.scraped_at,
        };
        let again = normalize_and_validate(record.to_raw(), &profile, &ctx).unwrap();
        assert_eq!(&again, record);
    }
}
