//! The escalating extraction tiers. Each tier turns candidates into raw field
//! maps and hands them to the session, which validates and appends.

pub mod emergency;
pub mod generic;
pub mod heuristic;
pub mod structured;

use scraper::ElementRef;

use crate::extractor::model::RawFieldMap;
use crate::extractor::profile::SiteProfile;
use crate::extractor::resolver::{AVAILABILITY, DELIVERY};

/// Resolve every field of one candidate with the profile's selectors and
/// strategies.
pub fn field_map(fragment: ElementRef<'_>, profile: &SiteProfile) -> RawFieldMap {
    RawFieldMap {
        name: profile.name_strategy.resolve_name(fragment, &profile.name),
        current_price: profile.current_price.resolve(fragment),
        original_price: profile
            .original_price_strategy
            .resolve_original_price(fragment, &profile.original_price),
        rating: profile.rating.resolve(fragment),
        reviews: profile.reviews.resolve(fragment),
        discount: profile.discount.resolve(fragment),
        offers: profile.offers.resolve_all(fragment),
        image_url: profile.image.resolve_image(fragment),
        delivery: DELIVERY.resolve(fragment),
        availability: AVAILABILITY.resolve(fragment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::profile::ProfileRegistry;
    use scraper::Html;

    #[test]
    fn test_field_map_for_amazon_card() {
        let html = Html::parse_fragment(
            r#"<div data-component-type="s-search-result">
                <span class="a-badge-text">Limited time deal</span>
                <h2><a href="/dp/B0D"><span>Samsung Galaxy M35 5G (Moonlight Blue, 6GB RAM, 128GB)</span></a></h2>
                <i class="a-icon-star-small"><span class="a-icon-alt">4.1 out of 5 stars</span></i>
                <a href="/dp/B0D#customerReviews"><span>2,311</span></a>
                <span class="a-price"><span class="a-price-whole">14,999</span></span>
                <span class="a-price a-text-price"><span class="a-offscreen">₹24,499</span></span>
                <span class="s-coupon-unclipped">Save ₹750 with coupon</span>
                <img class="s-image" src="https://m.media-amazon.com/images/I/71.jpg">
                <span>FREE delivery Sat, 15 Mar</span>
            </div>"#,
        );
        let registry = ProfileRegistry::builtin().unwrap();
        let profile = registry.get("amazon").unwrap();

        let fields = field_map(html.root_element(), &profile);

        assert_eq!(
            fields.name.as_deref(),
            Some("Samsung Galaxy M35 5G (Moonlight Blue, 6GB RAM, 128GB)")
        );
        assert_eq!(fields.current_price.as_deref(), Some("14,999"));
        assert_eq!(fields.original_price.as_deref(), Some("₹24,499"));
        assert_eq!(fields.rating.as_deref(), Some("4.1 out of 5 stars"));
        assert_eq!(fields.reviews.as_deref(), Some("2,311"));
        assert_eq!(fields.discount.as_deref(), Some("Limited time deal"));
        assert_eq!(fields.offers, vec!["Save ₹750 with coupon"]);
        assert_eq!(
            fields.image_url.as_deref(),
            Some("https://m.media-amazon.com/images/I/71.jpg")
        );
        assert_eq!(fields.delivery.as_deref(), Some("FREE delivery Sat, 15 Mar"));
    }
}
