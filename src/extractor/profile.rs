//! Static per-site selector bundles and the registry that holds them.

use scraper::Selector;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

use crate::extractor::selector::{SelectorSpec, css_spec};
use crate::extractor::strategy::{
    ImageAltOrSlugName, ListPriceLabel, NameStrategy, OriginalPriceStrategy, SelectorName,
    SelectorOriginalPrice,
};

/// Generic floor for name length; site minimums only ever raise it.
pub const MIN_NAME_LEN: usize = 5;

/// Everything needed to extract products from one site. Immutable once built.
#[derive(Debug)]
pub struct SiteProfile {
    pub key: &'static str,
    pub display_name: &'static str,
    pub default_url: Url,
    pub default_query: &'static str,
    /// Query-string parameter of `default_url` that carries the search terms.
    pub search_param: &'static str,
    /// Query isolating one product listing, as text for fetchers that
    /// isolate fragments themselves.
    pub candidate_query: &'static str,
    pub candidate_selector: Option<Selector>,
    pub currency: char,
    /// Site-specific minimum name length.
    pub min_name_len: usize,
    pub name: SelectorSpec,
    pub current_price: SelectorSpec,
    pub original_price: SelectorSpec,
    pub rating: SelectorSpec,
    pub reviews: SelectorSpec,
    pub discount: SelectorSpec,
    pub offers: SelectorSpec,
    pub image: SelectorSpec,
    pub name_strategy: Box<dyn NameStrategy>,
    pub original_price_strategy: Box<dyn OriginalPriceStrategy>,
}

impl SiteProfile {
    /// Minimum accepted name length: the generic floor or the site's, whichever is stricter.
    pub fn effective_min_name_len(&self) -> usize {
        self.min_name_len.max(MIN_NAME_LEN)
    }

    /// `scheme://host` of the default URL, used to absolutize relative links.
    pub fn origin(&self) -> Url {
        let mut origin = self.default_url.clone();
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);
        origin
    }

    /// The default URL with its search parameter replaced by `query`.
    pub fn search_url(&self, query: &str) -> Url {
        let pairs: Vec<(String, String)> = self
            .default_url
            .query_pairs()
            .map(|(key, value)| {
                let value = if key == self.search_param {
                    query.to_string()
                } else {
                    value.into_owned()
                };
                (key.into_owned(), value)
            })
            .collect();

        let mut url = self.default_url.clone();
        url.query_pairs_mut().clear().extend_pairs(pairs);
        url
    }
}

/// Starts a profile with empty specs, default strategies and the rupee symbol.
pub fn profile(
    key: &'static str,
    display_name: &'static str,
    default_url: Url,
    default_query: &'static str,
    candidate_query: &'static str,
) -> SiteProfile {
    SiteProfile {
        key,
        display_name,
        default_url,
        default_query,
        search_param: "q",
        candidate_query,
        candidate_selector: Selector::parse(candidate_query).ok(),
        currency: '₹',
        min_name_len: MIN_NAME_LEN,
        name: SelectorSpec::default(),
        current_price: SelectorSpec::default(),
        original_price: SelectorSpec::default(),
        rating: SelectorSpec::default(),
        reviews: SelectorSpec::default(),
        discount: SelectorSpec::default(),
        offers: SelectorSpec::default(),
        image: SelectorSpec::default(),
        name_strategy: Box::new(SelectorName),
        original_price_strategy: Box::new(SelectorOriginalPrice),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("unknown site {key:?}; available: {available}")]
    UnknownSite { key: String, available: String },

    #[error("invalid default url for {key}: {source}")]
    InvalidUrl {
        key: &'static str,
        source: url::ParseError,
    },
}

/// Site profiles by key.
#[derive(Debug, Default)]
pub struct ProfileRegistry {
    profiles: HashMap<&'static str, Arc<SiteProfile>>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    /// Registry holding every built-in site.
    pub fn builtin() -> Result<Self, ProfileError> {
        let mut registry = Self::new();
        registry.register(amazon()?);
        registry.register(flipkart()?);
        registry.register(meesho()?);
        registry.register(sathya()?);
        Ok(registry)
    }

    pub fn register(&mut self, profile: SiteProfile) {
        self.profiles.insert(profile.key, Arc::new(profile));
    }

    pub fn get(&self, key: &str) -> Result<Arc<SiteProfile>, ProfileError> {
        self.profiles
            .get(key)
            .cloned()
            .ok_or_else(|| ProfileError::UnknownSite {
                key: key.to_string(),
                available: self.keys().join(", "),
            })
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = self.profiles.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

fn parse_url(key: &'static str, url: &str) -> Result<Url, ProfileError> {
    Url::parse(url).map_err(|source| ProfileError::InvalidUrl { key, source })
}

const GENERIC_IMAGES: [&str; 6] = [
    "img[src]",
    "img[data-src]",
    r#"img[class*="product"]"#,
    r#"img[alt*="product"]"#,
    ".product-image img",
    r#"img[class*="image"]"#,
];

fn amazon() -> Result<SiteProfile, ProfileError> {
    let key = "amazon";
    let mut p = profile(
        key,
        "Amazon India",
        parse_url(key, "https://www.amazon.in/s?k=mobile+phones")?,
        "mobile phones",
        r#"div[data-component-type="s-search-result"]"#,
    );
    p.search_param = "k";
    p.min_name_len = 10;
    p.name = css_spec(&[
        r#"h2 a span[data-component-type="s-product-image"]"#,
        "h2 a span",
        "h2 span",
        r#"span[data-component-type="s-product-image"]"#,
        ".s-size-mini span",
        "h2",
    ]);
    p.current_price = css_spec(&[
        ".a-price-whole",
        ".a-price .a-price-whole",
        "span.a-price-whole",
        ".a-price-range .a-price-whole",
        r#"span[data-a-size="xl"] .a-price-whole"#,
    ]);
    p.original_price = css_spec(&[
        ".a-price.a-text-price .a-offscreen",
        ".a-text-price .a-offscreen",
        "span.a-price.a-text-price span",
        ".a-price.a-text-price",
    ]);
    p.rating = css_spec(&[
        ".a-icon-alt",
        r#"span[aria-label*="stars"]"#,
        ".a-icon-star-small .a-icon-alt",
        r#"i[data-hook="average-star-rating"] .a-icon-alt"#,
    ]);
    p.reviews = css_spec(&[
        r#"a[href*="customerReviews"] span"#,
        r#"span[data-hook="total-review-count"]"#,
        r#"a[href*="reviews"] span"#,
        ".a-size-base",
    ]);
    p.discount = SelectorSpec::builder()
        .css(".a-badge-text")
        .contains("% off")
        .contains("off")
        .css(".a-color-price")
        .build();
    p.offers = SelectorSpec::builder()
        .css(".s-coupon-unclipped")
        .contains("coupon")
        .contains("back with")
        .css(".a-color-secondary")
        .build();
    p.image = css_spec(&[
        ".s-image img",
        "img.s-image",
        "img[data-src]",
        "img[src]",
        ".s-product-image img",
    ]);
    Ok(p)
}

fn flipkart() -> Result<SiteProfile, ProfileError> {
    let key = "flipkart";
    let mut p = profile(
        key,
        "Flipkart",
        parse_url(key, "https://www.flipkart.com/search?q=mobile+phones")?,
        "mobile phones",
        "div[data-id]",
    );
    p.min_name_len = 5;
    p.name = css_spec(&[
        "a[title]",
        r#"div[class*="title"] a"#,
        r#"div[class*="title"]"#,
        r#"a[href*="/p/"]"#,
        r#"div[class*="product"] a"#,
    ]);
    p.current_price = css_spec(&[
        r#"div[class*="price"]"#,
        r#"span[class*="price"]"#,
        r#"div[class*="Nx9bqj"]"#,
        r#"div[class*="a-price-whole"]"#,
        r#"span[class*="a-price-whole"]"#,
    ]);
    p.original_price = css_spec(&[
        r#"div[class*="strike"]"#,
        r#"span[class*="strike"]"#,
        r#"div[class*="yRaY8j"]"#,
        r#"span[class*="yRaY8j"]"#,
    ]);
    p.rating = css_spec(&[
        r#"div[class*="rating"]"#,
        r#"span[class*="rating"]"#,
        r#"div[class*="XQDdHH"]"#,
        r#"span[class*="XQDdHH"]"#,
        r#"div[class*="star"]"#,
        r#"span[class*="star"]"#,
    ]);
    p.reviews = SelectorSpec::builder()
        .css(r#"span[class*="review"]"#)
        .css(r#"div[class*="review"]"#)
        .css(r#"span[class*="Wphh3N"]"#)
        .css(r#"span[class*="Bz-crL"]"#)
        .contains("ratings")
        .build();
    p.discount = SelectorSpec::builder()
        .css(r#"div[class*="discount"]"#)
        .css(r#"span[class*="discount"]"#)
        .css(r#"div[class*="UkUFwK"]"#)
        .contains("% off")
        .contains("off")
        .build();
    p.offers = css_spec(&[
        r#"div[class*="offer"]"#,
        r#"span[class*="offer"]"#,
        r#"div[class*="coupon"]"#,
        r#"span[class*="coupon"]"#,
    ]);
    p.image = css_spec(&GENERIC_IMAGES);
    Ok(p)
}

fn meesho() -> Result<SiteProfile, ProfileError> {
    let key = "meesho";
    let mut p = profile(
        key,
        "Meesho",
        parse_url(key, "https://www.meesho.com/search?q=saree")?,
        "saree",
        r#"div[class*="product"]"#,
    );
    p.min_name_len = 3;
    p.name = css_spec(&[r#"div[class*="title"]"#, "h1", "h2", "h3", r#"span[class*="title"]"#]);
    p.current_price = css_spec(&[
        r#"span[class*="price"]"#,
        r#"div[class*="price"]"#,
        r#"span[class*="amount"]"#,
    ]);
    p.original_price = css_spec(&[r#"span[class*="strike"]"#, r#"span[class*="original"]"#]);
    p.rating = css_spec(&[
        r#"span[class*="rating"]"#,
        r#"div[class*="star"]"#,
        r#"span[class*="score"]"#,
    ]);
    p.reviews = SelectorSpec::builder()
        .css(r#"span[class*="review"]"#)
        .contains("ratings")
        .build();
    p.discount = SelectorSpec::builder().contains("% off").contains("off").build();
    p.offers = css_spec(&[r#"span[class*="offer"]"#, r#"div[class*="coupon"]"#]);
    p.image = css_spec(&GENERIC_IMAGES);
    Ok(p)
}

fn sathya() -> Result<SiteProfile, ProfileError> {
    let key = "sathya";
    let mut p = profile(
        key,
        "Sathya Store",
        parse_url(key, "https://www.sathya.store/search?category=&q=vivo+mobile")?,
        "vivo mobile",
        "div.product-box",
    );
    p.min_name_len = 2;
    p.name = css_spec(&[r#"a[href*="/category/"]"#, "img[alt]", "h4", "h3", r#"div[class*="title"]"#]);
    p.current_price = SelectorSpec::builder().contains("₹").build();
    p.original_price = SelectorSpec::builder()
        .css(r#"span[class*="strike"]"#)
        .css(r#"span[class*="original"]"#)
        .css("del")
        .contains("MRP")
        .contains("M.R.P")
        .build();
    p.rating = css_spec(&[
        r#"div[class*="star"]"#,
        r#"span[class*="rating"]"#,
        r#"div[class*="review"]"#,
        r#"div[class*="rating"]"#,
        r#"span[class*="score"]"#,
        r#"div[class*="Rating"]"#,
    ]);
    p.reviews = SelectorSpec::builder()
        .css(r#"span[class*="review"]"#)
        .contains("ratings")
        .contains("reviews")
        .css(r#"span[class*="Review"]"#)
        .build();
    p.discount = SelectorSpec::builder().contains("% off").contains("off").contains("Save").build();
    p.offers = SelectorSpec::builder()
        .css(r#"span[class*="offer"]"#)
        .css(r#"div[class*="coupon"]"#)
        .contains("Save")
        .build();
    p.image = css_spec(&[
        "img[src]",
        "img[data-src]",
        "img[alt]",
        r#"img[class*="product"]"#,
        r#"img[class*="image"]"#,
        ".product-box img",
        r#"img[class*="box"]"#,
    ]);
    p.name_strategy = Box::new(ImageAltOrSlugName {
        slug_marker: "/category/",
    });
    p.original_price_strategy = Box::new(ListPriceLabel::new(&["MRP", "M.R.P"]));
    Ok(p)
}
