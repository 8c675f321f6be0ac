//! Per-site overrides for the two fields that need more than a selector list.

use percent_encoding::percent_decode_str;
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::fmt::Debug;
use std::sync::LazyLock;

use crate::extractor::selector::{SelectorExpr, SelectorSpec};
use crate::extractor::text::{find_text_owner, starts_with_currency, visible_lines, visible_text};

pub trait NameStrategy: Debug + Send + Sync {
    fn resolve_name(&self, fragment: ElementRef<'_>, spec: &SelectorSpec) -> Option<String>;
}

pub trait OriginalPriceStrategy: Debug + Send + Sync {
    fn resolve_original_price(&self, fragment: ElementRef<'_>, spec: &SelectorSpec)
    -> Option<String>;
}

/// Name straight from the profile's selectors.
#[derive(Debug, Default, Clone, Copy)]
pub struct SelectorName;

impl NameStrategy for SelectorName {
    fn resolve_name(&self, fragment: ElementRef<'_>, spec: &SelectorSpec) -> Option<String> {
        spec.resolve(fragment)
    }
}

/// Reference price straight from the profile's selectors.
#[derive(Debug, Default, Clone, Copy)]
pub struct SelectorOriginalPrice;

impl OriginalPriceStrategy for SelectorOriginalPrice {
    fn resolve_original_price(
        &self,
        fragment: ElementRef<'_>,
        spec: &SelectorSpec,
    ) -> Option<String> {
        spec.resolve(fragment)
    }
}

static IMG_ALT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[alt]").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static DETAIL_HEADING: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    ["div.product-detail h4", "div.product-detail h3", "div.product-detail h2"]
        .iter()
        .filter_map(|query| Selector::parse(query).ok())
        .collect()
});

/// Stores that render the title as an image: read the image's alt text, then
/// the product slug in the link path, then the detail heading, then the first
/// meaningful line of text. The profile's name selectors are not consulted.
#[derive(Debug, Clone)]
pub struct ImageAltOrSlugName {
    /// Path marker identifying product links, e.g. `/category/`.
    pub slug_marker: &'static str,
}

impl NameStrategy for ImageAltOrSlugName {
    fn resolve_name(&self, fragment: ElementRef<'_>, _spec: &SelectorSpec) -> Option<String> {
        self.from_alt(fragment)
            .or_else(|| self.from_slug(fragment))
            .or_else(|| from_detail_heading(fragment))
            .or_else(|| first_meaningful_line(fragment))
    }
}

impl ImageAltOrSlugName {
    fn from_alt(&self, fragment: ElementRef<'_>) -> Option<String> {
        let alt = fragment.select(&IMG_ALT).next()?.value().attr("alt")?.trim();
        looks_like_name(alt).then(|| alt.to_string())
    }

    fn from_slug(&self, fragment: ElementRef<'_>) -> Option<String> {
        let href = fragment.select(&LINK).next()?.value().attr("href")?;
        if !href.contains(self.slug_marker) {
            return None;
        }
        let path = href.split(['?', '#']).next().unwrap_or(href);
        let slug = path.trim_end_matches('/').rsplit('/').next()?;
        let slug = percent_decode_str(slug).decode_utf8_lossy();
        let name = title_case(&slug.replace(['-', '_'], " "));
        (name.chars().count() > 3).then_some(name)
    }
}

fn from_detail_heading(fragment: ElementRef<'_>) -> Option<String> {
    DETAIL_HEADING.iter().find_map(|selector| {
        let text = visible_text(fragment.select(selector).next()?);
        looks_like_name(&text).then_some(text)
    })
}

fn looks_like_name(text: &str) -> bool {
    text.chars().count() > 5 && !starts_with_currency(text)
}

fn first_meaningful_line(fragment: ElementRef<'_>) -> Option<String> {
    visible_lines(fragment).into_iter().find(|line| {
        looks_like_name(line)
            && !line.starts_with('(')
            && !line.starts_with("Save")
    })
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

static LABELLED_AMOUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"₹\s*([\d,]+)").unwrap());

static LIST_PRICE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)MRP[:\s]*₹?\s*([\d,]+)",
        r"(?i)M\.R\.P\.?[:\s]*₹?\s*([\d,]+)",
        r"(?i)₹\s*([\d,]+)\s*\(MRP\)",
        r"(?i)₹\s*([\d,]+)\s*\(M\.R\.P\.?\)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Reference price printed next to a localized "list price" label (`MRP`)
/// rather than in a strike-through element.
#[derive(Debug, Clone)]
pub struct ListPriceLabel {
    labels: Vec<SelectorExpr>,
}

impl ListPriceLabel {
    pub fn new(labels: &[&str]) -> Self {
        Self {
            labels: labels
                .iter()
                .filter_map(|label| SelectorExpr::contains(label).ok())
                .collect(),
        }
    }
}

impl OriginalPriceStrategy for ListPriceLabel {
    fn resolve_original_price(
        &self,
        fragment: ElementRef<'_>,
        _spec: &SelectorSpec,
    ) -> Option<String> {
        let labelled = self.labels.iter().find_map(|label| match label {
            SelectorExpr::Contains(pattern) => {
                let owner = find_text_owner(fragment, pattern)?;
                let text = visible_text(owner);
                LABELLED_AMOUNT
                    .captures(&text)
                    .map(|caps| format!("₹{}", &caps[1]))
            }
            SelectorExpr::Structural(_) => None,
        });
        if labelled.is_some() {
            return labelled;
        }

        let text = visible_text(fragment);
        LIST_PRICE_PATTERNS
            .iter()
            .find_map(|pattern| pattern.captures(&text))
            .map(|caps| format!("₹{}", &caps[1]))
    }
}
