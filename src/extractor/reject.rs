use crate::extractor::model::RawFieldMap;
use crate::extractor::profile::MIN_NAME_LEN;
use crate::extractor::text::starts_with_currency;

/// Names containing these are listing chrome, not products.
const JUNK_NAME_PATTERNS: [&str; 2] = ["Add to Compare", "Sponsored"];

/// Whole-name matches (case-insensitive) that are buttons or badges.
const JUNK_NAMES: [&str; 6] = [
    "add to cart",
    "buy now",
    "quick view",
    "currently unavailable",
    "out of stock",
    "bestseller",
];

/// Why a cleaned field map was not turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("no product name")]
    MissingName,

    #[error("name {0:?} is listing boilerplate")]
    Boilerplate(String),

    #[error("name {name:?} is shorter than {min} characters")]
    TooShort { name: String, min: usize },

    #[error("name {0:?} is only digits")]
    Numeric(String),

    #[error("name {0:?} starts with a currency symbol")]
    PriceAsName(String),
}

/// Apply the acceptance rules, in order, to cleaned fields. `site_min_len`
/// is an additional floor on top of the generic minimum.
pub fn check(fields: &RawFieldMap, site_min_len: usize) -> Result<&str, Rejection> {
    let name = match fields.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => return Err(Rejection::MissingName),
    };

    let lower = name.to_lowercase();
    if JUNK_NAME_PATTERNS.iter().any(|pattern| name.contains(pattern))
        || JUNK_NAMES.contains(&lower.as_str())
    {
        return Err(Rejection::Boilerplate(name.to_string()));
    }

    let length = name.chars().count();
    if length < MIN_NAME_LEN {
        return Err(Rejection::TooShort {
            name: name.to_string(),
            min: MIN_NAME_LEN,
        });
    }

    if name.chars().all(|c| c.is_numeric()) {
        return Err(Rejection::Numeric(name.to_string()));
    }

    if starts_with_currency(name) {
        return Err(Rejection::PriceAsName(name.to_string()));
    }

    if length < site_min_len {
        return Err(Rejection::TooShort {
            name: name.to_string(),
            min: site_min_len,
        });
    }

    Ok(name)
}
