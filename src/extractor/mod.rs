pub mod cleaner;
pub mod model;
pub mod profile;
pub mod reject;
pub mod resolver;
pub mod selector;
pub mod session;
pub mod strategy;
pub mod text;
pub mod tiers;

#[cfg(test)]
mod tests;

pub use model::{ProductRecord, ProductRow, RawFieldMap, RecordContext, Tier};
pub use profile::{ProfileError, ProfileRegistry, SiteProfile};
pub use reject::Rejection;
pub use session::{ExtractionSession, PageOutcome};

/// Clean a raw field map and turn it into a record, or say why it was refused.
pub fn normalize_and_validate(
    raw: RawFieldMap,
    profile: &SiteProfile,
    ctx: &RecordContext<'_>,
) -> Result<ProductRecord, Rejection> {
    // 1. Canonicalize every field
    let fields = cleaner::clean(raw, profile);

    // 2. Apply the acceptance rules to the cleaned name
    let name = reject::check(&fields, profile.effective_min_name_len())?.to_string();

    // 3. Build the record
    Ok(ProductRecord {
        index: ctx.index,
        site: profile.key.to_string(),
        search_query: ctx.search_query.map(str::to_string),
        name,
        current_price: fields.current_price,
        original_price: fields.original_price,
        rating: fields.rating,
        reviews: fields.reviews,
        discount: fields.discount,
        offers: fields.offers,
        image_url: fields.image_url,
        delivery: fields.delivery,
        availability: fields.availability,
        scraped_at: ctx.scraped_at,
        tier: ctx.tier,
    })
}
