//! Tier 1: the profile's own selectors against isolated candidate fragments.

use chrono::Utc;
use scraper::{ElementRef, Html};
use tracing::debug;

use crate::extractor::model::{RecordContext, Tier};
use crate::extractor::profile::SiteProfile;
use crate::extractor::session::ExtractionSession;
use crate::extractor::tiers::field_map;

/// Run the per-fragment pipeline over fragments the fetcher already isolated.
/// Each fragment is scoped to its outermost element, so selectors see the
/// same descendants as a candidate isolated from the document. Returns the
/// number of accepted records.
pub fn extract_fragments(
    session: &mut ExtractionSession,
    profile: &SiteProfile,
    fragments: &[String],
    search_query: Option<&str>,
) -> usize {
    let mut accepted = 0;
    for (position, fragment) in fragments.iter().enumerate() {
        let html = Html::parse_fragment(fragment);
        let root = html.root_element();
        let candidate = root.children().find_map(ElementRef::wrap).unwrap_or(root);
        if accept_candidate(session, profile, candidate, position + 1, search_query) {
            accepted += 1;
        }
    }
    accepted
}

/// Isolate candidates with the profile's candidate query, then run the
/// per-fragment pipeline. Returns the number of accepted records.
pub fn extract_document(
    session: &mut ExtractionSession,
    profile: &SiteProfile,
    document: &Html,
    search_query: Option<&str>,
) -> usize {
    let Some(selector) = &profile.candidate_selector else {
        return 0;
    };

    let candidates: Vec<ElementRef<'_>> = document.select(selector).collect();
    debug!(
        site = profile.key,
        candidates = candidates.len(),
        "isolated candidate fragments"
    );

    candidates
        .into_iter()
        .enumerate()
        .filter(|(position, candidate)| {
            accept_candidate(session, profile, *candidate, position + 1, search_query)
        })
        .count()
}

fn accept_candidate(
    session: &mut ExtractionSession,
    profile: &SiteProfile,
    candidate: ElementRef<'_>,
    index: usize,
    search_query: Option<&str>,
) -> bool {
    let ctx = RecordContext {
        index,
        search_query,
        tier: Tier::Structured,
        scraped_at: Utc::now(),
    };
    session.accept(profile, field_map(candidate, profile), &ctx)
}
