//! Tier 3: anchor-based chunking of the page's visible text.
//!
//! A line carrying a price, a rating or a review count anchors a chunk. The
//! lines around it are assumed to describe the same product until an anchor of
//! a kind the chunk already holds shows up.

use chrono::Utc;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::extractor::model::{RawFieldMap, RecordContext, Tier};
use crate::extractor::profile::SiteProfile;
use crate::extractor::session::ExtractionSession;
use crate::extractor::text::{
    CURRENCY_AMOUNT, RATING, REVIEW_COUNT, block_lines, starts_with_currency, truncate_chars,
};

pub const MAX_CHUNKS: usize = 20;

/// The anchor line plus up to four followers.
const MAX_CHUNK_LINES: usize = 5;

/// Lines this short (in bytes) are labels and icons.
const MIN_LINE_BYTES: usize = 5;

const MIN_CHUNK_CHARS: usize = 20;

const MAX_NAME_CHARS: usize = 100;

static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Price,
    Rating,
    Reviews,
}

fn anchors(line: &str) -> Vec<Anchor> {
    let mut kinds = Vec::new();
    if CURRENCY_AMOUNT.is_match(line) {
        kinds.push(Anchor::Price);
    }
    if RATING.is_match(line) {
        kinds.push(Anchor::Rating);
    }
    if REVIEW_COUNT.is_match(line) {
        kinds.push(Anchor::Reviews);
    }
    kinds
}

#[derive(Debug, Default)]
struct Chunk {
    lines: Vec<String>,
    anchors: Vec<Anchor>,
}

impl Chunk {
    fn start(line: String, kinds: Vec<Anchor>) -> Self {
        Self {
            lines: vec![line],
            anchors: kinds,
        }
    }

    fn is_full(&self) -> bool {
        self.lines.len() >= MAX_CHUNK_LINES
    }

    fn accepts_anchor(&self, kinds: &[Anchor]) -> bool {
        !self.is_full() && !kinds.iter().any(|kind| self.anchors.contains(kind))
    }

    fn push(&mut self, line: String, kinds: Vec<Anchor>) {
        self.lines.push(line);
        self.anchors.extend(kinds);
    }
}

/// Group visible lines into product-sized chunks, each returned as its lines
/// joined by newlines.
pub fn chunk_lines<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current: Option<Chunk> = None;

    for line in lines {
        let line: String = line.into();
        let line = line.trim();
        if line.len() <= MIN_LINE_BYTES {
            continue;
        }

        let kinds = anchors(line);
        if !kinds.is_empty() {
            match current.as_mut() {
                Some(chunk) if chunk.accepts_anchor(&kinds) => chunk.push(line.to_string(), kinds),
                _ => {
                    chunks.extend(current.take());
                    current = Some(Chunk::start(line.to_string(), kinds));
                }
            }
        } else if let Some(chunk) = current.as_mut() {
            if chunk.is_full() {
                chunks.extend(current.take());
            } else {
                chunk.push(line.to_string(), Vec::new());
            }
        }
    }
    chunks.extend(current);

    chunks.into_iter().map(|chunk| chunk.lines.join("\n")).collect()
}

/// Pull fields out of one chunk; `None` when it is too short to be a listing.
pub fn parse_chunk(chunk: &str) -> Option<RawFieldMap> {
    if chunk.chars().count() <= MIN_CHUNK_CHARS {
        return None;
    }

    let lines: Vec<&str> = chunk.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let first = *lines.first()?;
    let name = lines
        .iter()
        .skip(1)
        .find(|line| {
            line.chars().count() > first.chars().count()
                && !starts_with_currency(line)
                && !line.starts_with(|c: char| c.is_ascii_digit())
        })
        .copied()
        .unwrap_or(first);

    Some(RawFieldMap {
        name: Some(truncate_chars(name, MAX_NAME_CHARS)),
        current_price: CURRENCY_AMOUNT.find(chunk).map(|m| m.as_str().to_string()),
        rating: RATING.captures(chunk).map(|caps| caps[1].to_string()),
        reviews: REVIEW_COUNT.find(chunk).map(|m| m.as_str().to_string()),
        ..RawFieldMap::default()
    })
}

/// Returns the number of accepted records.
pub fn extract(
    session: &mut ExtractionSession,
    profile: &SiteProfile,
    document: &Html,
    search_query: Option<&str>,
) -> usize {
    let scope = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());
    let chunks = chunk_lines(block_lines(scope));
    info!(site = profile.key, chunks = chunks.len(), "falling back to text heuristics");

    let mut accepted = 0;
    for (position, chunk) in chunks.iter().take(MAX_CHUNKS).enumerate() {
        let Some(fields) = parse_chunk(chunk) else {
            debug!(site = profile.key, position, "chunk too short");
            continue;
        };
        let ctx = RecordContext {
            index: position + 1,
            search_query,
            tier: Tier::HeuristicText,
            scraped_at: Utc::now(),
        };
        if session.accept(profile, fields, &ctx) {
            accepted += 1;
        }
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_name_rating_reviews_form_one_chunk() {
        let chunks = chunk_lines(["₹799", "Wireless Mouse", "4.2 out of 5", "230 ratings"]);
        assert_eq!(chunks, vec!["₹799\nWireless Mouse\n4.2 out of 5\n230 ratings"]);

        let fields = parse_chunk(&chunks[0]).unwrap();
        assert_eq!(fields.current_price.as_deref(), Some("₹799"));
        assert_eq!(fields.name.as_deref(), Some("Wireless Mouse"));
        assert_eq!(fields.rating.as_deref(), Some("4.2"));
        assert_eq!(fields.reviews.as_deref(), Some("230 ratings"));
        assert!(fields.original_price.is_none());
    }

    #[test]
    fn test_inline_split_price_and_name_stay_in_one_chunk() {
        let html = Html::parse_fragment(
            "<div><p><span>₹</span><span>799</span></p><p>Logitech <b>M235</b> Wireless Mouse</p>\
             <p>4.2 out of 5</p><p>230 ratings</p></div>",
        );
        let chunks = chunk_lines(block_lines(html.root_element()));
        assert_eq!(
            chunks,
            vec!["₹799\nLogitech M235 Wireless Mouse\n4.2 out of 5\n230 ratings"]
        );

        let fields = parse_chunk(&chunks[0]).unwrap();
        assert_eq!(fields.name.as_deref(), Some("Logitech M235 Wireless Mouse"));
        assert_eq!(fields.current_price.as_deref(), Some("₹799"));
    }

    #[test]
    fn test_repeated_anchor_kind_starts_new_chunk() {
        let chunks = chunk_lines([
            "₹1,299",
            "Logitech Keyboard K120",
            "₹2,499",
            "Portronics Toad 23 Mouse",
        ]);
        assert_eq!(
            chunks,
            vec!["₹1,299\nLogitech Keyboard K120", "₹2,499\nPortronics Toad 23 Mouse"]
        );
    }

    #[test]
    fn test_lines_before_first_anchor_and_after_full_chunk_are_dropped() {
        let chunks = chunk_lines([
            "Results for mouse",
            "₹499",
            "line one here",
            "line two here",
            "line three here",
            "line four here",
            "line five here",
        ]);
        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0].contains("Results"));
        assert!(!chunks[0].contains("line five"));
    }

    #[test]
    fn test_short_lines_are_ignored() {
        let chunks = chunk_lines(["₹9", "Menu", "$5.99 Cable organiser clips"]);
        assert_eq!(chunks, vec!["$5.99 Cable organiser clips"]);
    }

    #[test]
    fn test_short_chunk_is_not_parsed() {
        assert!(parse_chunk("₹799\nMouse").is_none());
    }

    #[test]
    fn test_name_prefers_longer_non_numeric_line() {
        let fields = parse_chunk("₹1,999 deal price\n2 pack\nHP Wired Mouse with USB").unwrap();
        assert_eq!(fields.name.as_deref(), Some("HP Wired Mouse with USB"));
    }
}
