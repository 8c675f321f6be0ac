//! Visible-text helpers and the shared price/rating patterns.

use regex::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;

/// Elements whose text never reaches a reader.
const HIDDEN_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Elements that put their text on lines of its own.
const BLOCK_TAGS: [&str; 34] = [
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul", "caption",
];

pub const CURRENCY_SYMBOLS: [char; 4] = ['₹', '$', '€', '£'];

/// A currency symbol followed by an amount, e.g. `₹ 12,999` or `$19.99`.
pub static CURRENCY_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[₹$€£]\s*\d[\d,]*(?:\.\d+)?").unwrap());

/// `4.2 out of 5`, `4.2/5`, `4 stars`. Group 1 is the number.
pub static RATING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:out\s+of\s+5|/\s*5\b|stars?\b)").unwrap()
});

/// `230 ratings`, `1,204 Reviews`. Group 1 is the count.
pub static REVIEW_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d[\d,]*)\s*(?:ratings?|reviews?)\b").unwrap());

/// Trimmed text of every visible text node under `element`, joined by single spaces.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut pieces = Vec::new();
    collect_text(element, &mut pieces);

    let mut out = String::new();
    for piece in pieces {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(piece);
    }
    out
}

/// Visible text split into trimmed, non-empty lines. Every text node starts a
/// new line, as do embedded newlines.
pub fn visible_lines(element: ElementRef<'_>) -> Vec<String> {
    let mut pieces = Vec::new();
    collect_text(element, &mut pieces);

    pieces
        .into_iter()
        .flat_map(str::lines)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Visible text read the way a browser lays it out: inline elements run
/// together, block elements and newlines end the line. Whitespace inside a
/// line is collapsed.
pub fn block_lines(element: ElementRef<'_>) -> Vec<String> {
    let mut text = String::new();
    collect_blocks(element, &mut text);

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Innermost element owning the first visible text node (document order)
/// that matches `pattern`.
pub fn find_text_owner<'a>(element: ElementRef<'a>, pattern: &Regex) -> Option<ElementRef<'a>> {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            if pattern.is_match(text) {
                return Some(element);
            }
        } else if let Some(child_element) = ElementRef::wrap(child)
            && !is_hidden(child_element)
            && let Some(owner) = find_text_owner(child_element, pattern)
        {
            return Some(owner);
        }
    }
    None
}

/// Every innermost element owning a visible text node that matches
/// `pattern`, in document order, each once.
pub fn find_text_owners<'a>(element: ElementRef<'a>, pattern: &Regex) -> Vec<ElementRef<'a>> {
    let mut owners = Vec::new();
    collect_owners(element, pattern, &mut owners);
    owners
}

fn collect_owners<'a>(element: ElementRef<'a>, pattern: &Regex, out: &mut Vec<ElementRef<'a>>) {
    let mut owned = false;
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            if !owned && pattern.is_match(text) {
                out.push(element);
                owned = true;
            }
        } else if let Some(child_element) = ElementRef::wrap(child)
            && !is_hidden(child_element)
        {
            collect_owners(child_element, pattern, out);
        }
    }
}

fn collect_blocks(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child)
            && !is_hidden(child_element)
        {
            let block = BLOCK_TAGS.contains(&child_element.value().name());
            if block {
                out.push('\n');
            }
            collect_blocks(child_element, out);
            if block {
                out.push('\n');
            }
        }
    }
}

fn collect_text<'a>(element: ElementRef<'a>, out: &mut Vec<&'a str>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push(text);
        } else if let Some(child_element) = ElementRef::wrap(child)
            && !is_hidden(child_element)
        {
            collect_text(child_element, out);
        }
    }
}

fn is_hidden(element: ElementRef<'_>) -> bool {
    HIDDEN_TAGS.contains(&element.value().name())
}

pub fn starts_with_currency(text: &str) -> bool {
    text.starts_with(CURRENCY_SYMBOLS)
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].trim_end().to_string(),
        None => text.to_string(),
    }
}
