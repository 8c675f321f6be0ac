//! Greedy first-match field resolution over a [`SelectorSpec`].
//!
//! Expressions are evaluated strictly in order and evaluation stops at the
//! first one that produces non-empty text; nothing is retried or scored.

use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

use crate::extractor::selector::{SelectorExpr, SelectorSpec};
use crate::extractor::text::{find_text_owner, find_text_owners, visible_text};

/// Attributes that may carry an image location, in preference order.
const IMAGE_ATTRS: [&str; 3] = ["src", "data-src", "data-lazy-src"];

static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());

/// Anything that can be asked for the text of one field inside a fragment.
pub trait FieldQuery {
    /// The element this query lands on, if any.
    fn locate<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>>;

    /// Trimmed visible text of the located element; `None` when empty.
    fn evaluate(&self, scope: ElementRef<'_>) -> Option<String> {
        let text = visible_text(self.locate(scope)?);
        (!text.is_empty()).then_some(text)
    }
}

impl FieldQuery for SelectorExpr {
    fn locate<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        match self {
            SelectorExpr::Structural(selector) => scope.select(selector).next(),
            SelectorExpr::Contains(pattern) => find_text_owner(scope, pattern),
        }
    }
}

/// First non-empty text yielded by `queries`, in order.
pub fn resolve<Q: FieldQuery>(scope: ElementRef<'_>, queries: &[Q]) -> Option<String> {
    queries.iter().find_map(|query| query.evaluate(scope))
}

impl SelectorSpec {
    pub fn resolve(&self, scope: ElementRef<'_>) -> Option<String> {
        resolve(scope, self.exprs())
    }

    /// Every distinct non-empty text across all expressions, in order.
    pub fn resolve_all(&self, scope: ElementRef<'_>) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for expr in self.exprs() {
            let texts: Vec<String> = match expr {
                SelectorExpr::Structural(selector) => {
                    scope.select(selector).map(visible_text).collect()
                }
                SelectorExpr::Contains(pattern) => find_text_owners(scope, pattern)
                    .into_iter()
                    .map(visible_text)
                    .collect(),
            };
            for text in texts {
                if !text.is_empty() && !found.contains(&text) {
                    found.push(text);
                }
            }
        }
        found
    }

    /// First image location reachable through the spec. Structural matches
    /// are read directly; a text match looks for an `img` inside the
    /// enclosing element.
    pub fn resolve_image(&self, scope: ElementRef<'_>) -> Option<String> {
        self.exprs().iter().find_map(|expr| {
            let element = expr.locate(scope)?;
            let image = match expr {
                SelectorExpr::Structural(_) => element,
                SelectorExpr::Contains(_) => element.select(&IMG).next()?,
            };
            IMAGE_ATTRS
                .iter()
                .filter_map(|attr| image.value().attr(attr))
                .map(str::trim)
                .find(|value| !value.is_empty())
                .map(str::to_string)
        })
    }
}

/// Delivery text; the same on every site.
pub static DELIVERY: LazyLock<SelectorSpec> = LazyLock::new(|| {
    SelectorSpec::builder()
        .css(r#"div[class*="delivery"]"#)
        .css(r#"span[class*="delivery"]"#)
        .css(r#"div[class*="shipping"]"#)
        .contains_pattern("delivery|shipping")
        .build()
});

/// Stock / availability text; the same on every site.
pub static AVAILABILITY: LazyLock<SelectorSpec> = LazyLock::new(|| {
    SelectorSpec::builder()
        .css(r#"span[class*="stock"]"#)
        .css(r#"div[class*="availability"]"#)
        .contains_pattern("bought|stock|available")
        .build()
});
