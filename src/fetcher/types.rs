use chrono::{DateTime, Utc};
use std::time::Duration;
use url::Url;

/// One page to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: Url,
    /// How long a rendering fetcher should let the page settle.
    pub render_wait: Duration,
    /// CSS query isolating candidate product fragments, if the caller wants
    /// the fetcher to isolate them.
    pub candidate_query: Option<String>,
}

impl FetchRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            render_wait: Duration::ZERO,
            candidate_query: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: Url,
    /// `false` when the fetcher reached the page but got nothing usable.
    pub success: bool,
    pub html: String,
    /// Serialized candidate fragments, when the fetcher isolated them.
    pub fragments: Option<Vec<String>>,
    /// Name of the encoding the body was decoded from.
    pub encoding: &'static str,
    pub fetched_at: DateTime<Utc>,
}

impl FetchedPage {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            success: true,
            html: html.into(),
            fragments: None,
            encoding: encoding_rs::UTF_8.name(),
            fetched_at: Utc::now(),
        }
    }

    pub fn with_fragments(mut self, fragments: Vec<String>) -> Self {
        self.fragments = Some(fragments);
        self
    }

    pub fn failed(url: Url) -> Self {
        Self {
            success: false,
            ..Self::new(url, String::new())
        }
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.as_ref().map_or(0, Vec::len)
    }
}
