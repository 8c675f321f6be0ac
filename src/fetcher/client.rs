use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder, header};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::fetcher::pipeline::{decode_body, isolate_fragments};
use crate::fetcher::{FetchError, FetchRequest, FetchedPage, PageFetcher};

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .default_headers({
            let mut headers = header::HeaderMap::new();
            headers.insert(
                header::ACCEPT,
                header::HeaderValue::from_static(
                    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                ),
            );
            headers.insert(
                header::ACCEPT_LANGUAGE,
                header::HeaderValue::from_static("en-IN,en;q=0.9"),
            );
            headers
        })
        .build()
        .expect("Failed to build HTTP client")
});

pub fn get_client() -> &'static Client {
    &HTTP_CLIENT
}

/// Plain HTTP fetcher. It does not execute scripts; the render wait only
/// widens the request timeout.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
    max_body_size: u64,
}

impl Default for HttpPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpPageFetcher {
    pub fn new() -> Self {
        Self::with_client(get_client().clone())
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            max_body_size: MAX_BODY_SIZE,
        }
    }

    pub fn max_body_size(mut self, bytes: u64) -> Self {
        self.max_body_size = bytes;
        self
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    #[instrument(skip_all, fields(url = %request.url))]
    async fn fetch_page(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(request.url.clone())
            .timeout(REQUEST_TIMEOUT + request.render_wait)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        // Check content length before downloading
        if let Some(content_length) = response.content_length()
            && content_length > self.max_body_size
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let final_url = response.url().clone();
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("text/html")
            .to_string();
        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        // Check body size after download (in case Content-Length was missing)
        if body.len() as u64 > self.max_body_size {
            return Err(FetchError::BodyTooLarge(body.len() as u64));
        }

        let (html, encoding) = decode_body(&content_type, &body);
        let fragments = match request.candidate_query.as_deref() {
            Some(query) => isolate_fragments(&html, query)?,
            None => None,
        };
        debug!(
            status = status.as_u16(),
            bytes = body.len(),
            encoding = encoding.name(),
            fragments = fragments.as_ref().map_or(0, Vec::len),
            "fetched page"
        );

        let mut page = FetchedPage::new(final_url, html);
        page.success = !page.html.trim().is_empty();
        page.fragments = fragments;
        page.encoding = encoding.name();
        Ok(page)
    }
}
