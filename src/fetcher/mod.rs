pub mod client;
pub mod errors;
pub mod pipeline;
pub mod types;

use async_trait::async_trait;

pub use client::{HttpPageFetcher, get_client};
pub use errors::FetchError;
pub use types::{FetchRequest, FetchedPage};

/// Anything that can turn a URL into page HTML.
///
/// Both `Err` and a page with `success == false` mean "nothing to extract
/// from this attempt"; neither is fatal to a run.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError>;
}
