//! Drives a scraping run: sites one at a time, a bounded retry loop per site,
//! and the emergency pass when nothing at all was collected.

pub mod backoff;

pub use backoff::Backoff;

use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};
use url::Url;

use crate::config::{Config, SiteSelection};
use crate::extractor::tiers::emergency;
use crate::extractor::{ExtractionSession, ProfileError, ProfileRegistry, SiteProfile};
use crate::fetcher::{FetchRequest, PageFetcher};

/// Retry and pacing knobs for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub backoff: Backoff,
    /// Pause between two sites.
    pub site_delay: Duration,
    pub render_wait: Duration,
    /// Pages tried in order by the emergency pass.
    pub emergency_urls: Vec<Url>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(3),
            backoff: Backoff::Fixed,
            site_delay: Duration::from_secs(2),
            render_wait: Duration::from_secs(5),
            emergency_urls: default_emergency_urls(),
        }
    }
}

impl From<&Config> for RunConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_attempts: config.max_attempts(),
            retry_delay: config.retry_delay(),
            backoff: config.backoff(),
            site_delay: config.site_delay(),
            render_wait: config.render_wait(),
            emergency_urls: default_emergency_urls(),
        }
    }
}

fn default_emergency_urls() -> Vec<Url> {
    emergency::FALLBACK_URLS
        .iter()
        .filter_map(|url| Url::parse(url).ok())
        .collect()
}

/// One site to scrape: its profile, the URL to fetch and the query recorded
/// on every record.
#[derive(Debug, Clone)]
pub struct SiteJob {
    pub profile: Arc<SiteProfile>,
    pub url: Url,
    pub search_query: String,
}

impl SiteJob {
    /// A custom query rewrites the profile's search URL; without one the
    /// profile's default URL and query are used.
    pub fn resolve(
        registry: &ProfileRegistry,
        selection: &SiteSelection,
    ) -> Result<Self, ProfileError> {
        let profile = registry.get(&selection.site)?;
        let (url, search_query) = match selection.query.as_deref() {
            Some(query) => (profile.search_url(query), query.to_string()),
            None => (profile.default_url.clone(), profile.default_query.to_string()),
        };
        Ok(Self {
            profile,
            url,
            search_query,
        })
    }
}

pub struct Runner<F> {
    fetcher: F,
    config: RunConfig,
    shutdown_token: CancellationToken,
}

impl<F: PageFetcher> Runner<F> {
    pub fn new(fetcher: F, config: RunConfig) -> Self {
        Self {
            fetcher,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Stop between attempts and sites once `token` is cancelled.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown_token = token;
        self
    }

    /// Scrape every job in order. Whatever was collected before a shutdown
    /// is kept.
    pub async fn run(&self, jobs: &[SiteJob]) -> ExtractionSession {
        let mut session = ExtractionSession::new();
        info!(
            run_id = %session.run_id(),
            sites = jobs.len(),
            max_attempts = self.config.max_attempts,
            backoff = %self.config.backoff,
            "starting run"
        );

        for (position, job) in jobs.iter().enumerate() {
            if self.shutdown_token.is_cancelled() {
                break;
            }

            let span = info_span!("site", site = job.profile.key, run_id = %session.run_id());
            self.run_site(&mut session, job).instrument(span).await;

            if position + 1 < jobs.len() && !self.pause(self.config.site_delay).await {
                break;
            }
        }

        if self.shutdown_token.is_cancelled() {
            warn!(records = session.len(), "run interrupted by shutdown");
        } else if session.is_empty() {
            emergency::run(
                &mut session,
                &self.fetcher,
                &self.config.emergency_urls,
                self.config.render_wait,
            )
            .await;
        }

        info!(records = session.len(), "run finished");
        session
    }

    /// Fetch and extract one site until it yields records or the attempts
    /// run out. Returns the number of records accepted.
    pub async fn run_site(&self, session: &mut ExtractionSession, job: &SiteJob) -> usize {
        let max_attempts = self.config.max_attempts.max(1);
        let request = FetchRequest {
            url: job.url.clone(),
            render_wait: self.config.render_wait,
            candidate_query: Some(job.profile.candidate_query.to_string()),
        };
        info!(
            display_name = job.profile.display_name,
            url = %job.url,
            query = %job.search_query,
            "scraping site"
        );

        for attempt in 0..max_attempts {
            info!(attempt = attempt + 1, max_attempts, "fetching");

            match self.fetcher.fetch_page(&request).await {
                Ok(page) => {
                    let outcome = session.extract_page(&job.profile, &page, Some(&job.search_query));
                    if outcome.accepted > 0 {
                        return outcome.accepted;
                    }
                    warn!(attempt = attempt + 1, "no products found");
                }
                Err(e) if !e.should_retry() => {
                    warn!(error = %e, "fetch failed permanently, skipping site");
                    return 0;
                }
                Err(e) => {
                    warn!(attempt = attempt + 1, error = %e, "fetch failed");
                }
            }

            if attempt + 1 < max_attempts {
                let delay = self.config.backoff.delay(attempt, self.config.retry_delay);
                if !self.pause(delay).await {
                    return 0;
                }
            }
        }

        warn!(max_attempts, "giving up on site");
        0
    }

    /// Sleep unless shut down first. Returns `false` on shutdown.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.shutdown_token.cancelled() => false,
            _ = sleep(duration) => true,
        }
    }
}

/// Cancel `token` on ctrl-c.
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Received shutdown signal, stopping after the current attempt...");
        token.cancel();
    });
}
