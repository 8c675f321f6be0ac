//! The run-wide record collection and the per-site tier escalation.

use scraper::Html;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::extractor::model::{ProductRecord, RawFieldMap, RecordContext, Tier};
use crate::extractor::normalize_and_validate;
use crate::extractor::profile::SiteProfile;
use crate::extractor::tiers::{generic, heuristic, structured};
use crate::fetcher::FetchedPage;

/// What one page contributed to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOutcome {
    /// Tier that produced the records, `None` when every tier came up empty.
    pub tier: Option<Tier>,
    pub accepted: usize,
}

impl PageOutcome {
    const EMPTY: PageOutcome = PageOutcome {
        tier: None,
        accepted: 0,
    };
}

/// Ordered, append-only collection of accepted records for one run.
#[derive(Debug)]
pub struct ExtractionSession {
    run_id: Uuid,
    records: Vec<ProductRecord>,
    produced: BTreeMap<String, usize>,
}

impl Default for ExtractionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionSession {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            records: Vec::new(),
            produced: BTreeMap::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ProductRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records accepted so far for `site`.
    pub fn count_for(&self, site: &str) -> usize {
        self.produced.get(site).copied().unwrap_or(0)
    }

    pub fn has_produced(&self, site: &str) -> bool {
        self.count_for(site) > 0
    }

    /// Per-site record counts, ordered by site key.
    pub fn summary(&self) -> &BTreeMap<String, usize> {
        &self.produced
    }

    pub fn append(&mut self, record: ProductRecord) {
        *self.produced.entry(record.site.clone()).or_default() += 1;
        self.records.push(record);
    }

    /// Validate one field map and append it. Returns whether it was accepted.
    pub fn accept(
        &mut self,
        profile: &SiteProfile,
        raw: RawFieldMap,
        ctx: &RecordContext<'_>,
    ) -> bool {
        match normalize_and_validate(raw, profile, ctx) {
            Ok(record) => {
                self.append(record);
                true
            }
            Err(rejection) => {
                debug!(
                    site = profile.key,
                    tier = %ctx.tier,
                    index = ctx.index,
                    reason = %rejection,
                    "candidate rejected"
                );
                false
            }
        }
    }

    /// Run the tiers against one fetched page, escalating only while the
    /// previous tier accepted nothing.
    pub fn extract_page(
        &mut self,
        profile: &SiteProfile,
        page: &FetchedPage,
        search_query: Option<&str>,
    ) -> PageOutcome {
        if !page.success {
            warn!(site = profile.key, "fetch reported failure, nothing to extract");
            return PageOutcome::EMPTY;
        }

        let supplied = page.fragments.as_deref().filter(|fragments| !fragments.is_empty());
        if let Some(fragments) = supplied {
            info!(site = profile.key, fragments = fragments.len(), "using supplied fragments");
            let accepted = structured::extract_fragments(self, profile, fragments, search_query);
            if accepted > 0 {
                return outcome(profile, Tier::Structured, accepted);
            }
        }

        let document = Html::parse_document(&page.html);

        if supplied.is_none() {
            let accepted = structured::extract_document(self, profile, &document, search_query);
            if accepted > 0 {
                return outcome(profile, Tier::Structured, accepted);
            }
        }

        let accepted = generic::extract(self, profile, &document, search_query);
        if accepted > 0 {
            return outcome(profile, Tier::Generic, accepted);
        }

        let accepted = heuristic::extract(self, profile, &document, search_query);
        if accepted > 0 {
            return outcome(profile, Tier::HeuristicText, accepted);
        }

        warn!(site = profile.key, "no tier produced records");
        PageOutcome::EMPTY
    }
}

fn outcome(profile: &SiteProfile, tier: Tier, accepted: usize) -> PageOutcome {
    info!(site = profile.key, %tier, accepted, "extracted products");
    PageOutcome {
        tier: Some(tier),
        accepted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::tiers::emergency::placeholder;

    #[test]
    fn test_append_tracks_sites_in_order() {
        let mut session = ExtractionSession::new();
        assert!(session.is_empty());

        session.append(placeholder("<title>a</title>", 1));
        let mut second = placeholder("<title>b</title>", 2);
        second.site = "flipkart".to_string();
        session.append(second);

        assert_eq!(session.len(), 2);
        assert_eq!(session.count_for("emergency"), 1);
        assert!(session.has_produced("flipkart"));
        assert!(!session.has_produced("amazon"));
        assert_eq!(session.records()[1].name, "Emergency Product - b");
        assert_eq!(
            session.summary().keys().collect::<Vec<_>>(),
            vec!["emergency", "flipkart"]
        );
    }

    #[test]
    fn test_each_session_has_its_own_run_id() {
        assert_ne!(ExtractionSession::new().run_id(), ExtractionSession::new().run_id());
    }
}
