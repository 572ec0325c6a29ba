//! Paginated feeds: job pages, review pages and the employers list.
//!
//! Job and review feeds are linked lists of pages; each page carries the
//! url of the next one. A walk ends on the last page or when a page points
//! back at a url already visited.

use std::collections::HashSet;
use std::pin::pin;

use futures::stream::{self, Stream, TryStreamExt};

use crate::error::{AppError, Result};
use crate::models::{EmployerFeedEntry, JobPage, JobSummary, Review, ReviewSummary, SiteConfig};
use crate::parsers::{parse_employer_feed, parse_job_page, parse_job_tags, parse_review_page};
use crate::services::Fetch;

type WalkState = (Option<String>, HashSet<String>);

/// Job feed, optionally narrowed by tags and location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFeed {
    pub tags: Vec<String>,
    pub location: Option<String>,
}

impl JobFeed {
    pub fn new(tags: Vec<String>, location: Option<String>) -> Self {
        Self { tags, location }
    }

    /// First page url: `{jobs_url}[/{tag-tag}][/{location}]`.
    pub fn url(&self, site: &SiteConfig) -> String {
        let mut url = site.jobs_url.trim_end_matches('/').to_string();
        if !self.tags.is_empty() {
            url.push('/');
            url.push_str(&self.tags.join("-"));
        }
        if let Some(location) = self.location.as_deref().filter(|l| !l.is_empty()) {
            url.push('/');
            url.push_str(location);
        }
        url
    }

    /// Stream of feed pages, fetched lazily.
    pub fn pages<'a>(
        &self,
        fetcher: &'a dyn Fetch,
        site: &SiteConfig,
    ) -> impl Stream<Item = Result<JobPage>> + 'a {
        let init: WalkState = (Some(self.url(site)), HashSet::new());

        stream::try_unfold(init, move |(next, mut visited)| async move {
            let Some(url) = next else {
                return Ok::<Option<(JobPage, WalkState)>, AppError>(None);
            };
            if !visited.insert(url.clone()) {
                log::warn!("Job feed points back to {}, stopping", url);
                return Ok(None);
            }

            let body = fetcher.get_text(&url).await?;
            let page = parse_job_page(&url, &body)?;
            log::debug!("Job feed page {} (next: {:?})", page.url, page.next);

            let next = page.next.clone();
            Ok(Some((page, (next, visited))))
        })
    }

    /// Every job tag of every page, in feed order.
    pub async fn job_tags(&self, fetcher: &dyn Fetch, site: &SiteConfig) -> Result<Vec<JobSummary>> {
        self.job_tags_limited(fetcher, site, None).await
    }

    /// Like [`JobFeed::job_tags`] but reads at most `max_pages` pages.
    pub async fn job_tags_limited(
        &self,
        fetcher: &dyn Fetch,
        site: &SiteConfig,
        max_pages: Option<usize>,
    ) -> Result<Vec<JobSummary>> {
        let mut pages = pin!(self.pages(fetcher, site));
        let mut jobs = Vec::new();
        let mut count = 0;

        while let Some(page) = pages.try_next().await? {
            jobs.extend(parse_job_tags(&page.jobs_html)?);
            count += 1;
            if max_pages.is_some_and(|max| count >= max) {
                break;
            }
        }

        log::info!("Job feed: {} jobs on {} pages", jobs.len(), count);
        Ok(jobs)
    }
}

/// All reviews of one employer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EmployerReviews {
    /// Count and ratings from the first page
    pub summary: ReviewSummary,
    pub reviews: Vec<Review>,
}

/// Review pages of one employer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewFeed {
    pub code: String,
}

impl ReviewFeed {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    pub fn url(&self, site: &SiteConfig) -> String {
        site.review_url(&self.code)
    }

    /// Walk every review page.
    pub async fn reviews(&self, fetcher: &dyn Fetch, site: &SiteConfig) -> Result<EmployerReviews> {
        let mut visited = HashSet::new();
        let mut next = Some(self.url(site));
        let mut collected: Option<EmployerReviews> = None;

        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                log::warn!("Review feed of {} points back to {}", self.code, url);
                break;
            }

            let body = fetcher.get_text(&url).await?;
            let page = parse_review_page(&url, &body)?;
            next = page.next;

            match collected.as_mut() {
                Some(all) => all.reviews.extend(page.reviews),
                None => {
                    collected = Some(EmployerReviews {
                        summary: page.summary,
                        reviews: page.reviews,
                    })
                }
            }
        }

        Ok(collected.unwrap_or_default())
    }
}

/// The employers JSON list, fetched once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployerFeed {
    entries: Vec<EmployerFeedEntry>,
}

impl EmployerFeed {
    pub async fn fetch(fetcher: &dyn Fetch, site: &SiteConfig) -> Result<Self> {
        let body = fetcher.get_text(&site.employers_json_url).await?;
        let entries = parse_employer_feed(&body)?;
        log::info!("Employers feed: {} employers", entries.len());
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmployerFeedEntry> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<EmployerFeedEntry> {
        self.entries
    }
}
