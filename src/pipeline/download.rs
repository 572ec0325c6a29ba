//! Cache refresh: download every job and employer the cache lacks or holds
//! stale.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;
use crate::models::JobSummary;
use crate::pipeline::source::{employer_codes, employers_with_feed_date};
use crate::services::CacheService;

/// Records to download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadPlan {
    pub jobs: Vec<JobSummary>,
    pub employers: Vec<String>,
}

impl DownloadPlan {
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty() && self.employers.is_empty()
    }
}

/// Result of a download batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub downloaded: usize,
    pub failed: usize,
}

/// Plan the downloads for the given feed jobs.
///
/// Employers are listed once, in first-seen order: those stale against
/// their feed date, then those of downloaded jobs that are not cached at all.
pub async fn calculate_downloads(cache: &CacheService<'_>, feed_jobs: &[JobSummary]) -> Result<DownloadPlan> {
    let mut plan = DownloadPlan::default();

    for job in feed_jobs {
        if !cache.is_job_cache_hit(job).await? {
            plan.jobs.push(job.clone());
        }
    }

    let feed_dates = employers_with_feed_date(feed_jobs, &cache.site().datetime_format);
    for code in employer_codes(feed_jobs) {
        let feed_date = feed_dates.get(&code).map(String::as_str);
        if !cache.is_employer_cache_hit(&code, feed_date).await? {
            plan.employers.push(code);
        }
    }

    for code in employer_codes(&plan.jobs) {
        if !plan.employers.contains(&code) && !cache.is_employer_cached(&code).await? {
            plan.employers.push(code);
        }
    }

    log::info!(
        "Downloads: jobs: {} employers: {}",
        plan.jobs.len(),
        plan.employers.len()
    );
    Ok(plan)
}

/// Download job detail pages one by one, pausing `delay` between requests.
pub async fn download_jobs(cache: &CacheService<'_>, jobs: &[JobSummary], delay: Duration) -> DownloadOutcome {
    let mut outcome = DownloadOutcome::default();
    let total = jobs.len();

    for (i, job) in jobs.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(delay).await;
        }
        log::info!("Downloading job {}/{} {}...", i + 1, total, job.code);
        match cache.fetch_job(job).await {
            Ok(_) => outcome.downloaded += 1,
            Err(e) => {
                log::warn!("Failed to download job {}: {}", job.code, e);
                outcome.failed += 1;
            }
        }
    }
    outcome
}

/// Download employers one by one, stamping each with its feed date.
pub async fn download_employers(
    cache: &CacheService<'_>,
    employers: &[String],
    feed_dates: &HashMap<String, String>,
    delay: Duration,
) -> DownloadOutcome {
    let mut outcome = DownloadOutcome::default();
    let total = employers.len();

    for (i, code) in employers.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(delay).await;
        }
        log::info!("Downloading employer {}/{} {}...", i + 1, total, code);
        let stamp = feed_dates.get(code).map(String::as_str);
        match cache.fetch_employer(code, stamp).await {
            Ok(_) => outcome.downloaded += 1,
            Err(e) => {
                log::warn!("Failed to download employer {}: {}", code, e);
                outcome.failed += 1;
            }
        }
    }
    outcome
}

/// Plan, then download unless this is a dry run.
pub async fn run_download(
    cache: &CacheService<'_>,
    feed_jobs: &[JobSummary],
    delay: Duration,
    confirmed: bool,
) -> Result<DownloadPlan> {
    let plan = calculate_downloads(cache, feed_jobs).await?;
    if plan.is_empty() {
        log::info!("Cache is up to date.");
        return Ok(plan);
    }
    if !confirmed {
        log::info!("Dry run, nothing downloaded. Confirm to download.");
        return Ok(plan);
    }

    let jobs = download_jobs(cache, &plan.jobs, delay).await;
    let feed_dates = employers_with_feed_date(feed_jobs, &cache.site().datetime_format);
    let employers = download_employers(cache, &plan.employers, &feed_dates, delay).await;

    log::info!(
        "Downloaded {} jobs ({} failed) and {} employers ({} failed).",
        jobs.downloaded,
        jobs.failed,
        employers.downloaded,
        employers.failed
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::{SiteConfig, fixtures::summary};
    use crate::services::testing::StaticFetcher;
    use crate::services::{Scraper, serve_employer};
    use crate::storage::LocalCache;

    const POST: &str = "2019-08-21 10:03:31 +0700";

    #[tokio::test]
    async fn plans_then_downloads_everything_once() {
        let tmp = TempDir::new().unwrap();
        let store = LocalCache::new(tmp.path());
        let site = SiteConfig::default();
        let fetcher = serve_employer(StaticFetcher::new(), "acme", &[("java-1", POST), ("qa-2", POST)]);
        let cache = CacheService::new(Scraper::new(&fetcher, &site), &store, 24);

        let feed = vec![summary("java-1", "acme", POST), summary("qa-2", "acme", POST)];

        let dry = run_download(&cache, &feed, Duration::ZERO, false).await.unwrap();
        assert_eq!(dry.jobs.len(), 2);
        assert_eq!(dry.employers, vec!["acme"]);
        assert!(fetcher.requests().is_empty());

        run_download(&cache, &feed, Duration::ZERO, true).await.unwrap();
        let employer = cache.cached_employer("acme").await.unwrap();
        assert_eq!(employer.last_post, POST);

        let again = calculate_downloads(&cache, &feed).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn failures_are_counted() {
        let tmp = TempDir::new().unwrap();
        let store = LocalCache::new(tmp.path());
        let site = SiteConfig::default();
        let fetcher = StaticFetcher::new();
        let cache = CacheService::new(Scraper::new(&fetcher, &site), &store, 24);

        let outcome = download_jobs(&cache, &[summary("gone-1", "acme", POST)], Duration::ZERO).await;
        assert_eq!(outcome, DownloadOutcome { downloaded: 0, failed: 1 });
    }
}
