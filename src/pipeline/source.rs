//! Feed snapshots.
//!
//! The job feed and the employers list are fetched whole and stored as
//! `jobs.json` and `employers.json`; later stages plan against them.

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::models::{EmployerFeedEntry, JobSummary, newest_post};
use crate::services::{CacheService, EmployerFeed, JobFeed};

/// Walk the job feed and store every summary.
pub async fn fetch_jobs(cache: &CacheService<'_>) -> Result<Vec<JobSummary>> {
    let jobs = JobFeed::default()
        .job_tags(cache.fetcher(), cache.site())
        .await?;
    cache.store().save_job_feed(&jobs).await?;
    log::info!("Found {} jobs.", jobs.len());
    Ok(jobs)
}

/// Fetch the employers list and store it.
pub async fn fetch_employers(cache: &CacheService<'_>) -> Result<Vec<EmployerFeedEntry>> {
    let feed = EmployerFeed::fetch(cache.fetcher(), cache.site()).await?;
    let entries = feed.into_entries();
    cache.store().save_employer_feed(&entries).await?;
    log::info!("Found {} employers.", entries.len());
    Ok(entries)
}

/// Refresh both snapshots. Returns `(employers, jobs)` counts.
pub async fn fetch_all(cache: &CacheService<'_>) -> Result<(usize, usize)> {
    let employers = fetch_employers(cache).await?.len();
    let jobs = fetch_jobs(cache).await?.len();
    Ok((employers, jobs))
}

/// Stored job feed snapshot, fetched first when there is none.
pub async fn feed_jobs(cache: &CacheService<'_>) -> Result<Vec<JobSummary>> {
    match cache.store().load_job_feed().await? {
        Some(jobs) => Ok(jobs),
        None => {
            log::info!("No job feed snapshot, fetching the feed");
            fetch_jobs(cache).await
        }
    }
}

/// Employer code mapped to the newest `last_post` among its feed jobs.
pub fn employers_with_feed_date(jobs: &[JobSummary], format: &str) -> HashMap<String, String> {
    let mut posts: HashMap<&str, Vec<&str>> = HashMap::new();
    for job in jobs {
        posts
            .entry(job.employer_code.as_str())
            .or_default()
            .push(job.last_post.as_str());
    }

    posts
        .into_iter()
        .filter_map(|(code, posts)| {
            newest_post(posts.into_iter(), format).map(|post| (code.to_string(), post.to_string()))
        })
        .collect()
}

/// Employer codes in first-seen order.
pub fn employer_codes(jobs: &[JobSummary]) -> Vec<String> {
    let mut seen = HashSet::new();
    jobs.iter()
        .filter(|job| seen.insert(job.employer_code.as_str()))
        .map(|job| job.employer_code.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::{SiteConfig, fixtures::summary};
    use crate::parsers::fixtures::{job_page, job_tag};
    use crate::services::Scraper;
    use crate::services::testing::StaticFetcher;
    use crate::storage::{LocalCache, RecordCache};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

    #[test]
    fn newest_post_per_employer() {
        let jobs = vec![
            summary("a", "acme", "2019-08-20 10:00:00 +0700"),
            summary("b", "acme", "2019-08-21 10:00:00 +0700"),
            summary("c", "globex", "2019-08-19 10:00:00 +0700"),
        ];
        let dates = employers_with_feed_date(&jobs, FORMAT);
        assert_eq!(dates.len(), 2);
        assert_eq!(dates["acme"], "2019-08-21 10:00:00 +0700");
        assert_eq!(dates["globex"], "2019-08-19 10:00:00 +0700");

        assert_eq!(employer_codes(&jobs), vec!["acme", "globex"]);
    }

    #[tokio::test]
    async fn fetch_all_writes_snapshots() {
        let tmp = TempDir::new().unwrap();
        let store = LocalCache::new(tmp.path());
        let site = SiteConfig::default();
        let fetcher = StaticFetcher::new()
            .with(
                "https://itviec.com/it-jobs",
                job_page(&job_tag("a-1", "acme", "2019-08-21 10:03:31 +0700"), None),
            )
            .with("https://itviec.com/api/v1/employers.json", r#"[["acme"]]"#);
        let cache = CacheService::new(Scraper::new(&fetcher, &site), &store, 24);

        assert_eq!(fetch_all(&cache).await.unwrap(), (1, 1));
        assert!(tmp.path().join("jobs.json").exists());
        assert_eq!(store.load_employer_feed().await.unwrap().unwrap()[0].code, "acme");

        let requests = fetcher.requests().len();
        assert_eq!(feed_jobs(&cache).await.unwrap().len(), 1);
        assert_eq!(fetcher.requests().len(), requests);
    }
}
