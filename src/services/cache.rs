//! Freshness-aware access to the record cache.

use chrono::Duration;

use crate::error::{AppError, Result};
use crate::models::{EmployerRecord, JobRecord, JobSummary, SiteConfig};
use crate::services::{Fetch, Scraper};
use crate::storage::RecordCache;
use crate::utils::time::is_fresh;

/// Record cache in front of the scraper.
pub struct CacheService<'a> {
    scraper: Scraper<'a>,
    store: &'a dyn RecordCache,
    freshness: Duration,
}

impl<'a> CacheService<'a> {
    pub fn new(scraper: Scraper<'a>, store: &'a dyn RecordCache, freshness_hours: u32) -> Self {
        Self {
            scraper,
            store,
            freshness: Duration::hours(i64::from(freshness_hours)),
        }
    }

    pub fn store(&self) -> &'a dyn RecordCache {
        self.store
    }

    pub fn site(&self) -> &'a SiteConfig {
        self.scraper.site()
    }

    pub fn fetcher(&self) -> &'a dyn Fetch {
        self.scraper.fetcher()
    }

    fn format(&self) -> &str {
        &self.scraper.site().datetime_format
    }

    /// Cached copy exists and is fresh against the feed's `last_post`.
    pub async fn is_job_cache_hit(&self, summary: &JobSummary) -> Result<bool> {
        Ok(match self.store.get_job(&summary.code).await? {
            Some(cached) => is_fresh(cached.last_post(), &summary.last_post, self.format(), self.freshness),
            None => false,
        })
    }

    /// Cached copy exists and is fresh against `feed_last_post`; without a
    /// feed date any cached copy counts.
    pub async fn is_employer_cache_hit(&self, code: &str, feed_last_post: Option<&str>) -> Result<bool> {
        let Some(cached) = self.store.get_employer(code).await? else {
            return Ok(false);
        };
        Ok(match feed_last_post {
            Some(live) => is_fresh(&cached.last_post, live, self.format(), self.freshness),
            None => true,
        })
    }

    pub async fn is_employer_cached(&self, code: &str) -> Result<bool> {
        Ok(self.store.get_employer(code).await?.is_some())
    }

    /// Fetch the job's detail page and cache the merged record.
    pub async fn fetch_job(&self, summary: &JobSummary) -> Result<JobRecord> {
        let job = self.scraper.job(summary).await?;
        self.store.save_job(&job).await?;
        Ok(job)
    }

    /// Fetch the employer with its reviews and cache it.
    pub async fn fetch_employer(&self, code: &str, last_post: Option<&str>) -> Result<EmployerRecord> {
        let employer = self.scraper.employer(code, last_post).await?;
        self.store.save_employer(&employer).await?;
        Ok(employer)
    }

    /// Cached employer, fetched first when missing.
    pub async fn employer_cache_or_fetch(&self, code: &str) -> Result<EmployerRecord> {
        match self.store.get_employer(code).await? {
            Some(employer) => Ok(employer),
            None => {
                log::info!("Employer {} not cached, fetching", code);
                self.fetch_employer(code, None).await
            }
        }
    }

    /// Cached job, fetched first when missing.
    pub async fn job_cache_or_fetch(&self, summary: &JobSummary) -> Result<JobRecord> {
        match self.store.get_job(&summary.code).await? {
            Some(job) => Ok(job),
            None => self.fetch_job(summary).await,
        }
    }

    /// Cached job by code.
    pub async fn cached_job(&self, code: &str) -> Result<JobRecord> {
        self.store
            .get_job(code)
            .await?
            .ok_or_else(|| AppError::not_found(format!("cached job '{code}'")))
    }

    /// Cached employer by code.
    pub async fn cached_employer(&self, code: &str) -> Result<EmployerRecord> {
        self.store
            .get_employer(code)
            .await?
            .ok_or_else(|| AppError::not_found(format!("cached employer '{code}'")))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::{JobDetail, fixtures};
    use crate::services::scraper::testing::serve_employer;
    use crate::services::testing::StaticFetcher;
    use crate::storage::LocalCache;

    const DAY_ONE: &str = "2019-08-21 10:03:31 +0700";

    #[tokio::test]
    async fn job_cache_hit_within_window() {
        let tmp = TempDir::new().unwrap();
        let store = LocalCache::new(tmp.path());
        let site = SiteConfig::default();
        let fetcher = StaticFetcher::new();
        let cache = CacheService::new(Scraper::new(&fetcher, &site), &store, 24);

        let summary = fixtures::summary("java-1", "acme", DAY_ONE);
        assert!(!cache.is_job_cache_hit(&summary).await.unwrap());

        store
            .save_job(&JobRecord::new(summary.clone(), JobDetail::default()))
            .await
            .unwrap();
        assert!(cache.is_job_cache_hit(&summary).await.unwrap());

        let next_day = fixtures::summary("java-1", "acme", "2019-08-22 10:03:31 +0700");
        assert!(cache.is_job_cache_hit(&next_day).await.unwrap());

        let later = fixtures::summary("java-1", "acme", "2019-08-22 10:03:32 +0700");
        assert!(!cache.is_job_cache_hit(&later).await.unwrap());

        let earlier = fixtures::summary("java-1", "acme", "2019-08-01 00:00:00 +0700");
        assert!(cache.is_job_cache_hit(&earlier).await.unwrap());
    }

    #[tokio::test]
    async fn employer_cache_hit() {
        let tmp = TempDir::new().unwrap();
        let store = LocalCache::new(tmp.path());
        let site = SiteConfig::default();
        let fetcher = serve_employer(StaticFetcher::new(), "acme", &[("java-1", DAY_ONE)]);
        let cache = CacheService::new(Scraper::new(&fetcher, &site), &store, 24);

        assert!(!cache.is_employer_cache_hit("acme", None).await.unwrap());

        let employer = cache.employer_cache_or_fetch("acme").await.unwrap();
        assert_eq!(employer.last_post, DAY_ONE);
        assert!(cache.is_employer_cache_hit("acme", None).await.unwrap());
        assert!(cache.is_employer_cache_hit("acme", Some(DAY_ONE)).await.unwrap());
        assert!(
            !cache
                .is_employer_cache_hit("acme", Some("2019-08-30 00:00:00 +0700"))
                .await
                .unwrap()
        );

        let requests = fetcher.requests().len();
        cache.employer_cache_or_fetch("acme").await.unwrap();
        assert_eq!(fetcher.requests().len(), requests);
    }

    #[tokio::test]
    async fn fetch_job_saves_record() {
        let tmp = TempDir::new().unwrap();
        let store = LocalCache::new(tmp.path());
        let site = SiteConfig::default();
        let fetcher = serve_employer(StaticFetcher::new(), "acme", &[("java-1", DAY_ONE)]);
        let cache = CacheService::new(Scraper::new(&fetcher, &site), &store, 24);

        let summary = fixtures::summary("java-1", "acme", DAY_ONE);
        cache.fetch_job(&summary).await.unwrap();
        assert_eq!(cache.cached_job("java-1").await.unwrap().summary, summary);
        assert!(matches!(
            cache.cached_job("nope").await,
            Err(AppError::NotFound(_))
        ));
    }
}
