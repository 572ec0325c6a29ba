//! Upgrade the relational store from the cache.
//!
//! Planning compares feed dates with the database by calendar day; a record
//! is up to date when the feed is at most one day ahead.

use std::collections::HashSet;

use crate::db::{Database, UpdateReport};
use crate::error::Result;
use crate::models::{EmployerRecord, JobRecord, JobSummary};
use crate::pipeline::source::{employer_codes, employers_with_feed_date};
use crate::services::CacheService;
use crate::utils::time::day_delta;

const UP_TO_DATE_DAYS: i64 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobUpgrades {
    pub create: Vec<JobSummary>,
    pub update: Vec<JobSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployerUpgrades {
    pub create: Vec<String>,
    pub update: Vec<String>,
}

/// Everything an upgrade would change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradePlan {
    pub jobs: JobUpgrades,
    pub employers: EmployerUpgrades,
}

impl UpgradePlan {
    pub fn is_empty(&self) -> bool {
        self.jobs.create.is_empty()
            && self.jobs.update.is_empty()
            && self.employers.create.is_empty()
            && self.employers.update.is_empty()
    }
}

/// Unparseable dates are never up to date.
fn is_up_to_date(db_post: &str, feed_post: &str, format: &str) -> bool {
    day_delta(db_post, feed_post, format).is_ok_and(|days| days <= UP_TO_DATE_DAYS)
}

/// Split feed jobs into those missing from the database and those behind.
pub async fn calculate_job_upgrades(
    db: &Database,
    feed_jobs: &[JobSummary],
    format: &str,
) -> Result<JobUpgrades> {
    let installed = db.job_last_posts().await?;
    let mut upgrades = JobUpgrades::default();
    let mut up_to_date = 0;

    for job in feed_jobs {
        match installed.get(&job.code) {
            Some(db_post) if is_up_to_date(db_post, &job.last_post, format) => up_to_date += 1,
            Some(_) => upgrades.update.push(job.clone()),
            None => {
                log::debug!("Job '{}' not found in database, needs to be created.", job.code);
                upgrades.create.push(job.clone());
            }
        }
    }

    log::debug!(
        "Job upgrades: update: {}, create: {}, up to date: {}",
        upgrades.update.len(),
        upgrades.create.len(),
        up_to_date
    );
    Ok(upgrades)
}

/// Same per employer, against the newest feed date of its jobs.
pub async fn calculate_employer_upgrades(
    db: &Database,
    feed_jobs: &[JobSummary],
    format: &str,
) -> Result<EmployerUpgrades> {
    let installed = db.employer_last_posts().await?;
    let feed_dates = employers_with_feed_date(feed_jobs, format);
    let mut upgrades = EmployerUpgrades::default();

    for code in employer_codes(feed_jobs) {
        match installed.get(&code) {
            Some(db_post) => {
                let feed_post = feed_dates.get(&code).map(String::as_str).unwrap_or_default();
                if !is_up_to_date(db_post, feed_post, format) {
                    log::debug!("Employer {} is behind the feed ({})", code, feed_post);
                    upgrades.update.push(code);
                }
            }
            None => upgrades.create.push(code),
        }
    }

    log::debug!(
        "Employer upgrades: update: {}, create: {}",
        upgrades.update.len(),
        upgrades.create.len()
    );
    Ok(upgrades)
}

/// Full upgrade plan.
///
/// Employers of new jobs are refreshed in the cache first and always end
/// up in the plan, as updates when installed and creations otherwise.
pub async fn calculate_updates(
    cache: &CacheService<'_>,
    db: &Database,
    feed_jobs: &[JobSummary],
) -> Result<UpgradePlan> {
    let format = &cache.site().datetime_format;
    let jobs = calculate_job_upgrades(db, feed_jobs, format).await?;

    let new_job_employers = employer_codes(&jobs.create);
    if !new_job_employers.is_empty() {
        log::info!("Refreshing cache of employers with new jobs");
        let feed_dates = employers_with_feed_date(feed_jobs, format);
        for code in &new_job_employers {
            let stamp = feed_dates.get(code).map(String::as_str);
            if let Err(e) = cache.fetch_employer(code, stamp).await {
                log::warn!("Failed to refresh employer {}: {}", code, e);
            }
        }
    }

    let mut employers = calculate_employer_upgrades(db, feed_jobs, format).await?;
    for code in new_job_employers {
        let installed = db.employer_by_code(&code).await?.is_some();
        let list = if installed {
            &mut employers.update
        } else {
            &mut employers.create
        };
        if !list.contains(&code) {
            list.push(code);
        }
    }

    let plan = UpgradePlan { jobs, employers };
    if plan.is_empty() {
        log::info!("Done.");
    } else {
        log::info!(
            "Total employer upgrades: updates: {}, new: {}",
            plan.employers.update.len(),
            plan.employers.create.len()
        );
        log::info!(
            "Total job upgrades: updates: {}, new: {}",
            plan.jobs.update.len(),
            plan.jobs.create.len()
        );
    }
    Ok(plan)
}

/// Records of every job the employer lists, fetched when not cached.
async fn job_records(cache: &CacheService<'_>, employer: &EmployerRecord) -> Result<Vec<JobRecord>> {
    let mut jobs = Vec::with_capacity(employer.jobs.len());
    for summary in &employer.jobs {
        jobs.push(cache.job_cache_or_fetch(summary).await?);
    }
    Ok(jobs)
}

/// Install an employer and its jobs from the cache, fetching what is missing.
pub async fn install_employer(cache: &CacheService<'_>, db: &Database, code: &str) -> Result<()> {
    log::info!("Installing employer '{}'...", code);
    let employer = cache.employer_cache_or_fetch(code).await?;
    let jobs = job_records(cache, &employer).await?;
    db.install_employer(&employer, &jobs).await
}

/// Sync an installed employer with its cached record.
pub async fn update_employer(cache: &CacheService<'_>, db: &Database, code: &str) -> Result<UpdateReport> {
    log::info!("Updating employer {}", code);
    let employer = cache.employer_cache_or_fetch(code).await?;
    let jobs = job_records(cache, &employer).await?;
    db.update_employer(&employer, &jobs).await
}

/// Plan, then apply unless this is a dry run.
pub async fn run_upgrade(
    cache: &CacheService<'_>,
    db: &Database,
    feed_jobs: &[JobSummary],
    confirmed: bool,
) -> Result<UpgradePlan> {
    let plan = calculate_updates(cache, db, feed_jobs).await?;
    if plan.is_empty() {
        return Ok(plan);
    }
    if !confirmed {
        log::info!("Dry run, database untouched. Confirm to upgrade.");
        return Ok(plan);
    }

    let mut failures = 0;

    if !plan.employers.create.is_empty() {
        log::info!("Creating new employers...");
        for code in &plan.employers.create {
            if let Err(e) = install_employer(cache, db, code).await {
                log::warn!("Failed to install employer {}: {}", code, e);
                failures += 1;
            }
        }
    }

    let mut updated = HashSet::new();
    if !plan.employers.update.is_empty() {
        log::info!("Updating employers...");
        for code in &plan.employers.update {
            if updated.insert(code.clone()) {
                if let Err(e) = update_employer(cache, db, code).await {
                    log::warn!("Failed to update employer {}: {}", code, e);
                    failures += 1;
                }
            }
        }
    }

    let changed_jobs: Vec<JobSummary> = plan
        .jobs
        .update
        .iter()
        .chain(&plan.jobs.create)
        .cloned()
        .collect();
    if !changed_jobs.is_empty() {
        log::info!("Updating jobs...");
        for code in employer_codes(&changed_jobs) {
            if updated.insert(code.clone()) {
                if let Err(e) = update_employer(cache, db, &code).await {
                    log::warn!("Failed to update employer {}: {}", code, e);
                    failures += 1;
                }
            }
        }
    }

    if failures > 0 {
        log::warn!("Upgrade finished with {} failures", failures);
    } else {
        log::info!("Upgrade finished.");
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::{JobDetail, SiteConfig, fixtures::summary};
    use crate::services::testing::StaticFetcher;
    use crate::services::{Scraper, serve_employer};
    use crate::storage::LocalCache;

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";
    const POST: &str = "2019-08-21 10:03:31 +0700";

    #[test]
    fn up_to_date_within_one_calendar_day() {
        assert!(is_up_to_date(POST, "2019-08-22 23:59:59 +0700", FORMAT));
        assert!(is_up_to_date(POST, "2019-08-01 00:00:00 +0700", FORMAT));
        assert!(!is_up_to_date(POST, "2019-08-23 00:00:00 +0700", FORMAT));
        assert!(!is_up_to_date("", POST, FORMAT));
    }

    #[tokio::test]
    async fn job_upgrades_split_create_and_update() {
        let db = Database::in_memory().await.unwrap();
        db.upsert_job(&JobRecord::new(summary("old-1", "acme", POST), JobDetail::default()))
            .await
            .unwrap();
        db.upsert_job(&JobRecord::new(summary("same-2", "acme", POST), JobDetail::default()))
            .await
            .unwrap();

        let feed = vec![
            summary("old-1", "acme", "2019-08-25 09:00:00 +0700"),
            summary("same-2", "acme", "2019-08-22 09:00:00 +0700"),
            summary("new-3", "acme", POST),
        ];
        let upgrades = calculate_job_upgrades(&db, &feed, FORMAT).await.unwrap();

        let create: Vec<_> = upgrades.create.iter().map(|j| j.code.as_str()).collect();
        let update: Vec<_> = upgrades.update.iter().map(|j| j.code.as_str()).collect();
        assert_eq!(create, vec!["new-3"]);
        assert_eq!(update, vec!["old-1"]);
    }

    #[tokio::test]
    async fn upgrade_installs_then_settles() {
        let tmp = TempDir::new().unwrap();
        let store = LocalCache::new(tmp.path());
        let site = SiteConfig::default();
        let fetcher = serve_employer(StaticFetcher::new(), "acme", &[("java-1", POST), ("qa-2", POST)]);
        let cache = CacheService::new(Scraper::new(&fetcher, &site), &store, 24);
        let db = Database::in_memory().await.unwrap();

        let feed = vec![summary("java-1", "acme", POST), summary("qa-2", "acme", POST)];

        let dry = run_upgrade(&cache, &db, &feed, false).await.unwrap();
        assert_eq!(dry.jobs.create.len(), 2);
        assert_eq!(dry.employers.create, vec!["acme"]);
        assert_eq!(db.counts().await.unwrap().employers, 0);

        run_upgrade(&cache, &db, &feed, true).await.unwrap();
        let counts = db.counts().await.unwrap();
        assert_eq!((counts.employers, counts.jobs, counts.reviews), (1, 2, 2));

        let again = calculate_updates(&cache, &db, &feed).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn new_job_of_installed_employer_updates_it() {
        let tmp = TempDir::new().unwrap();
        let store = LocalCache::new(tmp.path());
        let site = SiteConfig::default();
        let jobs = [("java-1", POST), ("go-3", POST)];
        let fetcher = serve_employer(StaticFetcher::new(), "acme", &jobs);
        let cache = CacheService::new(Scraper::new(&fetcher, &site), &store, 24);
        let db = Database::in_memory().await.unwrap();

        let (employer, records) = crate::db::fixtures::employer("acme", &[("java-1", POST)]);
        db.install_employer(&employer, &records).await.unwrap();

        let feed = vec![summary("java-1", "acme", POST), summary("go-3", "acme", POST)];
        let plan = calculate_updates(&cache, &db, &feed).await.unwrap();
        assert_eq!(plan.employers.update, vec!["acme"]);
        assert!(plan.employers.create.is_empty());

        run_upgrade(&cache, &db, &feed, true).await.unwrap();
        assert!(db.job_by_code("go-3").await.unwrap().is_some());
    }
}
