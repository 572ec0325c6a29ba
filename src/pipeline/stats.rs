//! Feed statistics and the database update backlog.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Duration;
use serde::Serialize;

use crate::db::Database;
use crate::error::Result;
use crate::models::{JobSummary, MAIN_CITIES};
use crate::utils::time::parse_datetime;

const OTHERS: &str = "Others";

/// Counts over a job feed snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    pub jobs: usize,
    pub employers: usize,
    pub tags: BTreeMap<String, usize>,
    /// Jobs per main city, then "Others" for jobs in none of them
    pub locations: Vec<(String, usize)>,
    /// Number of offers -> number of employers with that many
    pub employers_by_offers: BTreeMap<usize, usize>,
}

impl FeedStats {
    pub fn compute(jobs: &[JobSummary]) -> Self {
        let mut per_employer: HashMap<&str, usize> = HashMap::new();
        let mut tags: BTreeMap<String, usize> = BTreeMap::new();
        let mut cities = [0usize; MAIN_CITIES.len()];
        let mut others = 0;

        for job in jobs {
            *per_employer.entry(job.employer_code.as_str()).or_default() += 1;
            for tag in &job.tags {
                *tags.entry(tag.clone()).or_default() += 1;
            }

            let mut in_main_city = false;
            for (i, city) in MAIN_CITIES.iter().enumerate() {
                if job.addresses.iter().any(|a| a == city) {
                    cities[i] += 1;
                    in_main_city = true;
                }
            }
            if !in_main_city {
                others += 1;
            }
        }

        let mut employers_by_offers = BTreeMap::new();
        for count in per_employer.values() {
            *employers_by_offers.entry(*count).or_default() += 1;
        }

        let mut locations: Vec<(String, usize)> = MAIN_CITIES
            .iter()
            .zip(cities)
            .map(|(city, count)| (city.to_string(), count))
            .collect();
        locations.push((OTHERS.to_string(), others));

        Self {
            jobs: jobs.len(),
            employers: per_employer.len(),
            tags,
            locations,
            employers_by_offers,
        }
    }

    pub fn log(&self) {
        log::info!("Found {} jobs on {} employers.", self.jobs, self.employers);
        log::info!("Found {} tags.", self.tags.len());
        for (location, count) in &self.locations {
            log::info!("Found {} jobs in {}.", count, location);
        }
        for (offers, employers) in &self.employers_by_offers {
            log::info!("Found {} employers with {} offers.", employers, offers);
        }
    }
}

/// Feed jobs whose database copy differs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateBacklog {
    pub jobs: usize,
    pub employers: usize,
    /// `(hours, percent)`: share of deltas larger than `hours`, for 1..=23
    pub distribution: Vec<(i64, f64)>,
}

impl UpdateBacklog {
    pub fn log(&self) {
        log::info!(
            "To be updated: {} jobs from {} employers.",
            self.jobs,
            self.employers
        );
        for (hours, percent) in &self.distribution {
            log::info!("{} % of deltas differ more than {} hours", percent, hours);
        }
    }
}

/// Jobs missing from the database or with another `last_post`, and how far
/// the installed jobs lag behind the feed.
pub async fn to_be_updated(db: &Database, feed_jobs: &[JobSummary], format: &str) -> Result<UpdateBacklog> {
    let installed = db.job_last_posts().await?;

    let mut pending = Vec::new();
    let mut deltas = Vec::new();
    for job in feed_jobs {
        if let Some(db_post) = installed.get(&job.code) {
            match (parse_datetime(&job.last_post, format), parse_datetime(db_post, format)) {
                (Ok(new), Ok(old)) => deltas.push(new - old),
                _ => log::debug!("Unparseable last post for job {}", job.code),
            }
            if db_post == &job.last_post {
                continue;
            }
        }
        pending.push(job);
    }

    let employers: HashSet<&str> = pending.iter().map(|j| j.employer_code.as_str()).collect();
    Ok(UpdateBacklog {
        jobs: pending.len(),
        employers: employers.len(),
        distribution: delta_distribution(&deltas),
    })
}

/// For each hour 1..=23, percent of `deltas` exceeding it.
pub fn delta_distribution(deltas: &[Duration]) -> Vec<(i64, f64)> {
    (1..=23)
        .map(|hours| {
            if deltas.is_empty() {
                return (hours, 0.0);
            }
            let limit = Duration::hours(hours);
            let count = deltas.iter().filter(|d| **d > limit).count();
            let percent = count as f64 * 100.0 / deltas.len() as f64;
            (hours, (percent * 100.0).round() / 100.0)
        })
        .collect()
}
