//! Read queries for browsing and planning.

use std::collections::HashMap;

use serde::Serialize;

use super::Database;
use super::rows::{EmployerRow, JOB_COLUMNS, JobRow};
use crate::error::Result;
use crate::models::MAIN_CITIES;

/// Row count of every table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub employers: i64,
    pub jobs: i64,
    pub tags: i64,
    pub addresses: i64,
    pub reviews: i64,
}

/// Jobs carrying a tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagCount {
    pub name: String,
    pub jobs: i64,
    /// Share of all jobs, rounded to two decimals
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct EmployerJobCount {
    pub code: String,
    pub name: String,
    pub jobs: i64,
}

/// A job with its tag and address names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobView {
    #[serde(flatten)]
    pub job: JobRow,
    pub tags: Vec<String>,
    pub addresses: Vec<String>,
}

impl Database {
    pub async fn counts(&self) -> Result<TableCounts> {
        Ok(TableCounts {
            employers: self.count("employer").await?,
            jobs: self.count("job").await?,
            tags: self.count("tag").await?,
            addresses: self.count("address").await?,
            reviews: self.count("review").await?,
        })
    }

    async fn count(&self, table: &'static str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        Ok(sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(self.pool())
            .await?)
    }

    /// Most recently inserted jobs.
    pub async fn latest_jobs(&self, limit: i64) -> Result<Vec<JobRow>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM job ORDER BY job.id DESC LIMIT ?");
        Ok(sqlx::query_as::<_, JobRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool())
            .await?)
    }

    pub async fn job_by_code(&self, code: &str) -> Result<Option<JobView>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM job WHERE job.code = ?");
        let Some(job) = sqlx::query_as::<_, JobRow>(&sql)
            .bind(code)
            .fetch_optional(self.pool())
            .await?
        else {
            return Ok(None);
        };

        let tags = sqlx::query_scalar::<_, String>(
            "SELECT tag.name FROM tag JOIN job_tag ON job_tag.tag_id = tag.id \
             WHERE job_tag.job_id = ? ORDER BY tag.name",
        )
        .bind(job.id)
        .fetch_all(self.pool())
        .await?;

        let addresses = sqlx::query_scalar::<_, String>(
            "SELECT address.full_address FROM address \
             JOIN job_address ON job_address.address_id = address.id \
             WHERE job_address.job_id = ? ORDER BY address.full_address",
        )
        .bind(job.id)
        .fetch_all(self.pool())
        .await?;

        Ok(Some(JobView {
            job,
            tags,
            addresses,
        }))
    }

    pub async fn employer_by_code(&self, code: &str) -> Result<Option<EmployerRow>> {
        Ok(sqlx::query_as::<_, EmployerRow>("SELECT * FROM employer WHERE code = ?")
            .bind(code)
            .fetch_optional(self.pool())
            .await?)
    }

    /// Jobs with an address in `city`, newest first.
    pub async fn jobs_in_city(&self, city: &str, limit: i64) -> Result<Vec<JobRow>> {
        let sql = format!(
            "SELECT DISTINCT {JOB_COLUMNS} FROM job \
             JOIN job_address ON job_address.job_id = job.id \
             JOIN address ON address.id = job_address.address_id \
             WHERE address.city = ? ORDER BY job.id DESC LIMIT ?"
        );
        Ok(sqlx::query_as::<_, JobRow>(&sql)
            .bind(city)
            .bind(limit)
            .fetch_all(self.pool())
            .await?)
    }

    /// Jobs with no address in any of the main cities.
    pub async fn other_jobs(&self, limit: i64) -> Result<Vec<JobRow>> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM job WHERE job.id NOT IN ( \
                SELECT job_address.job_id FROM job_address \
                JOIN address ON address.id = job_address.address_id \
                WHERE address.city IN (?, ?, ?)) \
             ORDER BY job.id DESC LIMIT ?"
        );
        let [first, second, third] = MAIN_CITIES;
        Ok(sqlx::query_as::<_, JobRow>(&sql)
            .bind(first)
            .bind(second)
            .bind(third)
            .bind(limit)
            .fetch_all(self.pool())
            .await?)
    }

    /// Tags by number of jobs, most used first. Unused tags are left out.
    pub async fn tag_counts(&self) -> Result<Vec<TagCount>> {
        let total = self.count("job").await?;
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT tag.name, COUNT(job_tag.job_id) AS jobs FROM tag \
             JOIN job_tag ON job_tag.tag_id = tag.id \
             GROUP BY tag.id ORDER BY jobs DESC, tag.name",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, jobs)| TagCount {
                name,
                jobs,
                percent: percent(jobs, total),
            })
            .collect())
    }

    /// Employers by number of jobs in the database, most first.
    pub async fn employers_by_job_count(&self) -> Result<Vec<EmployerJobCount>> {
        Ok(sqlx::query_as::<_, EmployerJobCount>(
            "SELECT employer.code AS code, employer.name AS name, COUNT(job.id) AS jobs \
             FROM employer LEFT JOIN job ON job.employer_code = employer.code \
             GROUP BY employer.id ORDER BY jobs DESC, employer.code",
        )
        .fetch_all(self.pool())
        .await?)
    }

    /// Distinct city names, without "District ..." entries.
    pub async fn locations(&self) -> Result<Vec<String>> {
        let cities = sqlx::query_scalar::<_, String>("SELECT DISTINCT city FROM address ORDER BY city")
            .fetch_all(self.pool())
            .await?;
        Ok(cities
            .into_iter()
            .filter(|city| !city.starts_with("District "))
            .collect())
    }

    /// `code -> last_post` of every job.
    pub async fn job_last_posts(&self) -> Result<HashMap<String, String>> {
        let rows = sqlx::query_as::<_, (String, String)>("SELECT code, last_post FROM job")
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().collect())
    }

    /// `code -> last_post` of every employer.
    pub async fn employer_last_posts(&self) -> Result<HashMap<String, String>> {
        let rows = sqlx::query_as::<_, (String, String)>("SELECT code, last_post FROM employer")
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().collect())
    }
}

fn percent(part: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let value = part as f64 / total as f64 * 100.0;
    (value * 100.0).round() / 100.0
}
