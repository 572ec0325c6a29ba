//! Table rows.

use serde::Serialize;

/// A row of `job`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct JobRow {
    pub id: i64,
    pub code: String,
    pub site_id: Option<i64>,
    pub title: String,
    pub url: String,
    pub salary: String,
    pub description: String,
    pub reasons: String,
    pub details: String,
    pub skills: String,
    pub why: String,
    pub last_post: String,
    pub employer_code: String,
}

/// A row of `employer`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct EmployerRow {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub url: String,
    pub logo: String,
    pub location: String,
    pub industry: String,
    pub employees: String,
    pub country: String,
    pub working_days: Option<String>,
    pub overtime: Option<String>,
    pub website: Option<String>,
    pub description: String,
    /// JSON array of reasons to join
    pub why: String,
    pub reviews_count: i64,
    pub rating: Option<f64>,
    pub recommended: Option<i64>,
    /// JSON object of category ratings
    pub rating_categories: String,
    pub last_post: String,
}

pub(crate) const JOB_COLUMNS: &str = "job.id, job.code, job.site_id, job.title, job.url, \
    job.salary, job.description, job.reasons, job.details, job.skills, job.why, \
    job.last_post, job.employer_code";
