//! Employer, review and address records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::JobSummary;

/// A cached employer page with its reviews.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmployerRecord {
    pub code: String,
    pub name: String,
    pub url: String,
    pub logo: String,
    pub location: String,
    pub industry: String,
    pub employees: String,
    pub country: String,

    #[serde(default)]
    pub working_days: Option<String>,

    #[serde(default)]
    pub overtime: Option<String>,

    #[serde(default)]
    pub website: Option<String>,

    /// Description panel HTML
    #[serde(default)]
    pub description: String,

    /// Items of the "why you'll love working here" panel
    #[serde(default)]
    pub why: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub addresses: Vec<String>,

    /// Open positions listed on the employer page
    #[serde(default)]
    pub jobs: Vec<JobSummary>,

    #[serde(default)]
    pub reviews: Vec<Review>,

    #[serde(default)]
    pub reviews_count: u32,

    #[serde(default)]
    pub ratings: Ratings,

    /// Newest "last post" among the employer's jobs when it was cached
    #[serde(default)]
    pub last_post: String,
}

impl EmployerRecord {
    /// Newest job `last_post`, compared as site timestamps.
    pub fn newest_job_post(&self, format: &str) -> Option<&str> {
        newest_post(self.jobs.iter().map(|j| j.last_post.as_str()), format)
    }
}

/// Pick the newest timestamp; unparseable values lose against parseable ones.
pub fn newest_post<'a>(posts: impl Iterator<Item = &'a str>, format: &str) -> Option<&'a str> {
    posts.max_by_key(|p| crate::utils::time::parse_datetime(p, format).ok())
}

/// One company review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Review {
    pub title: String,
    pub date: String,
}

/// Aggregated review ratings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Ratings {
    #[serde(default)]
    pub overall: Option<f32>,

    /// Percentage of reviewers recommending the employer
    #[serde(default)]
    pub recommended: Option<u32>,

    /// Per-category scores, e.g. "Salary & benefits" -> "4.1"
    #[serde(default)]
    pub categories: BTreeMap<String, String>,
}

/// A postal address split into its coarse components.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub full_address: String,
    pub city: String,
    pub district: Option<String>,
}

impl Address {
    /// Parse "street, district, city"; only the last two components matter.
    ///
    /// Returns `None` for an empty address.
    pub fn parse(full_address: &str) -> Option<Self> {
        let full = full_address.trim();
        if full.is_empty() {
            return None;
        }

        let mut parts = full.rsplitn(3, ", ");
        let city = parts.next()?.trim().to_string();
        let district = parts.next().map(|d| d.trim().to_string());

        Some(Self {
            full_address: full.to_string(),
            city,
            district,
        })
    }
}

/// One entry of the employers JSON feed.
///
/// The feed is an array of arrays whose first element is the employer code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmployerFeedEntry {
    pub code: String,

    /// Remaining columns as sent by the site
    #[serde(default)]
    pub extra: Vec<serde_json::Value>,
}
