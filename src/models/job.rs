//! Job records.

use serde::{Deserialize, Serialize};

/// A job as listed in a feed page (one "job tag").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobSummary {
    /// Slug identifying the job, last path segment of `url`
    pub code: String,

    /// Numeric id from the `job_<n>` element id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub title: String,

    pub employer_code: String,

    pub url: String,

    pub salary: String,

    #[serde(default)]
    pub addresses: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub description: String,

    /// Site timestamp of the last post, e.g. `2019-08-21 10:03:31 +0700`
    pub last_post: String,

    /// Relative time shown in the feed ("3 hours ago")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
}

/// Sections of a job detail page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct JobDetail {
    pub reasons: String,
    pub details: String,
    pub skills: String,
    pub why: String,
}

/// A cached job: feed summary merged with its detail page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobRecord {
    #[serde(flatten)]
    pub summary: JobSummary,

    #[serde(flatten)]
    pub detail: JobDetail,
}

impl JobRecord {
    pub fn new(summary: JobSummary, detail: JobDetail) -> Self {
        Self { summary, detail }
    }

    pub fn code(&self) -> &str {
        &self.summary.code
    }

    pub fn last_post(&self) -> &str {
        &self.summary.last_post
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_flat() {
        let record = JobRecord::new(
            fixtures::summary("java-dev", "acme", "2019-08-21 10:03:31 +0700"),
            JobDetail {
                skills: "<ul><li>Java</li></ul>".to_string(),
                ..JobDetail::default()
            },
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["code"], "java-dev");
        assert_eq!(value["skills"], "<ul><li>Java</li></ul>");
        assert!(value.get("summary").is_none());

        let back: JobRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
