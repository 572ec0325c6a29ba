//! JSON record cache.
//!
//! One JSON file per record, keyed by code, plus the last feed snapshots.
//!
//! ## Directory Structure
//!
//! ```text
//! cache/
//! ├── jobs.json             # Job feed snapshot (all summaries)
//! ├── employers.json        # Employers feed snapshot
//! ├── jobs/
//! │   └── {code}.json       # JobRecord
//! └── employers/
//!     └── {code}.json       # EmployerRecord with reviews
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{EmployerFeedEntry, EmployerRecord, JobRecord, JobSummary};

// Re-export for convenience
pub use local::LocalCache;

/// Trait for record cache backends.
#[async_trait]
pub trait RecordCache: Send + Sync {
    /// Cached job, `None` if it was never stored.
    async fn get_job(&self, code: &str) -> Result<Option<JobRecord>>;

    async fn save_job(&self, job: &JobRecord) -> Result<()>;

    /// Codes of every cached job.
    async fn job_codes(&self) -> Result<Vec<String>>;

    /// Cached employer, `None` if it was never stored.
    async fn get_employer(&self, code: &str) -> Result<Option<EmployerRecord>>;

    async fn save_employer(&self, employer: &EmployerRecord) -> Result<()>;

    /// Last job feed snapshot.
    async fn load_job_feed(&self) -> Result<Option<Vec<JobSummary>>>;

    async fn save_job_feed(&self, jobs: &[JobSummary]) -> Result<()>;

    /// Last employers feed snapshot.
    async fn load_employer_feed(&self) -> Result<Option<Vec<EmployerFeedEntry>>>;

    async fn save_employer_feed(&self, employers: &[EmployerFeedEntry]) -> Result<()>;
}
