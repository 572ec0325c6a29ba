//! Pipeline entry points.
//!
//! - `source`: Fetch and store the job and employer feeds
//! - `download`: Refresh the JSON cache from the feed
//! - `upgrade`: Bring the database in line with the feed
//! - `load`: Copy every cached job into the database
//! - `stats`: Feed statistics and the update backlog

pub mod download;
pub mod load;
pub mod source;
pub mod stats;
pub mod upgrade;

pub use download::{DownloadOutcome, DownloadPlan, calculate_downloads, run_download};
pub use load::{LoadReport, load_cached_jobs};
pub use source::{feed_jobs, fetch_all, fetch_employers, fetch_jobs};
pub use stats::{FeedStats, UpdateBacklog, to_be_updated};
pub use upgrade::{UpgradePlan, calculate_updates, install_employer, run_upgrade, update_employer};
