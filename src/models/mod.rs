// src/models/mod.rs

//! Domain models for the scraper.
//!
//! Feed pages, cached job/employer records and configuration.

mod config;
mod employer;
mod feed;
mod job;

pub use config::{
    CacheConfig, Config, CrawlerConfig, DATABASE_URL_ENV, DatabaseConfig, SiteConfig,
};
pub use employer::{Address, EmployerFeedEntry, EmployerRecord, Ratings, Review, newest_post};
pub use feed::{JobPage, ReviewPage, ReviewSummary};
pub use job::{JobDetail, JobRecord, JobSummary};

/// Cities with their own job listings; everything else is "Others".
pub const MAIN_CITIES: [&str; 3] = ["Ho Chi Minh", "Ha Noi", "Da Nang"];

#[cfg(test)]
pub(crate) use job::fixtures;
