//! Service layer for the scraper.
//!
//! This module contains:
//! - Page fetching (`Fetch`, `HttpFetcher`)
//! - Feed walks (`JobFeed`, `ReviewFeed`, `EmployerFeed`)
//! - Record scraping (`Scraper`)
//! - Freshness-aware cache access (`CacheService`)

mod cache;
mod feeds;
mod fetcher;
mod scraper;

pub use cache::CacheService;
pub use feeds::{EmployerFeed, EmployerReviews, JobFeed, ReviewFeed};
pub use fetcher::{Fetch, HttpFetcher};
pub use scraper::Scraper;

#[cfg(test)]
pub(crate) use fetcher::testing;
#[cfg(test)]
pub(crate) use scraper::testing::serve_employer;
