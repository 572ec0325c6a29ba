//! Feed page structures.

use crate::models::{Ratings, Review};

/// One page of the job feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPage {
    /// Url this page was fetched from
    pub url: String,

    /// HTML fragment holding the job tags
    pub jobs_html: String,

    pub prev: Option<String>,
    pub next: Option<String>,
}

/// Review statistics shown on the first review page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReviewSummary {
    pub reviews_count: u32,
    pub ratings: Ratings,
}

/// One page of an employer's reviews.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReviewPage {
    pub summary: ReviewSummary,
    pub reviews: Vec<Review>,
    pub next: Option<String>,
}
