//! Record scraping: job detail pages and employer pages with their reviews.

use crate::error::Result;
use crate::models::{EmployerRecord, JobRecord, JobSummary, SiteConfig};
use crate::parsers::{parse_employer, parse_job_detail};
use crate::services::{Fetch, ReviewFeed};

/// Fetches and parses full records.
pub struct Scraper<'a> {
    fetcher: &'a dyn Fetch,
    site: &'a SiteConfig,
}

impl<'a> Scraper<'a> {
    pub fn new(fetcher: &'a dyn Fetch, site: &'a SiteConfig) -> Self {
        Self { fetcher, site }
    }

    pub fn site(&self) -> &'a SiteConfig {
        self.site
    }

    pub fn fetcher(&self) -> &'a dyn Fetch {
        self.fetcher
    }

    /// Detail page of `summary`, merged with the summary itself.
    pub async fn job(&self, summary: &JobSummary) -> Result<JobRecord> {
        let url = self.site.job_url(&summary.code);
        let html = self.fetcher.get_text(&url).await?;
        let detail = parse_job_detail(&html)?;
        Ok(JobRecord::new(summary.clone(), detail))
    }

    /// Employer page plus every review page.
    ///
    /// `last_post` stamps the record; without it the newest post among the
    /// employer's jobs is used.
    pub async fn employer(&self, code: &str, last_post: Option<&str>) -> Result<EmployerRecord> {
        let url = self.site.employer_url(code);
        let html = self.fetcher.get_text(&url).await?;
        let mut employer = parse_employer(&html, code, &url)?;

        let all = ReviewFeed::new(code).reviews(self.fetcher, self.site).await?;
        employer.reviews = all.reviews;
        employer.reviews_count = all.summary.reviews_count;
        employer.ratings = all.summary.ratings;

        employer.last_post = match last_post {
            Some(post) => post.to_string(),
            None => employer
                .newest_job_post(&self.site.datetime_format)
                .unwrap_or_default()
                .to_string(),
        };

        log::debug!(
            "Scraped employer {}: {} jobs, {} reviews",
            code,
            employer.jobs.len(),
            employer.reviews.len()
        );
        Ok(employer)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::parsers::fixtures::{employer_page, job_detail_page, review_page};
    use crate::services::testing::StaticFetcher;

    /// Serve the detail page of every job and the employer page of `code`.
    pub fn serve_employer(
        fetcher: StaticFetcher,
        code: &str,
        jobs: &[(&str, &str)],
    ) -> StaticFetcher {
        let mut fetcher = fetcher
            .with(
                format!("https://itviec.com/companies/{code}"),
                employer_page(code, jobs),
            )
            .with(
                format!("https://itviec.com/companies/{code}/review"),
                review_page(&["Nice", "Busy"], None, true),
            );
        for (job, _) in jobs {
            fetcher = fetcher.with(format!("https://itviec.com/it-jobs/{job}"), job_detail_page());
        }
        fetcher
    }
}

#[cfg(test)]
mod tests {
    use super::testing::serve_employer;
    use super::*;
    use crate::models::fixtures;
    use crate::services::testing::StaticFetcher;

    #[tokio::test]
    async fn job_merges_summary_and_detail() {
        let site = SiteConfig::default();
        let fetcher = serve_employer(StaticFetcher::new(), "acme", &[("java-1", "2019-08-21 10:03:31 +0700")]);
        let scraper = Scraper::new(&fetcher, &site);

        let summary = fixtures::summary("java-1", "acme", "2019-08-21 10:03:31 +0700");
        let job = scraper.job(&summary).await.unwrap();
        assert_eq!(job.summary, summary);
        assert_eq!(job.detail.details, "<p>Write code.</p>");
    }

    #[tokio::test]
    async fn employer_stamped_with_newest_job() {
        let site = SiteConfig::default();
        let fetcher = serve_employer(
            StaticFetcher::new(),
            "acme",
            &[
                ("old-1", "2019-08-01 10:00:00 +0700"),
                ("new-2", "2019-08-21 10:03:31 +0700"),
            ],
        );
        let scraper = Scraper::new(&fetcher, &site);

        let employer = scraper.employer("acme", None).await.unwrap();
        assert_eq!(employer.last_post, "2019-08-21 10:03:31 +0700");
        assert_eq!(employer.reviews.len(), 2);
        assert_eq!(employer.reviews_count, 2);
        assert_eq!(employer.ratings.recommended, Some(85));
    }

    #[tokio::test]
    async fn employer_stamped_with_given_post() {
        let site = SiteConfig::default();
        let fetcher = serve_employer(StaticFetcher::new(), "acme", &[]);
        let scraper = Scraper::new(&fetcher, &site);

        let employer = scraper
            .employer("acme", Some("2019-09-01 00:00:00 +0700"))
            .await
            .unwrap();
        assert_eq!(employer.last_post, "2019-09-01 00:00:00 +0700");
    }
}
