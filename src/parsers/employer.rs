//! Employer page parsing.
//!
//! Page outline:
//!
//! ```text
//! div.company-page
//! ├── div.headers          logo, name, location, industry, size, country, tags
//! └── div.company-container
//!     ├── div.col-left     navigation, description, jobs, why, location panels
//!     └── div.col-right    ratings (parsed from the review pages instead)
//! ```

use scraper::Html;

use super::{item_texts, own_text, parse_job_tag, parse_selector, require, select_first, text, text_of, texts_of};
use crate::error::Result;
use crate::models::{EmployerRecord, Ratings};

/// Parse an employer page. Reviews and `last_post` are filled in later.
pub fn parse_employer(html: &str, code: &str, url: &str) -> Result<EmployerRecord> {
    let document = Html::parse_document(html);
    let context = "employer page";

    let company = require(document.root_element(), "div.company-page", context)?;
    let header = require(company, "div.headers", context)?;

    let logo = select_first(header, "div.logo-container img")?
        .and_then(|img| img.value().attr("data-src").or(img.value().attr("src")))
        .unwrap_or_default()
        .to_string();

    let name = text(require(header, "h1", context)?);

    let location = match select_first(header, "div.name-and-info span")? {
        Some(span) => {
            let own = own_text(span);
            if own.is_empty() { text(span) } else { own }
        }
        None => String::new(),
    };

    let tags = select_first(header, "div.tag-list")?
        .map(item_texts)
        .unwrap_or_default();

    let mut employer = EmployerRecord {
        code: code.to_string(),
        name,
        url: url.to_string(),
        logo,
        location,
        industry: text_of(header, "span.gear-icon")?.unwrap_or_default(),
        employees: text_of(header, "span.group-icon")?.unwrap_or_default(),
        country: text_of(header, "div.country span")?.unwrap_or_default(),
        working_days: text_of(header, "div.working-date span")?,
        overtime: text_of(header, "div.overtime span")?,
        website: None,
        description: String::new(),
        why: Vec::new(),
        tags,
        addresses: Vec::new(),
        jobs: Vec::new(),
        reviews: Vec::new(),
        reviews_count: 0,
        ratings: Ratings::default(),
        last_post: String::new(),
    };

    let Some(left) = select_first(company, "div.col-left")? else {
        log::warn!("Employer {} has no left column", code);
        return Ok(employer);
    };

    employer.website = select_first(left, "ul.navigation a.ion-android-open[href]")?
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);

    employer.description = select_first(left, "div.panel")?
        .map(|panel| panel.inner_html().trim().to_string())
        .unwrap_or_default();

    let job_sel = parse_selector("div.panel.jobs div.job")?;
    for block in left.select(&job_sel) {
        match parse_job_tag(block, Some(code)) {
            Ok(job) => employer.jobs.push(job),
            Err(e) => log::warn!("Skipping job of employer {}: {}", code, e),
        }
    }

    employer.why = texts_of(left, "div.panel.why li")?;
    employer.addresses = texts_of(left, "div.panel.location .full-address")?;

    Ok(employer)
}
