//! Job tag and job detail parsing.

use scraper::{ElementRef, Html};

use super::{item_texts, parse_selector, require, select_first, text, text_of};
use crate::error::{AppError, Result};
use crate::models::{JobDetail, JobSummary};
use crate::utils::last_segment;

/// Parse every `div.job` block of a feed fragment.
///
/// Blocks that fail to parse are logged and skipped.
pub fn parse_job_tags(jobs_html: &str) -> Result<Vec<JobSummary>> {
    let fragment = Html::parse_fragment(jobs_html);
    let job_sel = parse_selector("div.job")?;

    let mut jobs = Vec::new();
    for block in fragment.select(&job_sel) {
        match parse_job_tag(block, None) {
            Ok(job) => jobs.push(job),
            Err(e) => log::warn!("Skipping job tag: {}", e),
        }
    }
    Ok(jobs)
}

/// Parse a single job tag.
///
/// `employer_code` is used when the block has no employer link, as on the
/// employer's own page.
pub fn parse_job_tag(block: ElementRef<'_>, employer_code: Option<&str>) -> Result<JobSummary> {
    let context = "job tag";

    let title_link = require(block, "h2.title a", context)?;
    let url = title_link
        .value()
        .attr("href")
        .ok_or_else(|| AppError::parse(context, "title link has no href"))?
        .to_string();
    let code = last_segment(&url)
        .ok_or_else(|| AppError::parse(context, format!("no job code in '{url}'")))?
        .to_string();

    let employer_code = match select_first(block, "a[target=_blank][href]")? {
        Some(link) => link
            .value()
            .attr("href")
            .and_then(last_segment)
            .map(str::to_string),
        None => None,
    }
    .or_else(|| employer_code.map(str::to_string))
    .ok_or_else(|| AppError::parse(context, format!("no employer for job '{code}'")))?;

    let last_post = last_post(block)
        .ok_or_else(|| AppError::parse(context, format!("no last post for job '{code}'")))?;

    let id = block
        .value()
        .attr("id")
        .and_then(|id| id.strip_prefix("job_"))
        .and_then(|n| n.parse().ok());

    Ok(JobSummary {
        code,
        id,
        title: text(title_link),
        employer_code,
        url,
        salary: text_of(block, "span.salary-text")?.unwrap_or_default(),
        addresses: select_first(block, "div.address")?
            .map(item_texts)
            .unwrap_or_default(),
        tags: select_first(block, "div.tag-list")?
            .map(item_texts)
            .unwrap_or_default(),
        description: text_of(block, "div.description")?.unwrap_or_default(),
        last_post,
        distance: text_of(block, "span.distance-time")?,
    })
}

/// The quoted timestamp of the block's comment, e.g.
/// `<!-- Last post: "2019-08-21 10:03:31 +0700" -->`.
fn last_post(block: ElementRef<'_>) -> Option<String> {
    block
        .descendants()
        .filter_map(|node| node.value().as_comment().map(|c| &**c))
        .find_map(|comment| comment.split('"').nth(1))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| block.value().attr("data-last-post").map(str::to_string))
}

/// Parse the sections of a job detail page.
pub fn parse_job_detail(html: &str) -> Result<JobDetail> {
    let document = Html::parse_document(html);
    let container = require(document.root_element(), "div.job-detail", "job detail")?;

    let mut detail = JobDetail::default();
    for child in container.children().filter_map(ElementRef::wrap) {
        let classes: Vec<&str> = child.value().classes().collect();
        let body = child.inner_html().trim().to_string();

        if classes.contains(&"job_reason_to_join_us") {
            detail.reasons = body;
        } else if classes.contains(&"job_description") {
            detail.details = body;
        } else if classes.contains(&"skills_experience") {
            detail.skills = body;
        } else if classes.contains(&"love_working_here") {
            detail.why = body;
        }
    }
    Ok(detail)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_feed_job_tag() {
        let html = fixtures::job_tag("senior-java-acme-1234", "acme", "2019-08-21 10:03:31 +0700");
        let jobs = parse_job_tags(&html).unwrap();
        assert_eq!(jobs.len(), 1);

        let job = &jobs[0];
        assert_eq!(job.code, "senior-java-acme-1234");
        assert_eq!(job.id, Some(42));
        assert_eq!(job.title, "Senior Java Developer");
        assert_eq!(job.employer_code, "acme");
        assert_eq!(job.url, "/it-jobs/senior-java-acme-1234");
        assert_eq!(job.salary, "Up to $2000");
        assert_eq!(job.addresses, vec!["Ho Chi Minh", "Ha Noi"]);
        assert_eq!(job.tags, vec!["Java", "Spring"]);
        assert_eq!(job.description, "Build things.");
        assert_eq!(job.last_post, "2019-08-21 10:03:31 +0700");
        assert_eq!(job.distance.as_deref(), Some("3 hours ago"));
    }

    #[test]
    fn skips_broken_blocks() {
        let html = format!(
            "{}<div class=\"job\"><p>no title here</p></div>{}",
            fixtures::job_tag("a-1", "acme", "2019-08-21 10:03:31 +0700"),
            fixtures::job_tag("b-2", "globex", "2019-08-20 10:03:31 +0700"),
        );
        let jobs = parse_job_tags(&html).unwrap();
        let codes: Vec<_> = jobs.iter().map(|j| j.code.as_str()).collect();
        assert_eq!(codes, vec!["a-1", "b-2"]);
    }

    #[test]
    fn last_post_from_data_attribute() {
        let html = r#"<div class="job" data-last-post="2019-08-21 10:03:31 +0700">
            <h2 class="title"><a href="/it-jobs/x-1">X</a></h2>
            <a target="_blank" href="/companies/acme">Acme</a></div>"#;
        let jobs = parse_job_tags(html).unwrap();
        assert_eq!(jobs[0].last_post, "2019-08-21 10:03:31 +0700");
        assert!(jobs[0].tags.is_empty());
        assert_eq!(jobs[0].salary, "");
    }

    #[test]
    fn employer_fallback_is_used() {
        let fragment = Html::parse_fragment(
            r#"<div class="job"><!-- "2019-08-21 10:03:31 +0700" -->
               <h2 class="title"><a href="/it-jobs/x-1">X</a></h2></div>"#,
        );
        let sel = parse_selector("div.job").unwrap();
        let block = fragment.select(&sel).next().unwrap();

        assert!(parse_job_tag(block, None).is_err());
        let job = parse_job_tag(block, Some("acme")).unwrap();
        assert_eq!(job.employer_code, "acme");
    }

    #[test]
    fn parses_job_detail_sections() {
        let detail = parse_job_detail(&fixtures::job_detail_page()).unwrap();
        assert!(detail.reasons.contains("<li>Money</li>"));
        assert_eq!(detail.details, "<p>Write code.</p>");
        assert_eq!(detail.skills, "<ul><li>Java</li></ul>");
        assert_eq!(detail.why, "<p>Free lunch</p>");
    }

    #[test]
    fn job_detail_requires_container() {
        assert!(parse_job_detail("<html><body><p>gone</p></body></html>").is_err());
    }
}
