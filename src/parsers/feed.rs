//! Feed JSON parsing.

use scraper::Html;
use serde::Deserialize;
use url::Url;

use super::parse_selector;
use crate::error::{AppError, Result};
use crate::models::{EmployerFeedEntry, JobPage};
use crate::utils::resolve_url;

/// Raw job feed response.
#[derive(Debug, Deserialize)]
struct RawJobPage {
    jobs_html: String,
    #[serde(default)]
    show_more_html: Option<String>,
}

/// Parse one job feed response fetched from `url`.
///
/// Pagination links come from the `show_more_html` fragment and are
/// resolved against `url`.
pub fn parse_job_page(url: &str, body: &str) -> Result<JobPage> {
    let raw: RawJobPage = serde_json::from_str(body)?;
    let base = Url::parse(url)?;

    let (prev, next) = match raw.show_more_html.as_deref() {
        Some(html) => (
            pagination_link(html, "prev", &base)?,
            pagination_link(html, "next", &base)?,
        ),
        None => (None, None),
    };

    Ok(JobPage {
        url: url.to_string(),
        jobs_html: raw.jobs_html,
        prev,
        next,
    })
}

fn pagination_link(html: &str, rel: &str, base: &Url) -> Result<Option<String>> {
    let fragment = Html::parse_fragment(html);
    let sel = parse_selector(&format!("a[rel={rel}][href]"))?;

    Ok(fragment
        .select(&sel)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(|href| resolve_url(base, href)))
}

/// Parse the employers JSON feed: an array of arrays led by the code.
pub fn parse_employer_feed(body: &str) -> Result<Vec<EmployerFeedEntry>> {
    let rows: Vec<serde_json::Value> = serde_json::from_str(body)?;
    let mut entries = Vec::with_capacity(rows.len());

    for row in rows {
        let serde_json::Value::Array(mut columns) = row else {
            return Err(AppError::parse("employer feed", "entry is not an array"));
        };
        if columns.is_empty() {
            log::warn!("Skipping empty employer feed entry");
            continue;
        }

        let code = match columns.remove(0) {
            serde_json::Value::String(code) => code,
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                log::warn!("Skipping employer feed entry with code {}", other);
                continue;
            }
        };
        entries.push(EmployerFeedEntry {
            code,
            extra: columns,
        });
    }
    Ok(entries)
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// A job feed response holding `jobs_html` and an optional next link.
    pub fn job_page(jobs_html: &str, next: Option<&str>) -> String {
        let show_more = match next {
            Some(href) => format!(
                r#"<div class="show-more"><a rel="prev" href="/it-jobs?page=0">Prev</a><a rel="next" href="{href}">More jobs</a></div>"#
            ),
            None => String::new(),
        };
        serde_json::json!({
            "suggestion": "",
            "jobs_html": jobs_html,
            "show_more_html": show_more,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_with_next_link() {
        let body = fixtures::job_page("<div></div>", Some("/it-jobs?page=2"));
        let page = parse_job_page("https://itviec.com/it-jobs", &body).unwrap();

        assert_eq!(page.url, "https://itviec.com/it-jobs");
        assert_eq!(page.jobs_html, "<div></div>");
        assert_eq!(page.next.as_deref(), Some("https://itviec.com/it-jobs?page=2"));
        assert_eq!(page.prev.as_deref(), Some("https://itviec.com/it-jobs?page=0"));
    }

    #[test]
    fn last_page_has_no_next() {
        let body = fixtures::job_page("", None);
        let page = parse_job_page("https://itviec.com/it-jobs?page=9", &body).unwrap();
        assert!(page.next.is_none());
        assert!(page.prev.is_none());
    }

    #[test]
    fn empty_href_is_no_link() {
        let body = serde_json::json!({
            "jobs_html": "",
            "show_more_html": "<a rel=\"next\" href=\"\">More</a>",
        })
        .to_string();
        let page = parse_job_page("https://itviec.com/it-jobs", &body).unwrap();
        assert!(page.next.is_none());
    }

    #[test]
    fn missing_jobs_html_is_error() {
        assert!(parse_job_page("https://itviec.com/it-jobs", "{}").is_err());
    }

    #[test]
    fn parses_employer_feed() {
        let body = r#"[["acme", "Acme Corp", 12], [42], [], ["globex"]]"#;
        let entries = parse_employer_feed(body).unwrap();

        let codes: Vec<_> = entries.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["acme", "42", "globex"]);
        assert_eq!(entries[0].extra.len(), 2);
    }

    #[test]
    fn employer_feed_rejects_objects() {
        assert!(parse_employer_feed(r#"[{"code": "acme"}]"#).is_err());
    }
}
