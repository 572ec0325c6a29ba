//! Employer review page parsing.

use scraper::{ElementRef, Html};
use url::Url;

use super::{parse_selector, select_first, text, text_of};
use crate::error::Result;
use crate::models::{Ratings, Review, ReviewPage, ReviewSummary};
use crate::utils::resolve_url;

/// Parse one review page fetched from `url`.
///
/// The summary (count and ratings) is read when present; a page without it
/// yields the default summary.
pub fn parse_review_page(url: &str, html: &str) -> Result<ReviewPage> {
    let document = Html::parse_document(html);
    let base = Url::parse(url)?;

    let root = document.root_element();
    let left = select_first(root, "div.col-left")?.unwrap_or(root);

    let summary = ReviewSummary {
        reviews_count: reviews_count(left)?,
        ratings: ratings(left)?,
    };

    let mut reviews = Vec::new();
    let review_sel = parse_selector("div.content-of-review")?;
    for block in left.select(&review_sel) {
        let Some(title) = text_of(block, "h3.short-title")? else {
            log::debug!("Skipping review without title on {}", url);
            continue;
        };
        reviews.push(Review {
            title,
            date: text_of(block, "div.date")?.unwrap_or_default(),
        });
    }

    let next = select_first(root, "ul.pagination a[rel=next][href]")?
        .and_then(|a| a.value().attr("href"))
        .filter(|href| !href.trim().is_empty())
        .map(|href| resolve_url(&base, href.trim()));

    Ok(ReviewPage {
        summary,
        reviews,
        next,
    })
}

/// "12 Reviews" in the second navigation link.
fn reviews_count(left: ElementRef<'_>) -> Result<u32> {
    let sel = parse_selector("ul.navigation a")?;
    Ok(left
        .select(&sel)
        .nth(1)
        .map(text)
        .and_then(|t| t.split_whitespace().next().and_then(|n| n.parse().ok()))
        .unwrap_or(0))
}

fn ratings(left: ElementRef<'_>) -> Result<Ratings> {
    let mut ratings = Ratings::default();

    let Some(stars) = text_of(left, "p.start-point")? else {
        return Ok(ratings);
    };
    ratings.overall = stars
        .split_whitespace()
        .next()
        .and_then(|n| n.parse().ok());

    ratings.recommended = select_first(left, "td[data-rate]")?
        .and_then(|td| td.value().attr("data-rate"))
        .and_then(|rate| rate.trim().trim_end_matches('%').parse().ok());

    let row_sel = parse_selector("table.ratings-specific tr")?;
    let cell_sel = parse_selector("td")?;
    for row in left.select(&row_sel) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
        if cells.len() < 2 {
            continue;
        }
        let (first, last) = (cells[0], cells[cells.len() - 1]);

        let name = match select_first(first, "span")? {
            Some(span) => text(span),
            None => text(first),
        };
        if name.is_empty() {
            continue;
        }
        if let Some(score) = text(last).split_whitespace().next() {
            ratings.categories.insert(name, score.to_string());
        }
    }

    Ok(ratings)
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// A review page with the given review titles and an optional next href.
    pub fn review_page(titles: &[&str], next: Option<&str>, with_summary: bool) -> String {
        let reviews: String = titles
            .iter()
            .map(|title| {
                format!(
                    r#"<div class="content-of-review">
  <h3 class="short-title"> {title} </h3>
  <div class="stars"></div>
  <div class="date">August 2019</div>
  <div class="details-review"><p>Text</p></div>
</div>"#
                )
            })
            .collect();

        let summary = if with_summary {
            r#"<div class="panel panel-default">
  <p class="start-point">4.5 stars</p>
  <table><tr><td data-rate="85"></td><td>Recommend working here to a friend</td></tr></table>
</div>
<table class="ratings-specific">
  <tr><td><span>Salary &amp; benefits</span></td><td class="stars"></td><td>4.1 <i></i></td></tr>
  <tr><td><span>Training &amp; learning</span></td><td class="stars"></td><td>3.9</td></tr>
</table>"#
        } else {
            ""
        };

        let pagination = match next {
            Some(href) => format!(
                r#"<ul class="pagination"><li><a rel="next" href="{href}">Next</a></li></ul>"#
            ),
            None => String::new(),
        };

        format!(
            r#"<html><body><div class="company-review"><div class="row company-container">
<div class="col-md-8 col-left">
  <ul class="navigation"><li><a href="/companies/acme">About</a></li><li><a href="/companies/acme/review">{count} Reviews</a></li></ul>
  {summary}
  <div class="panel-body content-review disable-user-select">{reviews}</div>
  {pagination}
</div></div></div></body></html>"#,
            count = titles.len()
        )
    }
}
