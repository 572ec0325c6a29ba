//! HTML and JSON parsers for feed pages, job and employer pages.
//!
//! Everything here is pure: text in, records out. Fetching lives in
//! [`crate::services`].

mod employer;
mod feed;
mod job;
mod review;

pub use employer::parse_employer;
pub use feed::{parse_employer_feed, parse_job_page};
pub use job::{parse_job_detail, parse_job_tag, parse_job_tags};
pub use review::parse_review_page;

#[cfg(test)]
pub(crate) mod fixtures {
    pub use super::employer::fixtures::*;
    pub use super::feed::fixtures::*;
    pub use super::job::fixtures::*;
    pub use super::review::fixtures::*;
}

use scraper::{ElementRef, Selector};

use crate::error::{AppError, Result};
use crate::utils::{normalize_whitespace, text_lines};

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// First element under `root` matching `selector`.
pub(crate) fn select_first<'a>(root: ElementRef<'a>, selector: &str) -> Result<Option<ElementRef<'a>>> {
    let sel = parse_selector(selector)?;
    Ok(root.select(&sel).next())
}

/// Like [`select_first`] but missing elements are a parse error.
pub(crate) fn require<'a>(
    root: ElementRef<'a>,
    selector: &str,
    context: &str,
) -> Result<ElementRef<'a>> {
    select_first(root, selector)?
        .ok_or_else(|| AppError::parse(context, format!("missing element '{selector}'")))
}

/// Whitespace-normalised text of an element.
pub(crate) fn text(el: ElementRef<'_>) -> String {
    normalize_whitespace(&el.text().collect::<String>())
}

/// Text of the first match, or `None`.
pub(crate) fn text_of(root: ElementRef<'_>, selector: &str) -> Result<Option<String>> {
    Ok(select_first(root, selector)?
        .map(text)
        .filter(|t| !t.is_empty()))
}

/// Text directly owned by the element, skipping child elements.
pub(crate) fn own_text(el: ElementRef<'_>) -> String {
    let own: String = el
        .children()
        .filter_map(|node| node.value().as_text().map(|t| &**t))
        .collect();
    normalize_whitespace(&own)
}

/// Texts of a list-like element: one per child element, or one per line
/// when the element has no children.
pub(crate) fn item_texts(el: ElementRef<'_>) -> Vec<String> {
    let items: Vec<String> = el
        .children()
        .filter_map(ElementRef::wrap)
        .map(text)
        .filter(|t| !t.is_empty())
        .collect();

    if items.is_empty() {
        text_lines(&el.text().collect::<String>())
    } else {
        items
    }
}

/// Texts of every match of `selector` under `root`.
pub(crate) fn texts_of(root: ElementRef<'_>, selector: &str) -> Result<Vec<String>> {
    let sel = parse_selector(selector)?;
    Ok(root
        .select(&sel)
        .map(text)
        .filter(|t| !t.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    #[test]
    fn test_parse_selector_valid() {
        assert!(parse_selector("div.job").is_ok());
        assert!(parse_selector("a[rel=next][href]").is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector("[[invalid").is_err());
    }

    #[test]
    fn item_texts_prefers_children() {
        let html = Html::parse_fragment(
            r#"<div class="tag-list"><a href="/java"><span>Java</span></a>
               <a href="/spring">Spring </a></div>"#,
        );
        let div = select_first(html.root_element(), "div.tag-list").unwrap().unwrap();
        assert_eq!(item_texts(div), vec!["Java", "Spring"]);
    }

    #[test]
    fn item_texts_falls_back_to_lines() {
        let html = Html::parse_fragment("<div class=\"address\">\nHo Chi Minh\n\n\nHa Noi\n</div>");
        let div = select_first(html.root_element(), "div.address").unwrap().unwrap();
        assert_eq!(item_texts(div), vec!["Ho Chi Minh", "Ha Noi"]);
    }

    #[test]
    fn own_text_skips_icons() {
        let html = Html::parse_fragment(
            r#"<span><i class="fa fa-map-marker"></i><b>x</b> District 1, Ho Chi Minh </span>"#,
        );
        let span = select_first(html.root_element(), "span").unwrap().unwrap();
        assert_eq!(own_text(span), "District 1, Ho Chi Minh");
    }
}
