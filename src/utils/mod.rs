//! Utility functions and helpers.

pub mod http;
pub mod time;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Last non-empty path segment of a url or path, ignoring query and fragment.
///
/// `/companies/acme-corp?tab=jobs` gives `acme-corp`.
pub fn last_segment(href: &str) -> Option<&str> {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    path.split('/').rev().find(|s| !s.is_empty())
}

/// Split a text block into trimmed, non-empty lines.
pub fn text_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collapse runs of whitespace into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://itviec.com/it-jobs").unwrap();
        assert_eq!(
            resolve_url(&base, "/it-jobs?page=2"),
            "https://itviec.com/it-jobs?page=2"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("/companies/acme-corp"), Some("acme-corp"));
        assert_eq!(
            last_segment("https://itviec.com/companies/acme-corp/"),
            Some("acme-corp")
        );
        assert_eq!(last_segment("/it-jobs/java-dev-0123?src=feed"), Some("java-dev-0123"));
        assert_eq!(last_segment("/"), None);
    }

    #[test]
    fn test_text_lines() {
        let lines = text_lines("\n  Ho Chi Minh\n\n\n   Ha Noi  \n");
        assert_eq!(lines, vec!["Ho Chi Minh", "Ha Noi"]);
    }
}
