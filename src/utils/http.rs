// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Create a configured asynchronous HTTP client.
///
/// Headers from `crawler.headers` are sent with every request.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .default_headers(default_headers(config)?)
        .build()?;
    Ok(client)
}

fn default_headers(config: &CrawlerConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AppError::config(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| AppError::config(format!("invalid value for header {name}: {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_headers_include_xhr_marker() {
        let headers = default_headers(&CrawlerConfig::default()).unwrap();
        assert_eq!(headers["x-requested-with"], "XMLHttpRequest");
    }

    #[test]
    fn invalid_header_name_is_config_error() {
        let mut config = CrawlerConfig::default();
        config.headers.insert("bad header".to_string(), "x".to_string());
        assert!(matches!(default_headers(&config), Err(AppError::Config(_))));
    }
}
