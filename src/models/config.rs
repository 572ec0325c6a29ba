//! Application configuration structures.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Environment variable that overrides `database.url`.
pub const DATABASE_URL_ENV: &str = "ITVIEC_DATABASE_URL";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Site urls and formats
    #[serde(default)]
    pub site: SiteConfig,

    /// HTTP behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// JSON cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Relational store settings
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply `ITVIEC_DATABASE_URL` if it is set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.database.url = url;
            }
        }
        self
    }

    /// Resolve relative cache/database locations against the data directory.
    pub fn rooted_at(mut self, data_dir: &Path) -> Self {
        if self.cache.dir.is_relative() {
            self.cache.dir = data_dir.join(&self.cache.dir);
        }
        if let Some(path) = self.database.url.strip_prefix("sqlite://") {
            let path = Path::new(path);
            if path.is_relative() && !self.database.url.contains(":memory:") {
                self.database.url = format!("sqlite://{}", data_dir.join(path).display());
            }
        }
        self
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        for (name, value) in [
            ("site.base_url", &self.site.base_url),
            ("site.jobs_url", &self.site.jobs_url),
            ("site.employers_json_url", &self.site.employers_json_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| AppError::validation(format!("{name} is not a valid url: {e}")))?;
        }
        for (name, value) in [
            ("site.job_url_template", &self.site.job_url_template),
            ("site.employer_url_template", &self.site.employer_url_template),
            ("site.review_url_template", &self.site.review_url_template),
        ] {
            if !value.contains("{}") {
                return Err(AppError::validation(format!(
                    "{name} must contain a {{}} placeholder"
                )));
            }
        }
        if self.cache.freshness_hours == 0 {
            return Err(AppError::validation("cache.freshness_hours must be > 0"));
        }
        if self.database.url.trim().is_empty() {
            return Err(AppError::validation("database.url is empty"));
        }
        Ok(())
    }
}

/// Urls and formats of the job site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// First page of the job feed
    #[serde(default = "defaults::jobs_url")]
    pub jobs_url: String,

    #[serde(default = "defaults::employers_json_url")]
    pub employers_json_url: String,

    /// Job detail page, `{}` is the job code
    #[serde(default = "defaults::job_url_template")]
    pub job_url_template: String,

    /// Employer page, `{}` is the employer code
    #[serde(default = "defaults::employer_url_template")]
    pub employer_url_template: String,

    /// First review page, `{}` is the employer code
    #[serde(default = "defaults::review_url_template")]
    pub review_url_template: String,

    /// chrono format of "last post" timestamps
    #[serde(default = "defaults::datetime_format")]
    pub datetime_format: String,
}

impl SiteConfig {
    pub fn job_url(&self, code: &str) -> String {
        self.job_url_template.replace("{}", code)
    }

    pub fn employer_url(&self, code: &str) -> String {
        self.employer_url_template.replace("{}", code)
    }

    pub fn review_url(&self, code: &str) -> String {
        self.review_url_template.replace("{}", code)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            jobs_url: defaults::jobs_url(),
            employers_json_url: defaults::employers_json_url(),
            job_url_template: defaults::job_url_template(),
            employer_url_template: defaults::employer_url_template(),
            review_url_template: defaults::review_url_template(),
            datetime_format: defaults::datetime_format(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Sleep between detail page downloads in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Extra headers sent with every request
    #[serde(default = "defaults::headers")]
    pub headers: BTreeMap<String, String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            headers: defaults::headers(),
        }
    }
}

/// JSON cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "defaults::cache_dir")]
    pub dir: PathBuf,

    /// Maximum age difference between a cached record and the feed
    #[serde(default = "defaults::freshness_hours")]
    pub freshness_hours: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: defaults::cache_dir(),
            freshness_hours: defaults::freshness_hours(),
        }
    }
}

/// Relational store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "defaults::database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: defaults::database_url(),
        }
    }
}

mod defaults {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    // Site defaults
    pub fn base_url() -> String {
        "https://itviec.com".into()
    }
    pub fn jobs_url() -> String {
        "https://itviec.com/it-jobs".into()
    }
    pub fn employers_json_url() -> String {
        "https://itviec.com/api/v1/employers.json".into()
    }
    pub fn job_url_template() -> String {
        "https://itviec.com/it-jobs/{}".into()
    }
    pub fn employer_url_template() -> String {
        "https://itviec.com/companies/{}".into()
    }
    pub fn review_url_template() -> String {
        "https://itviec.com/companies/{}/review".into()
    }
    pub fn datetime_format() -> String {
        "%Y-%m-%d %H:%M:%S %z".into()
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; itviec-scraper/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        700
    }
    pub fn headers() -> BTreeMap<String, String> {
        BTreeMap::from([("X-Requested-With".to_string(), "XMLHttpRequest".to_string())])
    }

    // Storage defaults
    pub fn cache_dir() -> PathBuf {
        PathBuf::from("cache")
    }
    pub fn freshness_hours() -> u32 {
        24
    }
    pub fn database_url() -> String {
        "sqlite://itviec.sqlite".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_template_without_placeholder() {
        let mut config = Config::default();
        config.site.employer_url_template = "https://itviec.com/companies".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            request_delay_ms = 0

            [cache]
            freshness_hours = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.crawler.request_delay_ms, 0);
        assert_eq!(config.crawler.timeout_secs, 30);
        assert_eq!(config.cache.freshness_hours, 12);
        assert_eq!(config.site.base_url, "https://itviec.com");
        assert_eq!(
            config.crawler.headers.get("X-Requested-With").map(String::as_str),
            Some("XMLHttpRequest")
        );
    }

    #[test]
    fn url_templates_fill_code() {
        let site = SiteConfig::default();
        assert_eq!(site.employer_url("acme"), "https://itviec.com/companies/acme");
        assert_eq!(
            site.review_url("acme"),
            "https://itviec.com/companies/acme/review"
        );
    }

    #[test]
    fn rooted_at_resolves_relative_paths() {
        let config = Config::default().rooted_at(Path::new("/data"));
        assert_eq!(config.cache.dir, PathBuf::from("/data/cache"));
        assert_eq!(config.database.url, "sqlite:///data/itviec.sqlite");
    }

    #[test]
    fn rooted_at_keeps_memory_database() {
        let mut config = Config::default();
        config.database.url = "sqlite::memory:".to_string();
        let config = config.rooted_at(Path::new("/data"));
        assert_eq!(config.database.url, "sqlite::memory:");
    }
}
