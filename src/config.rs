use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// SECOP II processes dataset on datos.gov.co
pub const DEFAULT_ENDPOINT: &str = "https://www.datos.gov.co/api/v3/views/p6dx-8zbt/query.json";
pub const DEFAULT_PAGE_SIZE: usize = 1000;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Environment variable holding the Socrata application token
pub const APP_TOKEN_ENV: &str = "SECOP_APP_TOKEN";

/// Sort order for rendered records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "ASC" => Ok(SortOrder::Ascending),
            "DESC" => Ok(SortOrder::Descending),
            _ => Err(Error::Config(format!(
                "Invalid sort order '{}', expected ASC or DESC",
                s
            ))),
        }
    }
}

/// Configuration for the retriever and the CLI
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub app_token: Option<String>,
    pub page_size: usize,
    pub request_timeout: Duration,
    /// Deadline for a whole retrieval, across all pages
    pub deadline: Option<Duration>,
    /// Fail on non-array response bodies instead of treating them as the last page
    pub strict_responses: bool,
    pub sort_order: SortOrder,
    pub limit: Option<usize>,
}

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            app_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            deadline: None,
            strict_responses: false,
            sort_order: SortOrder::Descending,
            limit: None,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Config("Page size must be greater than zero".to_string()));
        }

        if reqwest::Url::parse(&self.endpoint).is_err() {
            return Err(Error::Config(format!(
                "Endpoint is not a valid URL: {}",
                self.endpoint
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config("Request timeout must be greater than zero".to_string()));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// On-disk form of the configuration (`secopbot.yml`). Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub endpoint: Option<String>,
    pub app_token: Option<String>,
    pub page_size: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub deadline_secs: Option<u64>,
    pub strict_responses: Option<bool>,
    pub sort: Option<String>,
    pub limit: Option<usize>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }
}

/// Builder for creating configurations
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the values in a config file
    pub fn from_file(file: ConfigFile) -> Result<Self> {
        let mut builder = Self::new();
        if let Some(endpoint) = file.endpoint {
            builder = builder.endpoint(endpoint);
        }
        if let Some(token) = file.app_token {
            builder = builder.app_token(token);
        }
        if let Some(size) = file.page_size {
            builder = builder.page_size(size);
        }
        if let Some(secs) = file.request_timeout_secs {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = file.deadline_secs {
            builder = builder.deadline(Duration::from_secs(secs));
        }
        if let Some(strict) = file.strict_responses {
            builder = builder.strict_responses(strict);
        }
        if let Some(sort) = file.sort {
            builder = builder.sort_order_str(&sort)?;
        }
        if let Some(limit) = file.limit {
            builder = builder.limit(limit);
        }
        Ok(builder)
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn app_token(mut self, token: impl Into<String>) -> Self {
        self.config.app_token = Some(token.into());
        self
    }

    /// Fill the app token from `SECOP_APP_TOKEN` if none was set explicitly
    pub fn app_token_from_env(mut self) -> Self {
        if self.config.app_token.is_none() {
            self.config.app_token = std::env::var(APP_TOKEN_ENV).ok().filter(|t| !t.is_empty());
        }
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.config.deadline = Some(deadline);
        self
    }

    pub fn strict_responses(mut self, strict: bool) -> Self {
        self.config.strict_responses = strict;
        self
    }

    /// Set the sort order
    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.config.sort_order = order;
        self
    }

    /// Set sort order from `ASC` / `DESC`, case-insensitive
    pub fn sort_order_str(mut self, order: &str) -> Result<Self> {
        self.config.sort_order = order.parse()?;
        Ok(self)
    }

    /// Set the limit
    pub fn limit(mut self, limit: usize) -> Self {
        self.config.limit = Some(limit);
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.page_size, 1000);
        assert_eq!(config.sort_order, SortOrder::Descending);
        assert!(!config.strict_responses);
        assert!(config.deadline.is_none());
    }

    #[test]
    fn test_rejects_zero_page_size() {
        let err = ConfigBuilder::new().page_size(0).build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        assert!(ConfigBuilder::new().endpoint("not a url").build().is_err());
    }

    #[test]
    fn test_sort_order_from_str() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Ascending);
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Descending);
        assert!(matches!("whatever".parse::<SortOrder>(), Err(Error::Config(_))));

        let err = ConfigBuilder::new().sort_order_str("ascending").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: Invalid sort order 'ascending', expected ASC or DESC"
        );
    }

    #[test]
    fn test_config_file() {
        let file = ConfigFile::parse(
            "app_token: abc123\npage_size: 500\nrequest_timeout_secs: 5\nstrict_responses: true\nsort: ASC\n",
        )
        .unwrap();
        let config = ConfigBuilder::from_file(file).unwrap().build().unwrap();
        assert_eq!(config.app_token.as_deref(), Some("abc123"));
        assert_eq!(config.page_size, 500);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(config.strict_responses);
        assert_eq!(config.sort_order, SortOrder::Ascending);
    }

    #[test]
    fn test_config_file_rejects_misspelled_sort() {
        let file = ConfigFile::parse("sort: DSEC\n").unwrap();
        let err = ConfigBuilder::from_file(file).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("DSEC")));
    }

    #[test]
    fn test_config_file_rejects_unknown_keys() {
        assert!(ConfigFile::parse("pagesize: 10\n").is_err());
    }
}
