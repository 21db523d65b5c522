//! Site configuration (_config.yml) and CMS credentials

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable holding the content API endpoint
pub const ENDPOINT_ENV: &str = "PRISMIC_API_ENDPOINT";

/// Environment variable holding the content API access token
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    pub timezone: String,

    // Directory
    pub public_dir: String,

    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub detail: DetailConfig,
    #[serde(default)]
    pub cms: CmsOptions,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            language: "pt-BR".to_string(),
            timezone: "UTC".to_string(),
            public_dir: "public".to_string(),
            listing: ListingConfig::default(),
            detail: DetailConfig::default(),
            cms: CmsOptions::default(),
            server: ServerConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would only fail later at render time
    pub fn validate(&self) -> Result<()> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow::anyhow!("invalid timezone {:?}: {}", self.timezone, e))?;
        if self.listing.page_size == 0 {
            anyhow::bail!("listing.page_size must be at least 1");
        }
        if self.server.cache_capacity == 0 {
            anyhow::bail!("server.cache_capacity must be at least 1");
        }
        if self.detail.words_per_minute == 0 {
            anyhow::bail!("detail.words_per_minute must be at least 1");
        }
        Ok(())
    }

    /// Parsed timezone used for every displayed date
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }
}

/// Which timestamp the "load more" path displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMoreDate {
    /// Last publication date (default)
    LastPublication,
    /// First publication date, consistent with the initial page
    FirstPublication,
}

/// Listing page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: u32,
    pub load_more_date: LoadMoreDate,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: 1,
            load_more_date: LoadMoreDate::LastPublication,
        }
    }
}

/// Detail page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailConfig {
    /// Seconds a generated post stays fresh before a background refresh
    pub revalidate_secs: u64,
    pub words_per_minute: usize,
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self {
            revalidate_secs: 60 * 30,
            words_per_minute: 200,
        }
    }
}

/// HTTP client options for the content API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsOptions {
    pub timeout_secs: u64,
}

impl Default for CmsOptions {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
    /// Most rendered routes kept in memory
    pub cache_capacity: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "localhost".to_string(),
            port: 3000,
            cache_capacity: 1000,
        }
    }
}

/// Content API credentials, read once at process start
#[derive(Debug, Clone)]
pub struct CmsConfig {
    pub endpoint: String,
    pub access_token: Option<String>,
    pub timeout_secs: u64,
}

impl CmsConfig {
    /// Read endpoint and access token from the environment
    pub fn from_env(options: &CmsOptions) -> Result<Self> {
        let endpoint = std::env::var(ENDPOINT_ENV)
            .with_context(|| format!("{} was not found", ENDPOINT_ENV))?;
        let access_token = std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty());

        Ok(Self::new(endpoint, access_token, options.timeout_secs))
    }

    pub fn new(endpoint: String, access_token: Option<String>, timeout_secs: u64) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token,
            timeout_secs,
        }
    }
}
