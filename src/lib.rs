//! prismic-blog: a blog front-end rendered from a Prismic repository
//!
//! Posts are pulled through the content API, rendered with built-in Tera
//! templates, and either written to `public/` or served by an HTTP server
//! that revalidates pages in the background.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod pages;
pub mod prismic;
pub mod server;
pub mod templates;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{CmsConfig, SiteConfig};
use crate::helpers::DateFormatter;
use crate::pages::{DetailPage, ListingPage};
use crate::prismic::Client;
use crate::templates::TemplateRenderer;

/// The main blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Content API handle
    pub client: Client,
    pub renderer: Arc<TemplateRenderer>,
}

impl Blog {
    /// Load `_config.yml` from a directory and the CMS settings from the environment
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            SiteConfig::load(&config_path)?
        } else {
            SiteConfig::default()
        };

        let client = Client::new(&CmsConfig::from_env(&config.cms)?)?;
        Self::with_client(config, base_dir, client)
    }

    pub fn with_client(config: SiteConfig, base_dir: PathBuf, client: Client) -> Result<Self> {
        config.validate()?;
        let public_dir = base_dir.join(&config.public_dir);
        let renderer = Arc::new(TemplateRenderer::new(&config.title)?);

        Ok(Self {
            config,
            base_dir,
            public_dir,
            client,
            renderer,
        })
    }

    pub fn dates(&self) -> DateFormatter {
        DateFormatter::from_config(&self.config)
    }

    pub fn listing_page(&self) -> ListingPage {
        ListingPage::from_config(&self.config)
    }

    pub fn detail_page(&self) -> DetailPage {
        DetailPage::from_config(&self.config)
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
