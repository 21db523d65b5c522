//! Helper functions shared by page loaders and templates

mod date;
mod html;

pub use date::*;
pub use html::*;

use chrono::{DateTime, Locale, Utc};
use chrono_tz::Tz;

use crate::config::SiteConfig;

/// Locale-aware date formatting bound to a site configuration
#[derive(Debug, Clone, Copy)]
pub struct DateFormatter {
    locale: Locale,
    tz: Tz,
}

impl DateFormatter {
    pub fn new(locale: Locale, tz: Tz) -> Self {
        Self { locale, tz }
    }

    /// Build from the site's language and timezone
    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(locale_for(&config.language), config.tz())
    }

    /// "15 mar 2021"
    pub fn short(&self, date: &DateTime<Utc>) -> String {
        format_date_localized(date, SHORT_DATE, self.locale, self.tz)
    }

    /// "15 de março de 2021"
    pub fn long(&self, date: &DateTime<Utc>) -> String {
        format_date_localized(date, LONG_DATE, self.locale, self.tz)
    }

    /// Reformat a raw API timestamp; unparseable input yields `None`
    pub fn short_from_raw(&self, raw: &str) -> Option<String> {
        parse_timestamp(raw).map(|d| self.short(&d))
    }
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self::new(Locale::pt_BR, chrono_tz::UTC)
    }
}
