//! Typed responses of the content API
//!
//! Every shape is validated while deserializing; a document with missing
//! fields or an unparseable timestamp is rejected instead of being passed on
//! with holes in it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Response of the API root (`GET {endpoint}`)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRoot {
    pub refs: Vec<ApiRef>,
}

impl ApiRoot {
    /// The ref pointing at published content
    pub fn master_ref(&self) -> Option<&ApiRef> {
        self.refs.iter().find(|r| r.is_master_ref)
    }
}

/// A content release
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRef {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

/// One page of search results
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse<T> {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results_per_page: u32,
    #[serde(default)]
    pub results_size: u32,
    #[serde(default)]
    pub total_results_size: u32,
    #[serde(default)]
    pub total_pages: u32,
    /// Cursor to the next page; `None` on the last page
    pub next_page: Option<String>,
    pub prev_page: Option<String>,
    pub results: Vec<Document<T>>,
}

/// A document with typed `data`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Document<T> {
    pub id: String,
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub document_type: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub first_publication_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub last_publication_date: Option<DateTime<Utc>>,
    pub data: T,
}

impl<T> Document<T> {
    /// The uid, falling back to the document id for types without one
    pub fn uid_or_id(&self) -> &str {
        self.uid.as_deref().unwrap_or(&self.id)
    }
}

/// Document header without `data`, used when only identifiers matter
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NoData {}

/// Accepts both RFC 3339 and the API's `+0000` offset form; null stays `None`
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(value) => crate::helpers::parse_timestamp(&value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {:?}", value))),
    }
}
