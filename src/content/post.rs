//! Post models

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::prismic::{Document, RichTextBlock};

/// Fields of a post shown in listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummaryData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A post as shown in the listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    pub uid: String,

    /// Raw ISO timestamp after the initial load; an already formatted
    /// display string for posts appended by "load more"
    pub first_publication_date: Option<String>,

    pub data: PostSummaryData,
}

impl PostSummary {
    /// Project a search result, keeping the first publication date raw
    pub fn from_document(doc: Document<PostSummaryData>) -> Self {
        Self {
            uid: doc.uid_or_id().to_string(),
            first_publication_date: doc
                .first_publication_date
                .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true)),
            data: doc.data,
        }
    }
}

/// One page of listing results plus the cursor to the next one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostsPagination {
    /// `None` when there are no further pages
    pub next_page: Option<String>,
    pub results: Vec<PostSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub url: String,
}

/// A titled section of a post body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

/// Fields of a full post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetailData {
    pub title: String,
    pub subtitle: String,
    pub banner: Banner,
    pub author: String,
    pub content: Vec<ContentSection>,
}

/// A full post, immutable for the lifetime of a generated page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub data: PostDetailData,
}

impl PostDetail {
    pub fn from_document(doc: Document<PostDetailData>) -> Self {
        Self {
            uid: doc.uid_or_id().to_string(),
            first_publication_date: doc.first_publication_date,
            data: doc.data,
        }
    }
}
