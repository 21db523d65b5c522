//! Prismic content API: client, query predicates, documents and rich text

mod client;
mod document;
mod predicate;
pub mod richtext;

pub use client::Client;
pub use document::{ApiRef, ApiRoot, Document, NoData, SearchResponse};
pub use predicate::{encode_query, Predicate, QueryOptions};
pub use richtext::RichTextBlock;

/// Custom type holding blog posts
pub const POSTS_TYPE: &str = "posts";
