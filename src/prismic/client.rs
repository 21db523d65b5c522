//! HTTP client for the content API

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use super::document::{ApiRoot, Document, SearchResponse};
use super::predicate::{encode_query, Predicate, QueryOptions};
use crate::config::CmsConfig;
use crate::error::{BlogError, Result, WithMessage};

/// A configured handle to the content API.
///
/// Holds only connection settings; there is no retry and no caching here,
/// failures reach the caller as [`BlogError`]s.
#[derive(Clone, Debug)]
pub struct Client {
    endpoint: String,
    access_token: Option<String>,
    http: reqwest::Client,
}

impl Client {
    pub fn new(config: &CmsConfig) -> Result<Self> {
        Url::parse(&config.endpoint)
            .map_err(|e| BlogError::Config(format!("invalid endpoint {:?}: {}", config.endpoint, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("prismic-blog/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .with_message("failed to build http client")?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            access_token: config.access_token.clone(),
            http,
        })
    }

    /// Fetch the API root describing available refs
    pub async fn api_root(&self) -> Result<ApiRoot> {
        self.get_json(&self.endpoint, self.auth_params(), "api root")
            .await
    }

    /// Ref of the published content release
    pub async fn master_ref(&self) -> Result<String> {
        let root = self.api_root().await?;
        root.master_ref()
            .map(|r| r.reference.clone())
            .ok_or(BlogError::MissingRef)
    }

    /// Run a predicate search against `documents/search`
    pub async fn query<T: DeserializeOwned>(
        &self,
        reference: &str,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<SearchResponse<T>> {
        let mut params = vec![
            ("ref", reference.to_string()),
            ("q", encode_query(predicates)),
        ];
        params.extend(options.to_params());
        params.extend(self.auth_params());

        tracing::debug!(q = %encode_query(predicates), "querying content API");
        let url = format!("{}/documents/search", self.endpoint);
        self.get_json(&url, params, "search response").await
    }

    /// Run a search and follow `next_page` until the last page
    pub async fn query_all<T: DeserializeOwned>(
        &self,
        reference: &str,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<Vec<Document<T>>> {
        let mut response: SearchResponse<T> = self.query(reference, predicates, options).await?;
        let mut documents = Vec::new();
        loop {
            documents.append(&mut response.results);
            match response.next_page.take() {
                Some(cursor) => response = self.fetch_cursor(&cursor).await?,
                None => break,
            }
        }
        Ok(documents)
    }

    /// Fetch one document of a custom type by its uid
    pub async fn get_by_uid<T: DeserializeOwned>(
        &self,
        reference: &str,
        document_type: &str,
        uid: &str,
    ) -> Result<Document<T>> {
        let predicates = [Predicate::uid(document_type, uid)];
        self.query_single(reference, &predicates)
            .await?
            .ok_or_else(|| BlogError::NotFound(format!("{}/{}", document_type, uid)))
    }

    /// Fetch one document by its id, whatever its type
    pub async fn get_by_id<T: DeserializeOwned>(
        &self,
        reference: &str,
        id: &str,
    ) -> Result<Document<T>> {
        let predicates = [Predicate::at("document.id", id)];
        self.query_single(reference, &predicates)
            .await?
            .ok_or_else(|| BlogError::NotFound(format!("document {}", id)))
    }

    async fn query_single<T: DeserializeOwned>(
        &self,
        reference: &str,
        predicates: &[Predicate],
    ) -> Result<Option<Document<T>>> {
        let response: SearchResponse<T> = self
            .query(reference, predicates, &QueryOptions::new().page_size(1))
            .await?;
        Ok(response.results.into_iter().next())
    }

    /// GET a `next_page` cursor and parse it as a search response
    pub async fn fetch_cursor<T: DeserializeOwned>(&self, cursor: &str) -> Result<SearchResponse<T>> {
        let url = self.cursor_url(cursor)?;
        tracing::debug!(cursor = %url, "fetching next page");
        self.get_json(url.as_str(), Vec::new(), "next page").await
    }

    /// Check that a cursor points at this API, adding the token when absent
    pub fn cursor_url(&self, cursor: &str) -> Result<Url> {
        let mut url = Url::parse(cursor)
            .map_err(|e| BlogError::InvalidCursor(format!("{}: {}", cursor, e)))?;
        let endpoint = Url::parse(&self.endpoint)
            .map_err(|e| BlogError::Config(format!("invalid endpoint: {}", e)))?;

        if url.origin() != endpoint.origin() {
            return Err(BlogError::InvalidCursor(format!(
                "{} is not served by {}",
                cursor, self.endpoint
            )));
        }

        if let Some(ref token) = self.access_token {
            if !url.query_pairs().any(|(k, _)| k == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
        Ok(url)
    }

    fn auth_params(&self) -> Vec<(&'static str, String)> {
        self.access_token
            .iter()
            .map(|t| ("access_token", t.clone()))
            .collect()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: Vec<(&'static str, String)>,
        what: &str,
    ) -> Result<T> {
        let response = self
            .http
            .get(url)
            .query(&query)
            .send()
            .await
            .with_message(&format!("failed to request {}", what))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .with_message(&format!("failed to read {}", what))?;

        if status == StatusCode::NOT_FOUND {
            return Err(BlogError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(BlogError::BackendUnavailable {
                message: format!("{} returned {}: {}", what, status, text),
                source: None,
            });
        }

        serde_json::from_str(&text).with_message(what)
    }
}
