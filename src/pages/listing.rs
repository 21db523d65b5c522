//! Home page: the post listing with cursor pagination

use async_trait::async_trait;
use tera::Context;

use super::{GenerationContext, PageProps, StaticPage};
use crate::config::{LoadMoreDate, SiteConfig};
use crate::content::{PostSummary, PostSummaryData, PostsPagination};
use crate::error::{BlogError, Result};
use crate::helpers::DateFormatter;
use crate::pages::preview::EXIT_PREVIEW_ROUTE;
use crate::prismic::{Client, Document, Predicate, QueryOptions, POSTS_TYPE};
use crate::templates::{SummaryView, TemplateRenderer};

/// Fields the listing needs; `uid` always comes back with the document
const SUMMARY_FIELDS: [&str; 3] = ["posts.title", "posts.subtitle", "posts.author"];

/// Props of the home page
#[derive(Debug, Clone)]
pub struct ListingProps {
    pub posts_pagination: PostsPagination,
    pub preview: bool,
}

/// The listing at `/`
#[derive(Debug, Clone)]
pub struct ListingPage {
    page_size: u32,
    dates: DateFormatter,
    /// Whether `/api/load-more` answers next to the page
    load_more: bool,
}

impl ListingPage {
    /// A listing without the "load more" control, as written to static files
    pub fn new(page_size: u32, dates: DateFormatter) -> Self {
        Self {
            page_size,
            dates,
            load_more: false,
        }
    }

    /// Offer the "load more" control; only valid when the server handles
    /// `/api/load-more`
    pub fn with_load_more(mut self, enabled: bool) -> Self {
        self.load_more = enabled;
        self
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(config.listing.page_size, DateFormatter::from_config(config))
    }

    /// First page of posts, in backend order
    pub async fn initial_load(&self, cx: &GenerationContext) -> Result<PostsPagination> {
        let response = cx
            .client
            .query::<PostSummaryData>(
                &cx.reference,
                &[Predicate::at("document.type", POSTS_TYPE)],
                &QueryOptions::new()
                    .fetch(SUMMARY_FIELDS)
                    .page_size(self.page_size),
            )
            .await?;

        Ok(PostsPagination {
            next_page: response.next_page,
            results: response
                .results
                .into_iter()
                .map(PostSummary::from_document)
                .collect(),
        })
    }
}

#[async_trait]
impl StaticPage for ListingPage {
    type Params = ();
    type Props = ListingProps;

    async fn paths(&self, _cx: &GenerationContext) -> Result<Vec<()>> {
        Ok(vec![()])
    }

    async fn props(&self, cx: &GenerationContext, _params: &()) -> Result<PageProps<ListingProps>> {
        let posts_pagination = self.initial_load(cx).await?;
        tracing::debug!(
            posts = posts_pagination.results.len(),
            more = posts_pagination.next_page.is_some(),
            "loaded listing"
        );
        Ok(PageProps::fixed(ListingProps {
            posts_pagination,
            preview: cx.preview,
        }))
    }

    fn render(&self, renderer: &TemplateRenderer, props: &ListingProps) -> Result<String> {
        let mut context = Context::new();
        context.insert("posts", &normalize(&props.posts_pagination.results, &self.dates));
        context.insert("next_page", &props.posts_pagination.next_page);
        context.insert("load_more", &self.load_more);
        context.insert("preview", &props.preview);
        context.insert("exit_preview_route", EXIT_PREVIEW_ROUTE);
        renderer.render("index.html", &context)
    }

    fn route(&self, _params: &()) -> String {
        "/".to_string()
    }
}

/// Build the display rows for the listing.
///
/// Raw timestamps become "15 mar 2021". Values that do not parse were
/// already formatted by [`Listing::load_more`] and pass through unchanged.
/// The summaries themselves are not modified.
pub fn normalize(posts: &[PostSummary], dates: &DateFormatter) -> Vec<SummaryView> {
    posts
        .iter()
        .map(|post| SummaryView {
            uid: post.uid.clone(),
            title: post.data.title.clone(),
            subtitle: post.data.subtitle.clone(),
            author: post.data.author.clone(),
            date: post
                .first_publication_date
                .as_deref()
                .map(|raw| dates.short_from_raw(raw).unwrap_or_else(|| raw.to_string())),
        })
        .collect()
}

/// Map a next-page result, formatting the configured timestamp in long form
pub fn summary_from_next_page(
    doc: Document<PostSummaryData>,
    source: LoadMoreDate,
    dates: &DateFormatter,
) -> PostSummary {
    let date = match source {
        LoadMoreDate::LastPublication => doc.last_publication_date,
        LoadMoreDate::FirstPublication => doc.first_publication_date,
    };
    PostSummary {
        uid: doc.uid_or_id().to_string(),
        first_publication_date: date.map(|d| dates.long(&d)),
        data: doc.data,
    }
}

/// Listing state that grows as more pages are loaded
#[derive(Debug, Clone)]
pub struct Listing {
    posts: Vec<PostSummary>,
    next_page: Option<String>,
    date_source: LoadMoreDate,
    dates: DateFormatter,
}

impl Listing {
    pub fn new(pagination: PostsPagination, date_source: LoadMoreDate, dates: DateFormatter) -> Self {
        Self {
            posts: pagination.results,
            next_page: pagination.next_page,
            date_source,
            dates,
        }
    }

    /// A listing holding nothing yet but a cursor
    pub fn from_cursor(cursor: String, date_source: LoadMoreDate, dates: DateFormatter) -> Self {
        Self::new(
            PostsPagination {
                next_page: Some(cursor),
                results: Vec::new(),
            },
            date_source,
            dates,
        )
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    /// Fetch the next page and append it.
    ///
    /// Returns how many posts were appended. Without a cursor nothing is
    /// requested. On failure the list and the cursor stay as they were, so
    /// the same call can be retried.
    pub async fn load_more(&mut self, client: &Client) -> Result<usize> {
        let Some(cursor) = self.next_page.as_deref() else {
            return Ok(0);
        };

        let response = client
            .fetch_cursor::<PostSummaryData>(cursor)
            .await
            .map_err(|e| match e {
                BlogError::InvalidCursor(_) => e,
                other => BlogError::ClientFetchFailed(other.to_string()),
            })?;

        let appended = response.results.len();
        self.posts.extend(
            response
                .results
                .into_iter()
                .map(|doc| summary_from_next_page(doc, self.date_source, &self.dates)),
        );
        self.next_page = response.next_page;
        tracing::debug!(appended, more = self.next_page.is_some(), "loaded more posts");
        Ok(appended)
    }

    pub fn into_pagination(self) -> PostsPagination {
        PostsPagination {
            next_page: self.next_page,
            results: self.posts,
        }
    }
}
