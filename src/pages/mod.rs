//! Page loaders: each page enumerates its routes, loads props, then renders
//!
//! Generation state is never global. Every load receives a
//! [`GenerationContext`] naming the client and the content ref to read from,
//! and returns its props together with how long the output stays fresh.

pub mod detail;
pub mod listing;
pub mod preview;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;
use crate::prismic::Client;
use crate::templates::TemplateRenderer;

pub use detail::DetailPage;
pub use listing::{Listing, ListingPage};

/// Where and how a page reads its content
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub client: Client,
    /// Content ref every query runs against
    pub reference: String,
    /// Whether the ref is a preview session rather than published content
    pub preview: bool,
}

impl GenerationContext {
    /// Context reading published content
    pub async fn published(client: &Client) -> Result<Self> {
        let reference = client.master_ref().await?;
        Ok(Self {
            client: client.clone(),
            reference,
            preview: false,
        })
    }

    /// Context reading a preview session's drafts
    pub fn preview(client: &Client, reference: String) -> Self {
        Self {
            client: client.clone(),
            reference,
            preview: true,
        }
    }
}

/// Loaded props and their validity window
#[derive(Debug, Clone)]
pub struct PageProps<P> {
    pub props: P,
    /// `None` keeps the page until the next full generation
    pub revalidate: Option<Duration>,
}

impl<P> PageProps<P> {
    pub fn fixed(props: P) -> Self {
        Self {
            props,
            revalidate: None,
        }
    }
}

/// A statically generated page
#[async_trait]
pub trait StaticPage: Send + Sync + 'static {
    type Params: Send + Sync + Clone + 'static;
    type Props: Send;

    /// Routes to pre-render at generation time
    async fn paths(&self, cx: &GenerationContext) -> Result<Vec<Self::Params>>;

    /// Load the data one route renders
    async fn props(
        &self,
        cx: &GenerationContext,
        params: &Self::Params,
    ) -> Result<PageProps<Self::Props>>;

    fn render(&self, renderer: &TemplateRenderer, props: &Self::Props) -> Result<String>;

    /// URL path of the route for `params`
    fn route(&self, params: &Self::Params) -> String;

    /// Whether routes missing at generation time are built on first request
    fn fallback(&self) -> bool {
        false
    }
}

/// A rendered route ready to be written or served
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub route: String,
    pub html: String,
    pub revalidate: Option<Duration>,
}

/// Load props for one route and render it
pub async fn render_route<P: StaticPage>(
    page: &P,
    renderer: &TemplateRenderer,
    cx: &GenerationContext,
    params: &P::Params,
) -> Result<RenderedPage> {
    let loaded = page.props(cx, params).await?;
    let html = page.render(renderer, &loaded.props)?;
    Ok(RenderedPage {
        route: page.route(params),
        html,
        revalidate: loaded.revalidate,
    })
}
