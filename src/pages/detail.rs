//! Post detail page at `/post/{uid}`

use async_trait::async_trait;
use chrono::SecondsFormat;
use std::time::Duration;
use tera::Context;

use super::{GenerationContext, PageProps, StaticPage};
use crate::config::SiteConfig;
use crate::content::{reading_time, PostDetail, PostDetailData};
use crate::error::Result;
use crate::helpers::{post_path, DateFormatter};
use crate::pages::preview::EXIT_PREVIEW_ROUTE;
use crate::prismic::{richtext, NoData, Predicate, QueryOptions, POSTS_TYPE};
use crate::templates::{DetailView, SectionView, TemplateRenderer};

/// Page size used while enumerating every post
const PATHS_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct DetailProps {
    pub post: PostDetail,
    pub preview: bool,
}

#[derive(Debug, Clone)]
pub struct DetailPage {
    revalidate: Duration,
    words_per_minute: usize,
    dates: DateFormatter,
    paths_page_size: u32,
}

impl DetailPage {
    pub fn new(revalidate: Duration, words_per_minute: usize, dates: DateFormatter) -> Self {
        Self {
            revalidate,
            words_per_minute,
            dates,
            paths_page_size: PATHS_PAGE_SIZE,
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(
            Duration::from_secs(config.detail.revalidate_secs),
            config.detail.words_per_minute,
            DateFormatter::from_config(config),
        )
    }

    fn view(&self, post: &PostDetail) -> DetailView {
        DetailView {
            uid: post.uid.clone(),
            title: post.data.title.clone(),
            subtitle: post.data.subtitle.clone(),
            banner_url: post.data.banner.url.clone(),
            author: post.data.author.clone(),
            date: post.first_publication_date.map(|d| self.dates.short(&d)),
            date_iso: post
                .first_publication_date
                .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true)),
            reading_time: reading_time(&post.data.content, self.words_per_minute),
            sections: post
                .data
                .content
                .iter()
                .map(|section| SectionView {
                    heading: section.heading.clone(),
                    html: richtext::as_html(&section.body),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl StaticPage for DetailPage {
    type Params = String;
    type Props = DetailProps;

    /// Every post uid, following cursors until the last page
    async fn paths(&self, cx: &GenerationContext) -> Result<Vec<String>> {
        let uids: Vec<String> = cx
            .client
            .query_all::<NoData>(
                &cx.reference,
                &[Predicate::at("document.type", POSTS_TYPE)],
                &QueryOptions::new().page_size(self.paths_page_size),
            )
            .await?
            .iter()
            .map(|doc| doc.uid_or_id().to_string())
            .collect();

        tracing::debug!(count = uids.len(), "enumerated post paths");
        Ok(uids)
    }

    async fn props(&self, cx: &GenerationContext, uid: &String) -> Result<PageProps<DetailProps>> {
        let doc = cx
            .client
            .get_by_uid::<PostDetailData>(&cx.reference, POSTS_TYPE, uid)
            .await?;

        Ok(PageProps {
            props: DetailProps {
                post: PostDetail::from_document(doc),
                preview: cx.preview,
            },
            revalidate: Some(self.revalidate),
        })
    }

    fn render(&self, renderer: &TemplateRenderer, props: &DetailProps) -> Result<String> {
        let mut context = Context::new();
        context.insert("post", &self.view(&props.post));
        context.insert("preview", &props.preview);
        context.insert("exit_preview_route", EXIT_PREVIEW_ROUTE);
        renderer.render("post.html", &context)
    }

    fn route(&self, uid: &String) -> String {
        post_path(uid)
    }

    fn fallback(&self) -> bool {
        true
    }
}
