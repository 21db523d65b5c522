//! List site content

use anyhow::Result;

use crate::content::{PostSummary, PostSummaryData};
use crate::helpers::post_path;
use crate::pages::GenerationContext;
use crate::prismic::{Predicate, QueryOptions, POSTS_TYPE};
use crate::Blog;

/// List site content by type
pub async fn run(blog: &Blog, content_type: &str) -> Result<()> {
    match content_type {
        "post" | "posts" => {
            let posts = load_posts(blog).await?;
            let dates = blog.dates();
            println!("Posts ({}):", posts.len());
            for post in posts {
                let date = post
                    .first_publication_date
                    .as_deref()
                    .and_then(|raw| dates.short_from_raw(raw))
                    .unwrap_or_else(|| "-".to_string());
                println!("  {} - {} [{}]", date, post.data.title, post.uid);
            }
        }
        "route" | "routes" => {
            let posts = load_posts(blog).await?;
            println!("Routes ({}):", posts.len() + 1);
            println!("  /");
            for post in posts {
                println!("  {}", post_path(&post.uid));
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, route", content_type);
        }
    }

    Ok(())
}

/// Every published post, in backend order
pub async fn load_posts(blog: &Blog) -> Result<Vec<PostSummary>> {
    let cx = GenerationContext::published(&blog.client).await?;
    let posts = cx
        .client
        .query_all::<PostSummaryData>(
            &cx.reference,
            &[Predicate::at("document.type", POSTS_TYPE)],
            &QueryOptions::new()
                .fetch(["posts.title", "posts.subtitle", "posts.author"])
                .page_size(100),
        )
        .await?
        .into_iter()
        .map(PostSummary::from_document)
        .collect();
    Ok(posts)
}
