//! Generator module - renders every static route and writes it under `public/`

use anyhow::Result;
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

use crate::error::BlogError;
use crate::pages::{render_route, GenerationContext, RenderedPage, StaticPage};
use crate::Blog;

/// Static site generator over the blog's pages
pub struct Generator {
    blog: Blog,
}

impl Generator {
    pub fn new(blog: &Blog) -> Self {
        Self { blog: blog.clone() }
    }

    /// Render every page against the published release and write it out.
    ///
    /// Any failed load aborts the whole generation. Returns the number of
    /// files written.
    pub async fn generate(&self) -> Result<usize> {
        let cx = GenerationContext::published(&self.blog.client).await?;
        tracing::debug!(reference = %cx.reference, "using master ref");

        let pages = self.render_all(&cx).await?;

        tokio::fs::create_dir_all(&self.blog.public_dir).await?;
        for page in &pages {
            self.write_page(page).await?;
        }

        Ok(pages.len())
    }

    /// Render the listing and every enumerated post
    pub async fn render_all(&self, cx: &GenerationContext) -> crate::error::Result<Vec<RenderedPage>> {
        let mut rendered = self.render_page(&self.blog.listing_page(), cx).await?;
        rendered.extend(self.render_page(&self.blog.detail_page(), cx).await?);
        Ok(rendered)
    }

    /// Render each path of one page, one after the other
    pub async fn render_page<P: StaticPage>(
        &self,
        page: &P,
        cx: &GenerationContext,
    ) -> crate::error::Result<Vec<RenderedPage>> {
        let mut rendered = Vec::new();
        for params in page.paths(cx).await? {
            let out = render_route(page, &self.blog.renderer, cx, &params).await?;
            tracing::debug!(route = %out.route, "rendered");
            rendered.push(out);
        }
        Ok(rendered)
    }

    async fn write_page(&self, page: &RenderedPage) -> Result<()> {
        let output_path = output_path(&self.blog.public_dir, &page.route)?;
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&output_path, &page.html).await?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }
}

/// File a route is written to: `/` -> `index.html`, `/post/a` -> `post/a/index.html`
pub fn output_path(public_dir: &Path, route: &str) -> crate::error::Result<PathBuf> {
    let mut path = public_dir.to_path_buf();
    for segment in route.split('/').filter(|s| !s.is_empty()) {
        let decoded = percent_decode_str(segment).decode_utf8_lossy();
        if decoded == "." || decoded == ".." || decoded.contains(['/', '\\']) {
            return Err(BlogError::Config(format!("route {} cannot be written to disk", route)));
        }
        path.push(decoded.as_ref());
    }
    Ok(path.join("index.html"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{mock_cms, post_doc, MockCms};
    use tempfile::TempDir;

    #[test]
    fn test_output_path() {
        let public = Path::new("/srv/public");
        assert_eq!(output_path(public, "/").unwrap(), public.join("index.html"));
        assert_eq!(
            output_path(public, "/post/como-utilizar-hooks").unwrap(),
            public.join("post/como-utilizar-hooks/index.html")
        );
        assert_eq!(
            output_path(public, "/post/a%20b").unwrap(),
            public.join("post/a b/index.html")
        );
        assert!(output_path(public, "/post/..").is_err());
        assert!(output_path(public, "/post/a%2Fb").is_err());
    }

    #[tokio::test]
    async fn test_generate_writes_every_page() {
        let cms = mock_cms(MockCms {
            posts: vec![
                post_doc("como-utilizar-hooks", "Como utilizar Hooks"),
                post_doc("criando-um-app-cra-do-zero", "Criando um app CRA do zero"),
            ],
            ..MockCms::default()
        })
        .await;
        let tmp = TempDir::new().unwrap();
        let public = tmp.path().join("public");
        let blog = cms.blog(&public);

        let written = Generator::new(&blog).generate().await.unwrap();
        assert_eq!(written, 3);

        let index = std::fs::read_to_string(public.join("index.html")).unwrap();
        assert!(index.contains("Como utilizar Hooks"));
        assert!(index.contains("15 mar 2021"));
        // page size 1 leaves the second post behind the cursor
        assert!(!index.contains("Criando um app CRA do zero"));
        assert!(!index.contains("Carregar mais posts"));
        assert!(!index.contains("/api/load-more"));

        let post = std::fs::read_to_string(
            public.join("post/criando-um-app-cra-do-zero/index.html"),
        )
        .unwrap();
        assert!(post.contains("<h1>Criando um app CRA do zero</h1>"));
        assert!(post.contains("1 min"));
    }

    #[tokio::test]
    async fn test_backend_failure_aborts() {
        let cms = mock_cms(MockCms {
            posts: vec![post_doc("a", "A")],
            fail_search: true,
            ..MockCms::default()
        })
        .await;
        let tmp = TempDir::new().unwrap();
        let public = tmp.path().join("public");
        let blog = cms.blog(&public);

        let err = Generator::new(&blog).generate().await.unwrap_err();
        assert!(err.downcast_ref::<BlogError>().is_some_and(BlogError::is_backend));
        assert!(!public.join("index.html").exists());
    }
}
