//! Built-in blog templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping stays on for every
//! `.html` template: plain strings are always escaped, and only values that
//! arrive as [`TrustedHtml`](crate::helpers::TrustedHtml) are emitted with
//! `| safe`.

use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::error::Result;
use crate::helpers::{post_path, TrustedHtml};

/// Template renderer with the embedded blog theme
pub struct TemplateRenderer {
    tera: Tera,
    site_title: String,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new(site_title: &str) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("blog/layout.html")),
            ("index.html", include_str!("blog/index.html")),
            ("post.html", include_str!("blog/post.html")),
            ("loading.html", include_str!("blog/loading.html")),
            ("not_found.html", include_str!("blog/not_found.html")),
            ("error.html", include_str!("blog/error.html")),
            ("partials/header.html", include_str!("blog/partials/header.html")),
        ])?;

        tera.register_filter("post_path", post_path_filter);

        Ok(Self {
            tera,
            site_title: site_title.to_string(),
        })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        let mut context = context.clone();
        context.insert("site_title", &self.site_title);
        Ok(self.tera.render(template_name, &context)?)
    }

    /// Interim page served while a fallback route is generated
    pub fn render_loading(&self) -> Result<String> {
        self.render("loading.html", &Context::new())
    }

    pub fn render_not_found(&self) -> Result<String> {
        self.render("not_found.html", &Context::new())
    }

    /// Page shown while the content API cannot serve a route
    pub fn render_unavailable(&self) -> Result<String> {
        self.render("error.html", &Context::new())
    }
}

/// Tera filter: uid -> detail route
fn post_path_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let uid = tera::try_get_value!("post_path", "value", String, value);
    Ok(tera::Value::String(post_path(&uid)))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SummaryView {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub heading: String,
    pub html: TrustedHtml,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailView {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub banner_url: String,
    pub author: String,
    pub date: Option<String>,
    pub date_iso: Option<String>,
    pub reading_time: usize,
    pub sections: Vec<SectionView>,
}
