//! Preview mode: entering a draft session and leaving it

use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;

use crate::error::{BlogError, Result};
use crate::helpers::post_path;
use crate::prismic::{Client, NoData, POSTS_TYPE};

/// Cookie carrying the preview ref
pub const PREVIEW_COOKIE: &str = "io.prismic.preview";

pub const ENTER_PREVIEW_ROUTE: &str = "/api/preview";
pub const EXIT_PREVIEW_ROUTE: &str = "/api/exit-preview";

/// Query of the preview entry link
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewParams {
    pub token: String,
    #[serde(rename = "documentId")]
    pub document_id: Option<String>,
}

/// The preview ref of the current request, if any
pub fn preview_ref(jar: &CookieJar) -> Option<String> {
    jar.get(PREVIEW_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Where to land after entering preview.
///
/// A `posts` document opens its detail page. Anything else, or an id the
/// preview release does not know, opens the listing.
pub async fn resolve_redirect(
    client: &Client,
    reference: &str,
    document_id: Option<&str>,
) -> Result<String> {
    let Some(id) = document_id else {
        return Ok("/".to_string());
    };

    match client.get_by_id::<NoData>(reference, id).await {
        Ok(doc) if doc.document_type == POSTS_TYPE => Ok(post_path(doc.uid_or_id())),
        Ok(_) | Err(BlogError::NotFound(_)) => Ok("/".to_string()),
        Err(e) => Err(e),
    }
}

/// Start a preview session and redirect to `location`
pub fn enter_preview(jar: CookieJar, reference: String, location: &str) -> (CookieJar, Redirect) {
    let cookie = Cookie::build((PREVIEW_COOKIE, reference))
        .path("/")
        .http_only(true);
    (jar.add(cookie), Redirect::to(location))
}

/// End the preview session and go back to the listing
pub fn exit_preview(jar: CookieJar) -> (CookieJar, Redirect) {
    let jar = jar.remove(Cookie::build(PREVIEW_COOKIE).path("/"));
    (jar, Redirect::to("/"))
}
