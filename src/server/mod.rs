//! HTTP server with stale-while-revalidate pages

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::{CachedPage, Lookup, PageCache, PageStatus};
use crate::content::PostsPagination;
use crate::error::BlogError;
use crate::generator::Generator;
use crate::pages::preview::{self, PreviewParams, ENTER_PREVIEW_ROUTE, EXIT_PREVIEW_ROUTE};
use crate::pages::{render_route, DetailPage, GenerationContext, Listing, ListingPage, StaticPage};
use crate::Blog;

/// How long a route whose generation failed is answered with the error page
const UNAVAILABLE_WINDOW: Duration = Duration::from_secs(30);

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    blog: Blog,
    cache: Arc<PageCache>,
    listing: Arc<ListingPage>,
    detail: Arc<DetailPage>,
}

impl AppState {
    pub fn new(blog: &Blog) -> Self {
        Self {
            blog: blog.clone(),
            cache: Arc::new(PageCache::with_capacity(blog.config.server.cache_capacity)),
            listing: Arc::new(blog.listing_page().with_load_more(true)),
            detail: Arc::new(blog.detail_page()),
        }
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// How long a missing post is remembered as 404
    fn not_found_window(&self) -> Duration {
        Duration::from_secs(self.blog.config.detail.revalidate_secs)
    }
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    let state = AppState::new(blog);
    match prerender(&state).await {
        Ok(count) => tracing::info!("Pre-rendered {} pages", count),
        Err(e) => tracing::warn!("Pre-rendering failed, pages will render on request: {}", e),
    }

    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    let public_dir = state.blog.public_dir.clone();

    Router::new()
        .route("/", get(home))
        .route("/post/:uid", get(post))
        .route("/api/load-more", get(load_more))
        .route(ENTER_PREVIEW_ROUTE, get(enter_preview))
        .route(EXIT_PREVIEW_ROUTE, get(exit_preview))
        .fallback_service(ServeDir::new(public_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Render every known route into the cache
pub async fn prerender(state: &AppState) -> crate::error::Result<usize> {
    let cx = GenerationContext::published(&state.blog.client).await?;
    let pages = Generator::new(&state.blog).render_all(&cx).await?;
    let count = pages.len();
    for page in pages {
        state
            .cache
            .insert(&page.route, CachedPage::new(page.html, PageStatus::Ok, page.revalidate))
            .await;
    }
    Ok(count)
}

async fn home(State(state): State<AppState>, jar: CookieJar) -> Response {
    let page = state.listing.clone();
    match preview::preview_ref(&jar) {
        Some(reference) => render_preview(&state, &*page, &(), reference).await,
        None => serve_cached(&state, page, ()).await,
    }
}

async fn post(State(state): State<AppState>, Path(uid): Path<String>, jar: CookieJar) -> Response {
    let page = state.detail.clone();
    match preview::preview_ref(&jar) {
        Some(reference) => render_preview(&state, &*page, &uid, reference).await,
        None => serve_cached(&state, page, uid).await,
    }
}

#[derive(Debug, Deserialize)]
struct LoadMoreParams {
    cursor: String,
}

/// Next page of the listing, formatted for appending
async fn load_more(
    State(state): State<AppState>,
    Query(params): Query<LoadMoreParams>,
) -> Result<Json<PostsPagination>, BlogError> {
    let config = &state.blog.config;
    let mut listing = Listing::from_cursor(
        params.cursor,
        config.listing.load_more_date,
        state.blog.dates(),
    );
    listing.load_more(&state.blog.client).await?;
    Ok(Json(listing.into_pagination()))
}

async fn enter_preview(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<PreviewParams>,
) -> Result<(CookieJar, Redirect), BlogError> {
    let location = preview::resolve_redirect(
        &state.blog.client,
        &params.token,
        params.document_id.as_deref(),
    )
    .await?;
    tracing::info!(location = %location, "entering preview");
    Ok(preview::enter_preview(jar, params.token, &location))
}

async fn exit_preview(jar: CookieJar) -> (CookieJar, Redirect) {
    preview::exit_preview(jar)
}

/// Serve a route from the cache, refreshing it in the background when stale.
///
/// A route that was never rendered is built inline, unless the page uses
/// fallback: then the interim loading page is returned at once and the route
/// renders in the background.
async fn serve_cached<P: StaticPage>(state: &AppState, page: Arc<P>, params: P::Params) -> Response {
    let route = page.route(&params);

    match state.cache.lookup(&route).await {
        Lookup::Fresh(cached) => cached_response(cached),
        Lookup::Stale(cached) => {
            spawn_refresh(state, page, params, route);
            cached_response(cached)
        }
        Lookup::Missing if page.fallback() => {
            spawn_refresh(state, page, params, route);
            match state.blog.renderer.render_loading() {
                Ok(html) => Html(html).into_response(),
                Err(e) => e.into_response(),
            }
        }
        Lookup::Missing => match regenerate(state, &*page, &params, &route).await {
            Ok(cached) => cached_response(cached),
            Err(e) => e.into_response(),
        },
    }
}

fn spawn_refresh<P: StaticPage>(state: &AppState, page: Arc<P>, params: P::Params, route: String) {
    let state = state.clone();
    tokio::spawn(async move {
        if !state.cache.begin_refresh(&route).await {
            return;
        }
        if let Err(e) = regenerate(&state, &*page, &params, &route).await {
            tracing::warn!(route = %route, "revalidation failed: {}", e);
            // A stale page keeps being served; a route that never rendered
            // would otherwise stay on the loading page
            if !state.cache.contains(&route) {
                cache_unavailable(&state, &route).await;
            }
        }
        state.cache.end_refresh(&route).await;
    });
}

/// Render a route against the published release and store the result
async fn regenerate<P: StaticPage>(
    state: &AppState,
    page: &P,
    params: &P::Params,
    route: &str,
) -> crate::error::Result<CachedPage> {
    let cx = GenerationContext::published(&state.blog.client).await?;

    let cached = match render_route(page, &state.blog.renderer, &cx, params).await {
        Ok(rendered) => CachedPage::new(rendered.html, PageStatus::Ok, rendered.revalidate),
        Err(BlogError::NotFound(what)) => {
            tracing::debug!(route, "not found: {}", what);
            CachedPage::new(
                state.blog.renderer.render_not_found()?,
                PageStatus::NotFound,
                Some(state.not_found_window()),
            )
        }
        Err(e) => return Err(e),
    };

    tracing::debug!(route, "regenerated");
    state.cache.insert(route, cached.clone()).await;
    Ok(cached)
}

async fn cache_unavailable(state: &AppState, route: &str) {
    match state.blog.renderer.render_unavailable() {
        Ok(html) => {
            let page = CachedPage::new(html, PageStatus::Unavailable, Some(UNAVAILABLE_WINDOW));
            state.cache.insert(route, page).await;
        }
        Err(e) => tracing::error!(route, "failed to render error page: {}", e),
    }
}

/// Preview requests bypass the cache and read the session's ref
async fn render_preview<P: StaticPage>(
    state: &AppState,
    page: &P,
    params: &P::Params,
    reference: String,
) -> Response {
    let cx = GenerationContext::preview(&state.blog.client, reference);
    match render_route(page, &state.blog.renderer, &cx, params).await {
        Ok(rendered) => Html(rendered.html).into_response(),
        Err(BlogError::NotFound(_)) => match state.blog.renderer.render_not_found() {
            Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
            Err(e) => e.into_response(),
        },
        Err(e) => e.into_response(),
    }
}

fn cached_response(cached: CachedPage) -> Response {
    let status = match cached.status {
        PageStatus::Ok => StatusCode::OK,
        PageStatus::NotFound => StatusCode::NOT_FOUND,
        PageStatus::Unavailable => StatusCode::BAD_GATEWAY,
    };
    (status, Html(cached.html)).into_response()
}

impl IntoResponse for BlogError {
    fn into_response(self) -> Response {
        let status = match self {
            BlogError::NotFound(_) => StatusCode::NOT_FOUND,
            BlogError::InvalidCursor(_) => StatusCode::BAD_REQUEST,
            BlogError::BackendUnavailable { .. }
            | BlogError::MalformedResponse { .. }
            | BlogError::ClientFetchFailed(_)
            | BlogError::MissingRef => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{mock_cms, post_doc, MockCms, RunningCms};
    use tempfile::TempDir;

    struct TestApp {
        url: String,
        state: AppState,
        http: reqwest::Client,
        _public: TempDir,
    }

    impl TestApp {
        async fn get(&self, path: &str) -> (StatusCode, String) {
            let response = self
                .http
                .get(format!("{}{}", self.url, path))
                .send()
                .await
                .unwrap();
            let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
            (status, response.text().await.unwrap())
        }

        /// Poll until the background task has produced the expected page
        async fn wait_for(&self, path: &str, done: impl Fn(StatusCode, &str) -> bool) -> (StatusCode, String) {
            for _ in 0..100 {
                let (status, body) = self.get(path).await;
                if done(status, &body) {
                    return (status, body);
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            panic!("{} never settled", path);
        }

        async fn wait_for_search(&self, cms: &RunningCms, count: usize) {
            for _ in 0..100 {
                if cms.search_count() >= count {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            panic!("expected {} searches, saw {}", count, cms.search_count());
        }

        /// Wait until no background refresh of `route` is running
        async fn wait_for_refresh(&self, route: &str) {
            for _ in 0..100 {
                if self.state.cache().begin_refresh(route).await {
                    self.state.cache().end_refresh(route).await;
                    return;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            panic!("refresh of {} never finished", route);
        }
    }

    async fn spawn_app(cms: &RunningCms, prerendered: bool) -> TestApp {
        let public = TempDir::new().unwrap();
        let blog = cms.blog(public.path());
        spawn_blog(blog, public, prerendered).await
    }

    async fn spawn_blog(blog: Blog, public: TempDir, prerendered: bool) -> TestApp {
        let state = AppState::new(&blog);
        if prerendered {
            prerender(&state).await.unwrap();
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        TestApp {
            url: format!("http://{}", addr),
            state,
            http: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap(),
            _public: public,
        }
    }

    fn two_posts() -> MockCms {
        MockCms {
            posts: vec![
                post_doc("como-utilizar-hooks", "Como utilizar Hooks"),
                post_doc("criando-um-app-cra-do-zero", "Criando um app CRA do zero"),
            ],
            ..MockCms::default()
        }
    }

    #[tokio::test]
    async fn test_prerendered_pages_come_from_cache() {
        let cms = mock_cms(two_posts()).await;
        let app = spawn_app(&cms, true).await;
        let searches = cms.search_count();

        let (status, body) = app.get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Como utilizar Hooks"));

        let (status, body) = app.get("/post/criando-um-app-cra-do-zero").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>Criando um app CRA do zero</h1>"));

        assert_eq!(cms.search_count(), searches);
    }

    #[tokio::test]
    async fn test_fallback_serves_loading_then_content() {
        let cms = mock_cms(two_posts()).await;
        let app = spawn_app(&cms, false).await;

        let (status, body) = app.get("/post/como-utilizar-hooks").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Carregando..."));
        assert!(!body.contains("Proin et varius"));

        let (_, body) = app
            .wait_for("/post/como-utilizar-hooks", |_, body| !body.contains("Carregando..."))
            .await;
        assert!(body.contains("<h1>Como utilizar Hooks</h1>"));
        assert!(body.contains("Proin et varius"));
    }

    #[tokio::test]
    async fn test_fallback_unknown_post_becomes_404() {
        let cms = mock_cms(two_posts()).await;
        let app = spawn_app(&cms, false).await;

        let (status, body) = app.get("/post/missing").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Carregando..."));

        let (_, body) = app
            .wait_for("/post/missing", |status, _| status == StatusCode::NOT_FOUND)
            .await;
        assert!(body.contains("404"));
    }

    #[tokio::test]
    async fn test_fallback_backend_failure_becomes_502() {
        let cms = mock_cms(MockCms {
            fail_search: true,
            ..two_posts()
        })
        .await;
        let app = spawn_app(&cms, false).await;

        let (status, body) = app.get("/post/como-utilizar-hooks").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Carregando..."));

        let (_, body) = app
            .wait_for("/post/como-utilizar-hooks", |status, _| {
                status == StatusCode::BAD_GATEWAY
            })
            .await;
        assert!(body.contains("Não foi possível carregar"));
        assert!(!body.contains("http-equiv=\"refresh\""));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_page() {
        let cms = mock_cms(MockCms {
            fail_search: true,
            ..two_posts()
        })
        .await;
        let app = spawn_app(&cms, false).await;
        let route = "/post/como-utilizar-hooks";
        app.state
            .cache()
            .insert(
                route,
                CachedPage::new("old copy".into(), PageStatus::Ok, Some(Duration::ZERO)),
            )
            .await;

        let (status, body) = app.get(route).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "old copy");

        app.wait_for_search(&cms, 1).await;
        app.wait_for_refresh(route).await;
        let (status, body) = app.get(route).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "old copy");
    }

    #[tokio::test]
    async fn test_cache_is_bounded() {
        let cms = mock_cms(two_posts()).await;
        let public = TempDir::new().unwrap();
        let mut blog = cms.blog(public.path());
        blog.config.server.cache_capacity = 5;
        let app = spawn_blog(blog, public, false).await;

        let routes: Vec<String> = (0..40).map(|i| format!("/post/junk-{}", i)).collect();
        for route in &routes {
            let (_, body) = app.get(route).await;
            assert!(body.contains("Carregando..."));
        }
        app.wait_for_search(&cms, routes.len()).await;
        for route in &routes {
            app.wait_for_refresh(route).await;
        }

        assert!(app.state.cache().entry_count().await <= 5);
    }

    #[tokio::test]
    async fn test_served_home_offers_load_more() {
        let cms = mock_cms(two_posts()).await;
        let app = spawn_app(&cms, false).await;

        let (status, body) = app.get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Carregar mais posts"));
        assert!(body.contains("/api/load-more"));
    }

    #[tokio::test]
    async fn test_stale_page_is_served_then_refreshed() {
        let cms = mock_cms(two_posts()).await;
        let app = spawn_app(&cms, false).await;
        app.state
            .cache()
            .insert(
                "/post/como-utilizar-hooks",
                CachedPage::new("old copy".into(), PageStatus::Ok, Some(Duration::ZERO)),
            )
            .await;

        let (status, body) = app.get("/post/como-utilizar-hooks").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "old copy");

        let (_, body) = app
            .wait_for("/post/como-utilizar-hooks", |_, body| body != "old copy")
            .await;
        assert!(body.contains("<h1>Como utilizar Hooks</h1>"));
    }

    #[tokio::test]
    async fn test_load_more_endpoint() {
        let cms = mock_cms(two_posts()).await;
        let app = spawn_app(&cms, false).await;
        let cursor = format!("{}/documents/search?ref=master-ref&page=2&pageSize=1", cms.endpoint);

        let response = app
            .http
            .get(format!("{}/api/load-more", app.url))
            .query(&[("cursor", cursor.as_str())])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);

        let page: serde_json::Value = response.json().await.unwrap();
        assert_eq!(page["next_page"], serde_json::Value::Null);
        assert_eq!(page["results"][0]["uid"], "criando-um-app-cra-do-zero");
        assert_eq!(
            page["results"][0]["first_publication_date"],
            "25 de março de 2021"
        );
        assert_eq!(page["results"][0]["data"]["author"], "Joseph Oliveira");
    }

    #[tokio::test]
    async fn test_load_more_rejects_foreign_cursor() {
        let cms = mock_cms(two_posts()).await;
        let app = spawn_app(&cms, false).await;

        let response = app
            .http
            .get(format!("{}/api/load-more", app.url))
            .query(&[("cursor", "http://169.254.169.254/latest/meta-data")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        assert_eq!(cms.search_count(), 0);
    }

    #[tokio::test]
    async fn test_load_more_backend_failure() {
        let cms = mock_cms(MockCms {
            fail_search: true,
            ..MockCms::default()
        })
        .await;
        let app = spawn_app(&cms, false).await;
        let cursor = format!("{}/documents/search?page=2", cms.endpoint);

        let response = app
            .http
            .get(format!("{}/api/load-more", app.url))
            .query(&[("cursor", cursor.as_str())])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 502);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("failed to load more posts"));
    }

    #[tokio::test]
    async fn test_preview_bypasses_cache() {
        let cms = mock_cms(two_posts()).await;
        let app = spawn_app(&cms, true).await;
        let searches = cms.search_count();

        let response = app
            .http
            .get(format!("{}/", app.url))
            .header("Cookie", "io.prismic.preview=preview-ref")
            .send()
            .await
            .unwrap();
        let body = response.text().await.unwrap();
        assert!(body.contains("Sair do modo Preview"));
        assert!(cms.search_count() > searches);
        assert_eq!(cms.requests().last().unwrap()["ref"], "preview-ref");
    }

    #[tokio::test]
    async fn test_enter_and_exit_preview() {
        let cms = mock_cms(two_posts()).await;
        let app = spawn_app(&cms, false).await;

        let response = app
            .http
            .get(format!(
                "{}/api/preview?token=preview-ref&documentId=id-como-utilizar-hooks",
                app.url
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 303);
        assert_eq!(response.headers()["location"], "/post/como-utilizar-hooks");
        assert!(response.headers()["set-cookie"]
            .to_str()
            .unwrap()
            .starts_with("io.prismic.preview=preview-ref"));

        let response = app
            .http
            .get(format!("{}/api/exit-preview", app.url))
            .header("Cookie", "io.prismic.preview=preview-ref")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 303);
        assert_eq!(response.headers()["location"], "/");
        assert!(response.headers()["set-cookie"]
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));
    }

    #[test]
    fn test_error_status_mapping() {
        let status = |e: BlogError| e.into_response().status();
        assert_eq!(status(BlogError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(BlogError::InvalidCursor("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(BlogError::ClientFetchFailed("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status(BlogError::MissingRef), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status(BlogError::Config("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
