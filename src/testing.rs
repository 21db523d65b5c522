//! Test fixtures: an in-process content API

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::{CmsConfig, SiteConfig};
use crate::prismic::Client;

/// Behaviour of the mock content API
#[derive(Clone, Default)]
pub struct MockCms {
    pub posts: Vec<Value>,
    pub fail_search: bool,
    pub malformed_search: bool,
}

/// A running mock with its endpoint and request log
pub struct RunningCms {
    pub endpoint: String,
    log: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl RunningCms {
    /// Query strings of every search request received so far
    pub fn requests(&self) -> Vec<HashMap<String, String>> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn search_count(&self) -> usize {
        self.requests().len()
    }

    pub fn client(&self) -> Client {
        Client::new(&CmsConfig::new(self.endpoint.clone(), None, 5)).unwrap()
    }

    pub fn blog(&self, public_dir: &std::path::Path) -> crate::Blog {
        let config = SiteConfig {
            public_dir: public_dir.to_string_lossy().to_string(),
            ..SiteConfig::default()
        };
        crate::Blog::with_client(config, std::path::PathBuf::from("."), self.client()).unwrap()
    }
}

#[derive(Clone)]
struct MockState {
    cms: MockCms,
    endpoint: String,
    log: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

/// Start the mock on an ephemeral loopback port
pub async fn mock_cms(cms: MockCms) -> RunningCms {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let endpoint = format!("http://{}/api/v2", addr);
    let log = Arc::new(Mutex::new(Vec::new()));

    let state = MockState {
        cms,
        endpoint: endpoint.clone(),
        log: log.clone(),
    };
    let app = Router::new()
        .route("/api/v2", get(api_root))
        .route("/api/v2/documents/search", get(search))
        .with_state(state);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    RunningCms { endpoint, log }
}

async fn api_root() -> Json<Value> {
    Json(json!({
        "refs": [
            {"id": "master", "ref": "master-ref", "label": "Master", "isMasterRef": true}
        ]
    }))
}

async fn search(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Ok(mut log) = state.log.lock() {
        log.push(params.clone());
    }

    if state.cms.fail_search {
        return (StatusCode::SERVICE_UNAVAILABLE, "down").into_response();
    }
    if state.cms.malformed_search {
        return (StatusCode::OK, r#"{"results": "nope"}"#).into_response();
    }

    let q = params.get("q").cloned().unwrap_or_default();
    let matching: Vec<Value> = state
        .cms
        .posts
        .iter()
        .filter(|doc| {
            if q.contains("my.posts.uid") {
                q.contains(&format!("\"{}\"", doc["uid"].as_str().unwrap_or_default()))
            } else if q.contains("document.id") {
                q.contains(&format!("\"{}\"", doc["id"].as_str().unwrap_or_default()))
            } else {
                true
            }
        })
        .cloned()
        .collect();

    let page_size: usize = params
        .get("pageSize")
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);
    let page: usize = params.get("page").and_then(|s| s.parse().ok()).unwrap_or(1);
    let start = (page - 1) * page_size;
    let results: Vec<Value> = matching.iter().skip(start).take(page_size).cloned().collect();
    let total_pages = matching.len().div_ceil(page_size);

    let next_page = if page < total_pages {
        Value::String(format!(
            "{}/documents/search?ref=master-ref&page={}&pageSize={}",
            state.endpoint,
            page + 1,
            page_size
        ))
    } else {
        Value::Null
    };

    Json(json!({
        "page": page,
        "results_per_page": page_size,
        "results_size": results.len(),
        "total_results_size": matching.len(),
        "total_pages": total_pages,
        "next_page": next_page,
        "prev_page": null,
        "results": results,
    }))
    .into_response()
}

/// A full `posts` document
pub fn post_doc(uid: &str, title: &str) -> Value {
    json!({
        "id": format!("id-{}", uid),
        "uid": uid,
        "type": "posts",
        "href": format!("https://blog.cdn.prismic.io/api/v2/documents/search?q={}", uid),
        "tags": [],
        "first_publication_date": "2021-03-15T00:00:00+0000",
        "last_publication_date": "2021-03-25T19:25:28+0000",
        "slugs": [uid],
        "lang": "pt-br",
        "data": {
            "title": title,
            "subtitle": format!("{} subtitle", title),
            "author": "Joseph Oliveira",
            "banner": {"url": "https://images.prismic.io/banner.png", "alt": null},
            "content": [
                {
                    "heading": "Proin et varius",
                    "body": [
                        {"type": "paragraph", "text": "Nullam dolor sapien", "spans": []}
                    ]
                }
            ]
        }
    })
}
