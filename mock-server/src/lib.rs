//! In-process stand-in for the scraping API.
//!
//! Every route checks the `token` query parameter. The root route behaves
//! like the crawling endpoint: raw HTML with crawl metadata in response
//! headers, or a JSON envelope when `format=json`. The other routes cover a
//! plain JSON document with a rate-limit field, request echoing, forced
//! status codes, slow replies, compressed pages and arbitrarily large bodies.

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::compression::CompressionLayer;
use tracing::info;
use uuid::Uuid;

/// Content type the real API uses for JSON replies.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Crawl envelope returned for `format=json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub original_status: u16,
    pub pc_status: u16,
    pub url: String,
    pub rid: Uuid,
    pub body: String,
}

/// Echo of the request as seen by the server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    /// Named so the client does not mistake the echo for an envelope.
    pub payload: String,
}

#[derive(Clone)]
pub struct AppState {
    token: Arc<String>,
    remaining: Arc<RwLock<u32>>,
}

type Params = Query<HashMap<String, String>>;

pub fn app(token: &str) -> Router {
    let state = AppState {
        token: Arc::new(token.to_string()),
        remaining: Arc::new(RwLock::new(10)),
    };
    Router::new()
        .route("/", get(crawl))
        .route("/leads", get(leads))
        .route("/echo", any(echo))
        .route("/status/{code}", get(status))
        .route("/slow", get(slow))
        .route("/compressed", get(compressed).layer(CompressionLayer::new()))
        .route("/large", get(large))
        .with_state(state)
}

pub async fn run(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    info!(addr = ?listener.local_addr().ok(), "mock scraping API listening");
    axum::serve(listener, app(token)).await
}

fn authorized(state: &AppState, params: &HashMap<String, String>) -> Result<(), Response> {
    if params.get("token").map(String::as_str) == Some(state.token.as_str()) {
        return Ok(());
    }
    let body = json!({"error": "Token is invalid"}).to_string();
    Err((StatusCode::UNAUTHORIZED, [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response())
}

fn json_reply(status: StatusCode, value: serde_json::Value) -> Response {
    (status, [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], value.to_string()).into_response()
}

fn page_for(url: &str) -> String {
    format!("<html><head><title>{url}</title></head><body>crawled</body></html>")
}

async fn crawl(State(state): State<AppState>, Query(params): Params) -> Response {
    if let Err(resp) = authorized(&state, &params) {
        return resp;
    }
    let Some(url) = params.get("url").cloned() else {
        return json_reply(StatusCode::BAD_REQUEST, json!({"error": "url is required"}));
    };

    if params.get("format").map(String::as_str) == Some("json") {
        let envelope = Envelope {
            original_status: 200,
            pc_status: 200,
            body: page_for(&url),
            url,
            rid: Uuid::new_v4(),
        };
        return json_reply(StatusCode::OK, json!(envelope));
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE.as_str(), "text/html; charset=utf-8".to_string()),
            ("original_status", "200".to_string()),
            ("pc_status", "200".to_string()),
            ("url", url.clone()),
        ],
        page_for(&url),
    )
        .into_response()
}

async fn leads(State(state): State<AppState>, Query(params): Params) -> Response {
    if let Err(resp) = authorized(&state, &params) {
        return resp;
    }
    let domain = params.get("domain").cloned().unwrap_or_default();
    let mut remaining = state.remaining.write().await;
    *remaining = remaining.saturating_sub(1);
    json_reply(
        StatusCode::OK,
        json!({
            "success": true,
            "remaining_requests": *remaining,
            "domain": domain,
            "leads": [{"email": format!("info@{domain}"), "sources": []}],
        }),
    )
}

async fn echo(
    State(state): State<AppState>,
    method: Method,
    Query(params): Params,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(resp) = authorized(&state, &params) {
        return resp;
    }
    let headers = headers
        .iter()
        .filter(|(name, _)| name.as_str().starts_with("x-"))
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let echo = Echo {
        method: method.to_string(),
        query: params,
        headers,
        payload: String::from_utf8_lossy(&body).into_owned(),
    };
    json_reply(StatusCode::OK, json!(echo))
}

async fn status(State(state): State<AppState>, Path(code): Path<u16>, Query(params): Params) -> Response {
    if let Err(resp) = authorized(&state, &params) {
        return resp;
    }
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    json_reply(status, json!({"status": code}))
}

async fn slow(State(state): State<AppState>, Query(params): Params) -> Response {
    if let Err(resp) = authorized(&state, &params) {
        return resp;
    }
    let millis = params
        .get("millis")
        .and_then(|m| m.parse().ok())
        .unwrap_or(3_000);
    tokio::time::sleep(Duration::from_millis(millis)).await;
    json_reply(StatusCode::OK, json!({"slept": millis}))
}

/// Crawl page encoded with whatever coding the client's `Accept-Encoding`
/// prefers.
async fn compressed(State(state): State<AppState>, Query(params): Params) -> Response {
    if let Err(resp) = authorized(&state, &params) {
        return resp;
    }
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        page_for("compressed"),
    )
        .into_response()
}

/// `bytes` bytes of filler, 1 KiB by default.
async fn large(State(state): State<AppState>, Query(params): Params) -> Response {
    if let Err(resp) = authorized(&state, &params) {
        return resp;
    }
    let size = params
        .get("bytes")
        .and_then(|b| b.parse().ok())
        .unwrap_or(1024);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        vec![b'x'; size],
    )
        .into_response()
}
