//! Static file serving for the frontend.

use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use include_dir::{Dir, include_dir};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::state::AppState;

/// Embedded frontend files.
static FRONTEND_DIST: Dir = include_dir!("$CARGO_MANIFEST_DIR/frontend/dist");

const BASE_PATH_PLACEHOLDER: &str = "{{BASE_PATH}}";

/// Serve index.html with the base path and a cache-busting parameter filled in.
pub async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match FRONTEND_DIST.get_file("index.html") {
        Some(file) => {
            let contents = String::from_utf8_lossy(file.contents());
            let cache_bust = format!("?v={}", state.boot_time);
            let page = contents
                .replace(BASE_PATH_PLACEHOLDER, &state.config.base_path)
                .replace(".js\"", &format!(".js{}\"", cache_bust))
                .replace(".css\"", &format!(".css{}\"", cache_bust));

            Html(page).into_response()
        }
        None => (StatusCode::NOT_FOUND, "Frontend not built").into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct AssetQuery {
    v: Option<String>,
}

/// Serve a file from `assets/`.
///
/// Requests carrying the current `?v=` stamp from the page are cached as
/// immutable. Anything else must revalidate, so a restart never leaves a
/// browser on an old script.
pub async fn asset_handler(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    Query(query): Query<AssetQuery>,
) -> Response {
    let current = query.v.as_deref() == Some(state.boot_time.to_string().as_str());
    match asset(&path) {
        Some((mime, bytes)) => {
            let cache = if current {
                IMMUTABLE_CACHE
            } else {
                REVALIDATE_CACHE
            };
            (
                [
                    (header::CONTENT_TYPE, mime),
                    (header::CACHE_CONTROL, cache.to_string()),
                ],
                bytes,
            )
                .into_response()
        }
        None => {
            debug!(path = %path, "asset not found");
            (StatusCode::NOT_FOUND, "Asset not found").into_response()
        }
    }
}

const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";
const REVALIDATE_CACHE: &str = "no-cache";

/// Look up an embedded asset and its content type. Paths that climb out of
/// `assets/` are not served.
fn asset(path: &str) -> Option<(String, &'static [u8])> {
    if path.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
        return None;
    }
    let file = FRONTEND_DIST.get_file(format!("assets/{}", path))?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let mime = if mime.type_() == mime_guess::mime::TEXT {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.essence_str().to_string()
    };
    Some((mime, file.contents()))
}
