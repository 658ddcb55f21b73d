//! # API Tests
//!
//! Drive the router in-process with an in-memory store.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use qrforge::config::ServerConfig;
use qrforge::server::{AppState, router};
use qrforge::storage::MemoryStore;

fn app(base_path: &str) -> Router {
    let config = ServerConfig::default().base_path(base_path);
    router(Arc::new(AppState::with_store(config, MemoryStore::new())))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, req).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_generate_qr_is_recorded_in_history() {
    let app = app("");
    let (status, entry) = send_json(
        &app,
        post_json(
            "/api/qr",
            json!({"payload": {"type": "url", "data": "https://example.com"}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["type"], "qr");
    assert_eq!(entry["qrType"], "url");
    assert_eq!(entry["data"], "https://example.com");
    assert!(entry["image"].as_str().unwrap().starts_with("data:image/png;base64,"));

    let (status, history) = send_json(&app, get("/api/history")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["id"], entry["id"]);
}

#[tokio::test]
async fn test_blank_payload_is_a_validation_error() {
    let app = app("");
    let (status, body) = send_json(
        &app,
        post_json("/api/qr", json!({"payload": {"type": "text", "data": "   "}})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Please enter valid data"));

    let (_, history) = send_json(&app, get("/api/history")).await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn test_malformed_json_is_a_validation_error() {
    let app = app("");
    let req = Request::post("/api/barcode")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send_json(&app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_barcode_then_remove_from_history() {
    let app = app("");
    let (status, entry) = send_json(
        &app,
        post_json(
            "/api/barcode",
            json!({"data": "400638133393", "options": {"format": "EAN13"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["type"], "barcode");

    let id = entry["id"].as_str().unwrap();
    let req = Request::delete(format!("/api/history/{}", id))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let req = Request::delete(format!("/api/history/{}", id))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_template_lifecycle() {
    let app = app("");
    let options = json!({"width": 300, "darkColor": "#1e3a8a", "errorCorrectionLevel": "Q"});
    let (status, saved) = send_json(
        &app,
        post_json(
            "/api/templates",
            json!({"name": "Brand", "type": "qr", "options": options}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["options"], options);

    let id = saved["id"].as_str().unwrap().to_string();
    let (status, loaded) = send_json(&app, get(&format!("/api/templates/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loaded, saved);

    let req = Request::delete(format!("/api/templates/{}", id))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, req).await.0, StatusCode::NO_CONTENT);
    assert_eq!(
        send(&app, get(&format!("/api/templates/{}", id))).await.0,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_blank_template_name_rejected() {
    let app = app("");
    let (status, body) = send_json(
        &app,
        post_json("/api/templates", json!({"name": "  ", "type": "qr"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Please enter a template name"));
}

#[tokio::test]
async fn test_export_pdf_sets_download_headers() {
    let app = app("");
    let (_, entry) = send_json(
        &app,
        post_json("/api/qr", json!({"payload": {"type": "text", "data": "hello"}})),
    )
    .await;

    let req = post_json(
        "/api/export/pdf",
        json!({"image": entry["image"], "data": "hello", "type": "qr"}),
    );
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"qr-code.pdf\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_batch_reports_each_item() {
    let app = app("");
    let (status, results) = send_json(
        &app,
        post_json(
            "/api/batch",
            json!({"type": "qr", "items": ["https://a.example", "", "second"]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["id"], "1");
    assert_eq!(results[0]["status"], "generated");
    assert_eq!(results[1]["status"], "skipped");
    assert_eq!(results[2]["status"], "generated");

    // Batch output is not recorded
    let (_, history) = send_json(&app, get("/api/history")).await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn test_routes_nest_under_base_path() {
    let app = app("/QR-Barcode-Generator/");

    let (status, history) = send_json(&app, get("/QR-Barcode-Generator/api/history")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history, json!([]));

    let (status, _) = send(&app, get("/api/history")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_index_page_gets_base_path() {
    let app = app("/qr");
    let (status, body) = send(&app, get("/qr")).await;

    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("/qr/assets/"));
    assert!(!html.contains("{{BASE_PATH}}"));
    for section in ["id=\"advanced\"", "id=\"templates\"", "id=\"batch-input\"", "id=\"share\""] {
        assert!(html.contains(section), "missing {}", section);
    }
}

#[tokio::test]
async fn test_barcode_template_keeps_width_and_margin() {
    let app = app("");
    let options = json!({"width": 3, "margin": 5});
    let (status, saved) = send_json(
        &app,
        post_json(
            "/api/templates",
            json!({"name": "Narrow", "type": "barcode", "options": options}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["type"], "barcode");
    assert_eq!(saved["options"], options);

    let id = saved["id"].as_str().unwrap();
    let (status, loaded) = send_json(&app, get(&format!("/api/templates/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loaded, saved);
}

#[tokio::test]
async fn test_barcode_batch_with_width_and_margin() {
    let app = app("");
    let (status, results) = send_json(
        &app,
        post_json(
            "/api/batch",
            json!({"type": "barcode", "items": ["A-1", "A-2"], "options": {"width": 3, "margin": 5}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(results[0]["status"], "generated");
    assert_eq!(results[1]["status"], "generated");
}

#[tokio::test]
async fn test_huge_barcode_width_is_an_encode_error() {
    let app = app("");
    let (status, body) = send_json(
        &app,
        post_json(
            "/api/barcode",
            json!({"data": "ABC-123", "options": {"width": 4294967295u32}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to generate barcode");

    let (_, history) = send_json(&app, get("/api/history")).await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn test_huge_qr_width_is_an_encode_error() {
    let app = app("");
    let (status, body) = send_json(
        &app,
        post_json(
            "/api/qr",
            json!({"payload": {"type": "text", "data": "hi"}, "options": {"width": 4294967295u32}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to generate QR code");
}

#[tokio::test]
async fn test_assets_cache_only_current_version() {
    let app = app("");
    let (_, page) = send(&app, get("/")).await;
    let page = String::from_utf8(page).unwrap();
    let start = page.find("app.js?v=").unwrap() + "app.js?v=".len();
    let version: String = page[start..].chars().take_while(|c| c.is_ascii_digit()).collect();

    let response = app
        .clone()
        .oneshot(get(&format!("/assets/app.js?v={}", version)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/javascript; charset=utf-8"
    );
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=31536000, immutable"
    );

    let response = app.clone().oneshot(get("/assets/app.css?v=1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");

    let (status, _) = send(&app, get("/assets/missing.js")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_share_returns_links_for_generated_code() {
    let app = app("");
    let (_, entry) = send_json(
        &app,
        post_json("/api/barcode", json!({"data": "SKU-42"})),
    )
    .await;

    let (status, shared) = send_json(
        &app,
        post_json(
            "/api/share",
            json!({"type": "barcode", "data": entry["data"], "image": entry["image"]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(shared["method"], "fallback");
    assert_eq!(
        shared["message"],
        "Hi! 👋\n\nI've generated a Barcode for you.\n\nContent: SKU-42"
    );
    let saved_as = shared["savedAs"].as_str().unwrap();
    assert!(saved_as.starts_with("barcode-code-") && saved_as.ends_with(".png"));
    assert!(shared["webUrl"].as_str().unwrap().starts_with("https://web.whatsapp.com/send?text="));
    assert!(shared["appUrl"].as_str().unwrap().starts_with("whatsapp://send?text="));
}

#[tokio::test]
async fn test_share_without_png_is_rejected() {
    let app = app("");
    let (status, body) = send_json(
        &app,
        post_json(
            "/api/share",
            json!({"type": "qr", "data": "x", "image": "data:image/svg+xml;base64,PHN2Zy8+"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Please generate a code first"));
}
