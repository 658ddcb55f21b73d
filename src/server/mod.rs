//! # HTTP Server
//!
//! Serves the generator page and the JSON API it talks to.
//!
//! ## Usage
//!
//! ```bash
//! qrforge serve --listen 0.0.0.0:8080 --base-path /QR-Barcode-Generator
//! ```
//!
//! Then open http://localhost:8080/QR-Barcode-Generator/ in a browser.
//!
//! ## Routes
//!
//! All routes live under the configured base path.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/` | generator page |
//! | GET | `/assets/*path` | embedded assets |
//! | POST | `/api/qr` | generate a QR code, append to history |
//! | POST | `/api/qr/svg` | QR code as SVG data URL |
//! | POST | `/api/barcode` | generate a barcode, append to history |
//! | GET, DELETE | `/api/history` | list / clear history |
//! | DELETE | `/api/history/:id` | remove one entry |
//! | GET, POST | `/api/templates` | list / save templates |
//! | GET, DELETE | `/api/templates/:id` | load / delete a template |
//! | POST | `/api/export/:format` | download as png, jpg, svg or pdf |
//! | POST | `/api/scan` | decode an uploaded image (multipart `image`) |
//! | POST | `/api/batch` | generate many codes |
//! | POST | `/api/share` | download name and WhatsApp links for a code |
//!
//! Errors are returned as `{"error": "<message>"}` with a status per error
//! class.

mod handlers;
mod state;
mod static_files;

pub use state::AppState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::QrForgeError;

/// Upload limit for scans.
const SCAN_BODY_LIMIT: usize = 20 * 1024 * 1024;

/// Build the application router for `state`, mounted at its base path.
pub fn router(state: Arc<AppState>) -> Router {
    let base_path = state.config.base_path.clone();

    let app = Router::new()
        // Frontend
        .route("/", get(static_files::index_handler))
        .route("/assets/*path", get(static_files::asset_handler))
        // Generation
        .route("/api/qr", post(handlers::generate::qr))
        .route("/api/qr/svg", post(handlers::generate::qr_svg))
        .route("/api/barcode", post(handlers::generate::barcode))
        // History
        .route(
            "/api/history",
            get(handlers::history::list).delete(handlers::history::clear),
        )
        .route("/api/history/:id", delete(handlers::history::remove))
        // Templates
        .route(
            "/api/templates",
            get(handlers::templates::list).post(handlers::templates::create),
        )
        .route(
            "/api/templates/:id",
            get(handlers::templates::get).delete(handlers::templates::delete),
        )
        // Export, scan, batch, share
        .route("/api/export/:format", post(handlers::export::export))
        .route(
            "/api/scan",
            post(handlers::scan::scan).layer(DefaultBodyLimit::max(SCAN_BODY_LIMIT)),
        )
        .route("/api/batch", post(handlers::batch::batch))
        .route("/api/share", post(handlers::share::share))
        .with_state(state);

    let app = if base_path.is_empty() {
        app
    } else {
        Router::new().nest(&base_path, app)
    };

    app.layer(TraceLayer::new_for_http())
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use qrforge::config::{ServerConfig, StorageConfig};
/// use qrforge::server::serve;
///
/// # async fn example() -> Result<(), qrforge::QrForgeError> {
/// let config = ServerConfig::new("0.0.0.0:8080", StorageConfig::new("./data"))
///     .base_path("/QR-Barcode-Generator");
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), QrForgeError> {
    let state = Arc::new(AppState::new(config.clone()));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            QrForgeError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to bind to {}: {}", config.listen_addr, e),
            ))
        })?;

    info!(
        listen = %config.listen_addr,
        base_path = %config.base_path,
        data_dir = %config.storage.data_dir.display(),
        "qrforge server starting"
    );
    info!(
        "Open http://{}{}/ in your browser",
        config.listen_addr, config.base_path
    );

    axum::serve(listener, app).await?;

    Ok(())
}
