//! pdfxl API - PDF ⇄ spreadsheet conversion over HTTP
//!
//! Routes:
//! - `GET /`, `/pdf-to-excel`, `/excel-to-pdf`: upload pages
//! - `POST /api/pdf-to-excel`: multipart `file` (PDF) → `converted.xlsx`
//! - `POST /api/excel-to-pdf`: multipart `file` (XLS/XLSX) → `converted.pdf`
//! - `GET /robots.txt`, `/sitemap.xml`
//! - `GET /health`

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod pages;
pub mod state;
pub mod storage;

pub use config::Config;
pub use error::ApiError;
pub use state::AppState;

/// Build the router with all routes and middleware
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config.max_upload_bytes;

    Router::new()
        // Pages
        .route("/", get(pages::index))
        .route("/pdf-to-excel", get(pages::pdf_to_excel_page))
        .route("/excel-to-pdf", get(pages::excel_to_pdf_page))
        .route("/robots.txt", get(pages::robots))
        .route("/sitemap.xml", get(pages::sitemap))
        // Health check
        .route("/health", get(handlers::health))
        // Conversions
        .route("/api/pdf-to-excel", post(handlers::pdf_to_excel))
        .route("/api/excel-to-pdf", post(handlers::excel_to_pdf))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
